use resq_ast::Value;

use crate::{unsupported, Input};

/// Booleans accept wire booleans, numbers (nonzero is true), and text whose
/// first character is one of `t y 1` or `f n 0`
pub(crate) fn to_bool(input: Input<'_>) -> Result<Value, String> {
    match input {
        Input::Bool(b) => Ok(Value::Bool(b)),
        Input::Number(num) => Ok(Value::Bool(!num.is_zero())),
        Input::Text(s) => parse_bool(s)
            .map(Value::Bool)
            .ok_or_else(|| "unrecognized boolean text".to_string()),
        other => Err(unsupported(&other)),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.chars().next()?.to_ascii_lowercase() {
        't' | 'y' | '1' => Some(true),
        'f' | 'n' | '0' => Some(false),
        _ => None,
    }
}
