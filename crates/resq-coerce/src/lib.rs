//! Value coercion engine
//!
//! Converts a query literal into the exact host type a field requires.
//! Dispatch order:
//! 1. a typed literal that already has the target representation passes through;
//! 2. a wire literal is converted according to its tag;
//! 3. any other typed literal goes through the same category rules as a
//!    representation conversion.
//!
//! Coercion is pure: it returns either a fully converted value or an error
//! naming the literal and the target type.

use resq_ast::{Literal, Value, WireValue};
use resq_schema::{DataType, ResolvedField};
use thiserror::Error;

mod binary;
mod boolean;
mod enums;
mod numeric;
mod temporal;
mod text;

pub use text::LOCAL_BASE_URL;

use numeric::Num;

#[derive(Debug, Clone, PartialEq, Error)]
#[error("Cannot convert {value} to {target}: {reason}")]
pub struct CoerceError {
    pub value: String,
    pub target: String,
    pub reason: String,
}

impl CoerceError {
    fn new(literal: &Literal, target: &DataType, reason: impl Into<String>) -> Self {
        Self {
            value: literal.to_string(),
            target: target.to_string(),
            reason: reason.into(),
        }
    }
}

/// Normalized view of a literal used by the category rules
#[derive(Debug)]
pub(crate) enum Input<'a> {
    Null,
    Bool(bool),
    Number(Num),
    Text(&'a str),
    Array(&'a [WireValue]),
    Typed(&'a Value),
}

impl<'a> Input<'a> {
    pub(crate) fn from_wire(wire: &'a WireValue) -> Self {
        match wire {
            WireValue::Null => Input::Null,
            WireValue::Bool(b) => Input::Bool(*b),
            WireValue::Number(n) => Input::Number(Num::from_wire(n)),
            WireValue::String(s) => Input::Text(s),
            WireValue::Array(items) => Input::Array(items),
        }
    }

    pub(crate) fn from_typed(value: &'a Value) -> Self {
        match value {
            Value::Null => Input::Null,
            Value::Bool(b) => Input::Bool(*b),
            Value::String(s) => Input::Text(s),
            other => match Num::from_value(other) {
                Some(num) => Input::Number(num),
                None => Input::Typed(other),
            },
        }
    }

    pub(crate) fn describe(&self) -> &'static str {
        match self {
            Input::Null => "null",
            Input::Bool(_) => "a boolean",
            Input::Number(_) => "a number",
            Input::Text(_) => "a string",
            Input::Array(_) => "an array",
            Input::Typed(_) => "a typed value",
        }
    }
}

/// Reason text for an input the category has no rule for
pub(crate) fn unsupported(input: &Input<'_>) -> String {
    match input {
        Input::Typed(value) => format!("{} values are not accepted", value.type_name()),
        other => format!("{} is not accepted", other.describe()),
    }
}

/// Convert `literal` into a value of `target`
pub fn coerce(target: &DataType, literal: &Literal) -> Result<Value, CoerceError> {
    let input = match literal {
        Literal::Typed(value) if has_representation(value, target) => return Ok(value.clone()),
        Literal::Typed(value) => Input::from_typed(value),
        Literal::Wire(wire) => Input::from_wire(wire),
    };

    convert(target, input).map_err(|reason| {
        tracing::trace!(%target, %literal, %reason, "coercion rejected");
        CoerceError::new(literal, target, reason)
    })
}

/// Convert `literal` for a resolved field, admitting null on nullable fields
pub fn coerce_field(field: &ResolvedField, literal: &Literal) -> Result<Value, CoerceError> {
    if field.nullable && literal.is_null() {
        return Ok(Value::Null);
    }
    coerce(&field.data_type, literal)
}

fn convert(target: &DataType, input: Input<'_>) -> Result<Value, String> {
    if let Some(width) = target.int_width() {
        return numeric::to_integral(width, input);
    }
    match target {
        DataType::Bool => boolean::to_bool(input),
        DataType::Float32 => numeric::to_f32(input),
        DataType::Float64 => numeric::to_f64(input),
        DataType::Decimal => numeric::to_decimal(input),
        DataType::Char => text::to_char(input),
        DataType::String => text::to_string(input),
        DataType::Uuid => text::to_uuid(input),
        DataType::Url => text::to_url(input),
        DataType::Duration => temporal::to_duration(input),
        DataType::DateTime => temporal::to_datetime(input),
        DataType::DateTimeTz => temporal::to_datetimetz(input),
        DataType::Enum(ty) => enums::to_enum(ty, input),
        DataType::Bytes | DataType::SignedBytes | DataType::Chars | DataType::Binary => {
            binary::to_sequence(target, input)
        }
        DataType::Object(schema) => Err(format!("{schema} is a nested record, not a scalar")),
        _ => Err(format!("no coercion rule for {target}")),
    }
}

/// Whether a typed value already has the target's host representation
fn has_representation(value: &Value, target: &DataType) -> bool {
    matches!(
        (value, target),
        (Value::Bool(_), DataType::Bool)
            | (Value::I8(_), DataType::Int8)
            | (Value::I16(_), DataType::Int16)
            | (Value::I32(_), DataType::Int32)
            | (Value::I64(_), DataType::Int64)
            | (Value::U8(_), DataType::UInt8)
            | (Value::U16(_), DataType::UInt16)
            | (Value::U32(_), DataType::UInt32)
            | (Value::U64(_), DataType::UInt64)
            | (Value::F32(_), DataType::Float32)
            | (Value::F64(_), DataType::Float64)
            | (Value::Decimal(_), DataType::Decimal)
            | (Value::Char(_), DataType::Char)
            | (Value::String(_), DataType::String)
            | (Value::Uuid(_), DataType::Uuid)
            | (Value::Url(_), DataType::Url)
            | (Value::Duration(_), DataType::Duration)
            | (Value::DateTime(_), DataType::DateTime)
            | (Value::DateTimeTz(_), DataType::DateTimeTz)
            | (Value::Bytes(_), DataType::Bytes)
            | (Value::SignedBytes(_), DataType::SignedBytes)
            | (Value::Chars(_), DataType::Chars)
            | (Value::Binary(_), DataType::Binary)
    ) || matches!((value, target), (Value::Enum(v), DataType::Enum(t)) if v.type_name == t.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire_str(s: &str) -> Literal {
        Literal::wire_str(s)
    }

    #[test]
    fn test_wire_string_to_int32() {
        assert_eq!(coerce(&DataType::Int32, &wire_str("123")).unwrap(), Value::I32(123));
    }

    #[test]
    fn test_typed_number_is_not_stringified() {
        let err = coerce(&DataType::String, &Literal::Typed(Value::I32(123))).unwrap_err();
        assert_eq!(err.target, "string");
        assert!(err.value.contains("123"));
    }

    #[test]
    fn test_typed_passthrough() {
        let literal = Literal::Typed(Value::I64(9));
        assert_eq!(coerce(&DataType::Int64, &literal).unwrap(), Value::I64(9));
    }

    #[test]
    fn test_typed_numeric_conversion_is_checked() {
        assert_eq!(
            coerce(&DataType::Int16, &Literal::Typed(Value::I64(300))).unwrap(),
            Value::I16(300)
        );
        assert!(coerce(&DataType::Int8, &Literal::Typed(Value::I64(300))).is_err());
    }

    #[test]
    fn test_nullable_field_accepts_null() {
        let nullable = ResolvedField {
            name: "Age".to_string(),
            data_type: DataType::Int32,
            nullable: true,
        };
        let required = ResolvedField {
            nullable: false,
            ..nullable.clone()
        };
        let null = Literal::Wire(WireValue::Null);

        assert_eq!(coerce_field(&nullable, &null).unwrap(), Value::Null);
        assert!(coerce_field(&required, &null).is_err());
    }

    #[test]
    fn test_string_target_maps_wire_null() {
        assert_eq!(
            coerce(&DataType::String, &Literal::Wire(WireValue::Null)).unwrap(),
            Value::Null
        );
        assert!(coerce(&DataType::String, &Literal::Wire(WireValue::Bool(true))).is_err());
    }

    #[test]
    fn test_object_target_is_rejected() {
        let err = coerce(&DataType::Object("Address".to_string()), &wire_str("x")).unwrap_err();
        assert!(err.reason.contains("nested record"));
    }

    #[test]
    fn test_error_message_names_value_and_type() {
        let err = coerce(&DataType::Bool, &wire_str("maybe")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot convert \"maybe\" (wire string) to bool: unrecognized boolean text"
        );
    }
}
