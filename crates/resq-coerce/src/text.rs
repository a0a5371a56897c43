//! Character, string, uuid and url targets

use resq_ast::Value;
use url::{ParseError, Url};
use uuid::Uuid;

use crate::{unsupported, Input};

/// Base joined onto relative locators
pub const LOCAL_BASE_URL: &str = "http://localhost/";

pub(crate) fn to_char(input: Input<'_>) -> Result<Value, String> {
    match input {
        Input::Text(s) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Value::Char(c)),
                _ => Err(format!("expected exactly one character, got {}", s.chars().count())),
            }
        }
        other => Err(unsupported(&other)),
    }
}

/// Strings accept text and wire null only; other values are never stringified
pub(crate) fn to_string(input: Input<'_>) -> Result<Value, String> {
    match input {
        Input::Text(s) => Ok(Value::String(s.to_string())),
        Input::Null => Ok(Value::Null),
        other => Err(unsupported(&other)),
    }
}

pub(crate) fn to_uuid(input: Input<'_>) -> Result<Value, String> {
    match input {
        Input::Text(s) => Uuid::parse_str(s.trim())
            .map(Value::Uuid)
            .map_err(|e| format!("invalid uuid: {e}")),
        other => Err(unsupported(&other)),
    }
}

pub(crate) fn to_url(input: Input<'_>) -> Result<Value, String> {
    match input {
        Input::Text(s) => parse_url(s.trim()).map(Value::Url),
        other => Err(unsupported(&other)),
    }
}

/// Absolute locators parse as-is; rooted or relative ones join the local base
fn parse_url(s: &str) -> Result<Url, String> {
    let base = || Url::parse(LOCAL_BASE_URL).map_err(|e| e.to_string());

    if s.starts_with('/') {
        return base()?.join(s).map_err(|e| format!("invalid url: {e}"));
    }
    match Url::parse(s) {
        Ok(url) => Ok(url),
        Err(ParseError::RelativeUrlWithoutBase) => {
            base()?.join(s).map_err(|e| format!("invalid url: {e}"))
        }
        Err(e) => Err(format!("invalid url: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce;
    use resq_ast::Literal;
    use resq_schema::DataType;

    fn url_of(text: &str) -> String {
        match coerce(&DataType::Url, &Literal::wire_str(text)).unwrap() {
            Value::Url(url) => url.to_string(),
            other => panic!("expected url, got {other:?}"),
        }
    }

    #[test]
    fn test_rooted_path_uses_local_base() {
        assert_eq!(url_of("/a/b"), "http://localhost/a/b");
    }

    #[test]
    fn test_absolute_url_is_unchanged() {
        assert_eq!(url_of("https://x/y"), "https://x/y");
    }

    #[test]
    fn test_relative_path_uses_local_base() {
        assert_eq!(url_of("docs/readme"), "http://localhost/docs/readme");
    }

    #[test]
    fn test_char_requires_single_character() {
        assert_eq!(coerce(&DataType::Char, &Literal::wire_str("é")).unwrap(), Value::Char('é'));
        assert!(coerce(&DataType::Char, &Literal::wire_str("ab")).is_err());
        assert!(coerce(&DataType::Char, &Literal::wire_str("")).is_err());
    }

    #[test]
    fn test_uuid_text() {
        let id = "67e55044-10b1-426f-9247-bb680e5fe0c8";
        assert_eq!(
            coerce(&DataType::Uuid, &Literal::wire_str(id)).unwrap(),
            Value::Uuid(Uuid::parse_str(id).unwrap())
        );
        assert!(coerce(&DataType::Uuid, &Literal::wire_str("not-a-uuid")).is_err());
    }
}
