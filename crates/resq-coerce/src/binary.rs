//! Byte and character sequence targets
//!
//! Sequences accept base64 text, a wire array coerced element by element,
//! or a typed sequence of the same element kind.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use resq_ast::{Value, WireValue};
use resq_schema::{DataType, IntWidth};

use crate::numeric::integral_value;
use crate::text::to_char;
use crate::{unsupported, Input};

pub(crate) fn to_sequence(target: &DataType, input: Input<'_>) -> Result<Value, String> {
    match input {
        Input::Text(s) => from_base64(target, s.trim()),
        Input::Array(items) => from_array(target, items),
        Input::Typed(Value::Bytes(bytes) | Value::Binary(bytes)) => match target {
            DataType::Bytes => Ok(Value::Bytes(bytes.clone())),
            DataType::Binary => Ok(Value::Binary(bytes.clone())),
            _ => Err(format!("byte sequences cannot become {target}")),
        },
        other => Err(unsupported(&other)),
    }
}

fn from_base64(target: &DataType, s: &str) -> Result<Value, String> {
    let bytes = BASE64
        .decode(s)
        .map_err(|e| format!("invalid base64: {e}"))?;
    Ok(match target {
        DataType::Bytes => Value::Bytes(bytes),
        DataType::Binary => Value::Binary(bytes),
        DataType::SignedBytes => Value::SignedBytes(bytes.into_iter().map(|b| b as i8).collect()),
        _ => {
            let text = String::from_utf8(bytes).map_err(|e| format!("invalid utf-8: {e}"))?;
            Value::Chars(text.chars().collect())
        }
    })
}

fn from_array(target: &DataType, items: &[WireValue]) -> Result<Value, String> {
    match target {
        DataType::Bytes => Ok(Value::Bytes(integers(items, IntWidth::U8)?.map(|n| n as u8).collect())),
        DataType::Binary => Ok(Value::Binary(integers(items, IntWidth::U8)?.map(|n| n as u8).collect())),
        DataType::SignedBytes => Ok(Value::SignedBytes(
            integers(items, IntWidth::I8)?.map(|n| n as i8).collect(),
        )),
        _ => items
            .iter()
            .enumerate()
            .map(|(index, item)| match to_char(Input::from_wire(item)) {
                Ok(Value::Char(c)) => Ok(c),
                Ok(other) => Err(format!("element {index}: unexpected {}", other.type_name())),
                Err(reason) => Err(format!("element {index}: {reason}")),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Chars),
    }
}

/// Range-checked integer elements of a wire array
fn integers(items: &[WireValue], width: IntWidth) -> Result<impl Iterator<Item = i128>, String> {
    let values = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let Input::Number(num) = Input::from_wire(item) else {
                return Err(format!("element {index} is not a number"));
            };
            let value = num
                .to_integer()
                .map_err(|reason| format!("element {index}: {reason}"))?;
            integral_value(width, value)
                .map(|_| value)
                .map_err(|reason| format!("element {index}: {reason}"))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(values.into_iter())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce;
    use resq_ast::Literal;

    fn wire_array(json: &str) -> Literal {
        let value: serde_json::Value = serde_json::from_str(json).unwrap();
        Literal::Wire(WireValue::try_from(value).unwrap())
    }

    #[test]
    fn test_base64_bytes() {
        assert_eq!(
            coerce(&DataType::Bytes, &Literal::wire_str("AQID")).unwrap(),
            Value::Bytes(vec![1, 2, 3])
        );
        assert_eq!(
            coerce(&DataType::SignedBytes, &Literal::wire_str("/w==")).unwrap(),
            Value::SignedBytes(vec![-1])
        );
        assert_eq!(
            coerce(&DataType::Chars, &Literal::wire_str("aGk=")).unwrap(),
            Value::Chars(vec!['h', 'i'])
        );
        assert!(coerce(&DataType::Binary, &Literal::wire_str("***")).is_err());
    }

    #[test]
    fn test_arrays_coerce_each_element() {
        assert_eq!(
            coerce(&DataType::Binary, &wire_array("[0, 255]")).unwrap(),
            Value::Binary(vec![0, 255])
        );
        assert_eq!(
            coerce(&DataType::SignedBytes, &wire_array("[-128, 127]")).unwrap(),
            Value::SignedBytes(vec![-128, 127])
        );
        assert_eq!(
            coerce(&DataType::Chars, &wire_array(r#"["a", "b"]"#)).unwrap(),
            Value::Chars(vec!['a', 'b'])
        );

        let err = coerce(&DataType::Bytes, &wire_array("[1, 256]")).unwrap_err();
        assert!(err.reason.starts_with("element 1"));
    }

    #[test]
    fn test_typed_bytes_convert_between_representations() {
        let bytes = Literal::Typed(Value::Bytes(vec![9]));
        assert_eq!(coerce(&DataType::Binary, &bytes).unwrap(), Value::Binary(vec![9]));
        assert!(coerce(&DataType::Chars, &bytes).is_err());
    }
}
