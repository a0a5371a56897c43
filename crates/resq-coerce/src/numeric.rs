//! Integral, floating point and decimal targets

use resq_ast::{Decimal, Value};
use resq_schema::IntWidth;

use crate::{unsupported, Input};

/// Largest integer magnitude every f64 represents exactly
const F64_EXACT: i128 = 1 << 53;
const F32_EXACT: i128 = 1 << 24;

/// Numeric literal normalized across wire and typed inputs
#[derive(Debug, Clone, Copy)]
pub(crate) enum Num {
    Int(i128),
    Float(f64),
    Decimal(Decimal),
}

impl Num {
    pub(crate) fn from_wire(n: &serde_json::Number) -> Self {
        if let Some(i) = n.as_i64() {
            Num::Int(i as i128)
        } else if let Some(u) = n.as_u64() {
            Num::Int(u as i128)
        } else {
            Num::Float(n.as_f64().unwrap_or(f64::NAN))
        }
    }

    pub(crate) fn from_value(value: &Value) -> Option<Self> {
        Some(match value {
            Value::I8(v) => Num::Int(*v as i128),
            Value::I16(v) => Num::Int(*v as i128),
            Value::I32(v) => Num::Int(*v as i128),
            Value::I64(v) => Num::Int(*v as i128),
            Value::U8(v) => Num::Int(*v as i128),
            Value::U16(v) => Num::Int(*v as i128),
            Value::U32(v) => Num::Int(*v as i128),
            Value::U64(v) => Num::Int(*v as i128),
            Value::F32(v) => Num::Float(*v as f64),
            Value::F64(v) => Num::Float(*v),
            Value::Decimal(d) => Num::Decimal(*d),
            _ => return None,
        })
    }

    pub(crate) fn is_zero(self) -> bool {
        match self {
            Num::Int(i) => i == 0,
            Num::Float(f) => f == 0.0,
            Num::Decimal(d) => d.raw_value() == 0,
        }
    }

    /// Exact integer value; fractional inputs are never truncated
    pub(crate) fn to_integer(self) -> Result<i128, String> {
        match self {
            Num::Int(i) => Ok(i),
            Num::Float(f) => Err(format!("{f} is not an integral number")),
            Num::Decimal(d) => d.to_i128().map_err(|e| e.to_string()),
        }
    }
}

pub(crate) fn to_integral(width: IntWidth, input: Input<'_>) -> Result<Value, String> {
    let value = match input {
        Input::Number(num) => num.to_integer()?,
        Input::Text(s) => parse_integer(s)?,
        other => return Err(unsupported(&other)),
    };
    integral_value(width, value)
}

/// Build the host value for `width`, rejecting out-of-range inputs
pub(crate) fn integral_value(width: IntWidth, value: i128) -> Result<Value, String> {
    let out_of_range = || {
        let (min, max) = width.range();
        format!("{value} is outside the range {min}..={max}")
    };
    Ok(match width {
        IntWidth::I8 => Value::I8(i8::try_from(value).map_err(|_| out_of_range())?),
        IntWidth::I16 => Value::I16(i16::try_from(value).map_err(|_| out_of_range())?),
        IntWidth::I32 => Value::I32(i32::try_from(value).map_err(|_| out_of_range())?),
        IntWidth::I64 => Value::I64(i64::try_from(value).map_err(|_| out_of_range())?),
        IntWidth::U8 => Value::U8(u8::try_from(value).map_err(|_| out_of_range())?),
        IntWidth::U16 => Value::U16(u16::try_from(value).map_err(|_| out_of_range())?),
        IntWidth::U32 => Value::U32(u32::try_from(value).map_err(|_| out_of_range())?),
        IntWidth::U64 => Value::U64(u64::try_from(value).map_err(|_| out_of_range())?),
    })
}

/// Invariant integer text: optional sign then ASCII digits
pub(crate) fn parse_integer(s: &str) -> Result<i128, String> {
    let trimmed = s.trim();
    trimmed
        .parse::<i128>()
        .map_err(|_| format!("{trimmed:?} is not an integer"))
}

pub(crate) fn to_f64(input: Input<'_>) -> Result<Value, String> {
    let value = match input {
        Input::Number(Num::Int(i)) => exact_float(i, F64_EXACT)?,
        Input::Number(Num::Float(f)) => f,
        Input::Number(Num::Decimal(d)) => d.to_f64(),
        Input::Text(s) => parse_float(s)?,
        other => return Err(unsupported(&other)),
    };
    Ok(Value::F64(value))
}

pub(crate) fn to_f32(input: Input<'_>) -> Result<Value, String> {
    let value = match input {
        Input::Number(Num::Int(i)) => exact_float(i, F32_EXACT)?,
        Input::Number(Num::Float(f)) => f,
        Input::Number(Num::Decimal(d)) => d.to_f64(),
        Input::Text(s) => parse_float(s)?,
        other => return Err(unsupported(&other)),
    };
    let narrowed = value as f32;
    if value.is_finite() && !narrowed.is_finite() {
        return Err(format!("{value} is outside the float32 range"));
    }
    Ok(Value::F32(narrowed))
}

pub(crate) fn to_decimal(input: Input<'_>) -> Result<Value, String> {
    let decimal = match input {
        Input::Number(Num::Int(i)) => Decimal::new(i, 0).map_err(|e| e.to_string())?,
        Input::Number(Num::Float(f)) => Decimal::from_f64(f).map_err(|e| e.to_string())?,
        Input::Number(Num::Decimal(d)) => d,
        Input::Text(s) => s
            .trim()
            .parse::<Decimal>()
            .map_err(|e| format!("{:?} is not a decimal: {e}", s.trim()))?,
        other => return Err(unsupported(&other)),
    };
    Ok(Value::Decimal(decimal))
}

fn exact_float(value: i128, limit: i128) -> Result<f64, String> {
    if value.abs() > limit {
        return Err(format!("{value} cannot be represented exactly as a float"));
    }
    Ok(value as f64)
}

fn parse_float(s: &str) -> Result<f64, String> {
    let trimmed = s.trim();
    trimmed
        .parse::<f64>()
        .map_err(|_| format!("{trimmed:?} is not a number"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce;
    use resq_ast::{Literal, WireValue};
    use resq_schema::DataType;

    fn wire_number(json: &str) -> Literal {
        let number: serde_json::Number = serde_json::from_str(json).unwrap();
        Literal::Wire(WireValue::Number(number))
    }

    #[test]
    fn test_integral_from_wire_number() {
        assert_eq!(coerce(&DataType::UInt8, &wire_number("255")).unwrap(), Value::U8(255));
        assert!(coerce(&DataType::UInt8, &wire_number("256")).is_err());
        assert!(coerce(&DataType::UInt32, &wire_number("-1")).is_err());
        assert_eq!(
            coerce(&DataType::UInt64, &wire_number("18446744073709551615")).unwrap(),
            Value::U64(u64::MAX)
        );
    }

    #[test]
    fn test_integral_never_truncates() {
        assert!(coerce(&DataType::Int32, &wire_number("2.5")).is_err());
        assert!(coerce(&DataType::Int32, &Literal::wire_str("2.5")).is_err());

        let whole = Literal::Typed(Value::Decimal("4.00".parse().unwrap()));
        assert_eq!(coerce(&DataType::Int32, &whole).unwrap(), Value::I32(4));
        let fractional = Literal::Typed(Value::Decimal("4.10".parse().unwrap()));
        assert!(coerce(&DataType::Int32, &fractional).is_err());
    }

    #[test]
    fn test_integral_text_is_invariant() {
        assert_eq!(coerce(&DataType::Int64, &Literal::wire_str(" -42 ")).unwrap(), Value::I64(-42));
        assert!(coerce(&DataType::Int64, &Literal::wire_str("1,000")).is_err());
        assert!(coerce(&DataType::Int64, &Literal::wire_str("")).is_err());
    }

    #[test]
    fn test_booleans_are_not_numbers() {
        assert!(coerce(&DataType::Int32, &Literal::Wire(WireValue::Bool(true))).is_err());
    }

    #[test]
    fn test_floats() {
        assert_eq!(coerce(&DataType::Float64, &wire_number("1.5")).unwrap(), Value::F64(1.5));
        assert_eq!(coerce(&DataType::Float64, &wire_number("3")).unwrap(), Value::F64(3.0));
        assert_eq!(
            coerce(&DataType::Float32, &Literal::wire_str("0.25")).unwrap(),
            Value::F32(0.25)
        );
        assert!(coerce(&DataType::Float32, &wire_number("1e300")).is_err());
        assert!(coerce(&DataType::Float32, &wire_number("16777217")).is_err());
    }

    #[test]
    fn test_decimals() {
        let expected: Decimal = "12.50".parse().unwrap();
        assert_eq!(
            coerce(&DataType::Decimal, &Literal::wire_str("12.50")).unwrap(),
            Value::Decimal(expected)
        );
        assert_eq!(
            coerce(&DataType::Decimal, &wire_number("7")).unwrap(),
            Value::Decimal(Decimal::from(7i64))
        );
        assert!(coerce(&DataType::Decimal, &Literal::wire_str("1e5")).is_err());
    }
}
