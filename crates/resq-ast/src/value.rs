//! Literal and host value model

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::decimal::Decimal;
use crate::duration;

/// Literal carried by a query node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Literal {
    /// Value already committed to a host type
    Typed(Value),
    /// Generic wire value not yet committed to a host type
    Wire(WireValue),
}

impl Literal {
    pub fn wire_str(s: impl Into<String>) -> Self {
        Literal::Wire(WireValue::String(s.into()))
    }

    /// Borrow the text of a string literal, typed or wire
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::Typed(Value::String(s)) | Literal::Wire(WireValue::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Literal::Typed(Value::Null) | Literal::Wire(WireValue::Null))
    }
}

impl From<Value> for Literal {
    fn from(value: Value) -> Self {
        Literal::Typed(value)
    }
}

impl From<WireValue> for Literal {
    fn from(value: WireValue) -> Self {
        Literal::Wire(value)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Typed(value) => write!(f, "{} ({})", value, value.type_name()),
            Literal::Wire(value) => write!(f, "{} (wire {})", value, value.tag()),
        }
    }
}

/// Generically tagged wire value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    Array(Vec<WireValue>),
}

impl WireValue {
    pub fn tag(&self) -> &'static str {
        match self {
            WireValue::Null => "null",
            WireValue::Bool(_) => "boolean",
            WireValue::Number(_) => "number",
            WireValue::String(_) => "string",
            WireValue::Array(_) => "array",
        }
    }
}

impl TryFrom<serde_json::Value> for WireValue {
    type Error = String;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        Ok(match value {
            serde_json::Value::Null => WireValue::Null,
            serde_json::Value::Bool(b) => WireValue::Bool(b),
            serde_json::Value::Number(n) => WireValue::Number(n),
            serde_json::Value::String(s) => WireValue::String(s),
            serde_json::Value::Array(items) => WireValue::Array(
                items
                    .into_iter()
                    .map(WireValue::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            serde_json::Value::Object(_) => {
                return Err("objects are not valid wire literals".to_string())
            }
        })
    }
}

impl fmt::Display for WireValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireValue::Null => f.write_str("null"),
            WireValue::Bool(b) => write!(f, "{b}"),
            WireValue::Number(n) => write!(f, "{n}"),
            WireValue::String(s) => write!(f, "{s:?}"),
            WireValue::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Member of an enumeration type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnumValue {
    pub type_name: String,
    /// Declared variant name, absent for undeclared discriminants
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    pub discriminant: i64,
}

/// Host-typed value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Decimal(Decimal),
    Char(char),
    String(String),
    Uuid(Uuid),
    Duration(#[serde(with = "duration::text")] TimeDelta),
    DateTime(NaiveDateTime),
    DateTimeTz(DateTime<FixedOffset>),
    Url(Url),
    Enum(EnumValue),
    Bytes(Vec<u8>),
    SignedBytes(Vec<i8>),
    Chars(Vec<char>),
    Binary(Vec<u8>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::I8(_) => "i8",
            Value::I16(_) => "i16",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::U8(_) => "u8",
            Value::U16(_) => "u16",
            Value::U32(_) => "u32",
            Value::U64(_) => "u64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::Decimal(_) => "decimal",
            Value::Char(_) => "char",
            Value::String(_) => "string",
            Value::Uuid(_) => "uuid",
            Value::Duration(_) => "duration",
            Value::DateTime(_) => "datetime",
            Value::DateTimeTz(_) => "datetimetz",
            Value::Url(_) => "url",
            Value::Enum(_) => "enum",
            Value::Bytes(_) => "bytes",
            Value::SignedBytes(_) => "signed_bytes",
            Value::Chars(_) => "chars",
            Value::Binary(_) => "binary",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::I8(v) => write!(f, "{v}"),
            Value::I16(v) => write!(f, "{v}"),
            Value::I32(v) => write!(f, "{v}"),
            Value::I64(v) => write!(f, "{v}"),
            Value::U8(v) => write!(f, "{v}"),
            Value::U16(v) => write!(f, "{v}"),
            Value::U32(v) => write!(f, "{v}"),
            Value::U64(v) => write!(f, "{v}"),
            Value::F32(v) => write!(f, "{v}"),
            Value::F64(v) => write!(f, "{v}"),
            Value::Decimal(v) => write!(f, "{v}"),
            Value::Char(v) => write!(f, "{v:?}"),
            Value::String(v) => write!(f, "{v:?}"),
            Value::Uuid(v) => write!(f, "{v}"),
            Value::Duration(v) => f.write_str(&duration::format(v)),
            Value::DateTime(v) => write!(f, "{}", v.format("%Y-%m-%dT%H:%M:%S%.f")),
            Value::DateTimeTz(v) => write!(f, "{}", v.to_rfc3339()),
            Value::Url(v) => write!(f, "{v}"),
            Value::Enum(v) => match &v.variant {
                Some(name) => write!(f, "{}::{}", v.type_name, name),
                None => write!(f, "{}({})", v.type_name, v.discriminant),
            },
            Value::Bytes(v) | Value::Binary(v) => write!(f, "<{} bytes>", v.len()),
            Value::SignedBytes(v) => write!(f, "<{} signed bytes>", v.len()),
            Value::Chars(v) => write!(f, "{:?}", v.iter().collect::<String>()),
        }
    }
}

macro_rules! impl_from_for_value {
    ($($variant:ident: $t:ty),* $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from_for_value!(
    Bool: bool,
    I8: i8,
    I16: i16,
    I32: i32,
    I64: i64,
    U8: u8,
    U16: u16,
    U32: u32,
    U64: u64,
    F32: f32,
    F64: f64,
    Decimal: Decimal,
    Char: char,
    String: String,
    Uuid: Uuid,
    Url: Url,
);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}
