//! Schema model, property locator and schema registry

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

mod locator;
mod registry;

pub use locator::{LocatorOptions, PropertyLocator, ResolvedPath};
pub use registry::{InMemoryRegistry, SchemaRegistry};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Schema not found: {0}")]
    UnknownSchema(String),

    #[error("'{0}' is not a registered resource schema")]
    NotAResource(String),

    #[error("Unknown type name: {0}")]
    UnknownType(String),
}

/// Integral width backing enumerations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IntWidth {
    I8,
    I16,
    #[default]
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
}

impl IntWidth {
    pub const ALL: [IntWidth; 8] = [
        IntWidth::I8,
        IntWidth::I16,
        IntWidth::I32,
        IntWidth::I64,
        IntWidth::U8,
        IntWidth::U16,
        IntWidth::U32,
        IntWidth::U64,
    ];

    pub fn range(self) -> (i128, i128) {
        match self {
            IntWidth::I8 => (i8::MIN as i128, i8::MAX as i128),
            IntWidth::I16 => (i16::MIN as i128, i16::MAX as i128),
            IntWidth::I32 => (i32::MIN as i128, i32::MAX as i128),
            IntWidth::I64 => (i64::MIN as i128, i64::MAX as i128),
            IntWidth::U8 => (0, u8::MAX as i128),
            IntWidth::U16 => (0, u16::MAX as i128),
            IntWidth::U32 => (0, u32::MAX as i128),
            IntWidth::U64 => (0, u64::MAX as i128),
        }
    }

    pub fn contains(self, value: i128) -> bool {
        let (min, max) = self.range();
        (min..=max).contains(&value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumVariant {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumType {
    pub name: String,
    #[serde(default)]
    pub underlying: IntWidth,
    pub variants: Vec<EnumVariant>,
}

impl EnumType {
    /// Case-insensitive variant lookup by name
    pub fn variant_named(&self, name: &str) -> Option<&EnumVariant> {
        self.variants
            .iter()
            .find(|v| v.name == name)
            .or_else(|| self.variants.iter().find(|v| v.name.eq_ignore_ascii_case(name)))
    }

    pub fn variant_valued(&self, value: i64) -> Option<&EnumVariant> {
        self.variants.iter().find(|v| v.value == value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    // Primitives
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Decimal,

    // Text
    Char,
    String,

    // Identity / locators
    Uuid,
    Url,

    // Temporal
    Duration,
    DateTime,
    DateTimeTz,

    // Binary
    Bytes,
    SignedBytes,
    Chars,
    Binary,

    // Complex
    Enum(EnumType),
    /// Nested record described by another registered schema
    Object(String),
}

impl DataType {
    pub fn int_width(&self) -> Option<IntWidth> {
        Some(match self {
            DataType::Int8 => IntWidth::I8,
            DataType::Int16 => IntWidth::I16,
            DataType::Int32 => IntWidth::I32,
            DataType::Int64 => IntWidth::I64,
            DataType::UInt8 => IntWidth::U8,
            DataType::UInt16 => IntWidth::U16,
            DataType::UInt32 => IntWidth::U32,
            DataType::UInt64 => IntWidth::U64,
            _ => return None,
        })
    }

    pub fn is_numeric(&self) -> bool {
        self.int_width().is_some()
            || matches!(self, DataType::Float32 | DataType::Float64 | DataType::Decimal)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Bool => "bool",
            DataType::Int8 => "int8",
            DataType::Int16 => "int16",
            DataType::Int32 => "int32",
            DataType::Int64 => "int64",
            DataType::UInt8 => "uint8",
            DataType::UInt16 => "uint16",
            DataType::UInt32 => "uint32",
            DataType::UInt64 => "uint64",
            DataType::Float32 => "float32",
            DataType::Float64 => "float64",
            DataType::Decimal => "decimal",
            DataType::Char => "char",
            DataType::String => "string",
            DataType::Uuid => "uuid",
            DataType::Url => "url",
            DataType::Duration => "duration",
            DataType::DateTime => "datetime",
            DataType::DateTimeTz => "datetimetz",
            DataType::Bytes => "bytes",
            DataType::SignedBytes => "signed_bytes",
            DataType::Chars => "chars",
            DataType::Binary => "binary",
            DataType::Enum(e) => return write!(f, "enum {}", e.name),
            DataType::Object(schema) => return write!(f, "object {schema}"),
        };
        f.write_str(name)
    }
}

impl FromStr for DataType {
    type Err = SchemaError;

    /// Parse a scalar type name; enums and objects need a full declaration
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "bool" | "boolean" => DataType::Bool,
            "int8" | "i8" | "sbyte" => DataType::Int8,
            "int16" | "i16" | "short" => DataType::Int16,
            "int32" | "i32" | "int" | "integer" => DataType::Int32,
            "int64" | "i64" | "long" | "bigint" => DataType::Int64,
            "uint8" | "u8" | "byte" => DataType::UInt8,
            "uint16" | "u16" => DataType::UInt16,
            "uint32" | "u32" => DataType::UInt32,
            "uint64" | "u64" => DataType::UInt64,
            "float32" | "f32" | "float" => DataType::Float32,
            "float64" | "f64" | "double" => DataType::Float64,
            "decimal" => DataType::Decimal,
            "char" => DataType::Char,
            "string" | "text" | "varchar" => DataType::String,
            "uuid" | "guid" => DataType::Uuid,
            "url" | "uri" => DataType::Url,
            "duration" | "timespan" => DataType::Duration,
            "datetime" | "timestamp" => DataType::DateTime,
            "datetimetz" | "datetimeoffset" | "timestamptz" => DataType::DateTimeTz,
            "bytes" => DataType::Bytes,
            "signed_bytes" => DataType::SignedBytes,
            "chars" => DataType::Chars,
            "binary" | "blob" => DataType::Binary,
            _ => return Err(SchemaError::UnknownType(s.to_string())),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,

    /// Wire alias (serialized name) accepted by the locator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    /// Written as `{ Enum: ... }` / `{ Object: Address }` in schema files
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub data_type: DataType,

    #[serde(default)]
    pub nullable: bool,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            alias: None,
            data_type,
            nullable: false,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    pub fields: Vec<FieldDef>,
}

impl Schema {
    pub fn new(name: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// Exact, case-sensitive lookup on the declared name
    pub fn find_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Canonical field plus its nullability-unwrapped type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedField {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
}

impl From<&FieldDef> for ResolvedField {
    fn from(field: &FieldDef) -> Self {
        Self {
            name: field.name.clone(),
            data_type: field.data_type.clone(),
            nullable: field.nullable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_width_bounds() {
        assert!(IntWidth::U8.contains(255));
        assert!(!IntWidth::U8.contains(256));
        assert!(!IntWidth::U8.contains(-1));
        assert!(IntWidth::I64.contains(i64::MIN as i128));
    }

    #[test]
    fn test_type_names_round_trip() {
        for ty in [DataType::Int32, DataType::DateTimeTz, DataType::SignedBytes, DataType::Url] {
            assert_eq!(ty.to_string().parse::<DataType>().unwrap(), ty);
        }
        assert!(matches!("money".parse::<DataType>(), Err(SchemaError::UnknownType(_))));
    }

    #[test]
    fn test_enum_variant_lookup() {
        let status = EnumType {
            name: "Status".to_string(),
            underlying: IntWidth::U8,
            variants: vec![
                EnumVariant { name: "Open".to_string(), value: 1 },
                EnumVariant { name: "Closed".to_string(), value: 2 },
            ],
        };
        assert_eq!(status.variant_named("closed").map(|v| v.value), Some(2));
        assert_eq!(status.variant_valued(1).map(|v| v.name.as_str()), Some("Open"));
        assert!(status.variant_named("pending").is_none());
    }

    #[test]
    fn test_schema_from_yaml() {
        let yaml = r#"
name: UserResource
fields:
  - name: Id
    data_type: Int32
  - name: Email
    alias: email_address
    data_type: String
    nullable: true
  - name: Status
    data_type:
      Enum:
        name: Status
        variants:
          - { name: Active, value: 1 }
"#;
        let schema: Schema = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(schema.fields.len(), 3);
        assert_eq!(schema.find_field("Email").unwrap().alias.as_deref(), Some("email_address"));
        assert!(matches!(schema.fields[2].data_type, DataType::Enum(ref e) if e.underlying == IntWidth::I32));
    }

    #[test]
    fn test_field_types_in_flow_mappings() {
        let yaml = r#"
name: UserEntity
fields:
  - { name: Home, data_type: { Object: Address } }
  - { name: Tags, data_type: Chars, nullable: true }
  - name: State
    data_type: { Enum: { name: UserState, underlying: u8, variants: [{ name: Active, value: 1 }] } }
"#;
        let schema: Schema = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(schema.fields[0].data_type, DataType::Object("Address".to_string()));
        assert_eq!(schema.fields[1].data_type, DataType::Chars);
        assert!(matches!(schema.fields[2].data_type, DataType::Enum(ref e) if e.underlying == IntWidth::U8));

        let json = serde_json::to_value(&schema.fields[0]).unwrap();
        assert_eq!(json["data_type"], serde_json::json!({ "Object": "Address" }));
    }
}
