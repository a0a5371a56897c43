//! Mapping file: schemas, resource → entity bindings and transformation graphs
//!
//! ```yaml
//! schemas:
//!   - name: UserResource
//!     fields:
//!       - { name: Id, data_type: Int64 }
//!   - name: UserEntity
//!     fields:
//!       - { name: UserId, data_type: Int64 }
//! bindings:
//!   - { resource: UserResource, entity: UserEntity }
//! maps:
//!   - resource: UserResource
//!     entity: UserEntity
//!     forward:
//!       type: Assign
//!       target: { schema: UserResource, field: Id }
//!       value: { type: Field, field: { schema: UserEntity, field: UserId } }
//! ```

use std::path::Path;

use resq_mapping::{ExprMapping, TypeMap};
use resq_schema::{InMemoryRegistry, Schema};
use serde::Deserialize;

use crate::error::CliError;

#[derive(Debug, Clone, Deserialize)]
pub struct Binding {
    pub resource: String,
    pub entity: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MappingFile {
    #[serde(default)]
    pub schemas: Vec<Schema>,
    #[serde(default)]
    pub bindings: Vec<Binding>,
    #[serde(default)]
    pub maps: Vec<TypeMap>,
}

impl MappingFile {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, CliError> {
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Build the schema registry and mapping provider the file describes
    pub fn build(self) -> Result<(InMemoryRegistry, ExprMapping), CliError> {
        let mut registry = InMemoryRegistry::new();
        for schema in self.schemas {
            registry.add_schema(schema);
        }
        for binding in &self.bindings {
            registry
                .bind(&binding.resource, &binding.entity)
                .map_err(|e| CliError::Input(e.to_string()))?;
        }

        let mut mapping = ExprMapping::new();
        for map in self.maps {
            mapping.add(map);
        }

        tracing::debug!(
            bindings = self.bindings.len(),
            maps = mapping.maps().len(),
            "mapping file loaded"
        );
        Ok((registry, mapping))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resq_mapping::MappingProvider;
    use resq_schema::SchemaRegistry;
    use std::io::Write;

    const FILE: &str = r#"
schemas:
  - name: UserResource
    fields:
      - { name: Id, data_type: Int64 }
  - name: UserEntity
    fields:
      - { name: UserId, data_type: Int64 }
bindings:
  - { resource: UserResource, entity: UserEntity }
maps:
  - resource: UserResource
    entity: UserEntity
    forward:
      type: Assign
      target: { schema: UserResource, field: Id }
      value: { type: Field, field: { schema: UserEntity, field: UserId } }
"#;

    #[test]
    fn test_load_and_build() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FILE.as_bytes()).unwrap();

        let (registry, mapping) = MappingFile::load(file.path()).unwrap().build().unwrap();
        assert_eq!(registry.entity_for("UserResource"), Some("UserEntity"));
        assert!(mapping.transformation("UserResource", "UserEntity").is_some());
    }

    #[test]
    fn test_demo_mapping_builds() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/mapping.yaml");
        let (registry, mapping) = MappingFile::load(path).unwrap().build().unwrap();

        assert_eq!(registry.entity_for("UserResource"), Some("UserEntity"));
        assert!(mapping.transformation("UserResource", "UserEntity").is_some());
        assert!(mapping.maps()[0].reverse.is_some());
    }

    #[test]
    fn test_binding_to_unknown_schema() {
        let file = MappingFile::parse(
            "bindings:\n  - { resource: UserResource, entity: UserEntity }\n",
        )
        .unwrap();
        assert!(matches!(file.build(), Err(CliError::Input(_))));
    }
}
