//! Schema registry: schema lookup and resource → entity pairing

use std::collections::HashMap;

use crate::{Schema, SchemaError};

/// Lookup of schemas and of the entity schema paired with a resource schema
pub trait SchemaRegistry: Send + Sync {
    fn schema(&self, name: &str) -> Option<&Schema>;

    /// Entity schema name paired with `resource`, if it is a resource schema
    fn entity_for(&self, resource: &str) -> Option<&str>;

    /// Resolve both halves of a resource binding
    fn binding(&self, resource: &str) -> Result<(&Schema, &Schema), SchemaError> {
        let entity_name = self
            .entity_for(resource)
            .ok_or_else(|| SchemaError::NotAResource(resource.to_string()))?;
        let resource_schema = self
            .schema(resource)
            .ok_or_else(|| SchemaError::UnknownSchema(resource.to_string()))?;
        let entity_schema = self
            .schema(entity_name)
            .ok_or_else(|| SchemaError::UnknownSchema(entity_name.to_string()))?;
        Ok((resource_schema, entity_schema))
    }
}

/// In-process registry
#[derive(Debug, Default, Clone)]
pub struct InMemoryRegistry {
    schemas: HashMap<String, Schema>,
    bindings: HashMap<String, String>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_schema(&mut self, schema: Schema) {
        self.schemas.insert(schema.name.clone(), schema);
    }

    /// Pair a resource schema with its entity schema; both must be registered
    pub fn bind(&mut self, resource: &str, entity: &str) -> Result<(), SchemaError> {
        for name in [resource, entity] {
            if !self.schemas.contains_key(name) {
                return Err(SchemaError::UnknownSchema(name.to_string()));
            }
        }
        self.bindings.insert(resource.to_string(), entity.to_string());
        Ok(())
    }

    pub fn schemas(&self) -> impl Iterator<Item = &Schema> {
        self.schemas.values()
    }
}

impl SchemaRegistry for InMemoryRegistry {
    fn schema(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    fn entity_for(&self, resource: &str) -> Option<&str> {
        self.bindings.get(resource).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DataType, FieldDef};

    fn registry() -> InMemoryRegistry {
        let mut registry = InMemoryRegistry::new();
        registry.add_schema(Schema::new("UserResource", vec![FieldDef::new("Id", DataType::Int32)]));
        registry.add_schema(Schema::new("UserEntity", vec![FieldDef::new("UserId", DataType::Int64)]));
        registry
    }

    #[test]
    fn test_binding_lookup() {
        let mut registry = registry();
        registry.bind("UserResource", "UserEntity").unwrap();

        let (resource, entity) = registry.binding("UserResource").unwrap();
        assert_eq!(resource.name, "UserResource");
        assert_eq!(entity.name, "UserEntity");
    }

    #[test]
    fn test_unbound_schema_is_not_a_resource() {
        let registry = registry();
        assert_eq!(
            registry.binding("UserEntity").unwrap_err(),
            SchemaError::NotAResource("UserEntity".to_string())
        );
    }

    #[test]
    fn test_bind_requires_registered_schemas() {
        let mut registry = registry();
        assert_eq!(
            registry.bind("UserResource", "Missing").unwrap_err(),
            SchemaError::UnknownSchema("Missing".to_string())
        );
    }
}
