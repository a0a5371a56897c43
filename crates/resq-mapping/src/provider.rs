//! Declarative mapping provider backed by transformation graphs

use serde::{Deserialize, Serialize};

use crate::eval::Evaluator;
use crate::{MapExpr, MappingError, MappingProvider, Record};

/// Mapping between one resource schema and one entity schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeMap {
    pub resource: String,
    pub entity: String,

    /// Computes the resource from the entity
    pub forward: MapExpr,

    /// Computes the entity from the resource
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reverse: Option<MapExpr>,
}

/// Mapping provider over a fixed set of [`TypeMap`]s
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExprMapping {
    #[serde(default)]
    maps: Vec<TypeMap>,
}

impl ExprMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a map, replacing any earlier map for the same pair
    pub fn add(&mut self, map: TypeMap) {
        self.maps
            .retain(|m| !(m.resource == map.resource && m.entity == map.entity));
        self.maps.push(map);
    }

    pub fn maps(&self) -> &[TypeMap] {
        &self.maps
    }

    fn find(&self, resource: &str, entity: &str) -> Option<&TypeMap> {
        self.maps
            .iter()
            .find(|m| m.resource == resource && m.entity == entity)
    }
}

impl MappingProvider for ExprMapping {
    fn transformation(&self, resource: &str, entity: &str) -> Option<&MapExpr> {
        self.find(resource, entity).map(|m| &m.forward)
    }

    fn materialize(
        &self,
        resource: &str,
        entity: &str,
        instance: &Record,
    ) -> Result<Record, MappingError> {
        let reverse = self
            .find(resource, entity)
            .and_then(|m| m.reverse.as_ref())
            .ok_or_else(|| MappingError::NoMapping {
                from: resource.to_string(),
                to: entity.to_string(),
            })?;

        tracing::trace!(resource, entity, fields = instance.len(), "materializing entity record");
        Evaluator::new(resource, entity, instance).run(reverse)
    }
}
