//! Cross-call memo of correlation tables keyed by schema pair

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::CorrelationTable;

#[derive(Debug, Default)]
pub struct CorrelationCache {
    tables: RwLock<HashMap<(String, String), Arc<CorrelationTable>>>,
}

impl CorrelationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, resource: &str, entity: &str) -> Option<Arc<CorrelationTable>> {
        self.tables
            .read()
            .get(&(resource.to_string(), entity.to_string()))
            .cloned()
    }

    /// Cached table for the pair, building and storing it on a miss
    pub fn get_or_try_insert<E>(
        &self,
        resource: &str,
        entity: &str,
        build: impl FnOnce() -> Result<CorrelationTable, E>,
    ) -> Result<Arc<CorrelationTable>, E> {
        if let Some(table) = self.get(resource, entity) {
            tracing::trace!(resource, entity, "correlation cache hit");
            return Ok(table);
        }

        let table = Arc::new(build()?);
        // A concurrent builder may have won; keep whichever landed first
        let mut tables = self.tables.write();
        let stored = tables
            .entry((resource.to_string(), entity.to_string()))
            .or_insert(table);
        Ok(Arc::clone(stored))
    }

    pub fn len(&self) -> usize {
        self.tables.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.read().is_empty()
    }

    pub fn clear(&self) {
        self.tables.write().clear();
    }
}
