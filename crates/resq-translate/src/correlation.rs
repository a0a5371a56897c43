//! Correlation analysis: which entity fields compute each resource field
//!
//! The analyzer walks a transformation graph (entity → resource) keeping an
//! explicit stack of open scopes. Every statement of a block is a boundary:
//! the scope it opens is committed to the table when the statement closes,
//! and only if an assignment to a resource field was observed inside it.
//! Assignments nested inside an already claimed scope (for example the
//! member bindings of a constructed record) open a scope of their own.

use std::collections::BTreeMap;

use resq_mapping::{FieldRef, MapExpr};
use serde::Serialize;

use crate::TranslateError;

/// Entity fields feeding one resource field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationEntry {
    pub destination: String,
    /// Entity field names, deduplicated in first-seen order
    pub sources: Vec<String>,
    /// Sub-expression computing the destination
    pub expression: MapExpr,
}

impl CorrelationEntry {
    /// True when the destination is a plain (possibly converted) read of its
    /// only source field
    pub fn is_direct(&self) -> bool {
        match (self.expression.direct_field(), self.sources.as_slice()) {
            (Some(field), [source]) => &field.field == source,
            _ => false,
        }
    }
}

/// Correlations for one (resource, entity) schema pair
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CorrelationTable {
    pub resource: String,
    pub entity: String,
    entries: BTreeMap<String, CorrelationEntry>,
}

impl CorrelationTable {
    pub fn new(resource: impl Into<String>, entity: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            entity: entity.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Entry for an exact resource field name
    pub fn get(&self, destination: &str) -> Option<&CorrelationEntry> {
        self.entries.get(destination)
    }

    pub fn entries(&self) -> impl Iterator<Item = &CorrelationEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn commit(&mut self, entry: CorrelationEntry) {
        // First assignment per field wins
        self.entries
            .entry(entry.destination.clone())
            .or_insert(entry);
    }
}

#[derive(Debug, Default)]
struct Scope<'g> {
    destination: Option<String>,
    assigned: bool,
    sources: Vec<String>,
    expression: Option<&'g MapExpr>,
}

impl<'g> Scope<'g> {
    fn claimed(destination: &str, expression: &'g MapExpr) -> Self {
        Self {
            destination: Some(destination.to_string()),
            assigned: true,
            sources: Vec::new(),
            expression: Some(expression),
        }
    }

    fn is_unclaimed(&self) -> bool {
        !self.assigned
    }

    fn into_entry(self) -> Option<CorrelationEntry> {
        if !self.assigned {
            return None;
        }
        Some(CorrelationEntry {
            destination: self.destination?,
            sources: self.sources,
            expression: self.expression?.clone(),
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CorrelationAnalyzer {
    max_depth: usize,
}

impl CorrelationAnalyzer {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Build the correlation table for `graph`, which computes `resource`
    /// from `entity`
    pub fn analyze(
        &self,
        graph: &MapExpr,
        resource: &str,
        entity: &str,
    ) -> Result<CorrelationTable, TranslateError> {
        let mut walk = Walk {
            resource,
            entity,
            max_depth: self.max_depth,
            stack: Vec::new(),
            table: CorrelationTable::new(resource, entity),
        };

        match graph {
            MapExpr::Block { statements } => {
                for statement in statements {
                    walk.statement(statement, 1)?;
                }
            }
            other => walk.statement(other, 1)?,
        }

        tracing::debug!(
            resource,
            entity,
            entries = walk.table.len(),
            "correlation table built"
        );
        Ok(walk.table)
    }
}

struct Walk<'a, 'g> {
    resource: &'a str,
    entity: &'a str,
    max_depth: usize,
    stack: Vec<Scope<'g>>,
    table: CorrelationTable,
}

impl<'a, 'g> Walk<'a, 'g> {
    /// Visit `expr` inside a fresh scope and commit it on close
    fn statement(&mut self, expr: &'g MapExpr, depth: usize) -> Result<(), TranslateError> {
        self.stack.push(Scope::default());
        let result = self.visit(expr, depth);
        self.close_scope();
        result
    }

    fn close_scope(&mut self) {
        let Some(scope) = self.stack.pop() else {
            return;
        };
        match scope.into_entry() {
            Some(entry) => {
                tracing::trace!(
                    destination = %entry.destination,
                    sources = ?entry.sources,
                    "committing correlation"
                );
                self.table.commit(entry);
            }
            None => tracing::trace!("closing scope without assignment"),
        }
    }

    fn visit(&mut self, expr: &'g MapExpr, depth: usize) -> Result<(), TranslateError> {
        if depth > self.max_depth {
            return Err(TranslateError::DepthExceeded {
                limit: self.max_depth,
            });
        }

        match expr {
            MapExpr::Block { statements } => {
                for statement in statements {
                    self.statement(statement, depth + 1)?;
                }
                Ok(())
            }
            MapExpr::Assign { target, value } if target.schema == self.resource => {
                self.assign(target, value, depth)
            }
            MapExpr::Field { field } => {
                self.field_access(field);
                Ok(())
            }
            // Structural nodes contribute nothing themselves
            other => {
                for child in other.children() {
                    self.visit(child, depth + 1)?;
                }
                Ok(())
            }
        }
    }

    fn assign(
        &mut self,
        target: &FieldRef,
        value: &'g MapExpr,
        depth: usize,
    ) -> Result<(), TranslateError> {
        if let Some(scope) = self.stack.last_mut().filter(|s| s.is_unclaimed()) {
            let sources = std::mem::take(&mut scope.sources);
            *scope = Scope {
                sources,
                ..Scope::claimed(&target.field, value)
            };
            return self.visit(value, depth + 1);
        }

        self.stack.push(Scope::claimed(&target.field, value));
        let result = self.visit(value, depth + 1);
        self.close_scope();
        result
    }

    fn field_access(&mut self, field: &FieldRef) {
        if field.schema == self.resource {
            // A resource read names the scope when nothing has claimed it yet
            if let Some(scope) = self.stack.last_mut() {
                if scope.destination.is_none() {
                    scope.destination = Some(field.field.clone());
                }
            }
        } else if field.schema == self.entity {
            let open = self
                .stack
                .iter_mut()
                .rev()
                .find(|scope| scope.destination.is_some());
            match open {
                Some(scope) => {
                    if !scope.sources.contains(&field.field) {
                        scope.sources.push(field.field.clone());
                    }
                }
                None => tracing::trace!(field = %field.field, "entity read outside any scope"),
            }
        }
    }
}
