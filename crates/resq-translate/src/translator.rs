//! Resource → entity query translator

use std::sync::Arc;

use resq_ast::{Arg, Literal, Op, QueryNode, SortDirection, WireValue};
use resq_coerce::coerce_field;
use resq_mapping::{MappingError, MappingProvider, Record};
use resq_schema::{PropertyLocator, ResolvedField, Schema, SchemaRegistry};

use crate::{
    CorrelationAnalyzer, CorrelationCache, CorrelationEntry, CorrelationTable, TranslateError,
    TranslatorConfig,
};

/// Translator for resource-schema queries → entity-schema queries
pub struct SchemaTranslator<'a> {
    registry: &'a dyn SchemaRegistry,
    mapping: &'a dyn MappingProvider,
    config: TranslatorConfig,
    locator: PropertyLocator,
    cache: CorrelationCache,
}

/// Schema pair and correlations for one translation call
struct Binding<'s> {
    resource: &'s Schema,
    entity: &'s Schema,
    table: Arc<CorrelationTable>,
}

/// One entity field a resource field fans out to
struct Target<'t> {
    entry: &'t CorrelationEntry,
    /// Canonical resource field name
    resource_field: String,
    /// Entity-side PROPERTY node to emit
    property: QueryNode,
    /// Type of the leaf the literal compares against
    field: ResolvedField,
    nested: bool,
}

impl<'a> SchemaTranslator<'a> {
    pub fn new(registry: &'a dyn SchemaRegistry, mapping: &'a dyn MappingProvider) -> Self {
        Self::with_config(registry, mapping, TranslatorConfig::default())
    }

    pub fn with_config(
        registry: &'a dyn SchemaRegistry,
        mapping: &'a dyn MappingProvider,
        config: TranslatorConfig,
    ) -> Self {
        Self {
            registry,
            mapping,
            config,
            locator: PropertyLocator::new(config.locator),
            cache: CorrelationCache::new(),
        }
    }

    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    pub fn locator(&self) -> &PropertyLocator {
        &self.locator
    }

    pub fn cache(&self) -> &CorrelationCache {
        &self.cache
    }

    /// Translate `node`, written against `resource`, into its paired entity schema.
    ///
    /// Nodes that do not correlate to any entity field are dropped; if the
    /// root itself drops, the result is NOOP.
    pub fn translate(&self, node: &QueryNode, resource: &str) -> Result<QueryNode, TranslateError> {
        let span = tracing::debug_span!("translate", resource, entity = tracing::field::Empty);
        let _enter = span.enter();

        let (resource_schema, entity_schema) = self.registry.binding(resource)?;
        span.record("entity", entity_schema.name.as_str());

        let binding = Binding {
            resource: resource_schema,
            entity: entity_schema,
            table: self.table_for(resource_schema, entity_schema)?,
        };

        let translated = self.translate_node(&binding, node, 1)?;
        Ok(translated.unwrap_or_else(|| {
            tracing::debug!(op = ?node.op, "query root translated to nothing");
            QueryNode::noop()
        }))
    }

    /// Correlation table for `resource` and its paired entity schema
    pub fn correlations(&self, resource: &str) -> Result<Arc<CorrelationTable>, TranslateError> {
        let (resource_schema, entity_schema) = self.registry.binding(resource)?;
        self.table_for(resource_schema, entity_schema)
    }

    fn table_for(
        &self,
        resource: &Schema,
        entity: &Schema,
    ) -> Result<Arc<CorrelationTable>, TranslateError> {
        let build = || -> Result<CorrelationTable, TranslateError> {
            let graph = self
                .mapping
                .transformation(&resource.name, &entity.name)
                .ok_or_else(|| MappingError::NoMapping {
                    from: entity.name.clone(),
                    to: resource.name.clone(),
                })?;
            CorrelationAnalyzer::new(self.config.max_depth).analyze(graph, &resource.name, &entity.name)
        };

        if self.config.cache_correlations {
            self.cache.get_or_try_insert(&resource.name, &entity.name, build)
        } else {
            build().map(Arc::new)
        }
    }

    fn translate_node(
        &self,
        binding: &Binding<'_>,
        node: &QueryNode,
        depth: usize,
    ) -> Result<Option<QueryNode>, TranslateError> {
        if depth > self.config.max_depth {
            return Err(TranslateError::DepthExceeded {
                limit: self.config.max_depth,
            });
        }

        match node.op {
            Op::And | Op::Or | Op::Values => self.translate_logical(binding, node, depth),
            op if op.is_comparison() => self.translate_comparison(binding, node),
            op if op.is_pattern() => self.translate_pattern(binding, node),
            Op::Sort => self.translate_sort(binding, node).map(Some),
            // Outside a SORT the direction has no meaning; only the field is kept
            Op::SortProperty => Ok(node
                .nodes()
                .next()
                .and_then(|property| self.translate_property(binding, property))),
            Op::Select => Ok(Some(self.translate_select(binding, node))),
            Op::Property => Ok(self.translate_property(binding, node)),
            op if op.is_aggregate() => self.translate_container(binding, node, depth).map(Some),
            Op::Limit | Op::Distinct | Op::First | Op::One => Ok(Some(node.clone())),
            _ => Ok(Some(QueryNode::noop())),
        }
    }

    /// AND / OR / VALUES: children translate independently and untranslatable
    /// ones are omitted
    fn translate_logical(
        &self,
        binding: &Binding<'_>,
        node: &QueryNode,
        depth: usize,
    ) -> Result<Option<QueryNode>, TranslateError> {
        let mut args = Vec::with_capacity(node.args.len());
        let mut had_nodes = false;
        let mut kept_nodes = false;

        for arg in &node.args {
            match arg {
                Arg::Node(child) => {
                    had_nodes = true;
                    match self.translate_node(binding, child, depth + 1)? {
                        Some(translated) => {
                            kept_nodes = true;
                            args.push(Arg::Node(translated));
                        }
                        None => tracing::debug!(op = ?child.op, "omitting untranslatable child"),
                    }
                }
                other => args.push(other.clone()),
            }
        }

        if had_nodes && !kept_nodes {
            return Ok(None);
        }
        Ok(Some(QueryNode::new(node.op, args)))
    }

    /// EQ..GE: one field → one node, N fields → AND of N nodes
    fn translate_comparison(
        &self,
        binding: &Binding<'_>,
        node: &QueryNode,
    ) -> Result<Option<QueryNode>, TranslateError> {
        let (Some(property), Some(literal)) = (
            node.args.first().and_then(Arg::as_node),
            node.args.get(1).and_then(Arg::as_literal),
        ) else {
            tracing::warn!(op = ?node.op, "malformed comparison dropped");
            return Ok(None);
        };

        let targets = self.targets(binding, property);
        let mut comparisons = Vec::with_capacity(targets.len());
        for target in &targets {
            let value = self.convert_literal(binding, target, literal)?;
            comparisons.push(QueryNode::new(
                node.op,
                vec![Arg::Node(target.property.clone()), Arg::Literal(value)],
            ));
        }

        Ok(match comparisons.len() {
            0 => None,
            1 => comparisons.pop(),
            n => {
                tracing::debug!(op = ?node.op, fields = n, "composite comparison fanned out under AND");
                Some(QueryNode::and(comparisons))
            }
        })
    }

    /// LIKE / CONTAINS / EXCLUDES / IN / OUT: every correlated field and its
    /// values land on the same node
    fn translate_pattern(
        &self,
        binding: &Binding<'_>,
        node: &QueryNode,
    ) -> Result<Option<QueryNode>, TranslateError> {
        let Some(property) = node.args.first().and_then(Arg::as_node) else {
            tracing::warn!(op = ?node.op, "malformed pattern operation dropped");
            return Ok(None);
        };
        let literals: Vec<&Literal> = node.args.iter().skip(1).filter_map(Arg::as_literal).collect();
        let flatten = matches!(node.op, Op::In | Op::Out);

        let targets = self.targets(binding, property);
        if targets.is_empty() {
            return Ok(None);
        }
        if targets.len() > 1 {
            tracing::debug!(op = ?node.op, fields = targets.len(), "pattern operands flattened");
        }

        let mut args = Vec::new();
        for target in &targets {
            args.push(Arg::Node(target.property.clone()));
            for literal in &literals {
                match literal {
                    Literal::Wire(WireValue::Array(items)) if flatten => {
                        for item in items {
                            let element = Literal::Wire(item.clone());
                            args.push(Arg::Literal(self.convert_literal(binding, target, &element)?));
                        }
                    }
                    literal => args.push(Arg::Literal(self.convert_literal(binding, target, literal)?)),
                }
            }
        }
        Ok(Some(QueryNode::new(node.op, args)))
    }

    /// SORT is all-or-nothing: any unresolvable key is a syntax error
    fn translate_sort(&self, binding: &Binding<'_>, node: &QueryNode) -> Result<QueryNode, TranslateError> {
        let mut items = Vec::with_capacity(node.args.len());
        for arg in &node.args {
            let Arg::Node(item) = arg else {
                return Err(TranslateError::Syntax("sort items must be sort properties".to_string()));
            };
            let translated = match item.op {
                Op::SortProperty => self.translate_sort_property(binding, item),
                Op::Property => self.translate_property(binding, item),
                _ => None,
            };
            let translated = translated.ok_or_else(|| {
                TranslateError::Syntax(format!("cannot sort by '{}'", sort_key_label(item)))
            })?;
            items.push(translated);
        }
        Ok(QueryNode::sort(items))
    }

    fn translate_sort_property(&self, binding: &Binding<'_>, node: &QueryNode) -> Option<QueryNode> {
        let direction = node
            .args
            .iter()
            .find_map(|arg| match arg {
                Arg::Direction(direction) => Some(*direction),
                _ => None,
            })
            .unwrap_or(SortDirection::Asc);
        let property = self.translate_property(binding, node.nodes().next()?)?;
        Some(QueryNode::new(
            Op::SortProperty,
            vec![Arg::Direction(direction), Arg::Node(property)],
        ))
    }

    /// SELECT: unmapped fields drop out of the projection
    fn translate_select(&self, binding: &Binding<'_>, node: &QueryNode) -> QueryNode {
        let fields = node
            .nodes()
            .filter_map(|child| {
                let translated = self.translate_property(binding, child);
                if translated.is_none() {
                    tracing::debug!(
                        field = child.property_name().unwrap_or_default(),
                        "dropping unmapped projection"
                    );
                }
                translated
            })
            .map(Arg::Node)
            .collect();
        QueryNode::new(Op::Select, fields)
    }

    /// PROPERTY: exactly one correlated field, sub-path carried over as-is
    fn translate_property(&self, binding: &Binding<'_>, node: &QueryNode) -> Option<QueryNode> {
        let name = node.property_name()?;
        let canonical = self.locator.resolve_canonical_name(binding.resource, name);
        let entry = binding.table.get(&canonical)?;

        match entry.sources.as_slice() {
            [source] => Some(entity_property(source, node)),
            sources => {
                tracing::debug!(
                    field = %canonical,
                    sources = sources.len(),
                    "property does not map to a single entity field"
                );
                None
            }
        }
    }

    /// COUNT / AGGREGATE / MIN / MAX / MEAN / SUM
    fn translate_container(
        &self,
        binding: &Binding<'_>,
        node: &QueryNode,
        depth: usize,
    ) -> Result<QueryNode, TranslateError> {
        let mut args = Vec::with_capacity(node.args.len());
        for arg in &node.args {
            match arg {
                Arg::Node(child) => {
                    if let Some(translated) = self.translate_node(binding, child, depth + 1)? {
                        args.push(Arg::Node(translated));
                    }
                }
                other => args.push(other.clone()),
            }
        }
        Ok(QueryNode::new(node.op, args))
    }

    /// Entity fields behind the resource field a PROPERTY node names
    fn targets<'b>(&self, binding: &'b Binding<'_>, property: &QueryNode) -> Vec<Target<'b>> {
        let segments = property.property_segments();
        let Some((name, rest)) = segments.split_first() else {
            return Vec::new();
        };
        let canonical = self.locator.resolve_canonical_name(binding.resource, name);
        let Some(entry) = binding.table.get(&canonical) else {
            tracing::debug!(field = %canonical, "no correlated entity field");
            return Vec::new();
        };

        entry
            .sources
            .iter()
            .filter_map(|source| {
                let mut path = Vec::with_capacity(segments.len());
                path.push(source.as_str());
                path.extend_from_slice(rest);

                let resolved = self
                    .locator
                    .resolve_path(self.registry, binding.entity, &path);
                if resolved.is_none() {
                    tracing::warn!(field = %source, path = ?path, "correlated field is not declared on the entity");
                }
                Some(Target {
                    entry,
                    resource_field: canonical.clone(),
                    property: entity_property(source, property),
                    field: resolved?.field,
                    nested: !rest.is_empty(),
                })
            })
            .collect()
    }

    /// Coerce a literal for one target field, materializing computed fields
    /// through the mapping provider
    fn convert_literal(
        &self,
        binding: &Binding<'_>,
        target: &Target<'_>,
        literal: &Literal,
    ) -> Result<Literal, TranslateError> {
        if target.entry.is_direct() || target.nested || literal.is_null() {
            return Ok(Literal::Typed(coerce_field(&target.field, literal)?));
        }

        let Some(resource_field) = self
            .locator
            .resolve_typed_field(binding.resource, &target.resource_field)
        else {
            return Ok(Literal::Typed(coerce_field(&target.field, literal)?));
        };

        let resource_value = coerce_field(&resource_field, literal)?;
        let instance = Record::from([(resource_field.name.clone(), resource_value)]);
        let materialized = match self.mapping.materialize(
            &binding.resource.name,
            &binding.entity.name,
            &instance,
        ) {
            Ok(record) => record,
            Err(MappingError::NoMapping { .. }) => {
                tracing::debug!(field = %resource_field.name, "no reverse mapping, coercing directly");
                return Ok(Literal::Typed(coerce_field(&target.field, literal)?));
            }
            Err(e) => return Err(e.into()),
        };

        match materialized.get(&target.field.name) {
            Some(value) if !value.is_null() => Ok(Literal::Typed(coerce_field(
                &target.field,
                &Literal::Typed(value.clone()),
            )?)),
            _ => Ok(Literal::Typed(coerce_field(&target.field, literal)?)),
        }
    }
}

/// PROPERTY naming `field`, keeping the original node's sub-path
fn entity_property(field: &str, original: &QueryNode) -> QueryNode {
    let mut property = QueryNode::property(field);
    if let Some(sub_path) = original.sub_path() {
        property.args.push(Arg::Node(sub_path.clone()));
    }
    property
}

fn sort_key_label(item: &QueryNode) -> String {
    let property = if item.op == Op::Property {
        Some(item)
    } else {
        item.nodes().next()
    };
    property
        .map(|p| p.property_segments().join("."))
        .filter(|label| !label.is_empty())
        .unwrap_or_else(|| format!("{:?}", item.op))
}

#[cfg(test)]
mod tests {
    use super::*;
    use resq_ast::Value;
    use resq_mapping::{ExprMapping, MapExpr, TypeMap};
    use resq_schema::{DataType, FieldDef, InMemoryRegistry};

    fn fixture() -> (InMemoryRegistry, ExprMapping) {
        let mut registry = InMemoryRegistry::new();
        registry.add_schema(Schema::new(
            "Res",
            vec![
                FieldDef::new("Id", DataType::Int64),
                FieldDef::new("Tag", DataType::String),
            ],
        ));
        registry.add_schema(Schema::new(
            "Ent",
            vec![
                FieldDef::new("Key", DataType::Int64),
                FieldDef::new("Label", DataType::String),
            ],
        ));
        registry.bind("Res", "Ent").unwrap();

        let mut mapping = ExprMapping::new();
        mapping.add(TypeMap {
            resource: "Res".to_string(),
            entity: "Ent".to_string(),
            forward: MapExpr::block(vec![
                MapExpr::assign("Res", "Id", MapExpr::field("Ent", "Key")),
                MapExpr::assign("Res", "Tag", MapExpr::field("Ent", "Label")),
            ]),
            reverse: None,
        });
        (registry, mapping)
    }

    #[test]
    fn test_translate_single_comparison() {
        let (registry, mapping) = fixture();
        let translator = SchemaTranslator::new(&registry, &mapping);

        let query = QueryNode::compare(Op::Eq, "id", Literal::wire_str("42"));
        let translated = translator.translate(&query, "Res").unwrap();

        assert_eq!(
            translated,
            QueryNode::compare(Op::Eq, "Key", Literal::Typed(Value::I64(42)))
        );
    }

    #[test]
    fn test_unknown_root_becomes_noop() {
        let (registry, mapping) = fixture();
        let translator = SchemaTranslator::new(&registry, &mapping);

        let query = QueryNode::compare(Op::Eq, "Missing", Literal::wire_str("x"));
        assert_eq!(translator.translate(&query, "Res").unwrap(), QueryNode::noop());
    }

    #[test]
    fn test_logical_drops_untranslatable_children() {
        let (registry, mapping) = fixture();
        let translator = SchemaTranslator::new(&registry, &mapping);

        let query = QueryNode::or(vec![
            QueryNode::compare(Op::Eq, "Missing", Literal::wire_str("x")),
            QueryNode::compare(Op::Ne, "tag", Literal::wire_str("y")),
        ]);
        let translated = translator.translate(&query, "Res").unwrap();
        assert_eq!(
            translated,
            QueryNode::or(vec![QueryNode::compare(
                Op::Ne,
                "Label",
                Literal::Typed(Value::from("y"))
            )])
        );
    }

    #[test]
    fn test_pass_through_tags() {
        let (registry, mapping) = fixture();
        let translator = SchemaTranslator::new(&registry, &mapping);

        let limit = QueryNode::limit(10);
        assert_eq!(translator.translate(&limit, "Res").unwrap(), limit);
        let distinct = QueryNode::new(Op::Distinct, vec![]);
        assert_eq!(translator.translate(&distinct, "Res").unwrap(), distinct);
    }

    #[test]
    fn test_cached_tables_are_reused() {
        let (registry, mapping) = fixture();
        let config = TranslatorConfig {
            cache_correlations: true,
            ..TranslatorConfig::default()
        };
        let translator = SchemaTranslator::with_config(&registry, &mapping, config);

        let first = translator.correlations("Res").unwrap();
        let second = translator.correlations("Res").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(translator.cache().len(), 1);
    }

    #[test]
    fn test_sort_key_label() {
        let item = QueryNode::sort_property(SortDirection::Desc, "Name");
        assert_eq!(sort_key_label(&item), "Name");
    }
}
