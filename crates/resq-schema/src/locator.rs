//! Property locator: maps wire-supplied field names onto declared fields

use serde::{Deserialize, Serialize};

use crate::{DataType, FieldDef, ResolvedField, Schema, SchemaRegistry};

/// Name matching configuration for [`PropertyLocator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorOptions {
    /// Require exact case when matching names
    pub case_sensitive: bool,
    /// Also match a field's wire alias
    pub match_aliases: bool,
}

impl Default for LocatorOptions {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            match_aliases: true,
        }
    }
}

/// A nested path resolved through `Object` fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Canonical name of every segment
    pub segments: Vec<String>,
    /// The leaf field
    pub field: ResolvedField,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PropertyLocator {
    options: LocatorOptions,
}

impl PropertyLocator {
    pub fn new(options: LocatorOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> LocatorOptions {
        self.options
    }

    /// Canonical declared name, or `name` unchanged when nothing matches
    pub fn resolve_canonical_name(&self, schema: &Schema, name: &str) -> String {
        self.find(schema, name)
            .map(|f| f.name.clone())
            .unwrap_or_else(|| name.to_string())
    }

    /// Declared field matching `name`, or `None`
    pub fn resolve_typed_field(&self, schema: &Schema, name: &str) -> Option<ResolvedField> {
        self.find(schema, name).map(ResolvedField::from)
    }

    /// Resolve a dotted path, following `Object` fields through the registry
    pub fn resolve_path<S: AsRef<str>>(
        &self,
        registry: &dyn SchemaRegistry,
        schema: &Schema,
        segments: &[S],
    ) -> Option<ResolvedPath> {
        let (last, init) = segments.split_last()?;
        let mut current = schema;
        let mut canonical = Vec::with_capacity(segments.len());

        for segment in init {
            let field = self.find(current, segment.as_ref())?;
            let DataType::Object(ref nested) = field.data_type else {
                tracing::trace!(field = %field.name, "path continues past a scalar field");
                return None;
            };
            canonical.push(field.name.clone());
            current = registry.schema(nested)?;
        }

        let leaf = self.find(current, last.as_ref())?;
        canonical.push(leaf.name.clone());
        Some(ResolvedPath {
            segments: canonical,
            field: ResolvedField::from(leaf),
        })
    }

    fn find<'s>(&self, schema: &'s Schema, name: &str) -> Option<&'s FieldDef> {
        // Exact matches win over folded ones
        if let Some(field) = schema
            .fields
            .iter()
            .find(|f| f.name == name || self.alias(f) == Some(name))
        {
            return Some(field);
        }
        if self.options.case_sensitive {
            return None;
        }
        schema.fields.iter().find(|f| {
            fold_eq(&f.name, name) || self.alias(f).is_some_and(|alias| fold_eq(alias, name))
        })
    }

    fn alias<'s>(&self, field: &'s FieldDef) -> Option<&'s str> {
        if self.options.match_aliases {
            field.alias.as_deref()
        } else {
            None
        }
    }
}

fn fold_eq(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryRegistry;

    fn user_schema() -> Schema {
        Schema::new(
            "User",
            vec![
                FieldDef::new("FirstName", DataType::String),
                FieldDef::new("Email", DataType::String).with_alias("email_address"),
                FieldDef::new("Address", DataType::Object("Address".to_string())),
            ],
        )
    }

    #[test]
    fn test_case_insensitive_by_default() {
        let locator = PropertyLocator::default();
        let schema = user_schema();

        assert_eq!(locator.resolve_canonical_name(&schema, "firstname"), "FirstName");
        assert_eq!(locator.resolve_canonical_name(&schema, "EMAIL_ADDRESS"), "Email");
        assert_eq!(
            locator.resolve_typed_field(&schema, "FIRSTNAME").map(|f| f.name),
            Some("FirstName".to_string())
        );
    }

    #[test]
    fn test_canonical_name_falls_back_to_input() {
        let locator = PropertyLocator::default();
        let schema = user_schema();

        assert_eq!(locator.resolve_canonical_name(&schema, "Missing"), "Missing");
        assert!(locator.resolve_typed_field(&schema, "Missing").is_none());
    }

    #[test]
    fn test_case_sensitive_and_alias_options() {
        let schema = user_schema();
        let strict = PropertyLocator::new(LocatorOptions {
            case_sensitive: true,
            match_aliases: false,
        });

        assert!(strict.resolve_typed_field(&schema, "firstname").is_none());
        assert!(strict.resolve_typed_field(&schema, "email_address").is_none());
        assert!(strict.resolve_typed_field(&schema, "Email").is_some());
    }

    #[test]
    fn test_resolve_nested_path() {
        let mut registry = InMemoryRegistry::new();
        registry.add_schema(user_schema());
        registry.add_schema(Schema::new(
            "Address",
            vec![FieldDef::new("City", DataType::String).nullable()],
        ));
        let locator = PropertyLocator::default();
        let user = registry.schema("User").unwrap();

        let path = locator.resolve_path(&registry, user, &["address", "city"]).unwrap();
        assert_eq!(path.segments, vec!["Address", "City"]);
        assert!(path.field.nullable);

        assert!(locator.resolve_path(&registry, user, &["firstname", "city"]).is_none());
    }
}
