//! Query translation from resource schemas to entity schemas
//!
//! [`SchemaTranslator`] rewrites a query tree node by node. Field names are
//! resolved through a [`CorrelationTable`] derived from the mapping
//! provider's transformation graph, and literals are coerced to the exact
//! entity field types.

mod cache;
mod config;
mod correlation;
mod error;
mod translator;

pub use cache::CorrelationCache;
pub use config::{TranslatorConfig, DEFAULT_MAX_DEPTH};
pub use correlation::{CorrelationAnalyzer, CorrelationEntry, CorrelationTable};
pub use error::TranslateError;
pub use translator::SchemaTranslator;
