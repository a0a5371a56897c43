use resq_schema::LocatorOptions;
use serde::{Deserialize, Serialize};

/// Default bound on query and transformation graph nesting
pub const DEFAULT_MAX_DEPTH: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    pub locator: LocatorOptions,
    pub max_depth: usize,
    /// Reuse correlation tables across calls for the same schema pair
    pub cache_correlations: bool,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            locator: LocatorOptions::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            cache_correlations: false,
        }
    }
}
