//! Configuration for the resq command line tool
//!
//! Loads configuration from `resq.yaml` (locator, translation and logging
//! settings). Every field has a default, so the file and each of its
//! sections are optional.
//!
//! Environment variables always override file values.

use resq_schema::LocatorOptions;
use resq_translate::{TranslatorConfig, DEFAULT_MAX_DEPTH};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// File picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "resq.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid value '{value}' for environment variable {name}")]
    InvalidEnvVar { name: &'static str, value: String },
}

/// Translation limits and caching
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// Maximum query / transformation graph nesting
    pub max_depth: usize,

    /// Keep correlation tables between translations
    pub cache_correlations: bool,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            cache_correlations: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or module-specific
    pub level: String,

    /// Output format: pretty, json, compact
    pub format: String,

    /// Output destination: stderr, stdout, file, both
    pub output: String,

    /// Directory for log files
    pub directory: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: "compact".to_string(),
            output: "stderr".to_string(),
            directory: "./logs".to_string(),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub locator: LocatorOptions,
    pub translation: TranslationConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from YAML file with environment variable overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&contents)?;
        config.apply_env()?;
        Ok(config)
    }

    /// Load `path`, or `resq.yaml` when present, or fall back to defaults
    pub fn discover(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            return Self::load(DEFAULT_CONFIG_FILE);
        }
        let mut config = Config::default();
        config.apply_env()?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = env_flag("RESQ_CASE_SENSITIVE")? {
            self.locator.case_sensitive = value;
        }
        if let Some(value) = env_flag("RESQ_MATCH_ALIASES")? {
            self.locator.match_aliases = value;
        }
        if let Ok(value) = std::env::var("RESQ_MAX_DEPTH") {
            self.translation.max_depth =
                value.parse().map_err(|_| ConfigError::InvalidEnvVar {
                    name: "RESQ_MAX_DEPTH",
                    value,
                })?;
        }
        if let Some(value) = env_flag("RESQ_CACHE_CORRELATIONS")? {
            self.translation.cache_correlations = value;
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("LOG_FORMAT") {
            self.logging.format = format;
        }
        if let Ok(output) = std::env::var("LOG_OUTPUT") {
            self.logging.output = output;
        }
        if let Ok(dir) = std::env::var("LOG_DIR") {
            self.logging.directory = dir;
        }
        Ok(())
    }

    pub fn translator_config(&self) -> TranslatorConfig {
        TranslatorConfig {
            locator: self.locator,
            max_depth: self.translation.max_depth,
            cache_correlations: self.translation.cache_correlations,
        }
    }

    /// Set logging environment variables for the logging module
    pub fn apply_logging_env(&self) {
        std::env::set_var("RUST_LOG", &self.logging.level);
        std::env::set_var("LOG_FORMAT", &self.logging.format);
        std::env::set_var("LOG_OUTPUT", &self.logging.output);
        std::env::set_var("LOG_DIR", &self.logging.directory);
    }
}

fn env_flag(name: &'static str) -> Result<Option<bool>, ConfigError> {
    let Ok(value) = std::env::var(name) else {
        return Ok(None);
    };
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(ConfigError::InvalidEnvVar { name, value }),
    }
}

/// Serializes tests that touch process environment variables
#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn env_guard() -> std::sync::MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner())
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(!config.locator.case_sensitive);
        assert!(config.locator.match_aliases);
        assert_eq!(config.translation.max_depth, DEFAULT_MAX_DEPTH);
        assert!(config.translation.cache_correlations);
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.output, "stderr");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let _guard = env_guard();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "locator:\n  case_sensitive: true\n").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert!(config.locator.case_sensitive);
        assert!(config.locator.match_aliases);

        let translator = config.translator_config();
        assert!(translator.locator.case_sensitive);
        assert_eq!(translator.max_depth, config.translation.max_depth);
    }

    #[test]
    fn test_env_var_override() {
        let _guard = env_guard();
        std::env::set_var("RESQ_MAX_DEPTH", "12");
        std::env::set_var("RESQ_MATCH_ALIASES", "off");

        let config_yaml = r#"
locator:
  case_sensitive: false
  match_aliases: true
translation:
  max_depth: 64
  cache_correlations: false
logging:
  level: "info"
  format: "pretty"
  output: "stdout"
  directory: "./logs"
"#;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(config_yaml.as_bytes()).unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.translation.max_depth, 12); // Overridden
        assert!(!config.locator.match_aliases); // Overridden
        assert!(!config.translation.cache_correlations);

        std::env::remove_var("RESQ_MAX_DEPTH");
        std::env::remove_var("RESQ_MATCH_ALIASES");
    }

    #[test]
    fn test_invalid_env_flag() {
        let _guard = env_guard();
        std::env::set_var("RESQ_CACHE_CORRELATIONS", "sometimes");
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "translation: {{}}").unwrap();

        let result = Config::load(file.path());
        std::env::remove_var("RESQ_CACHE_CORRELATIONS");
        assert!(matches!(
            result,
            Err(ConfigError::InvalidEnvVar { name: "RESQ_CACHE_CORRELATIONS", .. })
        ));
    }
}
