//! Configuration loading
//!
//! Configuration structs derive `serde` and are read from RON documents.
//! Missing fields fall back to their defaults.

use crate::error::{CoreError, ErrorContext, Result};
use crate::logging::LogLevel;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level applied to every target without an explicit override
    pub default_level: LogLevel,
    /// Per-category level overrides, e.g. `{"texture": "debug"}`
    pub category_levels: BTreeMap<String, String>,
    /// Emit ANSI colour codes
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default_level: LogLevel::Info,
            category_levels: BTreeMap::new(),
            ansi: true,
        }
    }
}

/// Parse a RON document into a configuration value
pub fn from_ron_str<T: DeserializeOwned>(source: &str) -> Result<T> {
    Ok(ron::from_str(source)?)
}

/// Read and parse a RON configuration file
pub fn load_ron_file<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path)?;
    from_ron_str(&source).map_err(|e| {
        CoreError::configuration_with_context(
            e.to_string(),
            ErrorContext::new("load", "config").with_metadata("path", path.display().to_string()),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_logging_defaults() {
        let config: LoggingConfig = from_ron_str("()").unwrap();
        assert_eq!(config, LoggingConfig::default());
    }

    #[test]
    fn test_logging_from_ron() {
        let config: LoggingConfig = from_ron_str(
            r#"(default_level: warn, category_levels: {"texture": "debug"}, ansi: false)"#,
        )
        .unwrap();

        assert_eq!(config.default_level, LogLevel::Warn);
        assert_eq!(
            config.category_levels.get("texture").map(String::as_str),
            Some("debug")
        );
        assert!(!config.ansi);
    }

    #[test]
    fn test_missing_file() {
        let result: Result<LoggingConfig> = load_ron_file("/nonexistent/tessel.ron");
        assert!(matches!(result, Err(CoreError::Io(_))));
    }
}
