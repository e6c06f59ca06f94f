//! Logging setup for the Tessel crates
//!
//! Library code logs through `tracing` with one target per [`LogCategory`].
//! Applications call [`init`] once to install a formatting subscriber whose
//! filter is assembled from a [`LoggingConfig`].

use crate::config::LoggingConfig;
use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

/// Log levels supported by the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Convert LogLevel to string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(CoreError::configuration(format!(
                "unknown log level '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Log categories for organizing log messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogCategory {
    Gpu,
    Buffer,
    Texture,
    Pass,
    Config,
}

impl LogCategory {
    pub const ALL: [LogCategory; 5] = [
        LogCategory::Gpu,
        LogCategory::Buffer,
        LogCategory::Texture,
        LogCategory::Pass,
        LogCategory::Config,
    ];

    /// Short category name as used in configuration files
    pub fn as_str(&self) -> &'static str {
        match self {
            LogCategory::Gpu => "gpu",
            LogCategory::Buffer => "buffer",
            LogCategory::Texture => "texture",
            LogCategory::Pass => "pass",
            LogCategory::Config => "config",
        }
    }

    /// `tracing` target used by events of this category
    pub fn target(&self) -> &'static str {
        match self {
            LogCategory::Gpu => "tessel::gpu",
            LogCategory::Buffer => "tessel::buffer",
            LogCategory::Texture => "tessel::texture",
            LogCategory::Pass => "tessel::pass",
            LogCategory::Config => "tessel::config",
        }
    }

    fn from_name(name: &str) -> Option<LogCategory> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

impl std::fmt::Display for LogCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Build the filter directive string for a logging configuration.
///
/// Category names in `category_levels` are validated; unknown names or levels
/// are configuration errors.
pub fn filter_directives(config: &LoggingConfig) -> Result<String> {
    let mut directives = vec![config.default_level.as_str().to_string()];

    for (name, level) in &config.category_levels {
        let category = LogCategory::from_name(name).ok_or_else(|| {
            CoreError::configuration(format!("unknown log category '{}'", name))
        })?;
        let level = LogLevel::from_str(level)?;
        directives.push(format!("{}={}", category.target(), level));
    }

    Ok(directives.join(","))
}

/// Initialize the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over the configured levels when it is set.
/// Calling this more than once leaves the first subscriber in place.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(filter_directives(config)?)
            .map_err(|e| CoreError::initialization(format!("invalid log filter: {}", e)))?,
    };

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(config.ansi)
        .with_target(true)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(target: "tessel::config", "logging initialized");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(LogLevel::from_str("info").ok(), Some(LogLevel::Info));
        assert_eq!(LogLevel::from_str("INFO").ok(), Some(LogLevel::Info));
        assert!(LogLevel::from_str("invalid").is_err());

        assert_eq!(LogLevel::Info.as_str(), "info");
        assert_eq!(LogLevel::Error.as_str(), "error");
    }

    #[test]
    fn test_filter_directives() {
        let mut category_levels = BTreeMap::new();
        category_levels.insert("texture".to_string(), "debug".to_string());
        category_levels.insert("pass".to_string(), "trace".to_string());

        let config = LoggingConfig {
            default_level: LogLevel::Warn,
            category_levels,
            ansi: false,
        };

        assert_eq!(
            filter_directives(&config).unwrap(),
            "warn,tessel::pass=trace,tessel::texture=debug"
        );
    }

    #[test]
    fn test_unknown_category_rejected() {
        let mut category_levels = BTreeMap::new();
        category_levels.insert("audio".to_string(), "debug".to_string());

        let config = LoggingConfig {
            category_levels,
            ..LoggingConfig::default()
        };
        assert!(filter_directives(&config).is_err());
    }

    #[test]
    fn test_init_twice_is_ok() {
        let config = LoggingConfig::default();
        assert!(init(&config).is_ok());
        assert!(init(&config).is_ok());
    }
}
