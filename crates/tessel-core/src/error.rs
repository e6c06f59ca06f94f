//! Error types shared by the Tessel crates

use std::collections::BTreeMap;
use thiserror::Error;

/// Context information for errors to aid in debugging
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// Operation that was being performed when the error occurred
    pub operation: String,
    /// Component or module where the error occurred
    pub component: String,
    /// Additional contextual data
    pub metadata: BTreeMap<String, String>,
}

impl ErrorContext {
    /// Create a new error context
    pub fn new(operation: impl Into<String>, component: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            component: component.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Add metadata to the context
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Format context for logging
    pub fn format_for_log(&self) -> String {
        let mut parts = vec![
            format!("operation={}", self.operation),
            format!("component={}", self.component),
        ];

        if !self.metadata.is_empty() {
            let metadata_str = self
                .metadata
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join(", ");
            parts.push(format!("metadata=[{}]", metadata_str));
        }

        parts.join(", ")
    }
}

/// Errors raised while bringing up configuration and logging
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        context: Option<ErrorContext>,
    },

    #[error("Initialization error: {message}")]
    Initialization {
        message: String,
        context: Option<ErrorContext>,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Create a configuration error from a string
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Self::Configuration {
            message: msg.into(),
            context: None,
        }
    }

    /// Create a configuration error with context
    pub fn configuration_with_context<S: Into<String>>(msg: S, context: ErrorContext) -> Self {
        Self::Configuration {
            message: msg.into(),
            context: Some(context),
        }
    }

    /// Create an initialization error from a string
    pub fn initialization<S: Into<String>>(msg: S) -> Self {
        Self::Initialization {
            message: msg.into(),
            context: None,
        }
    }

    /// Get the error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Self::Configuration { context, .. } | Self::Initialization { context, .. } => {
                context.as_ref()
            }
            Self::Parse(_) | Self::Io(_) => None,
        }
    }

    /// Format error with context for logging
    pub fn format_for_log(&self) -> String {
        let base_msg = self.to_string();
        if let Some(context) = self.context() {
            format!("{} [{}]", base_msg, context.format_for_log())
        } else {
            base_msg
        }
    }
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_formatting() {
        let context = ErrorContext::new("load", "config")
            .with_metadata("path", "tessel.ron")
            .with_metadata("line", "3");

        assert_eq!(
            context.format_for_log(),
            "operation=load, component=config, metadata=[line=3, path=tessel.ron]"
        );
    }

    #[test]
    fn test_error_with_context_for_log() {
        let err = CoreError::configuration_with_context(
            "sample_count must be 1 or 4",
            ErrorContext::new("validate", "gpu"),
        );
        assert_eq!(
            err.format_for_log(),
            "Configuration error: sample_count must be 1 or 4 [operation=validate, component=gpu]"
        );

        let plain = CoreError::initialization("subscriber");
        assert!(plain.context().is_none());
        assert_eq!(plain.format_for_log(), "Initialization error: subscriber");
    }
}
