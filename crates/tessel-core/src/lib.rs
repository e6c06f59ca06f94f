//! Core functionality for the Tessel GPU layer
//!
//! This crate carries the ambient pieces shared by every Tessel crate:
//! error context, logging setup and configuration loading.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{from_ron_str, load_ron_file, LoggingConfig};
pub use error::{CoreError, ErrorContext, Result};
pub use logging::{LogCategory, LogLevel};

/// Framework version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize logging with the given configuration
pub fn init(config: &LoggingConfig) -> Result<()> {
    logging::init(config)?;
    tracing::info!(target: "tessel::config", "Tessel core v{} initialized", VERSION);
    Ok(())
}
