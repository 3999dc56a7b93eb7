//! Structured logging setup.
//!
//! Installs a `tracing-subscriber` formatter driven by [`LoggingConfig`]. The
//! `RUST_LOG` environment variable wins over the configured level when present.

use crate::config::LoggingConfig;
use crate::error::{constants, QueryError, Result};
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// Calling this more than once is harmless: later calls fail to install and
/// return `QueryError::Config`, which callers that only want "logging on" may
/// ignore.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str().to_lowercase()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = if config.json_format {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| QueryError::Config(format!("{}: {e}", constants::ERR_LOGGING_INIT)))?;

    tracing::info!(app = %config.app_name, "Logging initialized");
    Ok(())
}
