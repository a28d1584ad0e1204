//! Logging setup for binaries and tests embedding tilemerge.
//!
//! The library only emits `tracing` events; nothing is printed unless a
//! subscriber is installed. [`init_logging`] installs a formatted stderr
//! subscriber filtered by `RUST_LOG`, falling back to the given default.

use std::io;

use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Errors from logging setup.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The default filter directive could not be parsed.
    #[error("Invalid log filter '{filter}': {reason}")]
    InvalidFilter { filter: String, reason: String },

    /// A global subscriber is already installed.
    #[error("Logging already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Install a global stderr subscriber.
///
/// `RUST_LOG` takes precedence; `default_filter` (e.g. `"tilemerge=debug"`)
/// applies when it is unset or invalid.
///
/// # Errors
///
/// Returns [`LoggingError::InvalidFilter`] for an unparseable default filter
/// and [`LoggingError::AlreadyInitialized`] if a subscriber already exists.
pub fn init_logging(default_filter: &str) -> Result<(), LoggingError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter).map_err(|e| LoggingError::InvalidFilter {
            filter: default_filter.to_string(),
            reason: e.to_string(),
        })?,
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .try_init()
        .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))
}
