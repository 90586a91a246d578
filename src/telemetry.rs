//! Tracing subscriber setup for the server binary.
//!
//! `RUST_LOG` wins when set; otherwise the level from `engine.yaml` applies.

use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::ParseError;

/// Errors raised while installing the global subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The configured level could not be parsed as a filter directive.
    #[error("invalid log level/filter '{value}': unable to build EnvFilter")]
    EnvFilter {
        /// The rejected directive.
        value: String,
        /// The underlying parse error.
        #[source]
        source: ParseError,
    },

    /// A global subscriber was already installed.
    #[error("telemetry error: {0}")]
    Subscriber(Box<dyn std::error::Error + Send + Sync>),
}

/// Builds the filter: `RUST_LOG` if it parses, else `default_level`.
pub fn env_filter(default_level: &str) -> Result<EnvFilter, TelemetryError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(default_level).map_err(|source| TelemetryError::EnvFilter {
            value: default_level.to_string(),
            source,
        }),
    }
}

/// Installs a compact fmt subscriber as the global default.
pub fn init(default_level: &str) -> Result<(), TelemetryError> {
    let filter = env_filter(default_level)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}
