//! Tracing subscriber setup for host applications.
//!
//! The library only emits `tracing` events; installing a subscriber is the
//! host's call. This helper covers the common case.
//!
//! ```no_run
//! nutriguard_runtime::telemetry::init_tracing("info,nutriguard_runtime=debug").unwrap();
//! ```

use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Errors from installing the subscriber.
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),

    #[error("Global subscriber already set: {0}")]
    AlreadyInitialized(String),
}

/// Build the filter: `RUST_LOG` wins, `default_filter` otherwise.
pub fn env_filter(default_filter: &str) -> Result<EnvFilter, TelemetryError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(default_filter)
            .map_err(|e| TelemetryError::InvalidFilter(e.to_string())),
    }
}

/// Install a global fmt subscriber.
///
/// # Errors
///
/// Returns an error if the filter does not parse or a global subscriber has
/// already been set.
pub fn init_tracing(default_filter: &str) -> Result<(), TelemetryError> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_filter)?)
        .with_target(true)
        .try_init()
        .map_err(|e| TelemetryError::AlreadyInitialized(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails() {
        // the first call may race other tests, the second never succeeds
        let _ = init_tracing("warn");
        assert!(matches!(
            init_tracing("warn"),
            Err(TelemetryError::AlreadyInitialized(_))
        ));
    }
}
