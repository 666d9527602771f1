//! Stderr logging for pipeline runs.
//!
//! Snapshots are the only thing written to disk, so every event goes to
//! stderr and stdout stays free for the per-run summary lines.

use crate::config::TelemetryConfig;
use std::error::Error;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("invalid SCALES_LOG_LEVEL filter '{directives}': {source}")]
    Filter {
        directives: String,
        source: ParseError,
    },
    #[error("could not install the log subscriber: {0}")]
    Install(#[source] Box<dyn Error + Send + Sync>),
}

/// Filter for a run: `RUST_LOG` when it parses, the configured level
/// otherwise.
pub fn run_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => level_filter(&config.log_level),
    }
}

/// Parse `SCALES_LOG_LEVEL`-style directives such as `info` or
/// `scales=debug,warn`.
pub fn level_filter(directives: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(directives.trim()).map_err(|source| TelemetryError::Filter {
        directives: directives.to_string(),
        source,
    })
}

/// Install the process-wide subscriber. Call once, before the first run.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = run_filter(config)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::Install)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_levels_and_per_target_directives() {
        assert!(level_filter("info").is_ok());
        assert!(level_filter(" scales=debug,warn ").is_ok());
    }

    #[test]
    fn rejects_unknown_levels_and_names_the_directive() {
        let err = level_filter("scales=chatty").expect_err("unknown level");
        assert!(matches!(err, TelemetryError::Filter { .. }));
        assert!(err.to_string().contains("'scales=chatty'"));
    }
}
