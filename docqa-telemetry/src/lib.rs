//! # docqa-telemetry
//!
//! Installs the global `tracing` subscriber for docqa binaries.
//!
//! Filtering follows `RUST_LOG` when it is set and valid, and a caller
//! supplied default directive otherwise. Output goes to stderr so that
//! command output on stdout stays machine readable.
//!
//! ```rust,ignore
//! docqa_telemetry::init_telemetry("info")?;
//! tracing::info!(chunk_count = 12, "document indexed");
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the filter directives.
pub const LOG_ENV: &str = "RUST_LOG";

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid log filter '{directive}': {message}")]
    InvalidFilter { directive: String, message: String },

    #[error("a global tracing subscriber is already installed")]
    AlreadyInitialized,

    #[error("unknown log format '{0}' (expected 'text' or 'json')")]
    UnknownFormat(String),
}

/// Line format of emitted log records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable, one line per event.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" | "plain" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(TelemetryError::UnknownFormat(other.to_string())),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Text => f.write_str("text"),
            LogFormat::Json => f.write_str("json"),
        }
    }
}

/// Build the filter from an explicit `RUST_LOG` value.
///
/// An absent or unparsable `env_value` falls back to `default_directive`.
pub fn build_filter(
    env_value: Option<&str>,
    default_directive: &str,
) -> Result<EnvFilter, TelemetryError> {
    if let Some(filter) = env_value.and_then(|value| EnvFilter::try_new(value).ok()) {
        return Ok(filter);
    }
    EnvFilter::try_new(default_directive).map_err(|e| TelemetryError::InvalidFilter {
        directive: default_directive.to_string(),
        message: e.to_string(),
    })
}

/// Install a text subscriber.
///
/// # Errors
///
/// Fails if `default_directive` does not parse or a subscriber is already
/// installed.
pub fn init_telemetry(default_directive: &str) -> Result<(), TelemetryError> {
    init_with_format(LogFormat::Text, default_directive)
}

/// Install a JSON subscriber, one object per event.
///
/// # Errors
///
/// Same as [`init_telemetry`].
pub fn init_json_telemetry(default_directive: &str) -> Result<(), TelemetryError> {
    init_with_format(LogFormat::Json, default_directive)
}

/// Install a subscriber with the given line format.
///
/// # Errors
///
/// Same as [`init_telemetry`].
pub fn init_with_format(format: LogFormat, default_directive: &str) -> Result<(), TelemetryError> {
    let env_value = std::env::var(LOG_ENV).ok();
    let filter = build_filter(env_value.as_deref(), default_directive)?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    let installed = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|_| TelemetryError::AlreadyInitialized)?;

    tracing::debug!(%format, "telemetry initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_log_format() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!(" Text ".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!(matches!("xml".parse::<LogFormat>(), Err(TelemetryError::UnknownFormat(_))));
        assert_eq!(serde_json::to_string(&LogFormat::Json).unwrap(), "\"json\"");
    }

    #[test]
    fn env_value_takes_precedence() {
        let filter = build_filter(Some("docqa_rag=debug"), "warn").unwrap();
        assert_eq!(filter.to_string(), "docqa_rag=debug");
    }

    #[test]
    fn invalid_env_value_falls_back_to_default() {
        let filter = build_filter(Some("docqa_rag=loud"), "info").unwrap();
        assert_eq!(filter.to_string(), "info");
        let filter = build_filter(None, "warn").unwrap();
        assert_eq!(filter.to_string(), "warn");
    }

    #[test]
    fn invalid_default_is_an_error() {
        assert!(matches!(
            build_filter(None, "docqa_rag=loud"),
            Err(TelemetryError::InvalidFilter { .. })
        ));
    }

    #[test]
    fn second_init_reports_already_initialized() {
        let _ = init_telemetry("warn");
        assert!(matches!(init_json_telemetry("warn"), Err(TelemetryError::AlreadyInitialized)));
    }
}
