//! Tracing subscriber setup for the review service.

use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, TelemetryConfig};

/// Crates whose events follow the configured level; everything else stays at `warn`.
const SERVICE_TARGETS: [&str; 2] = ["loan_review", "loan_review_api"];

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("invalid log level/filter '{value}': unable to build EnvFilter")]
    EnvFilter {
        value: String,
        #[source]
        source: ParseError,
    },
    #[error("telemetry error: {0}")]
    Subscriber(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Filter directives for a configured level.
///
/// A bare level such as `debug` applies to the service crates only. A value that already
/// holds directives (`,` or `=`) is used as written.
pub fn filter_directives(config: &TelemetryConfig) -> String {
    let level = config.log_level.trim();
    if level.contains(',') || level.contains('=') {
        return level.to_string();
    }
    let mut directives = vec!["warn".to_string()];
    directives.extend(
        SERVICE_TARGETS
            .iter()
            .map(|target| format!("{target}={level}")),
    );
    directives.join(",")
}

fn configured_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(filter_directives(config)).map_err(|source| TelemetryError::EnvFilter {
        value: config.log_level.clone(),
        source,
    })
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level when present.
///
/// Fails with [`TelemetryError::Subscriber`] if a global subscriber is already set.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => configured_filter(config)?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_ansi(false);
    let installed = match config.log_format {
        LogFormat::Compact => builder.compact().with_target(false).try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };
    installed.map_err(TelemetryError::Subscriber)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(level: &str) -> TelemetryConfig {
        TelemetryConfig {
            log_level: level.to_string(),
            log_format: LogFormat::Compact,
        }
    }

    #[test]
    fn bare_level_is_scoped_to_service_crates() {
        assert_eq!(
            filter_directives(&config(" debug ")),
            "warn,loan_review=debug,loan_review_api=debug"
        );
    }

    #[test]
    fn explicit_directives_pass_through() {
        assert_eq!(
            filter_directives(&config("info,tower_http=debug")),
            "info,tower_http=debug"
        );
        assert_eq!(
            filter_directives(&config("loan_review=trace")),
            "loan_review=trace"
        );
    }

    #[test]
    fn unknown_level_is_reported_with_configured_value() {
        assert!(configured_filter(&config("info")).is_ok());
        match configured_filter(&config("verbose")) {
            Err(TelemetryError::EnvFilter { value, .. }) => assert_eq!(value, "verbose"),
            other => panic!("expected filter error, got {other:?}"),
        }
    }
}
