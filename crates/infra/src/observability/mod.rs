//! Tracing subscriber setup
//!
//! `RUST_LOG` wins when set; otherwise `LoggingConfig::level` is the filter.
//! JSON output flattens event fields for log shippers.

use solace_domain::{LoggingConfig, Result, SolaceError};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Build the filter: `RUST_LOG` if set, else the configured level
///
/// # Errors
/// Returns `SolaceError::Config` if the configured directive is invalid.
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level)
        .map_err(|e| SolaceError::Config(format!("Invalid log level '{}': {e}", config.level)))
}

/// Install the global subscriber
///
/// Returns `false` when a subscriber was already installed (tests, embedding
/// hosts); that is not an error.
///
/// # Errors
/// Returns `SolaceError::Config` if the log level directive is invalid.
pub fn init_tracing(config: &LoggingConfig) -> Result<bool> {
    let filter = env_filter(config)?;
    let json_layer =
        config.json.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!config.json).then(tracing_subscriber::fmt::layer);

    let installed =
        tracing_subscriber::registry().with(filter).with(json_layer).with(text_layer).try_init().is_ok();
    if installed {
        tracing::debug!(level = %config.level, json = config.json, "Tracing initialised");
    }
    Ok(installed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_level_is_a_config_error() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let config = LoggingConfig { level: "solace=loud".into(), json: false };
        assert!(matches!(env_filter(&config), Err(SolaceError::Config(_))));
    }

    #[test]
    fn second_init_reports_existing_subscriber() {
        let config = LoggingConfig::default();
        let first = init_tracing(&config).unwrap();
        let second = init_tracing(&config).unwrap();
        assert!(!(first && second));
        assert!(!second);
    }
}
