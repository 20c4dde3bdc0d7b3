//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem
//! - Configure log level at runtime
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - `RUST_LOG` wins over the configured level when set

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Environment, LogFormat, ObservabilityConfig};

/// Pick the output format: explicit config first, then the environment default.
pub fn effective_format(config: &ObservabilityConfig, environment: Environment) -> LogFormat {
    config.log_format.unwrap_or(if environment.is_production() {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    })
}

/// Default filter directive for the configured level.
pub fn default_directive(level: &str) -> String {
    format!("api_shield={level},tower_http={level}")
}

/// Install the global subscriber. Later calls are ignored.
pub fn init(config: &ObservabilityConfig, environment: Environment) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_directive(&config.log_level).into());

    let registry = tracing_subscriber::registry().with(filter);
    let result = match effective_format(config, environment) {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .try_init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    };

    if result.is_err() {
        tracing::debug!("Global subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_follows_environment() {
        let config = ObservabilityConfig::default();
        assert_eq!(effective_format(&config, Environment::Production), LogFormat::Json);
        assert_eq!(effective_format(&config, Environment::Development), LogFormat::Pretty);

        let forced = ObservabilityConfig {
            log_format: Some(LogFormat::Json),
            ..ObservabilityConfig::default()
        };
        assert_eq!(effective_format(&forced, Environment::Test), LogFormat::Json);
    }

    #[test]
    fn test_directive() {
        assert_eq!(default_directive("warn"), "api_shield=warn,tower_http=warn");
    }
}
