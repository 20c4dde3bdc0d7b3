//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use crate::config::schema::{Environment, LogFormat, ShieldConfig};
use crate::config::validation::{validate_config, ConfigIssue};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { variable: &'static str, value: String },
    Validation(Vec<ConfigIssue>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { variable, value } => {
                write!(f, "Invalid value {:?} for {}", value, variable)
            }
            ConfigError::Validation(issues) => {
                write!(f, "Validation failed: ")?;
                for (i, issue) in issues.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", issue)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load a TOML file, overlay the process environment, then validate.
pub fn load_config(path: &Path) -> Result<ShieldConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let mut config: ShieldConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;

    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Defaults plus the process environment, validated.
pub fn from_env() -> Result<ShieldConfig, ConfigError> {
    let mut config = ShieldConfig::default();

    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment variables read through `lookup`.
///
/// Empty values are treated as unset. `RATE_LIMIT_MAX` sets the budget of the
/// environment in effect after `APP_ENV` is applied.
pub fn apply_env_overrides<F>(config: &mut ShieldConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(raw) = get("APP_ENV") {
        config.environment = Environment::parse(&raw).ok_or(ConfigError::Env {
            variable: "APP_ENV",
            value: raw,
        })?;
    }

    let host = get("HOST");
    let port = get("PORT");
    if host.is_some() || port.is_some() {
        let (default_host, default_port) = config
            .listener
            .bind_address
            .rsplit_once(':')
            .map(|(h, p)| (h.to_string(), p.to_string()))
            .unwrap_or_else(|| ("0.0.0.0".to_string(), "3000".to_string()));
        let port = match port {
            Some(raw) => parse_number::<u16>("PORT", raw)?.to_string(),
            None => default_port,
        };
        config.listener.bind_address = format!("{}:{}", host.unwrap_or(default_host), port);
    }

    if let Some(raw) = get("ALLOWED_ORIGINS") {
        config.cors.extra_origins = split_list(&raw);
    }
    if let Some(domain) = get("CUSTOM_DOMAIN") {
        config.cors.custom_domain = Some(domain.trim().to_string());
    }

    if let Some(secret) = get("SESSION_SECRET") {
        config.session.secret = secret;
    }
    if let Some(raw) = get("SESSION_MAX_AGE") {
        config.session.max_age_secs = parse_number("SESSION_MAX_AGE", raw)?;
    }

    if let Some(raw) = get("RATE_LIMIT_WINDOW") {
        config.rate_limit.window_ms = parse_number("RATE_LIMIT_WINDOW", raw)?;
    }
    if let Some(raw) = get("RATE_LIMIT_MAX") {
        let max = parse_number("RATE_LIMIT_MAX", raw)?;
        if config.environment.is_production() {
            config.rate_limit.max_requests = max;
        } else {
            config.rate_limit.dev_max_requests = max;
        }
    }

    if let Some(level) = get("LOG_LEVEL") {
        config.observability.log_level = level;
    }
    if let Some(raw) = get("LOG_FORMAT") {
        config.observability.log_format = match raw.trim().to_ascii_lowercase().as_str() {
            "json" => Some(LogFormat::Json),
            "pretty" => Some(LogFormat::Pretty),
            _ => {
                return Err(ConfigError::Env {
                    variable: "LOG_FORMAT",
                    value: raw,
                })
            }
        };
    }

    Ok(())
}

fn parse_number<T: std::str::FromStr>(variable: &'static str, raw: String) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::Env { variable, value: raw })
}

/// Comma-separated list with blank entries dropped.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_env_overlay() {
        let mut config = ShieldConfig::default();
        apply_env_overrides(
            &mut config,
            lookup(&[
                ("APP_ENV", "production"),
                ("PORT", "8088"),
                ("ALLOWED_ORIGINS", "https://a.example, ,https://b.example,"),
                ("CUSTOM_DOMAIN", "shop.example"),
                ("SESSION_SECRET", "s3cr3t"),
                ("RATE_LIMIT_WINDOW", "60000"),
                ("RATE_LIMIT_MAX", "50"),
            ]),
        )
        .unwrap();

        assert!(config.environment.is_production());
        assert_eq!(config.listener.bind_address, "0.0.0.0:8088");
        assert_eq!(config.cors.extra_origins, vec!["https://a.example", "https://b.example"]);
        assert_eq!(config.cors.custom_domain.as_deref(), Some("shop.example"));
        assert_eq!(config.session.secret, "s3cr3t");
        assert_eq!(config.rate_limit.window_ms, 60_000);
        assert_eq!(config.rate_limit.max_requests, 50);
        assert_eq!(config.rate_limit.dev_max_requests, 1000);
    }

    #[test]
    fn test_rate_limit_max_targets_dev_budget_outside_production() {
        let mut config = ShieldConfig::default();
        apply_env_overrides(&mut config, lookup(&[("RATE_LIMIT_MAX", "5000")])).unwrap();
        assert_eq!(config.rate_limit.dev_max_requests, 5000);
        assert_eq!(config.rate_limit.max_requests, 100);
    }

    #[test]
    fn test_bad_env_values() {
        let mut config = ShieldConfig::default();
        let err = apply_env_overrides(&mut config, lookup(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::Env { variable: "PORT", .. }));

        let err = apply_env_overrides(&mut config, lookup(&[("APP_ENV", "staging")])).unwrap_err();
        assert!(matches!(err, ConfigError::Env { variable: "APP_ENV", .. }));
    }

    #[test]
    fn test_toml_defaults_fill_missing_sections() {
        let config: ShieldConfig = toml::from_str(
            r#"
            environment = "test"

            [rate_limit]
            window_ms = 1000
            max_requests = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.environment, Environment::Test);
        assert_eq!(config.rate_limit.window_ms, 1000);
        assert_eq!(config.rate_limit.api_prefix, "/api");
        assert_eq!(config.cors.max_age_secs, 86_400);
    }
}
