//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (window > 0, budgets > 0, ports valid)
//! - Check origins are bare `scheme://host[:port]` values
//! - Require a strong session secret in production
//!
//! # Design Decisions
//! - Returns all issues, not just the first
//! - Pure function: ShieldConfig → Result<(), Vec<ConfigIssue>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;
use url::Url;

use crate::config::schema::ShieldConfig;

/// Minimum secret length accepted in production.
pub const MIN_SECRET_LEN: usize = 32;

/// One semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub field: String,
    pub message: String,
}

impl ConfigIssue {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &ShieldConfig) -> Result<(), Vec<ConfigIssue>> {
    let mut issues = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        issues.push(ConfigIssue::new(
            "listener.bind_address",
            format!("{:?} is not a socket address", config.listener.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        issues.push(ConfigIssue::new("timeouts.request_secs", "must be greater than 0"));
    }

    let origins = config
        .cors
        .default_origins
        .iter()
        .chain(config.cors.extra_origins.iter());
    for origin in origins {
        if !is_bare_origin(origin) {
            issues.push(ConfigIssue::new(
                "cors.origins",
                format!("{origin:?} must look like scheme://host[:port]"),
            ));
        }
    }
    for domain in config.cors.custom_domain.iter().chain(config.cors.deployment_domains.iter()) {
        if domain.contains("://") || domain.contains('/') || domain.is_empty() {
            issues.push(ConfigIssue::new(
                "cors.domains",
                format!("{domain:?} must be a bare hostname"),
            ));
        }
    }

    let rl = &config.rate_limit;
    if rl.window_ms < 1000 {
        issues.push(ConfigIssue::new("rate_limit.window_ms", "must be at least 1000"));
    }
    if rl.max_requests == 0 || rl.dev_max_requests == 0 {
        issues.push(ConfigIssue::new("rate_limit.max_requests", "must be greater than 0"));
    }
    if rl.sweep_threshold == 0 {
        issues.push(ConfigIssue::new("rate_limit.sweep_threshold", "must be greater than 0"));
    }
    if !rl.api_prefix.starts_with('/') {
        issues.push(ConfigIssue::new("rate_limit.api_prefix", "must start with '/'"));
    }

    let session = &config.session;
    if session.cookie_name.is_empty()
        || !session
            .cookie_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        issues.push(ConfigIssue::new(
            "session.cookie_name",
            "must be non-empty and use only [A-Za-z0-9._-]",
        ));
    }
    if session.max_age_secs < 60 {
        issues.push(ConfigIssue::new("session.max_age_secs", "must be at least 60"));
    }
    if config.environment.is_production() && session.secret.len() < MIN_SECRET_LEN {
        issues.push(ConfigIssue::new(
            "session.secret",
            format!("SESSION_SECRET of at least {MIN_SECRET_LEN} bytes is required in production"),
        ));
    }
    for path in session.public_prefixes.iter().chain(session.auth_paths.iter()) {
        if !path.starts_with('/') {
            issues.push(ConfigIssue::new("session.paths", format!("{path:?} must start with '/'")));
        }
    }

    if let Some(uri) = &config.security.csp_report_uri {
        if Url::parse(uri).is_err() && !uri.starts_with('/') {
            issues.push(ConfigIssue::new("security.csp_report_uri", "must be a URL or absolute path"));
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

fn is_bare_origin(origin: &str) -> bool {
    match Url::parse(origin) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url.origin().ascii_serialization() == origin
        }
        Err(_) => false,
    }
}
