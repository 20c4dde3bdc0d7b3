//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the shield.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ShieldConfig {
    /// Deployment environment; drives cookie security and rate budgets.
    pub environment: Environment,

    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Cross-origin allow-list settings.
    pub cors: CorsConfig,

    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Session cookie and bypass settings.
    pub session: SessionConfig,

    /// Security hardening configuration.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Production,
    #[default]
    Development,
    Test,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }

    /// Parse the `APP_ENV` spelling; unknown values are `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Some(Environment::Production),
            "development" | "dev" => Some(Environment::Development),
            "test" | "testing" => Some(Environment::Test),
            _ => None,
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Cross-origin configuration. The allow-list is the union of all origin
/// sources below.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Local development origins.
    pub default_origins: Vec<String>,

    /// Extra origins (`ALLOWED_ORIGINS`).
    pub extra_origins: Vec<String>,

    /// Custom domain (`CUSTOM_DOMAIN`); adds the https apex and www origins.
    pub custom_domain: Option<String>,

    /// Known deployment hostnames, served over https.
    pub deployment_domains: Vec<String>,

    /// Methods announced on preflight.
    pub allowed_methods: Vec<String>,

    /// Request headers announced on preflight.
    pub allowed_headers: Vec<String>,

    /// Preflight cache lifetime in seconds.
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            default_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:3000".to_string(),
                "http://127.0.0.1:5173".to_string(),
            ],
            extra_origins: Vec::new(),
            custom_domain: None,
            deployment_domains: Vec::new(),
            allowed_methods: ["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"]
                .iter()
                .map(|m| m.to_string())
                .collect(),
            allowed_headers: vec!["Content-Type".to_string(), "Authorization".to_string()],
            max_age_secs: 86_400,
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Path prefix the limiter is scoped to.
    pub api_prefix: String,

    /// Fixed window length in milliseconds.
    pub window_ms: u64,

    /// Maximum requests per window in production.
    pub max_requests: u64,

    /// Maximum requests per window outside production.
    pub dev_max_requests: u64,

    /// Key count above which expired records are swept.
    pub sweep_threshold: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_prefix: "/api".to_string(),
            window_ms: 15 * 60 * 1000,
            max_requests: 100,
            dev_max_requests: 1000,
            sweep_threshold: 10_000,
        }
    }
}

impl RateLimitConfig {
    /// Budget for the given environment.
    pub fn max_for(&self, environment: Environment) -> u64 {
        if environment.is_production() {
            self.max_requests
        } else {
            self.dev_max_requests
        }
    }
}

/// Session cookie and session-gate configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Cookie name.
    pub cookie_name: String,

    /// HMAC key for cookie signatures (`SESSION_SECRET`).
    pub secret: String,

    /// Absolute cookie lifetime in seconds, renewed on every request.
    pub max_age_secs: u64,

    /// Paths that skip session validation (segment-aware prefixes).
    pub public_prefixes: Vec<String>,

    /// Login and registration paths.
    pub auth_paths: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "shield.sid".to_string(),
            secret: String::new(),
            max_age_secs: 24 * 60 * 60,
            public_prefixes: vec![
                "/api/products".to_string(),
                "/api/occasions".to_string(),
                "/api-docs".to_string(),
                "/health".to_string(),
            ],
            auth_paths: vec![
                "/api/auth/login".to_string(),
                "/api/auth/register".to_string(),
            ],
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes buffered by the sanitization stage.
    pub max_body_size: usize,

    /// Also send the policy as `Content-Security-Policy-Report-Only`.
    /// The enforced `Content-Security-Policy` header is sent either way.
    pub csp_report_only: bool,

    /// Optional CSP `report-uri`.
    pub csp_report_uri: Option<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 10 * 1024 * 1024, // 10MB
            csp_report_only: false,
            csp_report_uri: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Output format; `None` picks json in production, pretty otherwise.
    pub log_format: Option<LogFormat>,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: None,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
