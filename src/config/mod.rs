//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, overlay environment)
//!     → validation.rs (semantic checks)
//!     → ShieldConfig (validated, immutable)
//!     → shared via Arc to all pipeline stages
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the allow-list and header set derive from it once
//! - All fields have defaults to allow minimal configs
//! - Environment variables override file values
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{apply_env_overrides, from_env, load_config, ConfigError};
pub use schema::{
    CorsConfig, Environment, ListenerConfig, LogFormat, ObservabilityConfig, RateLimitConfig,
    SecurityConfig, SessionConfig, ShieldConfig, TimeoutConfig,
};
pub use validation::{validate_config, ConfigIssue};
