//! Request-time defense layer for axum services.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──▶ request id + trace
//!     ──▶ security headers (baseline, then hardening)
//!     ──▶ origin gate ──▶ rate limiter (API paths) ──▶ session gate
//!     ──▶ sanitizer (key rejection, body escaping)
//!     ──▶ handlers (call validation::* on their inputs)
//!
//!     Any gate failure ──▶ ShieldError ──▶ uniform JSON rejection
//! ```
//!
//! Cross-cutting: `config` (TOML + environment), `observability`
//! (tracing, metrics), `lifecycle` (startup, signals, shutdown).

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;
pub mod session;
pub mod validation;

pub use config::ShieldConfig;
pub use error::{ShieldError, ShieldResult};
pub use http::{PipelineBuilder, ShieldServer, Stage};
pub use lifecycle::Shutdown;
pub use validation::{FieldResult, ValidationFailure};
