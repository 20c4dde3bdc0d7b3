//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → headers.rs (baseline + hardening response headers)
//!     → origin.rs (allow-list gate, CORS headers, preflight)
//!     → rate_limit.rs (fixed window per client key, API paths only)
//!     → [session gate]
//!     → sanitize.rs (key rejection, body escaping)
//!     → Pass to handlers
//! ```
//!
//! # Design Decisions
//! - Defense in depth: multiple layers of protection
//! - Fail closed: reject on any security check failure
//! - No trust in client input
//! - Allow-list and header set are built once and shared read-only

pub mod headers;
pub mod origin;
pub mod rate_limit;
pub mod sanitize;

pub use origin::{OriginAllowList, OriginDecision, OriginPolicy};
pub use rate_limit::{FixedWindowLimiter, MemoryStore, RateDecision, RateLimitStore, RateRecord};
pub use sanitize::RequestEnvelope;

/// Segment-aware prefix match: `/api` covers `/api` and `/api/x`, not `/apix`.
pub fn path_has_prefix(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_has_prefix() {
        assert!(path_has_prefix("/api", "/api"));
        assert!(path_has_prefix("/api/orders/1", "/api"));
        assert!(path_has_prefix("/api/orders", "/api/"));
        assert!(!path_has_prefix("/api-docs", "/api"));
        assert!(!path_has_prefix("/health", "/api"));
        assert!(path_has_prefix("/anything", "/"));
    }
}
