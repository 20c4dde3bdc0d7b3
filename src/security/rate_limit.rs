//! Fixed-window rate limiting.
//!
//! # Responsibilities
//! - Count requests per client key within a fixed window
//! - Emit `X-RateLimit-*` headers on every API response
//! - Reject with 429 once a key exceeds its budget
//!
//! # Design Decisions
//! - Storage sits behind [`RateLimitStore`] so tests build isolated tables
//!   and a shared store can replace the in-memory one
//! - Each key's read-modify-write runs under its DashMap shard lock
//! - Expired records are swept only when the table outgrows its threshold

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, HeaderName, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::{Environment, RateLimitConfig};
use crate::error::{format_reset, ShieldError};
use crate::observability::metrics;
use crate::security::path_has_prefix;

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

const RATE_LIMIT_MESSAGE: &str = "Too many requests, please try again later.";

/// Counter state for one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateRecord {
    pub count: u64,
    pub reset_time: DateTime<Utc>,
}

/// Key-value storage for rate records.
pub trait RateLimitStore: Send + Sync {
    /// Count one request for `key` and return the updated record.
    ///
    /// A missing record starts at `{count: 0, reset_time: now + window}`; a
    /// record whose window has passed is reset in place before counting.
    fn hit(&self, key: &str, now: DateTime<Utc>, window: Duration) -> RateRecord;

    /// Drop records whose window ended before `now`. Returns how many went.
    fn sweep_expired(&self, now: DateTime<Utc>) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-local store.
pub struct MemoryStore {
    records: DashMap<String, RateRecord>,
    sweep_threshold: usize,
}

impl MemoryStore {
    pub fn new(sweep_threshold: usize) -> Self {
        Self {
            records: DashMap::new(),
            sweep_threshold,
        }
    }

    pub fn get(&self, key: &str) -> Option<RateRecord> {
        self.records.get(key).map(|r| *r)
    }
}

impl RateLimitStore for MemoryStore {
    fn hit(&self, key: &str, now: DateTime<Utc>, window: Duration) -> RateRecord {
        let record = {
            let mut entry = self.records.entry(key.to_string()).or_insert_with(|| RateRecord {
                count: 0,
                reset_time: now + window,
            });
            if now > entry.reset_time {
                entry.count = 0;
                entry.reset_time = now + window;
            }
            entry.count += 1;
            *entry
        };

        // The shard guard must be released before len() walks every shard.
        if self.records.len() > self.sweep_threshold {
            let removed = self.sweep_expired(now);
            tracing::debug!(removed, remaining = self.records.len(), "Swept rate limit table");
            metrics::record_rate_limit_keys(self.records.len());
        }

        record
    }

    fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let before = self.records.len();
        self.records.retain(|_, record| now <= record.reset_time);
        before.saturating_sub(self.records.len())
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}

/// Outcome of one rate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub limit: u64,
    pub remaining: u64,
    pub reset: DateTime<Utc>,
}

impl RateDecision {
    pub fn apply_headers(&self, headers: &mut HeaderMap) {
        headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(self.limit));
        headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(self.remaining));
        if let Ok(reset) = HeaderValue::from_str(&format_reset(&self.reset)) {
            headers.insert(X_RATELIMIT_RESET, reset);
        }
    }

    pub fn into_error(self) -> ShieldError {
        ShieldError::RateLimited {
            message: RATE_LIMIT_MESSAGE.to_string(),
            limit: self.limit,
            reset: self.reset,
        }
    }
}

/// Fixed-window limiter over an injectable store.
#[derive(Clone)]
pub struct FixedWindowLimiter {
    store: Arc<dyn RateLimitStore>,
    window: Duration,
    max: u64,
}

impl FixedWindowLimiter {
    pub fn new(store: Arc<dyn RateLimitStore>, window: Duration, max: u64) -> Self {
        Self { store, window, max }
    }

    /// Limiter with an in-memory store, budget picked for `environment`.
    pub fn from_config(config: &RateLimitConfig, environment: Environment) -> Self {
        Self::new(
            Arc::new(MemoryStore::new(config.sweep_threshold)),
            Duration::milliseconds(config.window_ms as i64),
            config.max_for(environment),
        )
    }

    pub fn check(&self, key: &str) -> RateDecision {
        self.check_at(key, Utc::now())
    }

    pub fn check_at(&self, key: &str, now: DateTime<Utc>) -> RateDecision {
        let record = self.store.hit(key, now, self.window);
        RateDecision {
            allowed: record.count <= self.max,
            limit: self.max,
            remaining: self.max.saturating_sub(record.count),
            reset: record.reset_time,
        }
    }

    pub fn limit(&self) -> u64 {
        self.max
    }

    pub fn store(&self) -> &Arc<dyn RateLimitStore> {
        &self.store
    }
}

/// Middleware state: the limiter plus the path scope it guards.
#[derive(Clone)]
pub struct RateLimitState {
    pub limiter: FixedWindowLimiter,
    pub api_prefix: String,
}

impl RateLimitState {
    pub fn new(limiter: FixedWindowLimiter, api_prefix: impl Into<String>) -> Self {
        Self {
            limiter,
            api_prefix: api_prefix.into(),
        }
    }
}

/// Rate-limit key: peer IP, then the first `X-Forwarded-For` hop, then `"unknown"`.
pub fn client_key(request: &Request<Body>) -> String {
    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn rate_limit_middleware(
    State(state): State<Arc<RateLimitState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !path_has_prefix(request.uri().path(), &state.api_prefix) {
        return next.run(request).await;
    }

    let key = client_key(&request);
    let decision = state.limiter.check(&key);

    let mut response = if decision.allowed {
        next.run(request).await
    } else {
        tracing::warn!(client = %key, limit = decision.limit, "Rate limit exceeded");
        metrics::record_rate_limited();
        decision.into_error().into_response()
    };
    decision.apply_headers(response.headers_mut());
    response
}
