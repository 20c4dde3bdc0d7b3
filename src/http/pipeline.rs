//! Ordered stage registration.
//!
//! # Responsibilities
//! - Hold the stage list in request order (outermost first)
//! - Check ordering preconditions before anything is wired
//! - Turn each stage into its layer over an application router
//!
//! # Preconditions
//! - `RequestTracing`, when present, is first so every span carries the request id
//! - `BaselineHeaders` precedes `HardeningHeaders`; hardening values win
//! - Header stages precede every gate so rejections are decorated too
//! - `Session` precedes `Sanitize`, which reads the body
//! - `Sanitize` is last: it runs as a route layer, after path params resolve
//!
//! # Design Decisions
//! - Layers are applied in reverse so the first registered stage is outermost
//! - Shared state (allow-list, header set, limiter, gate) is built once per build

use axum::{http::header::InvalidHeaderValue, middleware, Router};
use chrono::Duration;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::ShieldConfig;
use crate::security::{
    headers::{baseline_headers, hardening_headers, layer_if_not_present, layer_overriding},
    origin::{origin_middleware, OriginPolicy},
    rate_limit::{rate_limit_middleware, FixedWindowLimiter, RateLimitState, RateLimitStore},
    sanitize::{sanitize_middleware, SanitizeState},
};
use crate::session::{session_middleware, SessionGate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    RequestTracing,
    BaselineHeaders,
    HardeningHeaders,
    OriginGate,
    RateLimit,
    Session,
    Sanitize,
}

impl Stage {
    /// Full chain, outermost first.
    pub const STANDARD: [Stage; 7] = [
        Stage::RequestTracing,
        Stage::BaselineHeaders,
        Stage::HardeningHeaders,
        Stage::OriginGate,
        Stage::RateLimit,
        Stage::Session,
        Stage::Sanitize,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::RequestTracing => "request_tracing",
            Stage::BaselineHeaders => "baseline_headers",
            Stage::HardeningHeaders => "hardening_headers",
            Stage::OriginGate => "origin_gate",
            Stage::RateLimit => "rate_limit",
            Stage::Session => "session",
            Stage::Sanitize => "sanitize",
        }
    }

    pub fn is_decoration(self) -> bool {
        matches!(self, Stage::BaselineHeaders | Stage::HardeningHeaders)
    }

    /// Stages that can end a request with a rejection.
    pub fn is_gate(self) -> bool {
        matches!(
            self,
            Stage::OriginGate | Stage::RateLimit | Stage::Session | Stage::Sanitize
        )
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("stage {0} registered twice")]
    Duplicate(Stage),

    #[error("stage {stage} must be registered before {before}")]
    OutOfOrder { stage: Stage, before: Stage },

    #[error("stage {0} must be registered first")]
    NotFirst(Stage),

    #[error("stage {0} must be registered last")]
    NotLast(Stage),

    #[error("invalid header value in {stage}: {source}")]
    InvalidHeader {
        stage: Stage,
        #[source]
        source: InvalidHeaderValue,
    },
}

/// Builds the guarded router from an ordered stage list.
pub struct PipelineBuilder {
    config: Arc<ShieldConfig>,
    stages: Vec<Stage>,
    store: Option<Arc<dyn RateLimitStore>>,
}

impl PipelineBuilder {
    pub fn new(config: Arc<ShieldConfig>) -> Self {
        Self {
            config,
            stages: Vec::new(),
            store: None,
        }
    }

    /// Builder preloaded with [`Stage::STANDARD`].
    pub fn standard(config: Arc<ShieldConfig>) -> Self {
        let mut builder = Self::new(config);
        builder.stages.extend(Stage::STANDARD);
        builder
    }

    pub fn stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    /// Use `store` for rate records instead of a fresh in-memory table.
    pub fn rate_limit_store(mut self, store: Arc<dyn RateLimitStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    fn position(&self, stage: Stage) -> Option<usize> {
        self.stages.iter().position(|s| *s == stage)
    }

    fn require_before(&self, stage: Stage, before: Stage) -> Result<(), PipelineError> {
        match (self.position(stage), self.position(before)) {
            (Some(a), Some(b)) if a > b => Err(PipelineError::OutOfOrder { stage, before }),
            _ => Ok(()),
        }
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        for (i, stage) in self.stages.iter().enumerate() {
            if self.stages[..i].contains(stage) {
                return Err(PipelineError::Duplicate(*stage));
            }
        }

        if self.position(Stage::RequestTracing).is_some_and(|p| p != 0) {
            return Err(PipelineError::NotFirst(Stage::RequestTracing));
        }
        if self
            .position(Stage::Sanitize)
            .is_some_and(|p| p + 1 != self.stages.len())
        {
            return Err(PipelineError::NotLast(Stage::Sanitize));
        }

        self.require_before(Stage::BaselineHeaders, Stage::HardeningHeaders)?;
        self.require_before(Stage::Session, Stage::Sanitize)?;
        for decoration in self.stages.iter().copied().filter(|s| s.is_decoration()) {
            for gate in self.stages.iter().copied().filter(|s| s.is_gate()) {
                self.require_before(decoration, gate)?;
            }
        }

        Ok(())
    }

    /// Wrap `routes` in the registered stages.
    ///
    /// # Panics
    ///
    /// With [`Stage::Sanitize`] registered, `routes` must already contain at
    /// least one route (axum refuses a route layer on an empty router).
    pub fn build(self, routes: Router) -> Result<Router, PipelineError> {
        self.validate()?;
        let config = &self.config;
        let mut router = routes;

        for stage in self.stages.iter().rev().copied() {
            router = match stage {
                Stage::Sanitize => router.route_layer(middleware::from_fn_with_state(
                    Arc::new(SanitizeState {
                        max_body_size: config.security.max_body_size,
                    }),
                    sanitize_middleware,
                )),
                Stage::Session => router.layer(middleware::from_fn_with_state(
                    Arc::new(SessionGate::from_config(config)),
                    session_middleware,
                )),
                Stage::RateLimit if !config.rate_limit.enabled => {
                    tracing::info!("Rate limiting disabled by configuration");
                    router
                }
                Stage::RateLimit => {
                    let limiter = match &self.store {
                        Some(store) => FixedWindowLimiter::new(
                            store.clone(),
                            Duration::milliseconds(config.rate_limit.window_ms as i64),
                            config.rate_limit.max_for(config.environment),
                        ),
                        None => FixedWindowLimiter::from_config(&config.rate_limit, config.environment),
                    };
                    let state = RateLimitState::new(limiter, config.rate_limit.api_prefix.clone());
                    router.layer(middleware::from_fn_with_state(Arc::new(state), rate_limit_middleware))
                }
                Stage::OriginGate => {
                    let policy = OriginPolicy::from_config(&config.cors)
                        .map_err(|source| PipelineError::InvalidHeader { stage, source })?;
                    tracing::debug!(origins = policy.allow_list().len(), "Origin allow-list built");
                    router.layer(middleware::from_fn_with_state(Arc::new(policy), origin_middleware))
                }
                Stage::HardeningHeaders => {
                    let headers = hardening_headers(&config.security)
                        .map_err(|source| PipelineError::InvalidHeader { stage, source })?;
                    layer_overriding(router, headers)
                }
                Stage::BaselineHeaders => layer_if_not_present(router, baseline_headers()),
                Stage::RequestTracing => router
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TraceLayer::new_for_http())
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid)),
            };
            tracing::debug!(stage = %stage, "Pipeline stage installed");
        }

        Ok(router)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder(stages: &[Stage]) -> PipelineBuilder {
        stages
            .iter()
            .fold(PipelineBuilder::new(Arc::new(ShieldConfig::default())), |b, s| b.stage(*s))
    }

    #[test]
    fn test_standard_order_is_valid() {
        let builder = PipelineBuilder::standard(Arc::new(ShieldConfig::default()));
        assert_eq!(builder.stages(), &Stage::STANDARD);
        assert!(builder.validate().is_ok());
    }

    #[test]
    fn test_sanitize_before_session_rejected() {
        let err = builder(&[Stage::Sanitize, Stage::Session]).validate().unwrap_err();
        assert!(matches!(err, PipelineError::NotLast(Stage::Sanitize)));

        let err = builder(&[Stage::Session, Stage::RateLimit, Stage::Sanitize, Stage::OriginGate])
            .validate()
            .unwrap_err();
        assert!(matches!(err, PipelineError::NotLast(Stage::Sanitize)));
    }

    #[test]
    fn test_hardening_must_follow_baseline() {
        let err = builder(&[Stage::HardeningHeaders, Stage::BaselineHeaders])
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::OutOfOrder {
                stage: Stage::BaselineHeaders,
                before: Stage::HardeningHeaders
            }
        ));
    }

    #[test]
    fn test_headers_must_wrap_gates() {
        let err = builder(&[Stage::OriginGate, Stage::HardeningHeaders])
            .validate()
            .unwrap_err();
        assert!(matches!(err, PipelineError::OutOfOrder { before: Stage::OriginGate, .. }));
    }

    #[test]
    fn test_duplicates_and_tracing_position() {
        let err = builder(&[Stage::OriginGate, Stage::OriginGate]).validate().unwrap_err();
        assert!(matches!(err, PipelineError::Duplicate(Stage::OriginGate)));

        let err = builder(&[Stage::OriginGate, Stage::RequestTracing]).validate().unwrap_err();
        assert!(matches!(err, PipelineError::NotFirst(Stage::RequestTracing)));
    }

    #[test]
    fn test_partial_chains_are_allowed() {
        assert!(builder(&[]).validate().is_ok());
        assert!(builder(&[Stage::HardeningHeaders, Stage::RateLimit]).validate().is_ok());
        assert!(builder(&[Stage::Sanitize]).validate().is_ok());
    }
}
