//! Rejection taxonomy and the single error-reporting boundary.
//!
//! Gates and handlers return [`ShieldError`]; axum turns it into the uniform
//! JSON rejection through [`IntoResponse`]. Nothing here retries.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};
use thiserror::Error;

use crate::observability::metrics;
use crate::validation::ValidationFailure;

#[derive(Error, Debug)]
pub enum ShieldError {
    /// Field-level, user-correctable failure.
    #[error("{0}")]
    Validation(#[from] ValidationFailure),

    /// Dangerous key or operator value found during sanitization. Always terminal.
    #[error("Invalid field {key}: {rule}")]
    StructuralRejection {
        key: String,
        location: &'static str,
        rule: &'static str,
    },

    #[error("Origin {origin} not allowed by CORS")]
    OriginRejected { origin: String },

    #[error("{message}")]
    RateLimited {
        message: String,
        limit: u64,
        reset: DateTime<Utc>,
    },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payload exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("Not found: {0}")]
    NotFound(String),

    /// A validator was called incorrectly (programmer error).
    #[error("Validator misuse: {0}")]
    Misuse(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

pub type ShieldResult<T> = Result<T, ShieldError>;

impl ShieldError {
    pub fn status(&self) -> StatusCode {
        match self {
            ShieldError::Validation(_)
            | ShieldError::StructuralRejection { .. }
            | ShieldError::OriginRejected { .. }
            | ShieldError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ShieldError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ShieldError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ShieldError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ShieldError::NotFound(_) => StatusCode::NOT_FOUND,
            ShieldError::Misuse(_) | ShieldError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code, UPPER_SNAKE_CASE.
    pub fn code(&self) -> &'static str {
        match self {
            ShieldError::Validation(_) => "VALIDATION_FAILED",
            ShieldError::StructuralRejection { .. } => "INVALID_FIELD",
            ShieldError::OriginRejected { .. } => "CORS_ORIGIN_REJECTED",
            ShieldError::RateLimited { .. } => "RATE_LIMIT_EXCEEDED",
            ShieldError::Unauthorized(_) => "UNAUTHORIZED",
            ShieldError::BadRequest(_) => "BAD_REQUEST",
            ShieldError::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            ShieldError::NotFound(_) => "RESOURCE_NOT_FOUND",
            ShieldError::Misuse(_) | ShieldError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Short label used for the `error` field and the rejection metric.
    pub fn kind(&self) -> &'static str {
        match self {
            ShieldError::Validation(_) => "validation",
            ShieldError::StructuralRejection { .. } => "structural_rejection",
            ShieldError::OriginRejected { .. } => "origin_rejected",
            ShieldError::RateLimited { .. } => "rate_limited",
            ShieldError::Unauthorized(_) => "unauthorized",
            ShieldError::BadRequest(_) => "bad_request",
            ShieldError::PayloadTooLarge { .. } => "payload_too_large",
            ShieldError::NotFound(_) => "not_found",
            ShieldError::Misuse(_) => "misuse",
            ShieldError::Internal(_) => "internal",
        }
    }

    /// Structured context a client can act on. Internal kinds expose none.
    pub fn details(&self) -> Option<Value> {
        match self {
            ShieldError::Validation(failure) => Some(failure.details()),
            ShieldError::StructuralRejection { key, location, rule } => Some(json!({
                "field": key,
                "location": location,
                "rule": rule,
            })),
            ShieldError::OriginRejected { origin } => Some(json!({ "origin": origin })),
            ShieldError::RateLimited { limit, reset, .. } => Some(json!({
                "limit": limit,
                "remaining": 0,
                "reset": format_reset(reset),
            })),
            ShieldError::PayloadTooLarge { limit } => Some(json!({ "maximum": limit })),
            ShieldError::Unauthorized(_)
            | ShieldError::BadRequest(_)
            | ShieldError::NotFound(_)
            | ShieldError::Misuse(_)
            | ShieldError::Internal(_) => None,
        }
    }

    fn public_message(&self) -> String {
        match self {
            ShieldError::Misuse(_) | ShieldError::Internal(_) => {
                "An error occurred. Please try again.".to_string()
            }
            other => other.to_string(),
        }
    }
}

/// RFC 3339 with millisecond precision, as sent in `X-RateLimit-Reset`.
pub fn format_reset(reset: &DateTime<Utc>) -> String {
    reset.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl IntoResponse for ShieldError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(kind = self.kind(), error = %self, "Request failed");
        } else {
            tracing::warn!(kind = self.kind(), error = %self, "Request rejected");
        }
        metrics::record_rejection(self.kind());

        let mut body = json!({
            "success": false,
            "error": self.kind(),
            "code": self.code(),
            "message": self.public_message(),
            "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        });
        if let Some(details) = self.details() {
            body["details"] = details;
        }

        (status, Json(body)).into_response()
    }
}
