//! Pagination parameter validation.

use serde_json::{Map, Value};

use crate::validation::failure::{FieldResult, ValidationFailure};
use crate::validation::rules::{coerce_number, number_value};

/// Largest page size a caller may request.
pub const MAX_LIMIT: f64 = 100.0;

/// Validate `limit` and `offset` in place and return the same map.
///
/// Only keys that are present are coerced and written back; a missing key is
/// never filled in, so "absent" stays distinguishable from `0`.
pub fn validate_pagination(mut params: Map<String, Value>) -> FieldResult<Map<String, Value>> {
    if let Some(raw) = params.get("limit") {
        let limit = coerce_number(raw)
            .filter(|n| !n.is_nan() && (0.0..=MAX_LIMIT).contains(n))
            .ok_or_else(|| {
                ValidationFailure::new("limit", "Limit must be a number between 0 and 100", raw.clone())
                    .with_rule("0 <= limit <= 100")
                    .with_context("minimum", 0)
                    .with_context("maximum", 100)
            })?;
        params.insert("limit".to_string(), number_value(limit));
    }

    if let Some(raw) = params.get("offset") {
        let offset = coerce_number(raw)
            .filter(|n| n.is_finite() && *n >= 0.0)
            .ok_or_else(|| {
                ValidationFailure::new("offset", "Offset must be a non-negative number", raw.clone())
                    .with_rule("offset >= 0")
                    .with_context("minimum", 0)
            })?;
        params.insert("offset".to_string(), number_value(offset));
    }

    Ok(params)
}

/// Typed view over a validated pagination map.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pagination {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl Pagination {
    /// Validate `params` and read the coerced values, truncating fractions.
    pub fn from_params(params: Map<String, Value>) -> FieldResult<Self> {
        let params = validate_pagination(params)?;
        let read = |key: &str| params.get(key).and_then(Value::as_f64).map(|n| n as u64);
        Ok(Self {
            limit: read("limit"),
            offset: read("offset"),
        })
    }
}
