//! Field-level validation failure.
//!
//! Every validator in [`crate::validation::rules`] fails with the same shape so
//! that the error boundary can render byte-identical rejections regardless of
//! which handler invoked it.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// Result alias used by every field validator.
pub type FieldResult<T> = Result<T, ValidationFailure>;

/// A single violated field rule.
///
/// Built at the point of failure and never mutated afterwards: fields are
/// private and the builder methods consume `self`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationFailure {
    field: String,
    #[serde(skip)]
    message: String,
    received: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    rule: Option<String>,
    #[serde(flatten)]
    context: Map<String, Value>,
}

impl ValidationFailure {
    pub fn new(field: impl Into<String>, message: impl Into<String>, received: Value) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            received,
            rule: None,
            context: Map::new(),
        }
    }

    /// Attach the violated rule.
    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rule = Some(rule.into());
        self
    }

    /// Attach an extra context entry such as `minimum` or `examples`.
    pub fn with_context(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.context.insert(key.to_string(), value.into());
        self
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn received(&self) -> &Value {
        &self.received
    }

    pub fn rule(&self) -> Option<&str> {
        self.rule.as_deref()
    }

    /// Look up an extra context entry.
    pub fn context(&self, key: &str) -> Option<&Value> {
        self.context.get(key)
    }

    /// Structured details for the rejection body.
    pub fn details(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationFailure {}

/// JavaScript-style type name of a loosely typed value, used as `received`
/// when a type check fails.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
