//! Request sanitization.
//!
//! # Responsibilities
//! - Reject keys that could act as query operators or prototype paths
//! - Reject string values that carry query operators
//! - Escape markup characters in body string leaves
//! - Hand handlers a typed [`RequestEnvelope`]
//!
//! # Design Decisions
//! - Rejection covers body, path params and query; escaping covers the body only
//! - A single forbidden key or value fails the whole request; nothing is partially cleaned
//! - JSON and form bodies are checked on the parsed tree, then written back re-encoded

use axum::{
    body::{to_bytes, Body},
    extract::{FromRequestParts, RawPathParams, State},
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::{Arc, LazyLock};

use crate::error::ShieldError;

/// Keys rejected outright regardless of their characters.
pub const FORBIDDEN_KEYS: &[&str] = &["__proto__", "constructor", "prototype"];

const KEY_RULE: &str = "keys must not contain '$' or '.'";
const VALUE_RULE: &str = "values must not contain query operators";

static OPERATOR_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\$(ne|gt|gte|lt|lte|in|nin|regex|where|or|and|not|exists|type)")
        .expect("OPERATOR_VALUE: invalid regex pattern")
});

/// Sanitized request data, stored in request extensions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestEnvelope {
    /// JSON or form body with string leaves escaped; `None` for empty or other bodies.
    pub body: Option<Value>,
    pub params: Map<String, Value>,
    pub query: Map<String, Value>,
}

impl RequestEnvelope {
    /// Reject forbidden keys and operator values in every container, then escape the body.
    pub fn sanitize(
        body: Option<Value>,
        params: Map<String, Value>,
        query: Map<String, Value>,
    ) -> Result<Self, ShieldError> {
        if let Some(body) = &body {
            reject_forbidden_keys(body, "body")?;
        }
        reject_forbidden_in_map(&params, "params")?;
        reject_forbidden_in_map(&query, "query")?;

        let body = body.map(|mut value| {
            escape_strings(&mut value);
            value
        });

        Ok(Self { body, params, query })
    }
}

pub fn is_forbidden_key(key: &str) -> bool {
    key.contains('$') || key.contains('.') || FORBIDDEN_KEYS.contains(&key)
}

/// `$ne`, `$where` and the other operators, anywhere in the string, any case.
pub fn carries_operator(value: &str) -> bool {
    OPERATOR_VALUE.is_match(value)
}

/// Walk `value` and fail on the first forbidden key or operator value at any depth.
pub fn reject_forbidden_keys(value: &Value, location: &'static str) -> Result<(), ShieldError> {
    check_value(value, location, location)
}

fn check_value(value: &Value, field: &str, location: &'static str) -> Result<(), ShieldError> {
    match value {
        Value::Object(map) => reject_forbidden_in_map(map, location),
        Value::Array(items) => items
            .iter()
            .try_for_each(|item| check_value(item, field, location)),
        Value::String(s) if carries_operator(s) => Err(ShieldError::StructuralRejection {
            key: field.to_string(),
            location,
            rule: VALUE_RULE,
        }),
        _ => Ok(()),
    }
}

fn reject_forbidden_in_map(map: &Map<String, Value>, location: &'static str) -> Result<(), ShieldError> {
    for (key, value) in map {
        if is_forbidden_key(key) {
            return Err(ShieldError::StructuralRejection {
                key: key.clone(),
                location,
                rule: KEY_RULE,
            });
        }
        check_value(value, key, location)?;
    }
    Ok(())
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            other => out.push(other),
        }
    }
    out
}

/// Escape every string leaf in place. Keys are left alone.
pub fn escape_strings(value: &mut Value) {
    match value {
        Value::String(s) => *s = escape_html(s),
        Value::Array(items) => items.iter_mut().for_each(escape_strings),
        Value::Object(map) => map.values_mut().for_each(escape_strings),
        _ => {}
    }
}

/// Urlencoded pairs as a flat map; repeated keys collect into an array.
pub fn parse_form(input: &[u8]) -> Map<String, Value> {
    let mut map = Map::new();
    for (key, value) in url::form_urlencoded::parse(input) {
        let value = Value::String(value.into_owned());
        match map.get_mut(key.as_ref()) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                map.insert(key.into_owned(), value);
            }
        }
    }
    map
}

pub fn parse_query(query: &str) -> Map<String, Value> {
    parse_form(query.as_bytes())
}

/// Inverse of [`parse_form`]: arrays become repeated pairs.
pub fn encode_form(map: &Map<String, Value>) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in map {
        match value {
            Value::Array(items) => {
                for item in items {
                    serializer.append_pair(key, &form_value(item));
                }
            }
            other => {
                serializer.append_pair(key, &form_value(other));
            }
        }
    }
    serializer.finish()
}

fn form_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyFormat {
    Json,
    Form,
}

fn body_format(headers: &HeaderMap) -> Option<BodyFormat> {
    let mime = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())?
        .trim()
        .to_ascii_lowercase();

    if mime == "application/json" || mime.ends_with("+json") {
        Some(BodyFormat::Json)
    } else if mime == "application/x-www-form-urlencoded" {
        Some(BodyFormat::Form)
    } else {
        None
    }
}

#[derive(Debug, Clone)]
pub struct SanitizeState {
    pub max_body_size: usize,
}

/// Sanitization stage. Must run as a route layer so path params are resolved.
pub async fn sanitize_middleware(
    State(state): State<Arc<SanitizeState>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ShieldError> {
    let (mut parts, body) = request.into_parts();

    let params: Map<String, Value> = match RawPathParams::from_request_parts(&mut parts, &()).await {
        Ok(raw) => raw
            .iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect(),
        Err(_) => Map::new(),
    };
    let query = parts.uri.query().map(parse_query).unwrap_or_default();

    let bytes = to_bytes(body, state.max_body_size)
        .await
        .map_err(|_| ShieldError::PayloadTooLarge {
            limit: state.max_body_size,
        })?;

    let format = if bytes.is_empty() {
        None
    } else {
        body_format(&parts.headers)
    };
    let parsed = match format {
        Some(BodyFormat::Json) => Some(
            serde_json::from_slice::<Value>(&bytes)
                .map_err(|e| ShieldError::BadRequest(format!("Malformed JSON body: {e}")))?,
        ),
        Some(BodyFormat::Form) => Some(Value::Object(parse_form(&bytes))),
        None => None,
    };

    let envelope = RequestEnvelope::sanitize(parsed, params, query)?;

    let body = match (&envelope.body, format) {
        (Some(Value::Object(map)), Some(BodyFormat::Form)) => {
            parts.headers.remove(header::CONTENT_LENGTH);
            Body::from(encode_form(map))
        }
        (Some(value), _) => {
            let encoded = serde_json::to_vec(value).map_err(|e| ShieldError::Internal(e.to_string()))?;
            parts.headers.remove(header::CONTENT_LENGTH);
            Body::from(encoded)
        }
        (None, _) => Body::from(bytes),
    };

    let mut request = Request::from_parts(parts, body);
    request.extensions_mut().insert(envelope);
    Ok(next.run(request).await)
}
