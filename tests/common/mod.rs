//! Shared utilities for integration tests.

#![allow(dead_code)]

use api_shield::config::{Environment, ShieldConfig};
use api_shield::http::echo;
use api_shield::session::SessionCookieConfig;
use api_shield::ShieldServer;
use axum::{
    body::{to_bytes, Body},
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub const SECRET: &str = "integration-secret-integration-secret";
pub const ALLOWED_ORIGIN: &str = "http://localhost:5173";

/// Test environment with a fixed session secret.
pub fn test_config() -> ShieldConfig {
    let mut config = ShieldConfig::default();
    config.environment = Environment::Test;
    config.session.secret = SECRET.to_string();
    config
}

/// Two requests per one-second window.
pub fn tight_rate_limit_config() -> ShieldConfig {
    let mut config = test_config();
    config.rate_limit.window_ms = 1000;
    config.rate_limit.dev_max_requests = 2;
    config
}

pub fn app(config: ShieldConfig) -> Router {
    ShieldServer::build_router(Arc::new(config), echo::router()).unwrap()
}

pub fn session_cookie(config: &ShieldConfig, id: &str) -> String {
    let cookie = SessionCookieConfig::from_config(&config.session, config.environment);
    format!("{}={}", cookie.name, cookie.sign(id))
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    TestResponse { status, headers, body }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn get_with(uri: &str, headers: &[(&str, &str)]) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: &str, headers: &[(&str, &str)]) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn post_form(uri: &str, body: &str, headers: &[(&str, &str)]) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}
