//! Origin policy gate.
//!
//! # Responsibilities
//! - Build the allow-list once from config
//! - Reject declared origins that are not listed
//! - Answer preflight requests and decorate allowed responses
//!
//! # Design Decisions
//! - Requests without `Origin` are non-browser callers and always pass
//! - Matching is literal; no wildcard or suffix rules
//! - The gate runs for every path, public ones included

use axum::{
    body::Body,
    extract::State,
    http::{
        header::{self, InvalidHeaderValue},
        HeaderMap, HeaderValue, Method, Request, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::config::CorsConfig;
use crate::error::ShieldError;

const EXPOSED_HEADERS: &str = "X-RateLimit-Limit, X-RateLimit-Remaining, X-RateLimit-Reset";

/// Closed set of permitted origins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OriginAllowList {
    origins: BTreeSet<String>,
}

impl OriginAllowList {
    pub fn new<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let origins = origins
            .into_iter()
            .map(Into::into)
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();
        Self { origins }
    }

    /// Defaults, extra origins, then `https://` forms of the deployment hostnames.
    pub fn from_config(config: &CorsConfig) -> Self {
        let mut origins: Vec<String> = config
            .default_origins
            .iter()
            .chain(config.extra_origins.iter())
            .cloned()
            .collect();

        if let Some(domain) = config.custom_domain.as_deref().map(str::trim) {
            if !domain.is_empty() {
                origins.push(format!("https://{domain}"));
                origins.push(format!("https://www.{domain}"));
            }
        }
        origins.extend(
            config
                .deployment_domains
                .iter()
                .map(|d| d.trim())
                .filter(|d| !d.is_empty())
                .map(|d| format!("https://{d}")),
        );

        Self::new(origins)
    }

    pub fn contains(&self, origin: &str) -> bool {
        self.origins.contains(origin)
    }

    pub fn len(&self) -> usize {
        self.origins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.origins.iter().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginDecision {
    /// No `Origin` header.
    NoOrigin,
    Allowed(HeaderValue),
    Preflight(HeaderValue),
    Rejected(String),
}

/// Allow-list plus the precomputed CORS header values.
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    allow_list: OriginAllowList,
    allow_methods: HeaderValue,
    allow_headers: HeaderValue,
    max_age: HeaderValue,
}

impl OriginPolicy {
    pub fn from_config(config: &CorsConfig) -> Result<Self, InvalidHeaderValue> {
        Ok(Self {
            allow_list: OriginAllowList::from_config(config),
            allow_methods: HeaderValue::from_str(&config.allowed_methods.join(", "))?,
            allow_headers: HeaderValue::from_str(&config.allowed_headers.join(", "))?,
            max_age: HeaderValue::from(config.max_age_secs),
        })
    }

    pub fn allow_list(&self) -> &OriginAllowList {
        &self.allow_list
    }

    pub fn decide(&self, method: &Method, headers: &HeaderMap) -> OriginDecision {
        let Some(raw) = headers.get(header::ORIGIN) else {
            return OriginDecision::NoOrigin;
        };
        let origin = match raw.to_str() {
            Ok(origin) => origin,
            Err(_) => return OriginDecision::Rejected(String::from_utf8_lossy(raw.as_bytes()).into_owned()),
        };
        if !self.allow_list.contains(origin) {
            return OriginDecision::Rejected(origin.to_string());
        }

        if *method == Method::OPTIONS && headers.contains_key(header::ACCESS_CONTROL_REQUEST_METHOD) {
            OriginDecision::Preflight(raw.clone())
        } else {
            OriginDecision::Allowed(raw.clone())
        }
    }

    fn apply_allowed(&self, origin: HeaderValue, headers: &mut HeaderMap) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );
        headers.insert(
            header::ACCESS_CONTROL_EXPOSE_HEADERS,
            HeaderValue::from_static(EXPOSED_HEADERS),
        );
        headers.append(header::VARY, HeaderValue::from_static("Origin"));
    }

    fn apply_preflight(&self, headers: &mut HeaderMap) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, self.allow_methods.clone());
        headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, self.allow_headers.clone());
        headers.insert(header::ACCESS_CONTROL_MAX_AGE, self.max_age.clone());
    }
}

pub async fn origin_middleware(
    State(policy): State<Arc<OriginPolicy>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ShieldError> {
    match policy.decide(request.method(), request.headers()) {
        OriginDecision::NoOrigin => Ok(next.run(request).await),
        OriginDecision::Allowed(origin) => {
            let mut response = next.run(request).await;
            policy.apply_allowed(origin, response.headers_mut());
            Ok(response)
        }
        OriginDecision::Preflight(origin) => {
            let mut response = StatusCode::NO_CONTENT.into_response();
            policy.apply_allowed(origin, response.headers_mut());
            policy.apply_preflight(response.headers_mut());
            Ok(response)
        }
        OriginDecision::Rejected(origin) => {
            tracing::warn!(origin = %origin, path = %request.uri().path(), "Origin not allowed");
            Err(ShieldError::OriginRejected { origin })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> OriginPolicy {
        let config = CorsConfig {
            extra_origins: vec!["https://app.example".into(), " ".into()],
            custom_domain: Some("shop.example".into()),
            deployment_domains: vec!["shield.example.net".into(), "".into()],
            ..CorsConfig::default()
        };
        OriginPolicy::from_config(&config).unwrap()
    }

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn test_allow_list_sources() {
        let policy = policy();
        let list = policy.allow_list();
        assert!(list.contains("http://localhost:3000"));
        assert!(list.contains("https://app.example"));
        assert!(list.contains("https://shop.example"));
        assert!(list.contains("https://www.shop.example"));
        assert!(list.contains("https://shield.example.net"));
        assert!(!list.contains(""));
        assert_eq!(list.len(), 8);
    }

    #[test]
    fn test_no_origin_passes() {
        assert_eq!(policy().decide(&Method::GET, &HeaderMap::new()), OriginDecision::NoOrigin);
    }

    #[test]
    fn test_unlisted_origin_rejected() {
        let decision = policy().decide(&Method::GET, &headers(&[("origin", "http://evil.example")]));
        assert_eq!(decision, OriginDecision::Rejected("http://evil.example".into()));

        // Literal match only.
        let decision = policy().decide(&Method::GET, &headers(&[("origin", "https://app.example/")]));
        assert!(matches!(decision, OriginDecision::Rejected(_)));
    }

    #[test]
    fn test_preflight_needs_request_method() {
        let plain = policy().decide(&Method::OPTIONS, &headers(&[("origin", "https://app.example")]));
        assert!(matches!(plain, OriginDecision::Allowed(_)));

        let preflight = policy().decide(
            &Method::OPTIONS,
            &headers(&[
                ("origin", "https://app.example"),
                ("access-control-request-method", "POST"),
            ]),
        );
        assert!(matches!(preflight, OriginDecision::Preflight(_)));
    }
}
