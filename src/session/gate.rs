//! Session presence gate.
//!
//! Decides per request whether a protected path may proceed without a
//! session. Credential verification belongs to the authorization layer
//! behind this one; the gate only refuses requests that assert nothing.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::config::ShieldConfig;
use crate::error::ShieldError;
use crate::security::path_has_prefix;
use crate::session::cookie::{SessionContext, SessionCookieConfig};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionDecision {
    /// Public read path or a path outside the API.
    PublicBypass,
    SessionPresent(SessionContext),
    /// Login or registration.
    AuthEntry,
    /// No session, but a bearer credential for the authorizer to check.
    BearerDeferred,
    Rejected,
}

impl SessionDecision {
    pub fn is_allowed(&self) -> bool {
        !matches!(self, SessionDecision::Rejected)
    }
}

#[derive(Debug, Clone)]
pub struct SessionGate {
    cookie: SessionCookieConfig,
    api_prefix: String,
    public_prefixes: Vec<String>,
    auth_paths: Vec<String>,
}

impl SessionGate {
    pub fn new(
        cookie: SessionCookieConfig,
        api_prefix: impl Into<String>,
        public_prefixes: Vec<String>,
        auth_paths: Vec<String>,
    ) -> Self {
        Self {
            cookie,
            api_prefix: api_prefix.into(),
            public_prefixes,
            auth_paths,
        }
    }

    pub fn from_config(config: &ShieldConfig) -> Self {
        Self::new(
            SessionCookieConfig::from_config(&config.session, config.environment),
            config.rate_limit.api_prefix.clone(),
            config.session.public_prefixes.clone(),
            config.session.auth_paths.clone(),
        )
    }

    pub fn cookie(&self) -> &SessionCookieConfig {
        &self.cookie
    }

    pub fn is_public(&self, path: &str) -> bool {
        !path_has_prefix(path, &self.api_prefix)
            || self.public_prefixes.iter().any(|p| path_has_prefix(path, p))
    }

    pub fn decide(&self, path: &str, headers: &HeaderMap) -> SessionDecision {
        if self.is_public(path) {
            return SessionDecision::PublicBypass;
        }
        if let Some(session) = self.cookie.session(headers) {
            return SessionDecision::SessionPresent(session);
        }
        if self.auth_paths.iter().any(|p| path_has_prefix(path, p)) {
            return SessionDecision::AuthEntry;
        }
        if has_bearer(headers) {
            return SessionDecision::BearerDeferred;
        }
        SessionDecision::Rejected
    }
}

/// `Authorization: Bearer <token>` with a non-empty token. Scheme is case-insensitive.
pub fn has_bearer(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().split_once(' '))
        .map(|(scheme, token)| scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty())
        .unwrap_or(false)
}

pub async fn session_middleware(
    State(gate): State<Arc<SessionGate>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ShieldError> {
    let path = request.uri().path().to_string();

    let session = match gate.decide(&path, request.headers()) {
        SessionDecision::Rejected => {
            return Err(ShieldError::Unauthorized(
                "Session or bearer credential required".to_string(),
            ));
        }
        SessionDecision::BearerDeferred => {
            tracing::debug!(path = %path, "Session gap, deferring to bearer authorization");
            None
        }
        SessionDecision::SessionPresent(session) => Some(session),
        // Public paths still roll a valid session forward.
        SessionDecision::PublicBypass | SessionDecision::AuthEntry => gate.cookie.session(request.headers()),
    };

    let Some(session) = session else {
        return Ok(next.run(request).await);
    };

    let value = gate.cookie.sign(&session.id);
    request.extensions_mut().insert(session);
    let mut response = next.run(request).await;

    if gate.cookie.rolling && !response.headers().contains_key(header::SET_COOKIE) {
        if let Some(cookie) = gate.cookie.set_cookie(&value) {
            response.headers_mut().append(header::SET_COOKIE, cookie);
        }
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn gate() -> SessionGate {
        let mut config = ShieldConfig::default();
        config.session.secret = "gate-test-secret-gate-test-secret".into();
        SessionGate::from_config(&config)
    }

    fn with(name: header::HeaderName, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_public_paths_bypass() {
        let gate = gate();
        let none = HeaderMap::new();
        assert_eq!(gate.decide("/api/products", &none), SessionDecision::PublicBypass);
        assert_eq!(gate.decide("/api/products/7", &none), SessionDecision::PublicBypass);
        assert_eq!(gate.decide("/api/occasions", &none), SessionDecision::PublicBypass);
        assert_eq!(gate.decide("/api-docs/index.html", &none), SessionDecision::PublicBypass);
        assert_eq!(gate.decide("/health", &none), SessionDecision::PublicBypass);
        assert_eq!(gate.decide("/", &none), SessionDecision::PublicBypass);
    }

    #[test]
    fn test_protected_path_decisions() {
        let gate = gate();
        assert_eq!(gate.decide("/api/orders", &HeaderMap::new()), SessionDecision::Rejected);
        assert_eq!(gate.decide("/api/productsx", &HeaderMap::new()), SessionDecision::Rejected);
        assert_eq!(gate.decide("/api/auth/login", &HeaderMap::new()), SessionDecision::AuthEntry);
        assert_eq!(
            gate.decide("/api/orders", &with(header::AUTHORIZATION, "Bearer abc.def")),
            SessionDecision::BearerDeferred
        );

        let cookie = format!("shield.sid={}", gate.cookie().sign("u1"));
        assert_eq!(
            gate.decide("/api/orders", &with(header::COOKIE, &cookie)),
            SessionDecision::SessionPresent(SessionContext { id: "u1".into() })
        );
    }

    #[test]
    fn test_bearer_shape() {
        assert!(has_bearer(&with(header::AUTHORIZATION, "bearer t")));
        assert!(!has_bearer(&with(header::AUTHORIZATION, "Bearer ")));
        assert!(!has_bearer(&with(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")));
        assert!(!has_bearer(&HeaderMap::new()));
    }

    #[test]
    fn test_tampered_cookie_counts_as_absent() {
        let gate = gate();
        let headers = with(header::COOKIE, "shield.sid=u1.not-a-signature");
        assert_eq!(gate.decide("/api/orders", &headers), SessionDecision::Rejected);
    }
}
