//! Security response headers.
//!
//! # Responsibilities
//! - Baseline protective headers, only where the handler set none
//! - Hardening headers that always override the baseline
//!
//! # Design Decisions
//! - Pure decoration: neither set ever rejects a request
//! - Both sets wrap the gates so rejections carry them too
//! - Values are validated once at startup

use axum::http::{
    header::{self, InvalidHeaderValue},
    HeaderName, HeaderValue,
};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::SecurityConfig;

pub const X_XSS_PROTECTION: HeaderName = HeaderName::from_static("x-xss-protection");
pub const X_DOWNLOAD_OPTIONS: HeaderName = HeaderName::from_static("x-download-options");
pub const PERMISSIONS_POLICY: HeaderName = HeaderName::from_static("permissions-policy");
pub const CROSS_ORIGIN_RESOURCE_POLICY: HeaderName =
    HeaderName::from_static("cross-origin-resource-policy");

const CSP_DIRECTIVES: &[&str] = &[
    "default-src 'self'",
    "script-src 'self'",
    "style-src 'self'",
    "font-src 'self'",
    "connect-src 'self'",
    "img-src 'self' data: https:",
    "object-src 'none'",
    "frame-src 'none'",
    "frame-ancestors 'none'",
    "base-uri 'self'",
];

const PERMISSIONS: &str = "geolocation=(), microphone=(), camera=(), payment=(), usb=(), \
magnetometer=(), gyroscope=(), accelerometer=()";

pub type HeaderSet = Vec<(HeaderName, HeaderValue)>;

pub fn content_security_policy(report_uri: Option<&str>) -> String {
    let mut policy = CSP_DIRECTIVES.join("; ");
    if let Some(uri) = report_uri {
        policy.push_str("; report-uri ");
        policy.push_str(uri);
    }
    policy
}

/// General defaults, applied only when absent.
pub fn baseline_headers() -> HeaderSet {
    vec![
        (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
        (header::X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN")),
        (header::REFERRER_POLICY, HeaderValue::from_static("no-referrer")),
        (X_DOWNLOAD_OPTIONS, HeaderValue::from_static("noopen")),
        (header::X_DNS_PREFETCH_CONTROL, HeaderValue::from_static("off")),
        (CROSS_ORIGIN_RESOURCE_POLICY, HeaderValue::from_static("cross-origin")),
    ]
}

/// Strict set that replaces whatever is already there.
///
/// `Content-Security-Policy` is always enforced. Report-only mode adds a
/// `Content-Security-Policy-Report-Only` copy alongside it.
pub fn hardening_headers(config: &SecurityConfig) -> Result<HeaderSet, InvalidHeaderValue> {
    let csp = HeaderValue::from_str(&content_security_policy(config.csp_report_uri.as_deref()))?;

    let mut set = vec![
        (header::CONTENT_SECURITY_POLICY, csp.clone()),
        (header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY")),
        (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
        (X_XSS_PROTECTION, HeaderValue::from_static("1; mode=block")),
        (
            header::REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ),
        (PERMISSIONS_POLICY, HeaderValue::from_static(PERMISSIONS)),
    ];
    if config.csp_report_only {
        set.push((header::CONTENT_SECURITY_POLICY_REPORT_ONLY, csp));
    }
    Ok(set)
}

pub fn layer_if_not_present(mut router: Router, headers: HeaderSet) -> Router {
    for (name, value) in headers {
        router = router.layer(SetResponseHeaderLayer::if_not_present(name, value));
    }
    router
}

pub fn layer_overriding(mut router: Router, headers: HeaderSet) -> Router {
    for (name, value) in headers {
        router = router.layer(SetResponseHeaderLayer::overriding(name, value));
    }
    router
}
