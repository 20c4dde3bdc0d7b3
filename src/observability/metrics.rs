//! Metrics collection and exposition.
//!
//! # Metrics
//! - `shield_rejections_total` (counter): rejected requests by kind
//! - `shield_rate_limited_total` (counter): requests over budget
//! - `shield_rate_limit_keys` (gauge): live keys in the rate-limit table
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - Prometheus exposition is opt-in via `observability.metrics_enabled`

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_rejection(kind: &'static str) {
    counter!("shield_rejections_total", "kind" => kind).increment(1);
}

pub fn record_rate_limited() {
    counter!("shield_rate_limited_total").increment(1);
}

pub fn record_rate_limit_keys(len: usize) {
    gauge!("shield_rate_limit_keys").set(len as f64);
}
