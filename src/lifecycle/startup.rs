//! Startup orchestration.
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently

use std::net::SocketAddr;
use std::path::Path;
use tokio::net::TcpListener;

use crate::config::{self, ConfigError, ShieldConfig};
use crate::observability::{logging, metrics};

/// Load the config file when given, otherwise defaults plus environment.
pub fn load(path: Option<&Path>) -> Result<ShieldConfig, ConfigError> {
    match path {
        Some(path) => config::load_config(path),
        None => config::from_env(),
    }
}

/// Logging first, then the optional metrics exporter.
pub fn init_observability(config: &ShieldConfig) {
    logging::init(&config.observability, config.environment);

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }
}

pub async fn bind(config: &ShieldConfig) -> std::io::Result<TcpListener> {
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");
    Ok(listener)
}
