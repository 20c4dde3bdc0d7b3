//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Add the health route and JSON 404 fallback to application routes
//! - Sanitize fallback requests too; route layers never reach the fallback
//! - Wrap everything in the standard pipeline
//! - Bind server to listener with peer addresses attached
//! - Stop on the shutdown broadcast

use axum::{
    handler::Handler,
    http::{StatusCode, Uri},
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::timeout::TimeoutLayer;

use crate::config::ShieldConfig;
use crate::error::ShieldError;
use crate::http::pipeline::{PipelineBuilder, PipelineError};
use crate::security::sanitize::{sanitize_middleware, SanitizeState};

/// HTTP server running the guarded router.
pub struct ShieldServer {
    router: Router,
    config: Arc<ShieldConfig>,
}

impl ShieldServer {
    /// Guard `routes` with the standard pipeline.
    pub fn new(config: ShieldConfig, routes: Router) -> Result<Self, PipelineError> {
        let config = Arc::new(config);
        let router = Self::build_router(config.clone(), routes)?;
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn build_router(config: Arc<ShieldConfig>, routes: Router) -> Result<Router, PipelineError> {
        let timeout = Duration::from_secs(config.timeouts.request_secs);
        let sanitize = Arc::new(SanitizeState {
            max_body_size: config.security.max_body_size,
        });
        let routes = routes
            .route("/health", get(health))
            .fallback(not_found.layer(middleware::from_fn_with_state(sanitize, sanitize_middleware)))
            .layer(TimeoutLayer::new(timeout));

        PipelineBuilder::standard(config).build(routes)
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            environment = ?self.config.environment,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &ShieldConfig {
        &self.config
    }
}

async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        })),
    )
}

async fn not_found(uri: Uri) -> ShieldError {
    ShieldError::NotFound(format!("No route for {}", uri.path()))
}
