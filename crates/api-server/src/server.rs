//! API server — assembles the HTTP router and serves the lead-capture and
//! operational endpoints.

use crate::crm::CrmClient;
use crate::rest::{self, AppState};
use axum::routing::{get, post};
use axum::Router;
use efh_core::config::AppConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// HTTP server for the site's API surface.
pub struct ApiServer {
    config: AppConfig,
    crm: Arc<CrmClient>,
}

impl ApiServer {
    pub fn new(config: AppConfig, crm: Arc<CrmClient>) -> Self {
        Self { config, crm }
    }

    /// Start the HTTP server.
    pub async fn start_http(&self) -> anyhow::Result<()> {
        let state = AppState {
            crm: self.crm.clone(),
            start_time: Instant::now(),
        };

        let app = Router::new()
            // Form-submission endpoints
            .route("/api/contact", post(rest::handle_contact))
            .route("/api/booking", post(rest::handle_booking))
            // Operational endpoints
            .route("/health", get(rest::health_check))
            .route("/ready", get(rest::readiness))
            .route("/live", get(rest::liveness))
            // Middleware
            .layer(CompressionLayer::new())
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(state);

        let addr = SocketAddr::new(self.config.api.host.parse()?, self.config.api.http_port);

        info!(addr = %addr, "starting HTTP server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }

    /// Start the Prometheus metrics exporter on its own port.
    pub async fn start_metrics(&self) -> anyhow::Result<()> {
        let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
        let handle = builder
            .with_http_listener(SocketAddr::new(
                self.config.api.host.parse()?,
                self.config.metrics.port,
            ))
            .install_recorder()?;

        info!(port = self.config.metrics.port, "metrics exporter started");

        // Keep the handle alive
        std::mem::forget(handle);
        Ok(())
    }
}
