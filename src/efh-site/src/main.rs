//! EFH site services — lead-capture API and operational endpoints backing the
//! marketing site.
//!
//! Main entry point that loads configuration and starts the HTTP server.

use clap::Parser;
use efh_api::{ApiServer, CrmClient};
use efh_core::config::AppConfig;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "efh-site")]
#[command(about = "Lead-capture and telemetry services for the EFH marketing site")]
#[command(version)]
struct Cli {
    /// HTTP port (overrides config)
    #[arg(long, env = "EFH_SITE__API__HTTP_PORT")]
    http_port: Option<u16>,

    /// Metrics port (overrides config)
    #[arg(long, env = "EFH_SITE__METRICS__PORT")]
    metrics_port: Option<u16>,

    /// CRM base URL (overrides config)
    #[arg(long, env = "EFH_SITE__CRM__BASE_URL")]
    crm_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "efh_site=info,tower_http=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("EFH site services starting up");

    // Load configuration
    let mut config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    // Apply CLI overrides
    if let Some(port) = cli.http_port {
        config.api.http_port = port;
    }
    if let Some(port) = cli.metrics_port {
        config.metrics.port = port;
    }
    if let Some(url) = cli.crm_url {
        config.crm.base_url = url;
    }

    info!(
        http_port = config.api.http_port,
        metrics_port = config.metrics.port,
        crm = %config.crm.base_url,
        "configuration loaded"
    );

    let crm = Arc::new(CrmClient::new(&config.crm)?);
    let server = ApiServer::new(config, crm);

    server.start_metrics().await?;
    server.start_http().await?;

    Ok(())
}
