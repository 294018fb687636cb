// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use crate::application::live_sync_service::LiveSyncService;
use crate::domain::filter::FilterState;
use crate::infrastructure::config::load_config;
use crate::infrastructure::http_source::HttpInspectionSource;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::build_router;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_config()?;

    // Create record source (infrastructure layer)
    let source = Arc::new(HttpInspectionSource::new(
        config.source.base_url.clone(),
        config.source.request_timeout(),
    )?);

    // Create live sync service (application layer)
    let live_sync = Arc::new(LiveSyncService::new(
        source,
        FilterState::with_limit(config.history.default_limit),
        config.poll.interval(),
        config.display.clone(),
    ));
    live_sync.start().await;

    // Build router (presentation layer)
    let router = build_router(Arc::new(AppState {
        live_sync: live_sync.clone(),
    }));

    // Start server
    let addr: SocketAddr = config
        .server
        .listen
        .parse()
        .with_context(|| format!("Invalid listen address {}", config.server.listen))?;
    tracing::info!(source = %config.source.base_url, "Starting inspection-live on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    live_sync.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
