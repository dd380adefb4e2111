//! Suggest Proxy - Search suggestions with cached entity enrichment
//!
//! Serves `GET /suggestions` over HTTP, backed by the upstream search API and
//! a process-wide in-memory cache that a daily task keeps under its budget.

use std::sync::Arc;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use suggest_proxy::cache::{MaintenanceHandle, MemoryCache, SuggestionCache};
use suggest_proxy::cli::{Cli, StartupConfig};
use suggest_proxy::data::{BingClient, SearchApi};
use suggest_proxy::handler::{router, AppState};

/// Installs the log subscriber, defaulting to `info` when RUST_LOG is unset
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

/// Resolves once Ctrl-C is received
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match StartupConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => Cli::command().error(ErrorKind::ValueValidation, e).exit(),
    };

    init_tracing();

    let cache: Arc<dyn SuggestionCache> = Arc::new(MemoryCache::new());
    let api: Arc<dyn SearchApi> = Arc::new(BingClient::with_base_url(config.upstream_url.clone()));

    let maintenance = MaintenanceHandle::spawn(Arc::clone(&cache), config.maintenance.clone());
    let state = AppState::new(api, cache, config.service.clone());

    let listener = TcpListener::bind(config.bind).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        upstream = %config.upstream_url,
        "Suggest proxy listening"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    maintenance.shutdown().await;
    tracing::info!("Suggest proxy stopped");

    Ok(())
}
