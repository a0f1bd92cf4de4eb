use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use linkkeep::api;
use linkkeep::config::Config;
use linkkeep::registry::LinkRegistry;
use linkkeep::storage::open_storage;
use linkkeep::sweeper::spawn_sweeper;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration");

    // Initialize storage
    let storage = open_storage(&config.storage)
        .await
        .context("failed to open link storage")?;

    // Load registry
    let registry = LinkRegistry::open(storage, config.registry.options()).await;
    info!("Loaded {} stored links", registry.records().len());
    let registry = registry.into_shared();

    // Sweep once at startup, then periodically
    let removed = registry.lock().await.sweep_expired().await;
    if !removed.is_empty() {
        info!("Removed {} expired links at startup", removed.len());
    }
    let sweeper = spawn_sweeper(Arc::clone(&registry), config.registry.sweep_interval());
    info!(
        "🧹 Sweeping expired links every {}s",
        config.registry.sweep_interval().as_secs()
    );

    let router = api::create_api_router(
        Arc::clone(&registry),
        config.registry.recent_limit,
        config.registry.create_delay(),
    );

    let api_addr = format!("{}:{}", config.api_server.host, config.api_server.port);
    let listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind {api_addr}"))?;
    info!("🚀 API server listening on http://{}", api_addr);
    info!("   - API endpoints available at http://{}/api/...", api_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    sweeper.shutdown().await;
    registry.lock().await.save().await;
    info!("Links flushed, bye");

    Ok(())
}
