use anyhow::{Context, Result};
use hub_connectors::api::{cors_layer, create_router};
use hub_connectors::IntegrationRegistry;
use integration_hub::config::{load_config, HubConfig};
use integration_hub::{kv, CredentialStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hub_connectors=info,integration_hub=info".into()),
        )
        .init();

    info!("Integration hub starting...");

    // File configuration is optional; environment overrides always apply
    let mut config = match std::env::var("HUB_CONFIG") {
        Ok(path) => load_config(&path)?,
        Err(_) => HubConfig::default(),
    };
    config.apply_env();

    info!(
        bind_addr = %config.server.bind_addr,
        public_url = %config.server.public_url,
        store = ?config.store.backend,
        ttl_seconds = config.store.ttl_seconds,
        "Configuration loaded"
    );

    let kv = kv::connect(&config.store)
        .await
        .context("Failed to connect to the KV store")?;
    let store = CredentialStore::new(kv, Duration::from_secs(config.store.ttl_seconds));
    info!("Credential store initialized");

    let registry = IntegrationRegistry::from_config(&config, store)
        .context("Failed to build integration registry")?;

    let router = create_router(Arc::new(registry)).layer(cors_layer(&config.server));
    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .context("Failed to bind integration API address")?;
    info!(addr = %config.server.bind_addr, "Integration API listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl_c signal");
            }
            info!("Shutdown signal received");
        })
        .await
        .context("Integration API server error")?;

    info!("Integration hub stopped");
    Ok(())
}
