//! Mini-App Authentication Service
//!
//! HTTP service that issues single-use challenge nonces, verifies wallet
//! signatures, and orchestrates zero-knowledge identity-proof verification.

use anyhow::{Context, Result};
use auth_service::config::Config;
use auth_service::{create_router, AppState};
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing/logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting Mini-App Authentication Service");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    info!("App ID: {}", config.abbreviated_app_id());
    info!("Verification authority: {}", config.verifier_base_url);

    // Create application state
    let state = AppState::new(&config).context("Failed to initialize service state")?;

    // Periodic sweep keeps the nonce store bounded even when nonces are
    // never redeemed.
    let store = state.nonces.clone();
    let sweep_interval = Duration::from_secs(config.sweep_interval_secs);
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(sweep_interval).await;
            store.sweep().await;
        }
    });

    // Create router
    let app = create_router(state);

    // Start server
    let listener = TcpListener::bind(&config.api_address())
        .await
        .with_context(|| format!("Failed to bind to {}", config.api_address()))?;

    info!("Auth service listening on {}", config.api_address());
    info!("API endpoints:");
    info!("  GET  /nonce - issue wallet-auth challenge");
    info!("  POST /complete-wallet-auth - verify signed message");
    info!("  POST /verify-proof - verify identity proof");
    info!("  GET  /health - health check");

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
