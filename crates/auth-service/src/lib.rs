//! Mini-app authentication service.
//!
//! Authenticates end users through two complementary proofs: a
//! wallet-signature challenge/response (Sign-In-With-Ethereum style) and a
//! zero-knowledge uniqueness proof adjudicated by an external verification
//! authority.
//!
//! ## Endpoints
//!
//! - `GET /nonce` - issue a single-use challenge nonce (sets the
//!   channel-binding cookie)
//! - `POST /complete-wallet-auth` - verify a signed authentication message
//! - `POST /verify-proof` - verify a zero-knowledge identity proof
//! - `GET /health` - health check

pub mod clock;
pub mod config;
pub mod handlers;
pub mod nonce;
pub mod orchestrator;
pub mod proof;
pub mod signature;
pub mod siwe;

use axum::{
    routing::{get, post},
    Router,
};
use chrono::Duration as ChronoDuration;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::nonce::{MemoryNonceStore, NonceStore};
use crate::orchestrator::AuthOrchestrator;
use crate::proof::{DeveloperPortalClient, ProofAuthority};
use crate::signature::{Eip191Recovery, SignatureVerifier};

/// Application state shared across handlers
pub struct AppState {
    pub orchestrator: AuthOrchestrator,

    /// The nonce store, kept alongside the orchestrator so the periodic
    /// sweep task can reach it.
    pub nonces: Arc<dyn NonceStore>,

    /// Application identifier passed to the verification authority.
    pub app_id: String,

    /// App id truncated for status responses and log lines.
    pub abbreviated_app_id: String,

    /// Nonce lifetime, also used as the binding cookie Max-Age.
    pub nonce_ttl_secs: u64,
}

impl AppState {
    /// Build production state from configuration.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let nonces: Arc<dyn NonceStore> = Arc::new(MemoryNonceStore::new(
            ChronoDuration::seconds(config.nonce_ttl_secs as i64),
            clock.clone(),
        ));
        let signatures = SignatureVerifier::new(Arc::new(Eip191Recovery), clock.clone());
        let authority: Arc<dyn ProofAuthority> = Arc::new(DeveloperPortalClient::new(
            config.verifier_base_url.clone(),
            config.api_key.clone(),
            Duration::from_secs(config.verify_timeout_secs),
            clock.clone(),
        )?);

        Ok(Self {
            orchestrator: AuthOrchestrator::new(nonces.clone(), signatures, authority, clock),
            nonces,
            app_id: config.app_id.clone(),
            abbreviated_app_id: config.abbreviated_app_id(),
            nonce_ttl_secs: config.nonce_ttl_secs,
        })
    }
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/nonce", get(handlers::nonce_handler))
        .route(
            "/complete-wallet-auth",
            post(handlers::complete_wallet_auth_handler),
        )
        .route("/verify-proof", post(handlers::verify_proof_handler))
        // Middleware
        .layer(
            CorsLayer::permissive(), // Allow all origins for development
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
