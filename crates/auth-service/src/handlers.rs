//! API request handlers for the authentication endpoints.

use axum::{
    extract::rejection::JsonRejection,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use worldgate_common::{
    IdentityProofAttempt, Outcome, ReasonKind, RejectionReason, VerificationResult,
    VerifiedIdentity, WalletAuthAttempt,
};

use crate::nonce::random_token;
use crate::AppState;

/// Cookie carrying the channel binding for issued nonces.
pub const BINDING_COOKIE: &str = "siwe-binding";

/// Response from nonce issuance.
#[derive(Debug, Serialize)]
pub struct NonceResponse {
    /// The challenge value to embed in the signed message.
    pub nonce: String,

    /// Issuance time, milliseconds since the epoch.
    pub timestamp: i64,
}

/// Signed payload produced by the wallet.
#[derive(Debug, Deserialize)]
pub struct WalletAuthPayload {
    /// Client-side command status; anything but "success" is rejected.
    pub status: String,

    pub message: String,

    pub signature: String,

    pub address: String,
}

/// Request to complete wallet authentication.
#[derive(Debug, Deserialize)]
pub struct CompleteWalletAuthRequest {
    pub payload: WalletAuthPayload,

    pub nonce: String,
}

/// Response from wallet authentication completion.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteWalletAuthResponse {
    /// "success" or "error"
    pub status: String,

    pub is_valid: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<VerifiedIdentity>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<RejectionReason>,
}

/// Response from identity-proof verification.
#[derive(Debug, Serialize)]
pub struct VerifyProofResponse {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<VerifiedIdentity>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RejectionReason>,
}

/// Handler-level failure.
///
/// A body that does not deserialize is an ordinary rejected verification,
/// rendered in the shape of the endpoint it was addressed to.
#[derive(Debug)]
pub enum ApiError {
    MalformedWalletRequest(String),
    MalformedProofRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::MalformedWalletRequest(detail) => {
                let result = VerificationResult::rejected(RejectionReason::with_detail(
                    ReasonKind::Malformed,
                    detail,
                ));
                wallet_response(result).into_response()
            }
            ApiError::MalformedProofRequest(detail) => (
                StatusCode::BAD_REQUEST,
                Json(VerifyProofResponse {
                    success: false,
                    user: None,
                    error: Some(RejectionReason::with_detail(ReasonKind::Malformed, detail)),
                }),
            )
                .into_response(),
        }
    }
}

/// Health check endpoint
pub async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "auth-service",
        "verifier": {
            "configured": true,
            "app_id": state.abbreviated_app_id,
        }
    }))
}

/// Issue a wallet-auth challenge nonce.
///
/// The nonce is bound to a fresh channel token delivered as an http-only,
/// secure, same-site-strict cookie; completion must present it.
pub async fn nonce_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let binding = random_token();
    let nonce = state
        .orchestrator
        .begin_wallet_auth(Some(binding.clone()))
        .await;

    info!("Issued wallet-auth nonce {}", nonce);

    let cookie = format!(
        "{}={}; Max-Age={}; Path=/; HttpOnly; Secure; SameSite=Strict",
        BINDING_COOKIE, binding, state.nonce_ttl_secs
    );

    (
        [(header::SET_COOKIE, cookie)],
        Json(NonceResponse {
            timestamp: nonce.issued_at.timestamp_millis(),
            nonce: nonce.value,
        }),
    )
}

/// Complete wallet authentication by verifying the signed message.
pub async fn complete_wallet_auth_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    request: Result<Json<CompleteWalletAuthRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CompleteWalletAuthResponse>), ApiError> {
    let Json(request) =
        request.map_err(|rejection| ApiError::MalformedWalletRequest(rejection.body_text()))?;

    // Payload shape is validated before any store access.
    if request.payload.status != "success" {
        let result = VerificationResult::rejected(RejectionReason::with_detail(
            ReasonKind::Malformed,
            "wallet payload status is not success",
        ));
        return Ok(wallet_response(result));
    }

    let attempt = WalletAuthAttempt {
        nonce: request.nonce,
        address: request.payload.address,
        message: request.payload.message,
        signature: request.payload.signature,
    };

    let binding = binding_from_headers(&headers);
    let result = state
        .orchestrator
        .complete_wallet_auth(&attempt, binding.as_deref())
        .await;

    Ok(wallet_response(result))
}

/// Verify a zero-knowledge identity proof through the external authority.
pub async fn verify_proof_handler(
    State(state): State<Arc<AppState>>,
    attempt: Result<Json<IdentityProofAttempt>, JsonRejection>,
) -> Result<(StatusCode, Json<VerifyProofResponse>), ApiError> {
    let Json(attempt) =
        attempt.map_err(|rejection| ApiError::MalformedProofRequest(rejection.body_text()))?;

    let result = state
        .orchestrator
        .complete_proof_auth(&attempt, &state.app_id)
        .await;

    let status = match result.outcome {
        Outcome::Verified => StatusCode::OK,
        Outcome::Rejected => StatusCode::BAD_REQUEST,
        Outcome::Error => StatusCode::SERVICE_UNAVAILABLE,
    };

    Ok((
        status,
        Json(VerifyProofResponse {
            success: result.is_verified(),
            user: result.identity,
            error: result.reason,
        }),
    ))
}

fn wallet_response(result: VerificationResult) -> (StatusCode, Json<CompleteWalletAuthResponse>) {
    let status = if result.is_verified() {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };

    (
        status,
        Json(CompleteWalletAuthResponse {
            status: if result.is_verified() {
                "success".to_string()
            } else {
                "error".to_string()
            },
            is_valid: result.is_verified(),
            user: result.identity,
            reason: result.reason,
        }),
    )
}

/// Extract the channel-binding cookie, if the client presented one.
fn binding_from_headers(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == BINDING_COOKIE).then(|| value.to_string())
    })
}
