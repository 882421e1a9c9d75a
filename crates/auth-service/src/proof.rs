//! Identity-proof verification against the external authority.
//!
//! The authority's verdict is one-shot: no caching, no automatic retries.
//! A negative verdict (`Rejected`) and an unreachable authority
//! (`ServiceUnavailable`) are kept distinct so callers never conflate
//! "proof is invalid" with "could not ask".

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use worldgate_common::{
    IdentityProofAttempt, ProofError, VerificationLevel, VerifiedProof,
};

use crate::clock::Clock;

/// External authority adjudicating zero-knowledge identity proofs.
#[async_trait]
pub trait ProofAuthority: Send + Sync {
    async fn verify(
        &self,
        attempt: &IdentityProofAttempt,
        app_id: &str,
    ) -> Result<VerifiedProof, ProofError>;
}

/// Request body of the authority's verify endpoint.
#[derive(Debug, Serialize)]
struct VerifyRequest<'a> {
    proof: &'a str,
    merkle_root: &'a str,
    nullifier_hash: &'a str,
    verification_level: VerificationLevel,
    action: &'a str,
    /// An absent signal is forwarded as the empty string.
    signal: &'a str,
}

/// Verdict body returned by the authority.
#[derive(Debug, Deserialize)]
struct VerifyResponse {
    success: bool,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

/// HTTP client for the verification authority's developer portal.
pub struct DeveloperPortalClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    clock: Arc<dyn Clock>,
}

impl DeveloperPortalClient {
    /// Create a client with a bounded timeout on every outbound call.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
            clock,
        })
    }

    fn verify_url(&self, app_id: &str) -> String {
        format!("{}/verify/{}", self.base_url.trim_end_matches('/'), app_id)
    }
}

#[async_trait]
impl ProofAuthority for DeveloperPortalClient {
    async fn verify(
        &self,
        attempt: &IdentityProofAttempt,
        app_id: &str,
    ) -> Result<VerifiedProof, ProofError> {
        let body = VerifyRequest {
            proof: &attempt.proof,
            merkle_root: &attempt.merkle_root,
            nullifier_hash: &attempt.nullifier_hash,
            verification_level: attempt.verification_level,
            action: &attempt.action,
            signal: attempt.signal.as_deref().unwrap_or(""),
        };

        debug!(
            "Submitting proof for action '{}' to verification authority",
            attempt.action
        );

        let response = self
            .http
            .post(self.verify_url(app_id))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProofError::ServiceUnavailable(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ProofError::ServiceUnavailable(e.to_string()))?;

        match serde_json::from_str::<VerifyResponse>(&text) {
            Ok(verdict) if status.is_success() && verdict.success => Ok(VerifiedProof {
                nullifier_hash: attempt.nullifier_hash.clone(),
                verification_level: attempt.verification_level,
                verified_at: self.clock.now(),
            }),
            Ok(verdict) => {
                let code = verdict
                    .code
                    .unwrap_or_else(|| format!("http_{}", status.as_u16()));
                warn!("Verification authority rejected proof: {}", code);
                Err(ProofError::Rejected {
                    code,
                    detail: verdict.detail,
                })
            }
            // The authority answered but the verdict is unreadable: treat a
            // 2xx as a transient authority fault, anything else as a
            // rejection carrying the HTTP status for diagnostics.
            Err(_) if status.is_success() => Err(ProofError::ServiceUnavailable(
                "malformed verdict body from authority".to_string(),
            )),
            Err(_) => Err(ProofError::Rejected {
                code: format!("http_{}", status.as_u16()),
                detail: None,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;

    fn sample_attempt() -> IdentityProofAttempt {
        IdentityProofAttempt {
            proof: "0xproof".to_string(),
            merkle_root: "0xroot".to_string(),
            nullifier_hash: "0xnullifier".to_string(),
            verification_level: VerificationLevel::Orb,
            action: "sign-in".to_string(),
            signal: None,
        }
    }

    fn client_for(server: &mockito::Server) -> DeveloperPortalClient {
        DeveloperPortalClient::new(
            server.url(),
            "sk_test",
            Duration::from_secs(2),
            Arc::new(SystemClock),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_accepted_proof_yields_nullifier() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/verify/app_123")
            .match_header("authorization", "Bearer sk_test")
            .with_status(200)
            .with_body(r#"{"success": true}"#)
            .create_async()
            .await;

        let verified = client_for(&server)
            .verify(&sample_attempt(), "app_123")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(verified.nullifier_hash, "0xnullifier");
        assert_eq!(verified.verification_level, VerificationLevel::Orb);
    }

    #[tokio::test]
    async fn test_negative_verdict_carries_authority_code() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/verify/app_123")
            .with_status(400)
            .with_body(r#"{"success": false, "code": "invalid_proof", "detail": "proof did not verify"}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .verify(&sample_attempt(), "app_123")
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ProofError::Rejected {
                code: "invalid_proof".to_string(),
                detail: Some("proof did not verify".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn test_success_false_on_2xx_is_still_rejected() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/verify/app_123")
            .with_status(200)
            .with_body(r#"{"success": false, "code": "max_verifications_reached"}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .verify(&sample_attempt(), "app_123")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ProofError::Rejected { ref code, .. } if code == "max_verifications_reached"
        ));
    }

    #[tokio::test]
    async fn test_unreadable_rejection_carries_http_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/verify/app_123")
            .with_status(403)
            .with_body("forbidden")
            .create_async()
            .await;

        let err = client_for(&server)
            .verify(&sample_attempt(), "app_123")
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ProofError::Rejected {
                code: "http_403".to_string(),
                detail: None,
            }
        );
    }

    #[tokio::test]
    async fn test_transport_failure_is_service_unavailable() {
        // Nothing listens here; the connection is refused.
        let client = DeveloperPortalClient::new(
            "http://127.0.0.1:9",
            "sk_test",
            Duration::from_millis(500),
            Arc::new(SystemClock),
        )
        .unwrap();

        let err = client
            .verify(&sample_attempt(), "app_123")
            .await
            .unwrap_err();

        assert!(matches!(err, ProofError::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_absent_signal_sent_as_empty_string() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/verify/app_123")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "signal": "",
                "verification_level": "orb",
            })))
            .with_status(200)
            .with_body(r#"{"success": true}"#)
            .create_async()
            .await;

        client_for(&server)
            .verify(&sample_attempt(), "app_123")
            .await
            .unwrap();

        mock.assert_async().await;
    }
}
