//! Verification orchestration.
//!
//! The façade used by inbound requests. Two flows, both terminal after a
//! single round trip:
//!
//! - wallet: issue nonce, then consume-nonce -> verify-signature
//! - proof: submit to the verification authority and map its verdict
//!
//! Both produce the same [`VerificationResult`] exit shape.

use std::sync::Arc;

use tracing::{info, warn};
use worldgate_common::{
    IdentityProofAttempt, Nonce, ProofError, VerificationResult, VerifiedIdentity,
    WalletAuthAttempt,
};

use crate::clock::Clock;
use crate::nonce::NonceStore;
use crate::proof::ProofAuthority;
use crate::signature::SignatureVerifier;

pub struct AuthOrchestrator {
    nonces: Arc<dyn NonceStore>,
    signatures: SignatureVerifier,
    authority: Arc<dyn ProofAuthority>,
    clock: Arc<dyn Clock>,
}

impl AuthOrchestrator {
    pub fn new(
        nonces: Arc<dyn NonceStore>,
        signatures: SignatureVerifier,
        authority: Arc<dyn ProofAuthority>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            nonces,
            signatures,
            authority,
            clock,
        }
    }

    /// Wallet flow step 1: issue a challenge nonce, optionally bound to a
    /// client channel token.
    pub async fn begin_wallet_auth(&self, channel_binding: Option<String>) -> Nonce {
        self.nonces.issue(channel_binding).await
    }

    /// Wallet flow step 2: redeem the nonce, then verify the signature.
    ///
    /// Nonce consumption comes first and is irreversible: if a later step
    /// fails, the nonce stays spent. That keeps the single-use guarantee
    /// under concurrent completion attempts for the same value.
    pub async fn complete_wallet_auth(
        &self,
        attempt: &WalletAuthAttempt,
        channel_binding: Option<&str>,
    ) -> VerificationResult {
        if let Err(err) = self
            .nonces
            .consume(&attempt.nonce, channel_binding)
            .await
        {
            warn!("Wallet auth rejected before signature check: {}", err);
            return VerificationResult::rejected(err);
        }

        match self.signatures.verify(attempt) {
            Ok(address) => {
                info!("Wallet auth verified for {}", address);
                VerificationResult::verified(VerifiedIdentity::wallet(
                    address,
                    self.clock.now(),
                ))
            }
            Err(err) => {
                warn!("Wallet auth signature rejected: {}", err);
                VerificationResult::rejected(err)
            }
        }
    }

    /// Proof flow: one-shot submission to the verification authority.
    ///
    /// No nonce is involved; replay protection is the caller's nullifier
    /// tracking. The core only reports the verdict and the nullifier.
    pub async fn complete_proof_auth(
        &self,
        attempt: &IdentityProofAttempt,
        app_id: &str,
    ) -> VerificationResult {
        match self.authority.verify(attempt, app_id).await {
            Ok(proof) => {
                info!("Identity proof verified for action '{}'", attempt.action);
                VerificationResult::verified(VerifiedIdentity::person(proof))
            }
            Err(err @ ProofError::Rejected { .. }) => {
                warn!("Identity proof rejected: {}", err);
                VerificationResult::rejected(err)
            }
            Err(err @ ProofError::ServiceUnavailable(_)) => {
                warn!("Verification authority unavailable: {}", err);
                VerificationResult::error(err)
            }
        }
    }
}
