//! Request-scoped authentication attempts.
//!
//! These values live for a single verification call and are never cached
//! or persisted by the core.

use serde::{Deserialize, Serialize};

/// A wallet signature challenge/response (Sign-In-With-Ethereum style).
///
/// `message` is the exact string that was signed, including the nonce and
/// its validity window. The nonce embedded in `message` must equal `nonce`,
/// which is the key used to look up the store entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletAuthAttempt {
    /// The challenge nonce the caller claims to be answering.
    pub nonce: String,

    /// The wallet address the caller claims to control.
    pub address: String,

    /// The exact signed message text.
    pub message: String,

    /// Hex-encoded 65-byte ECDSA signature over `message`.
    pub signature: String,
}

/// Strength of the identity check behind a proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationLevel {
    Device,
    Orb,
}

/// A zero-knowledge uniqueness proof to be adjudicated by the external
/// verification authority.
///
/// `nullifier_hash` is the stable pseudonymous identifier for
/// (person, action); it must never be exposed as directly linkable to a
/// wallet address without an explicit binding step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityProofAttempt {
    pub proof: String,

    pub merkle_root: String,

    pub nullifier_hash: String,

    /// Required input. Defaulting a security-relevant level server-side is
    /// a latent risk, so default substitution is left to the caller.
    pub verification_level: VerificationLevel,

    pub action: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal: Option<String>,
}
