//! Normalized verification outcomes.
//!
//! Both authentication flows produce the same [`VerificationResult`] shape
//! so callers have one exit contract regardless of method.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::attempt::VerificationLevel;
use crate::error::{NonceError, ProofError, SignatureError};

/// Terminal state of a verification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Verified,
    Rejected,
    /// The verdict could not be obtained (e.g. the verification authority
    /// was unreachable). Distinct from `Rejected`: the attempt may be
    /// retried by the caller.
    Error,
}

/// Who was authenticated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Subject {
    Wallet {
        wallet_address: String,
    },
    Person {
        nullifier_hash: String,
        verification_level: VerificationLevel,
    },
}

/// The authenticated identity, present only on a verified outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedIdentity {
    #[serde(flatten)]
    pub subject: Subject,

    pub verified_at: DateTime<Utc>,
}

impl VerifiedIdentity {
    pub fn wallet(address: String, verified_at: DateTime<Utc>) -> Self {
        Self {
            subject: Subject::Wallet {
                wallet_address: address,
            },
            verified_at,
        }
    }

    pub fn person(proof: VerifiedProof) -> Self {
        Self {
            subject: Subject::Person {
                nullifier_hash: proof.nullifier_hash,
                verification_level: proof.verification_level,
            },
            verified_at: proof.verified_at,
        }
    }
}

/// A proof the verification authority accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedProof {
    pub nullifier_hash: String,
    pub verification_level: VerificationLevel,
    pub verified_at: DateTime<Utc>,
}

/// Structured failure cause categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReasonKind {
    NotFound,
    Expired,
    ChannelMismatch,
    Malformed,
    MessageMismatch,
    WindowViolation,
    SignatureInvalid,
    ProofRejected,
    ServiceUnavailable,
}

/// Structured failure cause attached to rejected and errored outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionReason {
    pub kind: ReasonKind,

    /// Error code reported by the verification authority, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl RejectionReason {
    pub fn with_detail(kind: ReasonKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            code: None,
            detail: Some(detail.into()),
        }
    }
}

impl From<NonceError> for RejectionReason {
    fn from(err: NonceError) -> Self {
        let kind = match err {
            NonceError::NotFound => ReasonKind::NotFound,
            NonceError::Expired => ReasonKind::Expired,
            NonceError::ChannelMismatch => ReasonKind::ChannelMismatch,
        };
        Self::with_detail(kind, err.to_string())
    }
}

impl From<SignatureError> for RejectionReason {
    fn from(err: SignatureError) -> Self {
        let kind = match err {
            SignatureError::Malformed(_) => ReasonKind::Malformed,
            SignatureError::MessageMismatch => ReasonKind::MessageMismatch,
            SignatureError::WindowViolation => ReasonKind::WindowViolation,
            SignatureError::SignatureInvalid => ReasonKind::SignatureInvalid,
        };
        Self::with_detail(kind, err.to_string())
    }
}

impl From<ProofError> for RejectionReason {
    fn from(err: ProofError) -> Self {
        match err {
            ProofError::Rejected { code, detail } => Self {
                kind: ReasonKind::ProofRejected,
                code: Some(code),
                detail,
            },
            ProofError::ServiceUnavailable(detail) => {
                Self::with_detail(ReasonKind::ServiceUnavailable, detail)
            }
        }
    }
}

/// The single exit contract of both authentication flows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub outcome: Outcome,

    /// Present only when `outcome` is `verified`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<VerifiedIdentity>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<RejectionReason>,
}

impl VerificationResult {
    pub fn verified(identity: VerifiedIdentity) -> Self {
        Self {
            outcome: Outcome::Verified,
            identity: Some(identity),
            reason: None,
        }
    }

    pub fn rejected(reason: impl Into<RejectionReason>) -> Self {
        Self {
            outcome: Outcome::Rejected,
            identity: None,
            reason: Some(reason.into()),
        }
    }

    pub fn error(reason: impl Into<RejectionReason>) -> Self {
        Self {
            outcome: Outcome::Error,
            identity: None,
            reason: Some(reason.into()),
        }
    }

    pub fn is_verified(&self) -> bool {
        self.outcome == Outcome::Verified
    }
}
