pub mod attempt;
pub mod error;
pub mod nonce;
pub mod verdict;

pub use attempt::{IdentityProofAttempt, VerificationLevel, WalletAuthAttempt};
pub use error::{NonceError, ProofError, SignatureError};
pub use nonce::Nonce;
pub use verdict::{
    Outcome, ReasonKind, RejectionReason, Subject, VerificationResult, VerifiedIdentity,
    VerifiedProof,
};
