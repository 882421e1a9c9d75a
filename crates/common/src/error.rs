use thiserror::Error;

/// Why a nonce could not be consumed.
///
/// Always a user-facing rejected verification, never a server fault.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NonceError {
    #[error("Nonce not found (never issued, already used, or swept)")]
    NotFound,

    #[error("Nonce expired")]
    Expired,

    #[error("Nonce channel binding mismatch")]
    ChannelMismatch,
}

/// Why a wallet-signature attempt was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Malformed authentication message: {0}")]
    Malformed(String),

    #[error("Signed message does not match its canonical reconstruction")]
    MessageMismatch,

    #[error("Current time is outside the declared validity window")]
    WindowViolation,

    #[error("Recovered signer does not match the claimed address")]
    SignatureInvalid,
}

/// Why an identity-proof attempt did not verify.
///
/// `Rejected` means the authority said no; `ServiceUnavailable` means the
/// authority could not be asked. Callers must not conflate the two.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProofError {
    #[error("Proof rejected by verification authority: {code}")]
    Rejected {
        code: String,
        detail: Option<String>,
    },

    #[error("Verification authority unreachable: {0}")]
    ServiceUnavailable(String),
}
