//! Wallet signature verification.
//!
//! Pure with respect to I/O: no network calls, suitable for unit testing
//! with fixed messages and signatures. Cryptographic address recovery is
//! an injected capability so alternate backends can be substituted.

use std::str::FromStr;
use std::sync::Arc;

use alloy_primitives::{Address, Signature};
use worldgate_common::{SignatureError, WalletAuthAttempt};

use crate::clock::Clock;
use crate::siwe::SiweMessage;

/// Capability to recover the signing address of a personal-sign payload.
pub trait AddressRecovery: Send + Sync {
    fn recover(&self, message: &str, signature: &str) -> Result<Address, SignatureError>;
}

/// EIP-191 ECDSA recovery backed by alloy's k256 primitives.
#[derive(Debug, Clone, Copy, Default)]
pub struct Eip191Recovery;

impl AddressRecovery for Eip191Recovery {
    fn recover(&self, message: &str, signature: &str) -> Result<Address, SignatureError> {
        let signature = Signature::from_str(signature)
            .map_err(|e| SignatureError::Malformed(format!("invalid signature encoding: {}", e)))?;

        signature
            .recover_address_from_msg(message.as_bytes())
            .map_err(|_| SignatureError::SignatureInvalid)
    }
}

/// Verifies a signed authentication message against a claimed address and
/// nonce.
pub struct SignatureVerifier {
    recovery: Arc<dyn AddressRecovery>,
    clock: Arc<dyn Clock>,
}

impl SignatureVerifier {
    pub fn new(recovery: Arc<dyn AddressRecovery>, clock: Arc<dyn Clock>) -> Self {
        Self { recovery, clock }
    }

    /// Verify an attempt and return the authenticated address (checksummed).
    ///
    /// The checks run cheapest first: message structure, canonical
    /// reconstruction, declared bindings, validity window, then ECDSA
    /// recovery.
    pub fn verify(&self, attempt: &WalletAuthAttempt) -> Result<String, SignatureError> {
        let message = SiweMessage::parse(&attempt.message)?;

        // A signature-valid message that does not re-render to the exact
        // signed text is not accepted.
        if message.render() != attempt.message {
            return Err(SignatureError::MessageMismatch);
        }

        // The nonce embedded in the message must be the one used to look
        // up the store entry.
        if message.nonce != attempt.nonce {
            return Err(SignatureError::MessageMismatch);
        }

        let claimed = Address::from_str(&attempt.address)
            .map_err(|e| SignatureError::Malformed(format!("invalid claimed address: {}", e)))?;
        let declared = Address::from_str(&message.address)
            .map_err(|e| SignatureError::Malformed(format!("invalid message address: {}", e)))?;
        if claimed != declared {
            return Err(SignatureError::MessageMismatch);
        }

        self.check_window(&message)?;

        let recovered = self
            .recovery
            .recover(&attempt.message, &attempt.signature)?;
        if recovered != claimed {
            return Err(SignatureError::SignatureInvalid);
        }

        Ok(claimed.to_checksum(None))
    }

    /// Enforce `notBefore <= now <= expiresAt` as declared in the message.
    fn check_window(&self, message: &SiweMessage) -> Result<(), SignatureError> {
        let now = self.clock.now();

        // Issued-at must at least be a well-formed timestamp.
        message.issued_at_utc()?;

        if let Some(not_before) = message.not_before_utc()? {
            if now < not_before {
                return Err(SignatureError::WindowViolation);
            }
        }

        if let Some(expires_at) = message.expiration_utc()? {
            if now > expires_at {
                return Err(SignatureError::WindowViolation);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::test_support::ManualClock;
    use alloy_primitives::utils::eip191_hash_message;
    use chrono::{Duration, TimeZone, Utc};
    use k256::ecdsa::SigningKey;

    fn signer() -> (SigningKey, Address) {
        let key = SigningKey::from_slice(&[0x42u8; 32]).unwrap();
        let address = Address::from_public_key(key.verifying_key());
        (key, address)
    }

    fn sign(key: &SigningKey, message: &str) -> String {
        let hash = eip191_hash_message(message.as_bytes());
        let (signature, recovery_id) = key.sign_prehash_recoverable(hash.as_slice()).unwrap();
        let signature = Signature::from_signature_and_parity(signature, recovery_id.is_y_odd());
        format!("0x{}", hex::encode(signature.as_bytes()))
    }

    fn message_text(address: &Address, nonce: &str) -> String {
        [
            "miniapp.example wants you to sign in with your Ethereum account:".to_string(),
            address.to_checksum(None),
            String::new(),
            String::new(),
            "URI: https://miniapp.example".to_string(),
            "Version: 1".to_string(),
            "Chain ID: 10".to_string(),
            format!("Nonce: {}", nonce),
            "Issued At: 2026-08-24T12:00:00Z".to_string(),
            "Expiration Time: 2026-08-24T13:00:00Z".to_string(),
            "Not Before: 2026-08-24T11:59:00Z".to_string(),
        ]
        .join("\n")
    }

    fn in_window_clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 8, 24, 12, 30, 0).unwrap(),
        ))
    }

    fn attempt(address: &Address, nonce: &str, message: String, signature: String) -> WalletAuthAttempt {
        WalletAuthAttempt {
            nonce: nonce.to_string(),
            address: address.to_checksum(None),
            message,
            signature,
        }
    }

    #[test]
    fn test_valid_signature_round_trip() {
        let (key, address) = signer();
        let nonce = "aabbccddeeff00112233445566778899";
        let message = message_text(&address, nonce);
        let signature = sign(&key, &message);

        let verifier = SignatureVerifier::new(Arc::new(Eip191Recovery), in_window_clock());
        let verified = verifier
            .verify(&attempt(&address, nonce, message, signature))
            .unwrap();
        assert_eq!(verified, address.to_checksum(None));
    }

    #[test]
    fn test_signature_from_other_key_rejected() {
        let (_key, address) = signer();
        let other = SigningKey::from_slice(&[0x43u8; 32]).unwrap();
        let nonce = "aabbccddeeff00112233445566778899";
        let message = message_text(&address, nonce);
        let signature = sign(&other, &message);

        let verifier = SignatureVerifier::new(Arc::new(Eip191Recovery), in_window_clock());
        assert_eq!(
            verifier.verify(&attempt(&address, nonce, message, signature)),
            Err(SignatureError::SignatureInvalid)
        );
    }

    #[test]
    fn test_tampered_message_rejected_despite_valid_signature() {
        let (key, address) = signer();
        let nonce = "aabbccddeeff00112233445566778899";
        let message = format!("{}\nRequest ID: abc\nRequest ID: abc", message_text(&address, nonce));
        // The signature over the tampered text is genuine; the structure
        // check still refuses it.
        let signature = sign(&key, &message);

        let verifier = SignatureVerifier::new(Arc::new(Eip191Recovery), in_window_clock());
        assert!(matches!(
            verifier.verify(&attempt(&address, nonce, message, signature)),
            Err(SignatureError::Malformed(_))
        ));
    }

    #[test]
    fn test_nonce_mismatch_between_attempt_and_message() {
        let (key, address) = signer();
        let message = message_text(&address, "aabbccddeeff00112233445566778899");
        let signature = sign(&key, &message);

        let verifier = SignatureVerifier::new(Arc::new(Eip191Recovery), in_window_clock());
        assert_eq!(
            verifier.verify(&attempt(&address, "ffffffffffffffffffffffffffffffff", message, signature)),
            Err(SignatureError::MessageMismatch)
        );
    }

    #[test]
    fn test_expired_window_rejected() {
        let (key, address) = signer();
        let nonce = "aabbccddeeff00112233445566778899";
        let message = message_text(&address, nonce);
        let signature = sign(&key, &message);

        let clock = in_window_clock();
        clock.advance(Duration::hours(2));
        let verifier = SignatureVerifier::new(Arc::new(Eip191Recovery), clock);
        assert_eq!(
            verifier.verify(&attempt(&address, nonce, message, signature)),
            Err(SignatureError::WindowViolation)
        );
    }

    #[test]
    fn test_not_before_in_future_rejected() {
        let (key, address) = signer();
        let nonce = "aabbccddeeff00112233445566778899";
        let message = message_text(&address, nonce);
        let signature = sign(&key, &message);

        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 8, 24, 11, 0, 0).unwrap(),
        ));
        let verifier = SignatureVerifier::new(Arc::new(Eip191Recovery), clock);
        assert_eq!(
            verifier.verify(&attempt(&address, nonce, message, signature)),
            Err(SignatureError::WindowViolation)
        );
    }

    #[test]
    fn test_garbage_signature_is_malformed() {
        let (_key, address) = signer();
        let nonce = "aabbccddeeff00112233445566778899";
        let message = message_text(&address, nonce);

        let verifier = SignatureVerifier::new(Arc::new(Eip191Recovery), in_window_clock());
        assert!(matches!(
            verifier.verify(&attempt(&address, nonce, message, "0x1234".to_string())),
            Err(SignatureError::Malformed(_))
        ));
    }
}
