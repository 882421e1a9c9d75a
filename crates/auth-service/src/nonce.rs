//! Single-use challenge nonce lifecycle.
//!
//! A nonce is redeemable at most once and only within the store TTL of
//! issuance. Consumption is an atomic check-and-delete so that two
//! concurrent completion attempts for the same value can never both
//! succeed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Duration;
use rand::RngCore;
use tracing::debug;
use worldgate_common::{Nonce, NonceError};

use crate::clock::Clock;

/// Entropy of generated tokens in bytes (hex-encoded on the wire).
const TOKEN_BYTES: usize = 16;

/// Generate a random URL-safe token with [`TOKEN_BYTES`] bytes of entropy.
pub(crate) fn random_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Storage for live challenge nonces.
///
/// The store exclusively owns nonce records for their full lifetime:
/// created on `issue`, destroyed on successful `consume` or on expiry.
#[async_trait]
pub trait NonceStore: Send + Sync {
    /// Generate a fresh nonce, record it with the current timestamp and
    /// optional channel binding, and return it.
    async fn issue(&self, channel_binding: Option<String>) -> Nonce;

    /// Redeem a nonce exactly once.
    ///
    /// Fails with `NotFound` if the value is absent (never issued, already
    /// consumed, or swept), with `Expired` if the TTL has elapsed (deleting
    /// the entry as a side effect), and with `ChannelMismatch` if a binding
    /// was recorded and the supplied one differs. On success the entry is
    /// deleted.
    async fn consume(
        &self,
        value: &str,
        channel_binding: Option<&str>,
    ) -> Result<(), NonceError>;

    /// Delete all entries older than the TTL so memory stays bounded even
    /// when nonces are never redeemed.
    async fn sweep(&self);
}

/// In-process store backed by a mutex-guarded map.
///
/// The guard is never held across an await, so a plain `std` mutex
/// suffices.
pub struct MemoryNonceStore {
    entries: Mutex<HashMap<String, Nonce>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl MemoryNonceStore {
    /// Create a store whose nonces expire `ttl` after issuance.
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    fn lock_entries(&self) -> MutexGuard<'_, HashMap<String, Nonce>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl NonceStore for MemoryNonceStore {
    async fn issue(&self, channel_binding: Option<String>) -> Nonce {
        let nonce = Nonce::new(random_token(), self.clock.now(), channel_binding);
        let mut entries = self.lock_entries();
        entries.insert(nonce.value.clone(), nonce.clone());
        debug!("Issued nonce {} ({} live)", nonce, entries.len());
        nonce
    }

    async fn consume(
        &self,
        value: &str,
        channel_binding: Option<&str>,
    ) -> Result<(), NonceError> {
        // Lookup, TTL check, binding check, and delete happen under one
        // guard to keep consumption indivisible.
        let mut entries = self.lock_entries();

        let entry = entries.get(value).ok_or(NonceError::NotFound)?;

        if self.clock.now() - entry.issued_at > self.ttl {
            // An expired nonce must never become redeemable again.
            entries.remove(value);
            return Err(NonceError::Expired);
        }

        if let Some(bound) = entry.bound_channel.as_deref() {
            if channel_binding != Some(bound) {
                return Err(NonceError::ChannelMismatch);
            }
        }

        entries.remove(value);
        Ok(())
    }

    async fn sweep(&self) {
        let now = self.clock.now();
        let mut entries = self.lock_entries();
        let before = entries.len();
        entries.retain(|_, nonce| now - nonce.issued_at <= self.ttl);

        let swept = before - entries.len();
        if swept > 0 {
            debug!("Swept {} expired nonce(s), {} live", swept, entries.len());
        }
    }
}
