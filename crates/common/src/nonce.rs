use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single-use challenge nonce.
///
/// Immutable once issued: the store deletes the record on consumption or
/// expiry, it never mutates one in place. Redeemable at most once, within
/// the store's TTL of issuance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nonce {
    /// Opaque random token, URL-safe, at least 128 bits of entropy.
    pub value: String,

    /// When the nonce was issued.
    pub issued_at: DateTime<Utc>,

    /// Optional channel token (e.g. a cookie value) that must match at
    /// consumption time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bound_channel: Option<String>,
}

impl Nonce {
    /// Create a new nonce record.
    pub fn new(value: String, issued_at: DateTime<Utc>, bound_channel: Option<String>) -> Self {
        Self {
            value,
            issued_at,
            bound_channel,
        }
    }

    /// Truncated form safe for log lines. Full live nonce values never
    /// appear in logs.
    pub fn abbreviated(&self) -> String {
        match self.value.get(..8) {
            Some(prefix) => format!("{}...", prefix),
            None => self.value.clone(),
        }
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbreviated())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_truncated() {
        let nonce = Nonce::new(
            "aabbccddeeff00112233445566778899".to_string(),
            Utc::now(),
            None,
        );
        assert_eq!(nonce.to_string(), "aabbccdd...");
    }

    #[test]
    fn test_short_value_displays_whole() {
        let nonce = Nonce::new("abc".to_string(), Utc::now(), None);
        assert_eq!(nonce.to_string(), "abc");
    }
}
