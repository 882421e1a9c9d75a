//! EIP-4361 ("Sign-In with Ethereum") message model.
//!
//! The signed message is parsed into its declared fields and can be
//! re-rendered into the canonical text. A verifier compares the rendering
//! against the exact signed string, so a message that parses but carries
//! extra or reordered content is still rejected.

use chrono::{DateTime, Utc};
use worldgate_common::SignatureError;

const SIGN_IN_SUFFIX: &str = " wants you to sign in with your Ethereum account:";

fn malformed(msg: impl Into<String>) -> SignatureError {
    SignatureError::Malformed(msg.into())
}

/// Declared fields of a sign-in message.
///
/// Timestamps are kept as the raw strings that appeared in the message so
/// the canonical rendering reproduces the signed text byte for byte;
/// parsed values are exposed through the `*_utc` accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiweMessage {
    pub domain: String,
    pub address: String,
    pub statement: Option<String>,
    pub uri: String,
    pub version: String,
    pub chain_id: String,
    pub nonce: String,
    pub issued_at: String,
    pub expiration_time: Option<String>,
    pub not_before: Option<String>,
    pub request_id: Option<String>,
}

impl SiweMessage {
    /// Parse a sign-in message.
    ///
    /// The grammar is positional: preamble, address, blank separator,
    /// optional statement, then the labeled fields in their fixed order.
    /// Trailing content after the last field is malformed.
    pub fn parse(message: &str) -> Result<Self, SignatureError> {
        let lines: Vec<&str> = message.split('\n').collect();

        let preamble = lines
            .first()
            .ok_or_else(|| malformed("empty message"))?;
        let domain = preamble
            .strip_suffix(SIGN_IN_SUFFIX)
            .ok_or_else(|| malformed("missing sign-in preamble"))?;
        if domain.is_empty() {
            return Err(malformed("empty domain"));
        }

        let address = lines
            .get(1)
            .filter(|line| !line.is_empty())
            .ok_or_else(|| malformed("missing address line"))?;

        if lines.get(2) != Some(&"") {
            return Err(malformed("expected blank line after address"));
        }

        // Optional statement is framed by blank lines.
        let (statement, mut idx) = match lines.get(3) {
            Some(&"") => (None, 4),
            Some(line) => {
                if lines.get(4) != Some(&"") {
                    return Err(malformed("expected blank line after statement"));
                }
                (Some(line.to_string()), 5)
            }
            None => return Err(malformed("message truncated after address")),
        };

        let uri = required_field(&lines, &mut idx, "URI")?;
        let version = required_field(&lines, &mut idx, "Version")?;
        let chain_id = required_field(&lines, &mut idx, "Chain ID")?;
        let nonce = required_field(&lines, &mut idx, "Nonce")?;
        let issued_at = required_field(&lines, &mut idx, "Issued At")?;
        let expiration_time = optional_field(&lines, &mut idx, "Expiration Time");
        let not_before = optional_field(&lines, &mut idx, "Not Before");
        let request_id = optional_field(&lines, &mut idx, "Request ID");

        if idx != lines.len() {
            return Err(malformed("unexpected trailing content"));
        }

        Ok(Self {
            domain: domain.to_string(),
            address: address.to_string(),
            statement,
            uri,
            version,
            chain_id,
            nonce,
            issued_at,
            expiration_time,
            not_before,
            request_id,
        })
    }

    /// Render the canonical message text for these fields.
    pub fn render(&self) -> String {
        let mut lines = vec![
            format!("{}{}", self.domain, SIGN_IN_SUFFIX),
            self.address.clone(),
            String::new(),
        ];
        if let Some(statement) = &self.statement {
            lines.push(statement.clone());
        }
        lines.push(String::new());
        lines.push(format!("URI: {}", self.uri));
        lines.push(format!("Version: {}", self.version));
        lines.push(format!("Chain ID: {}", self.chain_id));
        lines.push(format!("Nonce: {}", self.nonce));
        lines.push(format!("Issued At: {}", self.issued_at));
        if let Some(value) = &self.expiration_time {
            lines.push(format!("Expiration Time: {}", value));
        }
        if let Some(value) = &self.not_before {
            lines.push(format!("Not Before: {}", value));
        }
        if let Some(value) = &self.request_id {
            lines.push(format!("Request ID: {}", value));
        }
        lines.join("\n")
    }

    pub fn issued_at_utc(&self) -> Result<DateTime<Utc>, SignatureError> {
        parse_timestamp(&self.issued_at, "Issued At")
    }

    pub fn expiration_utc(&self) -> Result<Option<DateTime<Utc>>, SignatureError> {
        self.expiration_time
            .as_deref()
            .map(|raw| parse_timestamp(raw, "Expiration Time"))
            .transpose()
    }

    pub fn not_before_utc(&self) -> Result<Option<DateTime<Utc>>, SignatureError> {
        self.not_before
            .as_deref()
            .map(|raw| parse_timestamp(raw, "Not Before"))
            .transpose()
    }
}

fn parse_timestamp(raw: &str, label: &str) -> Result<DateTime<Utc>, SignatureError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| malformed(format!("invalid {} timestamp: {}", label, e)))
}

fn required_field(
    lines: &[&str],
    idx: &mut usize,
    label: &str,
) -> Result<String, SignatureError> {
    let line = lines
        .get(*idx)
        .ok_or_else(|| malformed(format!("missing {} field", label)))?;
    let value = line
        .strip_prefix(&format!("{}: ", label))
        .ok_or_else(|| malformed(format!("missing {} field", label)))?;
    *idx += 1;
    Ok(value.to_string())
}

fn optional_field(lines: &[&str], idx: &mut usize, label: &str) -> Option<String> {
    let value = lines
        .get(*idx)?
        .strip_prefix(&format!("{}: ", label))?;
    *idx += 1;
    Some(value.to_string())
}
