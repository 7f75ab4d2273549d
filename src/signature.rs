//! Webhook signature verification.
//!
//! Inbound deliveries carry a `webhook-signature` header of the form
//! `t={unix_ts},v1={hex_hmac}` with one or more `v1` entries (multiple
//! entries appear during secret rotation). The HMAC-SHA256 is computed
//! over `"{timestamp}.{raw_payload}"` - the raw request bytes, never a
//! re-serialized form. Verification must run before the payload is
//! trusted or parsed as JSON.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SignatureError {
    #[error("malformed signature header")]
    MalformedHeader,

    #[error("timestamp outside tolerance window (age {age_secs}s)")]
    StaleTimestamp { age_secs: i64 },

    #[error("no matching signature digest")]
    InvalidSignature,
}

#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    secret: String,
    tolerance_secs: i64,
}

impl SignatureVerifier {
    pub fn new(secret: impl Into<String>, tolerance_secs: i64) -> Self {
        Self {
            secret: secret.into(),
            tolerance_secs,
        }
    }

    /// Verify `header` against the raw request body.
    ///
    /// Pure validation; no side effects. Timestamp checks run before the
    /// HMAC so an attacker replaying an old capture learns nothing about
    /// the digest comparison.
    pub fn verify(&self, payload: &[u8], header: &str) -> Result<(), SignatureError> {
        let mut timestamp = None;
        let mut digests = Vec::new();

        for part in header.split(',') {
            let part = part.trim();
            if let Some(t) = part.strip_prefix("t=") {
                timestamp = Some(t);
            } else if let Some(s) = part.strip_prefix("v1=") {
                digests.push(s);
            }
        }

        let timestamp_str = timestamp.ok_or(SignatureError::MalformedHeader)?;
        if digests.is_empty() {
            return Err(SignatureError::MalformedHeader);
        }

        let timestamp: i64 = timestamp_str
            .parse()
            .map_err(|_| SignatureError::MalformedHeader)?;

        // Symmetric window: future timestamps (sender clock ahead of
        // ours) get the same allowance as stale ones.
        let age_secs = chrono::Utc::now().timestamp() - timestamp;
        if age_secs.abs() > self.tolerance_secs {
            return Err(SignatureError::StaleTimestamp { age_secs });
        }

        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|_| SignatureError::InvalidSignature)?;
        mac.update(timestamp_str.as_bytes());
        mac.update(b".");
        mac.update(payload);
        let expected = hex::encode(mac.finalize().into_bytes());
        let expected = expected.as_bytes();

        // Constant-time comparison against every provided digest.
        // Length is not secret: always 64 hex chars for SHA-256.
        let mut matched = false;
        for digest in digests {
            let provided = digest.as_bytes();
            if provided.len() == expected.len() && bool::from(expected.ct_eq(provided)) {
                matched = true;
            }
        }

        if matched {
            Ok(())
        } else {
            Err(SignatureError::InvalidSignature)
        }
    }
}
