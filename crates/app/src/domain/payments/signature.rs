//! Webhook signature verification.
//!
//! The provider signs each delivery with a header of the form
//! `t=<unix seconds>,v1=<hex hmac>[,v1=<hex hmac>...]`, where each `v1` is
//! `HMAC-SHA256(secret, "<t>.<raw body>")`. Several `v1` entries appear while
//! the provider rotates secrets; any one matching is enough.

use std::{fmt, time::Duration};

use hmac::{Hmac, Mac};
use jiff::Timestamp;
use sha2::Sha256;
use smallvec::SmallVec;
use subtle::ConstantTimeEq;
use thiserror::Error;
use zeroize::Zeroize;

type HmacSha256 = Hmac<Sha256>;

/// Default allowed clock skew between the provider and us.
pub const DEFAULT_TOLERANCE: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("signature header has no timestamp")]
    MissingTimestamp,

    #[error("signature header has no v1 signature")]
    MissingSignature,

    #[error("signature timestamp is outside the tolerance window")]
    OutsideTolerance,

    #[error("signature does not match payload")]
    Mismatch,
}

/// An empty HMAC key signs anything, so it is never a usable secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("webhook secret must not be blank")]
pub struct BlankWebhookSecret;

/// Shared webhook signing secret. Never blank.
#[derive(Clone)]
pub struct WebhookSecret(Vec<u8>);

impl WebhookSecret {
    /// # Errors
    ///
    /// Returns [`BlankWebhookSecret`] when `secret` is empty or whitespace.
    pub fn new(secret: impl Into<Vec<u8>>) -> Result<Self, BlankWebhookSecret> {
        let mut secret = secret.into();

        if secret.iter().all(u8::is_ascii_whitespace) {
            secret.zeroize();

            return Err(BlankWebhookSecret);
        }

        Ok(Self(secret))
    }
}

impl fmt::Debug for WebhookSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WebhookSecret(**redacted**)")
    }
}

impl Drop for WebhookSecret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

#[derive(Debug, Clone)]
pub struct WebhookVerifier {
    secret: WebhookSecret,
    tolerance: Duration,
}

impl WebhookVerifier {
    #[must_use]
    pub fn new(secret: WebhookSecret, tolerance: Duration) -> Self {
        Self { secret, tolerance }
    }

    /// Check `header` against `payload`, failing closed on anything
    /// malformed.
    ///
    /// # Errors
    ///
    /// Returns a [`SignatureError`] describing the first check that failed.
    pub fn verify(
        &self,
        payload: &[u8],
        header: &str,
        now: Timestamp,
    ) -> Result<(), SignatureError> {
        let parsed = ParsedHeader::parse(header);

        let timestamp = parsed.timestamp.ok_or(SignatureError::MissingTimestamp)?;

        if parsed.signatures.is_empty() {
            return Err(SignatureError::MissingSignature);
        }

        let skew = now.as_second().abs_diff(timestamp);

        if skew > self.tolerance.as_secs() {
            return Err(SignatureError::OutsideTolerance);
        }

        let expected = self.digest(timestamp, payload);

        let matched = parsed.signatures.iter().fold(0_u8, |acc, candidate| {
            acc | expected.as_slice().ct_eq(candidate).unwrap_u8()
        });

        if matched == 1 {
            Ok(())
        } else {
            Err(SignatureError::Mismatch)
        }
    }

    /// Produce the header the provider would send for `payload` at
    /// `timestamp`.
    #[must_use]
    pub fn sign(&self, payload: &[u8], timestamp: i64) -> String {
        format!("t={timestamp},v1={}", hex::encode(self.digest(timestamp, payload)))
    }

    fn digest(&self, timestamp: i64, payload: &[u8]) -> Vec<u8> {
        // HMAC takes keys of any length; an empty digest can never match.
        let Ok(mut mac) = HmacSha256::new_from_slice(&self.secret.0) else {
            return Vec::new();
        };

        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);

        mac.finalize().into_bytes().to_vec()
    }
}

struct ParsedHeader {
    timestamp: Option<i64>,
    signatures: SmallVec<[Vec<u8>; 2]>,
}

impl ParsedHeader {
    fn parse(header: &str) -> Self {
        let mut timestamp = None;
        let mut signatures = SmallVec::new();

        for part in header.split(',') {
            let Some((key, value)) = part.trim().split_once('=') else {
                continue;
            };

            match key {
                "t" => timestamp = value.parse::<i64>().ok(),
                "v1" => {
                    if let Ok(bytes) = hex::decode(value) {
                        signatures.push(bytes);
                    }
                }
                _ => {}
            }
        }

        Self {
            timestamp,
            signatures,
        }
    }
}
