//! Slack v0 request-signature verification.
//!
//! Basestring is `v0:{timestamp}:{raw body}`, MAC'd with HMAC-SHA256 under
//! the workspace signing secret and hex-encoded into the
//! `x-slack-signature` header as `v0=<hex>`. Requests older than the
//! tolerance window are rejected regardless of signature validity.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use threadrelay_core::config::SIGNATURE_TOLERANCE_SECS;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_VERSION: &str = "v0";

#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("missing {0} header")]
    MissingHeader(&'static str),

    #[error("request timestamp is not a unix integer")]
    MalformedTimestamp,

    #[error("request timestamp outside tolerance window ({age}s old)")]
    StaleTimestamp { age: i64 },

    #[error("signature header is malformed")]
    MalformedSignature,

    #[error("signature mismatch")]
    Mismatch,
}

/// Verify a signed Events API request.
///
/// `now` is the receiver's current unix time, injected so the tolerance
/// window is testable. Comparison is constant-time via `Mac::verify_slice`.
pub fn verify_signature(
    signing_secret: &str,
    timestamp: Option<&str>,
    signature: Option<&str>,
    body: &[u8],
    now: i64,
) -> Result<(), SignatureError> {
    let timestamp =
        timestamp.ok_or(SignatureError::MissingHeader("x-slack-request-timestamp"))?;
    let signature = signature.ok_or(SignatureError::MissingHeader("x-slack-signature"))?;

    let ts: i64 = timestamp
        .parse()
        .map_err(|_| SignatureError::MalformedTimestamp)?;
    let age = (now - ts).abs();
    if age > SIGNATURE_TOLERANCE_SECS {
        return Err(SignatureError::StaleTimestamp { age });
    }

    let sig_hex = signature
        .strip_prefix("v0=")
        .ok_or(SignatureError::MalformedSignature)?;
    let expected = hex::decode(sig_hex).map_err(|_| SignatureError::MalformedSignature)?;

    let mut mac = HmacSha256::new_from_slice(signing_secret.as_bytes())
        .map_err(|_| SignatureError::MalformedSignature)?;
    mac.update(format!("{SIGNATURE_VERSION}:{timestamp}:").as_bytes());
    mac.update(body);

    mac.verify_slice(&expected)
        .map_err(|_| SignatureError::Mismatch)
}
