//! GitHub webhook signature verification using HMAC-SHA256.
//!
//! GitHub signs each delivery body with the webhook's shared secret and sends
//! the result in the `X-Hub-Signature-256` header as `sha256=<hex>`. A
//! delivery is authenticated before anything in it is parsed.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the body signature.
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// Why a delivery failed authentication.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("missing X-Hub-Signature-256 header")]
    Missing,

    /// The header is not `sha256=` followed by an even number of hex digits.
    #[error("malformed signature header")]
    Malformed,

    #[error("signature does not match payload")]
    Mismatch,
}

/// Computes the HMAC-SHA256 of a payload under the given secret.
pub fn compute_signature(payload: &[u8], secret: &[u8]) -> Vec<u8> {
    let mut mac = mac_for(secret);
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

/// Formats a raw signature as a header value, `sha256=<hex>`.
pub fn format_signature_header(signature: &[u8]) -> String {
    format!("sha256={}", hex::encode(signature))
}

/// Decodes a header value into raw signature bytes.
fn parse_signature_header(header: &str) -> Result<Vec<u8>, SignatureError> {
    let hex_sig = header
        .strip_prefix("sha256=")
        .ok_or(SignatureError::Malformed)?;
    hex::decode(hex_sig).map_err(|_| SignatureError::Malformed)
}

/// Checks a delivery's signature header against its body.
///
/// The comparison is constant-time (delegated to the HMAC implementation).
///
/// # Examples
///
/// ```
/// use slash_bot::webhooks::{compute_signature, format_signature_header, verify_signature};
///
/// let body = br#"{"action":"created"}"#;
/// let header = format_signature_header(&compute_signature(body, b"s3cret"));
///
/// assert!(verify_signature(body, Some(&header), b"s3cret").is_ok());
/// assert!(verify_signature(body, Some(&header), b"other").is_err());
/// assert!(verify_signature(body, None, b"s3cret").is_err());
/// ```
pub fn verify_signature(
    payload: &[u8],
    signature_header: Option<&str>,
    secret: &[u8],
) -> Result<(), SignatureError> {
    let header = signature_header.ok_or(SignatureError::Missing)?;
    let expected = parse_signature_header(header.trim())?;

    let mut mac = mac_for(secret);
    mac.update(payload);
    mac.verify_slice(&expected).map_err(|_| SignatureError::Mismatch)
}

fn mac_for(secret: &[u8]) -> HmacSha256 {
    HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size")
}
