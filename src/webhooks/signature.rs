//! Webhook signature verification using HMAC-SHA256 with constant-time
//! comparison to prevent timing attacks.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::WebhookError;

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_PREFIX: &str = "sha256=";

/// Verifies the `X-Notion-Signature` digest over the raw request body.
///
/// Pure function of the secret, the header value, and the body bytes. The
/// computed digest is lowercase-hex encoded and compared against the supplied
/// digest in constant time; unequal lengths are handled inside the comparison
/// rather than by an early length check. The secret never appears in errors
/// or logs.
pub fn verify_signature(
    secret: &str,
    signature_header: Option<&str>,
    body: &[u8],
) -> Result<(), WebhookError> {
    if secret.is_empty() {
        return Err(WebhookError::ConfigurationMissing);
    }

    let header = signature_header.unwrap_or("");
    if header.is_empty() {
        return Err(WebhookError::MissingSignature);
    }

    let provided_hex = header
        .strip_prefix(SIGNATURE_PREFIX)
        .ok_or(WebhookError::MalformedSignature)?;
    if provided_hex.is_empty() {
        return Err(WebhookError::MalformedSignature);
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| WebhookError::SignatureMismatch)?;
    mac.update(body);
    let computed_hex = hex::encode(mac.finalize().into_bytes());

    if ConstantTimeEq::ct_eq(computed_hex.as_bytes(), provided_hex.as_bytes()).into() {
        Ok(())
    } else {
        Err(WebhookError::SignatureMismatch)
    }
}
