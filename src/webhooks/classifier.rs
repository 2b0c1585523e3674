//! Inbound webhook classification.

use serde::Deserialize;

/// The two request shapes Notion delivers to the webhook endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestKind {
    /// One-time endpoint verification handshake carrying a token.
    Handshake { token: String },
    /// A regular change notification.
    Notification,
}

#[derive(Deserialize)]
struct VerificationProbe {
    #[serde(default)]
    verification_token: String,
}

/// Classifies a raw webhook payload.
///
/// Never fails: only a JSON object with a non-empty `verification_token`
/// field is a handshake. Parse failures, an absent field, and an empty field
/// all classify as a notification. Pure function of the payload bytes.
pub fn classify(payload: &[u8]) -> RequestKind {
    match serde_json::from_slice::<VerificationProbe>(payload) {
        Ok(probe) if !probe.verification_token.is_empty() => RequestKind::Handshake {
            token: probe.verification_token,
        },
        _ => RequestKind::Notification,
    }
}
