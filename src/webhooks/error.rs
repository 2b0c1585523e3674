//! Webhook pipeline errors.

use axum::http::StatusCode;
use thiserror::Error;

use crate::bus::PublishError;

/// Everything that can go wrong between receiving a webhook request and
/// handing its event to the bus.
///
/// The variant set is closed; HTTP mapping goes through the tables below so
/// a new variant cannot silently fall into a catch-all status.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// The shared secret is not configured; no request can be authenticated.
    #[error("webhook secret not configured")]
    ConfigurationMissing,
    /// No signature header was supplied.
    #[error("missing webhook signature header")]
    MissingSignature,
    /// The signature header is not `sha256=` followed by a non-empty digest.
    #[error("invalid webhook signature format")]
    MalformedSignature,
    /// The supplied digest does not match the request body.
    #[error("invalid webhook signature")]
    SignatureMismatch,
    /// The request body could not be read.
    #[error("failed to read request body")]
    BodyUnreadable,
    /// The event envelope could not be encoded.
    #[error("failed to encode webhook event: {0}")]
    SerializationFailed(#[from] serde_json::Error),
    /// The bus refused the message.
    #[error("failed to publish webhook event: {0}")]
    PublishRejected(#[from] PublishError),
}

impl WebhookError {
    /// HTTP status for this failure.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::ConfigurationMissing => StatusCode::INTERNAL_SERVER_ERROR,
            WebhookError::MissingSignature => StatusCode::UNAUTHORIZED,
            WebhookError::MalformedSignature => StatusCode::UNAUTHORIZED,
            WebhookError::SignatureMismatch => StatusCode::UNAUTHORIZED,
            WebhookError::BodyUnreadable => StatusCode::BAD_REQUEST,
            WebhookError::SerializationFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            WebhookError::PublishRejected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            WebhookError::ConfigurationMissing => "CONFIGURATION_MISSING",
            WebhookError::MissingSignature => "MISSING_SIGNATURE",
            WebhookError::MalformedSignature => "MALFORMED_SIGNATURE",
            WebhookError::SignatureMismatch => "SIGNATURE_MISMATCH",
            WebhookError::BodyUnreadable => "BODY_UNREADABLE",
            WebhookError::SerializationFailed(_) => "SERIALIZATION_FAILED",
            WebhookError::PublishRejected(_) => "PUBLISH_REJECTED",
        }
    }

    /// Stable message for the response body. Server-side causes are never
    /// detailed here.
    pub fn client_message(&self) -> &'static str {
        match self {
            WebhookError::ConfigurationMissing => "Webhook secret not configured",
            WebhookError::MissingSignature => "Missing webhook signature header",
            WebhookError::MalformedSignature => "Invalid webhook signature format",
            WebhookError::SignatureMismatch => "Invalid webhook signature",
            WebhookError::BodyUnreadable => "Failed to read request body",
            WebhookError::SerializationFailed(_) => "Failed to encode webhook event",
            WebhookError::PublishRejected(_) => "Failed to publish webhook event",
        }
    }
}
