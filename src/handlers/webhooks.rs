//! # Webhook API Handlers
//!
//! HTTP entry point for Notion webhook deliveries. The handler captures the
//! raw body exactly once and hands it to the ingestion pipeline; signature
//! verification, classification, and publication all happen over that same
//! byte buffer.

use axum::{
    extract::{Request, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::server::AppState;
use crate::webhooks::{WebhookError, WebhookOutcome};

/// Header carrying the HMAC-SHA256 signature of the raw body.
pub const SIGNATURE_HEADER: &str = "X-Notion-Signature";

/// Acknowledgement returned for accepted webhook requests
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WebhookAck {
    /// Outcome description
    #[schema(example = "Webhook event processed successfully")]
    pub message: String,
    /// Verification token, echoed back only during the endpoint handshake
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Receive a Notion webhook delivery
///
/// Verification handshakes are acknowledged with their token and never reach
/// the event bus; change notifications are wrapped into an event and
/// published.
#[utoipa::path(
    post,
    path = "/webhooks/notion",
    params(
        ("X-Notion-Signature" = Option<String>, Header, description = "HMAC-SHA256 of the raw body as `sha256=<hex>`")
    ),
    request_body(content = String, description = "Raw webhook payload (opaque to the API)", content_type = "application/json"),
    responses(
        (status = 200, description = "Handshake acknowledged or event published", body = WebhookAck),
        (status = 400, description = "Request body could not be read", body = ApiError),
        (status = 401, description = "Missing, malformed, or mismatched signature", body = ApiError),
        (status = 500, description = "Webhook secret not configured or event not publishable", body = ApiError)
    ),
    tag = "webhooks"
)]
pub async fn receive_notion_webhook(
    State(state): State<AppState>,
    req: Request,
) -> Result<Json<WebhookAck>, ApiError> {
    let signature = req
        .headers()
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    let body = axum::body::to_bytes(req.into_body(), usize::MAX)
        .await
        .map_err(|_| WebhookError::BodyUnreadable)?;

    let outcome = state.webhooks.process(signature.as_deref(), &body).await?;

    let ack = match outcome {
        WebhookOutcome::HandshakeAcknowledged { token } => WebhookAck {
            message: "Verification token received. Please use this token in your Notion \
                      integration settings."
                .to_string(),
            token: Some(token),
        },
        WebhookOutcome::NotificationPublished { .. } => WebhookAck {
            message: "Webhook event processed successfully".to_string(),
            token: None,
        },
    };

    Ok(Json(ack))
}
