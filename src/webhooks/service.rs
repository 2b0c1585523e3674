//! Ingestion pipeline: authenticate, classify, build, publish.

use std::sync::Arc;

use crate::bus::EventPublisher;
use crate::config::AppConfig;
use crate::ids::IdSource;

use super::WebhookError;
use super::classifier::{self, RequestKind};
use super::event::EventFactory;
use super::publisher::WebhookEventPublisher;
use super::signature;

/// Result of a processed webhook request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Endpoint verification handshake; the token goes back to the caller
    /// and nothing is published.
    HandshakeAcknowledged { token: String },
    /// Change notification accepted and published to the bus.
    NotificationPublished { event_id: String },
}

/// Request-scoped webhook processing over shared, read-only collaborators.
///
/// Configuration is captured at construction; per-request state lives
/// entirely on the stack of [`process`](Self::process).
pub struct WebhookService {
    secret: Option<String>,
    factory: EventFactory,
    publisher: WebhookEventPublisher,
}

impl WebhookService {
    pub fn new(config: &AppConfig, bus: Arc<dyn EventPublisher>, ids: Arc<dyn IdSource>) -> Self {
        Self {
            secret: config.webhook_secret.clone(),
            factory: EventFactory::new(ids),
            publisher: WebhookEventPublisher::new(bus, config.webhook_topic.clone()),
        }
    }

    /// Runs the full pipeline over a captured request body.
    ///
    /// The caller reads the body exactly once; validation and classification
    /// both see those same bytes. The sequence is authenticate, classify,
    /// then either acknowledge the handshake (without touching the bus) or
    /// build and publish the event.
    pub async fn process(
        &self,
        signature_header: Option<&str>,
        body: &[u8],
    ) -> Result<WebhookOutcome, WebhookError> {
        metrics::counter!("webhooks_received_total").increment(1);

        let secret = self.secret.as_deref().unwrap_or("");
        signature::verify_signature(secret, signature_header, body)?;

        match classifier::classify(body) {
            RequestKind::Handshake { token } => {
                // Handshake tokens are meant to be surfaced to the operator.
                tracing::info!(token = %token, "Webhook verification handshake acknowledged");
                Ok(WebhookOutcome::HandshakeAcknowledged { token })
            }
            RequestKind::Notification => {
                let event = self.factory.create(body.to_vec());
                let event_id = event.id().to_string();
                self.publisher.publish(&event).await?;
                metrics::counter!("webhooks_published_total").increment(1);
                tracing::info!(
                    event_id = %event_id,
                    payload_bytes = body.len(),
                    "Webhook event published"
                );
                Ok(WebhookOutcome::NotificationPublished { event_id })
            }
        }
    }
}
