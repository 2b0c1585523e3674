//! Publishes webhook events to the bus in the wire envelope.

use std::sync::Arc;

use serde::Serialize;
use serde_json::value::RawValue;

use crate::bus::{BusMessage, EventPublisher};

use super::{WebhookError, WebhookEvent};

/// Wire envelope for webhook events. The payload rides along verbatim as raw
/// JSON so consumers see exactly the bytes Notion sent.
#[derive(Serialize)]
struct NotionWebhookReceived<'a> {
    payload: &'a RawValue,
}

/// Serializes events and hands them to the bus on one fixed topic.
pub struct WebhookEventPublisher {
    bus: Arc<dyn EventPublisher>,
    topic: String,
}

impl WebhookEventPublisher {
    pub fn new(bus: Arc<dyn EventPublisher>, topic: impl Into<String>) -> Self {
        Self {
            bus,
            topic: topic.into(),
        }
    }

    /// The topic all events go to.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Publishes exactly one message per call; no batching, no retry.
    ///
    /// A payload that is not valid JSON cannot be framed and fails with
    /// `SerializationFailed` before anything reaches the bus.
    pub async fn publish(&self, event: &WebhookEvent) -> Result<(), WebhookError> {
        let raw: &RawValue = serde_json::from_slice(event.payload())?;
        let envelope = serde_json::to_vec(&NotionWebhookReceived { payload: raw })?;

        self.bus
            .publish(&self.topic, BusMessage::new(event.id(), envelope))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::InMemoryEventBus;
    use crate::ids::UuidIdSource;
    use crate::webhooks::EventFactory;

    fn factory() -> EventFactory {
        EventFactory::new(Arc::new(UuidIdSource))
    }

    #[tokio::test]
    async fn envelope_wraps_payload_verbatim() {
        let bus = Arc::new(InMemoryEventBus::new());
        let mut sub = bus.subscribe("notion.webhook.received");
        let publisher = WebhookEventPublisher::new(
            Arc::clone(&bus) as Arc<dyn EventPublisher>,
            "notion.webhook.received",
        );

        let payload = br#"{"type":"page.created","entity":{"id":"p-1"}}"#;
        let event = factory().create(payload.to_vec());

        publisher.publish(&event).await.expect("publish succeeds");

        let message = sub.try_recv().expect("not closed").expect("message");
        assert_eq!(message.id, event.id());

        let expected = format!(r#"{{"payload":{}}}"#, std::str::from_utf8(payload).unwrap());
        assert_eq!(message.payload, expected.as_bytes());
    }

    #[tokio::test]
    async fn invalid_json_payload_fails_before_the_bus() {
        let bus = Arc::new(InMemoryEventBus::new());
        let mut sub = bus.subscribe("notion.webhook.received");
        let publisher = WebhookEventPublisher::new(
            Arc::clone(&bus) as Arc<dyn EventPublisher>,
            "notion.webhook.received",
        );

        let event = factory().create(b"not json".to_vec());

        let result = publisher.publish(&event).await;

        assert!(matches!(result, Err(WebhookError::SerializationFailed(_))));
        assert_eq!(sub.try_recv().expect("not closed"), None);
    }

    #[tokio::test]
    async fn missing_subscriber_is_publish_rejected() {
        let bus = Arc::new(InMemoryEventBus::new());
        let publisher = WebhookEventPublisher::new(
            Arc::clone(&bus) as Arc<dyn EventPublisher>,
            "notion.webhook.received",
        );

        let event = factory().create(b"{}".to_vec());

        let result = publisher.publish(&event).await;

        assert!(matches!(result, Err(WebhookError::PublishRejected(_))));
    }
}
