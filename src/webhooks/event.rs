//! Domain event wrapping an accepted webhook payload.

use std::sync::Arc;

use crate::ids::IdSource;

/// Immutable event built from a raw webhook payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookEvent {
    id: String,
    payload: Vec<u8>,
}

impl WebhookEvent {
    /// The event's unique id (`webhook_<uuid>`).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The original payload bytes, untouched.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

/// Builds webhook events with ids from an injected id source.
///
/// The factory keeps no state of its own: uniqueness is entirely the id
/// source's concern, and nothing is cached between calls.
pub struct EventFactory {
    ids: Arc<dyn IdSource>,
}

impl EventFactory {
    pub fn new(ids: Arc<dyn IdSource>) -> Self {
        Self { ids }
    }

    /// Wraps a payload into an event with a fresh `webhook_`-prefixed id.
    pub fn create(&self, payload: Vec<u8>) -> WebhookEvent {
        WebhookEvent {
            id: self.ids.new_id("webhook"),
            payload,
        }
    }
}
