//! # In-process event bus
//!
//! Topic-based publish/subscribe built on `tokio::sync::broadcast`, used to
//! hand accepted webhook events to in-process consumers. Suitable for
//! single-node operation; a distributed deployment would swap in a
//! broker-backed implementation behind the same [`EventPublisher`] trait.

pub mod publisher;
pub mod subscriber;
pub mod worker;

pub use publisher::{EventPublisher, InMemoryEventBus, PublishError};
pub use subscriber::{Subscription, SubscriptionError};
pub use worker::spawn_webhook_worker;

/// Default per-topic channel capacity.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// A message carried by the bus: an opaque payload plus a caller-assigned id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusMessage {
    pub id: String,
    pub payload: Vec<u8>,
}

impl BusMessage {
    pub fn new(id: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            payload,
        }
    }
}
