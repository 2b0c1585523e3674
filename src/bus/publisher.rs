//! # Event Publisher
//!
//! Defines the publishing side of the event bus.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::debug;

use crate::bus::{BusMessage, DEFAULT_CHANNEL_CAPACITY};

/// Errors from publish operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PublishError {
    /// Nobody is listening on the topic; the message was not enqueued.
    #[error("no subscribers for topic '{topic}'")]
    NoSubscribers { topic: String },
}

/// Trait for publishing messages to the bus.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish a message to a topic.
    ///
    /// Returns the number of subscribers that received the message. A topic
    /// without a live subscriber rejects the publish; there is no buffering
    /// for consumers that do not exist yet.
    async fn publish(&self, topic: &str, message: BusMessage) -> Result<usize, PublishError>;

    /// Total number of messages successfully published.
    fn messages_published(&self) -> u64;
}

/// In-memory implementation of the event bus.
///
/// One broadcast channel per topic, created lazily on first subscription.
pub struct InMemoryEventBus {
    topics: RwLock<HashMap<String, broadcast::Sender<BusMessage>>>,
    capacity: usize,
    messages_published: AtomicU64,
}

impl InMemoryEventBus {
    /// Create a new in-memory event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new in-memory event bus with specified per-topic capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
            capacity,
            messages_published: AtomicU64::new(0),
        }
    }

    /// Subscribe to a topic, creating its channel if this is the first
    /// subscriber.
    #[must_use]
    pub fn subscribe(&self, topic: &str) -> super::Subscription {
        let mut topics = self
            .topics
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let sender = topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0);

        debug!(topic = %topic, "New bus subscription");
        super::Subscription::new(topic.to_string(), sender.subscribe())
    }

    /// Number of live subscribers on a topic.
    #[must_use]
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(topic)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }

    /// Per-topic channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, topic: &str, message: BusMessage) -> Result<usize, PublishError> {
        let sender = self
            .topics
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(topic)
            .cloned();

        let Some(sender) = sender else {
            return Err(PublishError::NoSubscribers {
                topic: topic.to_string(),
            });
        };

        match sender.send(message) {
            Ok(receiver_count) => {
                self.messages_published.fetch_add(1, Ordering::Relaxed);
                metrics::counter!("bus_published_total", "topic" => topic.to_string()).increment(1);
                debug!(topic = %topic, receivers = receiver_count, "Message published");
                Ok(receiver_count)
            }
            // send fails only when every receiver has been dropped
            Err(_) => Err(PublishError::NoSubscribers {
                topic: topic.to_string(),
            }),
        }
    }

    fn messages_published(&self) -> u64 {
        self.messages_published.load(Ordering::Relaxed)
    }
}
