//! # Notion webhook ingestion
//!
//! The pipeline behind `POST /webhooks/notion`: verify the HMAC signature
//! over the raw body, classify the request (verification handshake vs change
//! notification), wrap notifications into domain events, and publish them to
//! the in-process bus. Handshakes are acknowledged and never published.

pub mod classifier;
pub mod error;
pub mod event;
pub mod publisher;
pub mod service;
pub mod signature;

pub use classifier::{RequestKind, classify};
pub use error::WebhookError;
pub use event::{EventFactory, WebhookEvent};
pub use publisher::WebhookEventPublisher;
pub use service::{WebhookOutcome, WebhookService};
