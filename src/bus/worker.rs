//! Background consumer for accepted webhook events.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::bus::InMemoryEventBus;

/// Spawns the webhook consumer task.
///
/// The subscription is taken before this function returns, so by the time the
/// caller binds its listener the topic already has a live subscriber and
/// publishes can succeed. The task runs until `shutdown` is cancelled or the
/// bus is dropped.
pub fn spawn_webhook_worker(
    bus: Arc<InMemoryEventBus>,
    topic: &str,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    let mut subscription = bus.subscribe(topic);
    let topic = topic.to_string();

    tokio::spawn(async move {
        tracing::info!(topic = %topic, "Webhook worker started");
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!(topic = %topic, "Webhook worker stopping");
                    break;
                }
                message = subscription.recv() => {
                    match message {
                        Some(message) => {
                            tracing::info!(
                                event_id = %message.id,
                                payload_bytes = message.payload.len(),
                                "Webhook event consumed"
                            );
                            metrics::counter!("webhook_events_consumed_total").increment(1);
                        }
                        None => {
                            tracing::warn!(topic = %topic, "Event bus closed, webhook worker exiting");
                            break;
                        }
                    }
                }
            }
        }
    })
}
