//! Best-effort publisher for order outcome events.

use crate::{EventChannel, EventRecord, OrderOutcomeEvent};

/// Topic carrying order outcome events.
pub const ORDER_EVENTS_TOPIC: &str = "ORDER_EVENTS";

/// Publishes order outcome events keyed by customer.
///
/// Publication never fails the caller. The order's persisted status is the
/// source of truth; a lost event only leaves a stale cart.
#[derive(Clone)]
pub struct OrderEventPublisher<E: EventChannel> {
    channel: E,
    topic: String,
}

impl<E: EventChannel> OrderEventPublisher<E> {
    /// Creates a publisher writing to [`ORDER_EVENTS_TOPIC`].
    pub fn new(channel: E) -> Self {
        Self::with_topic(channel, ORDER_EVENTS_TOPIC)
    }

    pub fn with_topic(channel: E, topic: impl Into<String>) -> Self {
        Self {
            channel,
            topic: topic.into(),
        }
    }

    pub fn channel(&self) -> &E {
        &self.channel
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Publishes an event. Returns the stored record, or `None` if
    /// publication failed (already logged).
    #[tracing::instrument(
        skip(self, event),
        fields(event_type = event.event_type(), order_id = %event.order_id(), customer = %event.customer())
    )]
    pub async fn publish(&self, event: &OrderOutcomeEvent) -> Option<EventRecord> {
        let payload = match event.encode() {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, "failed to encode order event");
                metrics::counter!("event_publish_failures_total").increment(1);
                return None;
            }
        };

        match self
            .channel
            .publish(&self.topic, event.customer().as_str(), payload)
            .await
        {
            Ok(record) => {
                tracing::info!(
                    partition = record.partition,
                    offset = record.offset,
                    "order event published"
                );
                metrics::counter!("events_published_total", "event_type" => event.event_type())
                    .increment(1);
                Some(record)
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to publish order event");
                metrics::counter!("event_publish_failures_total").increment(1);
                None
            }
        }
    }
}
