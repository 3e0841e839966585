//! Reacts to order outcome events by clearing carts.

use common::CustomerId;
use event_channel::{EventError, EventRecord, OrderOutcomeEvent};

use crate::CartService;

/// What the consumer did with one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsumeOutcome {
    /// The order completed and the cart was cleared.
    Cleared(CustomerId),

    /// The order was cancelled; the cart is left for a retry.
    Kept(CustomerId),

    /// The order completed but clearing the cart failed.
    ClearFailed(CustomerId),

    /// The payload was empty, malformed, or of an unknown type.
    Skipped,
}

/// Clears a customer's cart once their order is paid.
///
/// A cancelled order keeps the cart intact so the customer can check out
/// again without re-adding items. No record is ever fatal to the consumer.
#[derive(Clone)]
pub struct CartClearingConsumer<C: CartService> {
    carts: C,
}

impl<C: CartService> CartClearingConsumer<C> {
    pub fn new(carts: C) -> Self {
        Self { carts }
    }

    /// Handles one record from the order events topic.
    #[tracing::instrument(skip(self, record), fields(partition = record.partition, offset = record.offset))]
    pub async fn handle(&self, record: &EventRecord) -> ConsumeOutcome {
        if record.payload.trim().is_empty() {
            tracing::warn!("empty order event payload, ignoring");
            return ConsumeOutcome::Skipped;
        }

        let event = match OrderOutcomeEvent::decode(&record.payload) {
            Ok(event) => event,
            Err(EventError::UnknownEventType(event_type)) => {
                tracing::warn!(%event_type, "unknown order event type, ignoring");
                return ConsumeOutcome::Skipped;
            }
            Err(e) => {
                tracing::error!(error = %e, payload = %record.payload, "failed to parse order event");
                return ConsumeOutcome::Skipped;
            }
        };

        match event {
            OrderOutcomeEvent::OrderCompleted { customer, order_id } => {
                match self.carts.clear_cart(&customer).await {
                    Ok(()) => {
                        tracing::info!(%order_id, %customer, "cleared cart after order completion");
                        metrics::counter!("carts_cleared_total").increment(1);
                        ConsumeOutcome::Cleared(customer)
                    }
                    Err(e) => {
                        tracing::error!(%order_id, %customer, error = %e, "failed to clear cart");
                        ConsumeOutcome::ClearFailed(customer)
                    }
                }
            }
            OrderOutcomeEvent::OrderCancelled {
                customer,
                order_id,
                reason,
            } => {
                tracing::info!(%order_id, %customer, %reason, "order cancelled, keeping cart");
                ConsumeOutcome::Kept(customer)
            }
        }
    }
}
