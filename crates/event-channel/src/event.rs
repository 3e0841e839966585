//! The order outcome event.

use common::{CustomerId, OrderId};
use serde::{Deserialize, Serialize};

use crate::error::EventError;

/// Broadcast once per saga execution after the order reaches a terminal
/// status.
///
/// Wire form is a JSON object tagged by `eventType`:
///
/// ```json
/// {"eventType":"ORDER_CANCELLED","customer":"alice","orderId":"…","reason":"Insufficient funds"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "eventType", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderOutcomeEvent {
    #[serde(rename_all = "camelCase")]
    OrderCompleted {
        customer: CustomerId,
        order_id: OrderId,
    },

    #[serde(rename_all = "camelCase")]
    OrderCancelled {
        customer: CustomerId,
        order_id: OrderId,
        reason: String,
    },
}

impl OrderOutcomeEvent {
    pub const ORDER_COMPLETED: &'static str = "ORDER_COMPLETED";
    pub const ORDER_CANCELLED: &'static str = "ORDER_CANCELLED";

    pub fn completed(customer: CustomerId, order_id: OrderId) -> Self {
        Self::OrderCompleted { customer, order_id }
    }

    pub fn cancelled(customer: CustomerId, order_id: OrderId, reason: impl Into<String>) -> Self {
        Self::OrderCancelled {
            customer,
            order_id,
            reason: reason.into(),
        }
    }

    /// The customer this event is keyed by.
    pub fn customer(&self) -> &CustomerId {
        match self {
            Self::OrderCompleted { customer, .. } | Self::OrderCancelled { customer, .. } => {
                customer
            }
        }
    }

    pub fn order_id(&self) -> OrderId {
        match self {
            Self::OrderCompleted { order_id, .. } | Self::OrderCancelled { order_id, .. } => {
                *order_id
            }
        }
    }

    /// Returns the wire tag of this variant.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::OrderCompleted { .. } => Self::ORDER_COMPLETED,
            Self::OrderCancelled { .. } => Self::ORDER_CANCELLED,
        }
    }

    /// Serializes the event to its JSON wire form.
    pub fn encode(&self) -> Result<String, EventError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses a JSON payload.
    ///
    /// An unrecognized `eventType` is reported separately from a payload
    /// that is not an event at all, so consumers can skip newer variants
    /// without treating them as corruption.
    pub fn decode(payload: &str) -> Result<Self, EventError> {
        let value: serde_json::Value =
            serde_json::from_str(payload).map_err(|e| EventError::Malformed(e.to_string()))?;

        let tag = value
            .get("eventType")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| EventError::Malformed("missing eventType".to_string()))?;

        if tag != Self::ORDER_COMPLETED && tag != Self::ORDER_CANCELLED {
            return Err(EventError::UnknownEventType(tag.to_string()));
        }

        serde_json::from_value(value).map_err(|e| EventError::Malformed(e.to_string()))
    }
}
