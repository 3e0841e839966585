//! The order entity and its line-item snapshots.

use chrono::{DateTime, Utc};
use common::{CustomerId, Money, OrderId, ProductId};
use serde::{Deserialize, Serialize};

use crate::error::OrderError;
use crate::status::OrderStatus;

/// A line of an order, copied from the cart at checkout.
///
/// Name and price are snapshots: later catalog changes never reach a
/// placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// The product identifier.
    pub product_id: ProductId,

    /// Product name at the time of ordering.
    pub product_name: String,

    /// Price per unit at the time of ordering.
    pub unit_price: Money,

    /// Quantity ordered.
    pub quantity: u32,
}

impl OrderItem {
    /// Creates a new order item.
    pub fn new(
        product_id: impl Into<ProductId>,
        product_name: impl Into<String>,
        unit_price: Money,
        quantity: u32,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            product_name: product_name.into(),
            unit_price,
            quantity,
        }
    }

    /// Returns the total price for this line (unit_price * quantity).
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// A customer order.
///
/// Items and total are fixed at construction. Only the status moves, and only
/// once: from `Pending` to `Paid` or `Cancelled`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    customer_id: CustomerId,
    items: Vec<OrderItem>,
    total_amount: Money,
    status: OrderStatus,

    /// Gateway transaction id, set when the order is paid.
    payment_id: Option<String>,

    /// Set when the order is cancelled.
    failure_reason: Option<String>,
    created_at: DateTime<Utc>,
}

impl Order {
    /// Builds a pending order from snapshotted cart lines.
    pub fn from_cart(customer_id: CustomerId, items: Vec<OrderItem>) -> Result<Self, OrderError> {
        if items.is_empty() {
            return Err(OrderError::NoItems);
        }
        if let Some(item) = items.iter().find(|item| item.quantity == 0) {
            return Err(OrderError::InvalidQuantity {
                product_id: item.product_id.to_string(),
                quantity: item.quantity,
            });
        }

        if let Some(item) = items.iter().find(|item| !item.unit_price.is_positive()) {
            return Err(OrderError::InvalidPrice {
                product_id: item.product_id.to_string(),
                unit_price: item.unit_price,
            });
        }

        let line_totals = items
            .iter()
            .map(|item| item.unit_price.checked_multiply(item.quantity))
            .collect::<Option<Vec<_>>>()
            .ok_or(OrderError::AmountOverflow)?;
        let total_amount = Money::checked_sum(line_totals).ok_or(OrderError::AmountOverflow)?;

        Ok(Self {
            id: OrderId::new(),
            customer_id,
            items,
            total_amount,
            status: OrderStatus::Pending,
            payment_id: None,
            failure_reason: None,
            created_at: Utc::now(),
        })
    }

    /// Reassembles an order from persisted columns.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        id: OrderId,
        customer_id: CustomerId,
        items: Vec<OrderItem>,
        total_amount: Money,
        status: OrderStatus,
        payment_id: Option<String>,
        failure_reason: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            customer_id,
            items,
            total_amount,
            status,
            payment_id,
            failure_reason,
            created_at,
        }
    }

    /// Records a successful payment.
    pub fn mark_paid(&mut self, transaction_id: impl Into<String>) -> Result<(), OrderError> {
        self.transition(OrderStatus::Paid)?;
        self.payment_id = Some(transaction_id.into());
        Ok(())
    }

    /// Compensates the order after a failed payment.
    pub fn cancel(&mut self, reason: impl Into<String>) -> Result<(), OrderError> {
        self.transition(OrderStatus::Cancelled)?;
        self.failure_reason = Some(reason.into());
        Ok(())
    }

    fn transition(&mut self, next: OrderStatus) -> Result<(), OrderError> {
        if !self.status.can_transition_to(next) {
            return Err(OrderError::InvalidStatusTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}

// Query methods
impl Order {
    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn customer_id(&self) -> &CustomerId {
        &self.customer_id
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Returns the gateway transaction id of the payment, if paid.
    pub fn payment_id(&self) -> Option<&str> {
        self.payment_id.as_deref()
    }

    /// Returns why the order was cancelled, if it was.
    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns true if the order is in a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
