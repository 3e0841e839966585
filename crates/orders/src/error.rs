//! Order error types.

use common::{Money, OrderId};
use thiserror::Error;

use crate::status::OrderStatus;

/// Errors raised by the order entity itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// Order has no items.
    #[error("Order has no items")]
    NoItems,

    /// Invalid quantity.
    #[error("Invalid quantity for {product_id}: {quantity} (must be greater than 0)")]
    InvalidQuantity { product_id: String, quantity: u32 },

    /// A line's unit price is zero or negative.
    #[error("Invalid price for {product_id}: {unit_price} (must be greater than 0)")]
    InvalidPrice { product_id: String, unit_price: Money },

    /// A line total or the order total does not fit the amount range.
    #[error("Order amount is out of range")]
    AmountOverflow,

    /// Order is not in a status that allows the requested transition.
    #[error("Invalid status transition: cannot move from {from} to {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },
}

/// Errors that can occur when interacting with the order store.
#[derive(Debug, Error)]
pub enum OrderStoreError {
    /// An order with this ID already exists.
    #[error("Order already exists: {0}")]
    AlreadyExists(OrderId),

    /// The order was not found.
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// The stored order is already terminal and may not be overwritten.
    #[error("Order {order_id} is already {status}")]
    TerminalStatus {
        order_id: OrderId,
        status: OrderStatus,
    },

    /// A stored row could not be mapped back into an order.
    #[error("Corrupt order row: {0}")]
    Corrupt(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for order store operations.
pub type Result<T> = std::result::Result<T, OrderStoreError>;
