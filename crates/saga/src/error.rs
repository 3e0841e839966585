//! Saga error types.

use common::OrderId;
use orders::{OrderError, OrderStoreError};
use thiserror::Error;

/// Errors that end an order placement before the order reaches a terminal
/// status.
#[derive(Debug, Error)]
pub enum SagaError {
    /// The customer has no cart or the cart has no lines. No order exists.
    #[error("Cart is empty")]
    EmptyCart,

    /// The cart service failed or timed out. No order exists.
    #[error("Cart service unavailable: {0}")]
    CartUnavailable(String),

    /// The cart holds a line that cannot become an order item.
    #[error("Invalid cart: {0}")]
    InvalidCart(OrderError),

    /// The order refused a status change.
    #[error("Invalid order transition: {0}")]
    InvalidTransition(OrderError),

    /// The order store failed.
    #[error("Order store error: {0}")]
    Store(#[from] OrderStoreError),
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;

/// Errors returned by a payment client.
///
/// A declined payment is not an error; it is a `FAILED` outcome.
#[derive(Debug, Error)]
pub enum PaymentClientError {
    /// The endpoint already holds a payment for this order.
    #[error("Payment already processed for order: {0}")]
    DuplicatePayment(OrderId),

    /// The endpoint refused the request as invalid.
    #[error("Payment request rejected: {0}")]
    Rejected(String),

    /// The endpoint failed or answered unexpectedly.
    #[error("Payment service unavailable: {0}")]
    Unavailable(String),

    /// The HTTP client failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}
