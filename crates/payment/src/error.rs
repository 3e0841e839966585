//! Payment error types.

use common::{Money, OrderId, PaymentId};
use thiserror::Error;

/// Errors returned by the payment endpoint.
///
/// A declined payment is not an error; it comes back as a `FAILED`
/// [`PaymentOutcome`](crate::PaymentOutcome).
#[derive(Debug, Error)]
pub enum PaymentError {
    /// A payment record already exists for this order.
    ///
    /// Signals a caller bug or a retried request; the existing record is
    /// left untouched.
    #[error("Payment already processed for order: {0}")]
    DuplicatePayment(OrderId),

    /// No payment exists for this order.
    #[error("Payment not found for order: {0}")]
    NotFound(OrderId),

    /// The requested amount is zero or negative.
    #[error("Invalid payment amount: {0} (must be greater than 0)")]
    InvalidAmount(Money),

    /// The ledger failed.
    #[error("Ledger error: {0}")]
    Ledger(LedgerError),
}

impl From<LedgerError> for PaymentError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::DuplicatePayment(order_id) => PaymentError::DuplicatePayment(order_id),
            other => PaymentError::Ledger(other),
        }
    }
}

/// Errors that can occur when interacting with the payment ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A record for this order already exists.
    #[error("Payment already recorded for order: {0}")]
    DuplicatePayment(OrderId),

    /// The payment record was not found.
    #[error("Payment not found: {0}")]
    NotFound(PaymentId),

    /// The stored record already reached `SUCCESS` or `FAILED`.
    #[error("Payment {0} is already resolved")]
    AlreadyResolved(PaymentId),

    /// A stored row could not be mapped back into a payment.
    #[error("Corrupt payment row: {0}")]
    Corrupt(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Errors raised while talking to the external payment gateway.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// The gateway could not be reached or answered with garbage.
    #[error("Gateway unavailable: {0}")]
    Unavailable(String),

    /// The gateway did not answer within the configured timeout.
    #[error("Gateway timed out after {0:?}")]
    Timeout(std::time::Duration),
}
