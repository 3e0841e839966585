use std::sync::Arc;

use async_trait::async_trait;
use common::OrderId;

use crate::{LedgerError, Payment};

/// Persistence for payment records.
///
/// A ledger holds at most one payment per order. The uniqueness check and
/// the write are a single atomic step, so two concurrent attempts for the
/// same order cannot both insert.
#[async_trait]
pub trait PaymentLedger: Send + Sync {
    /// Records a new `PENDING` payment.
    ///
    /// Fails with `DuplicatePayment` if the order already has a record.
    async fn insert(&self, payment: &Payment) -> Result<(), LedgerError>;

    /// Persists the resolved status of an existing payment.
    ///
    /// Fails with `AlreadyResolved` if the stored record left `PENDING`.
    async fn update(&self, payment: &Payment) -> Result<(), LedgerError>;

    /// Loads the payment recorded for an order.
    async fn find_by_order_id(&self, order_id: OrderId) -> Result<Option<Payment>, LedgerError>;
}

#[async_trait]
impl<L: PaymentLedger + ?Sized> PaymentLedger for Arc<L> {
    async fn insert(&self, payment: &Payment) -> Result<(), LedgerError> {
        (**self).insert(payment).await
    }

    async fn update(&self, payment: &Payment) -> Result<(), LedgerError> {
        (**self).update(payment).await
    }

    async fn find_by_order_id(&self, order_id: OrderId) -> Result<Option<Payment>, LedgerError> {
        (**self).find_by_order_id(order_id).await
    }
}
