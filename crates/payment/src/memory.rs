use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::OrderId;
use tokio::sync::RwLock;

use crate::{LedgerError, Payment, PaymentLedger};

/// In-memory payment ledger keyed by order.
#[derive(Clone, Default)]
pub struct InMemoryPaymentLedger {
    payments: Arc<RwLock<HashMap<OrderId, Payment>>>,
}

impl InMemoryPaymentLedger {
    /// Creates a new empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of recorded payments.
    pub async fn len(&self) -> usize {
        self.payments.read().await.len()
    }

    /// Returns true if no payment has been recorded.
    pub async fn is_empty(&self) -> bool {
        self.payments.read().await.is_empty()
    }
}

#[async_trait]
impl PaymentLedger for InMemoryPaymentLedger {
    async fn insert(&self, payment: &Payment) -> Result<(), LedgerError> {
        let mut payments = self.payments.write().await;
        if payments.contains_key(&payment.order_id) {
            return Err(LedgerError::DuplicatePayment(payment.order_id));
        }
        payments.insert(payment.order_id, payment.clone());
        Ok(())
    }

    async fn update(&self, payment: &Payment) -> Result<(), LedgerError> {
        let mut payments = self.payments.write().await;
        let stored = payments
            .get_mut(&payment.order_id)
            .filter(|p| p.id == payment.id)
            .ok_or(LedgerError::NotFound(payment.id))?;

        if stored.status.is_resolved() {
            return Err(LedgerError::AlreadyResolved(payment.id));
        }

        *stored = payment.clone();
        Ok(())
    }

    async fn find_by_order_id(&self, order_id: OrderId) -> Result<Option<Payment>, LedgerError> {
        Ok(self.payments.read().await.get(&order_id).cloned())
    }
}
