use std::sync::Arc;

use async_trait::async_trait;
use common::{CustomerId, OrderId};

use crate::{Order, Result};

/// Persistence for orders.
///
/// The store is the source of truth for an order's status. Implementations
/// must refuse to overwrite an order whose stored status is already terminal,
/// so a terminal order reads the same forever.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a new order together with its line items.
    ///
    /// Fails with `AlreadyExists` if the ID is taken.
    async fn insert(&self, order: &Order) -> Result<()>;

    /// Persists the status, payment reference and failure reason of an
    /// existing order.
    ///
    /// Fails with `NotFound` for unknown orders and `TerminalStatus` if the
    /// stored order is already `Paid` or `Cancelled`.
    async fn update_status(&self, order: &Order) -> Result<()>;

    /// Loads an order by ID.
    async fn get(&self, order_id: OrderId) -> Result<Option<Order>>;

    /// Lists a customer's orders, newest first.
    async fn find_by_customer(&self, customer_id: &CustomerId) -> Result<Vec<Order>>;

    /// Returns the number of stored orders.
    async fn count(&self) -> Result<usize>;
}

#[async_trait]
impl<S: OrderStore + ?Sized> OrderStore for Arc<S> {
    async fn insert(&self, order: &Order) -> Result<()> {
        (**self).insert(order).await
    }

    async fn update_status(&self, order: &Order) -> Result<()> {
        (**self).update_status(order).await
    }

    async fn get(&self, order_id: OrderId) -> Result<Option<Order>> {
        (**self).get(order_id).await
    }

    async fn find_by_customer(&self, customer_id: &CustomerId) -> Result<Vec<Order>> {
        (**self).find_by_customer(customer_id).await
    }

    async fn count(&self) -> Result<usize> {
        (**self).count().await
    }
}
