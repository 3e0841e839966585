use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{CustomerId, OrderId};
use tokio::sync::RwLock;

use crate::{Order, OrderStore, OrderStoreError, Result};

/// In-memory order store.
///
/// Provides the same guarantees as the PostgreSQL implementation and is used
/// by tests and by the default binary.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all orders.
    pub async fn clear(&self) {
        self.orders.write().await.clear();
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: &Order) -> Result<()> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id()) {
            return Err(OrderStoreError::AlreadyExists(order.id()));
        }
        orders.insert(order.id(), order.clone());
        Ok(())
    }

    async fn update_status(&self, order: &Order) -> Result<()> {
        let mut orders = self.orders.write().await;
        let stored = orders
            .get_mut(&order.id())
            .ok_or(OrderStoreError::NotFound(order.id()))?;

        if stored.is_terminal() {
            return Err(OrderStoreError::TerminalStatus {
                order_id: order.id(),
                status: stored.status(),
            });
        }

        *stored = order.clone();
        Ok(())
    }

    async fn get(&self, order_id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(&order_id).cloned())
    }

    async fn find_by_customer(&self, customer_id: &CustomerId) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut found: Vec<_> = orders
            .values()
            .filter(|o| o.customer_id() == customer_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then(b.id().cmp(&a.id()))
        });
        Ok(found)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.orders.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{OrderItem, OrderStatus};
    use common::Money;

    fn order_for(customer: &str) -> Order {
        Order::from_cart(
            CustomerId::new(customer),
            vec![OrderItem::new("1", "Keyboard", Money::from_cents(1000), 2)],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = InMemoryOrderStore::new();
        let order = order_for("alice");

        store.insert(&order).await.unwrap();

        let loaded = store.get(order.id()).await.unwrap().unwrap();
        assert_eq!(loaded, order);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_rejected() {
        let store = InMemoryOrderStore::new();
        let order = order_for("alice");

        store.insert(&order).await.unwrap();
        let result = store.insert(&order).await;
        assert!(matches!(result, Err(OrderStoreError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_update_status_persists_terminal_state() {
        let store = InMemoryOrderStore::new();
        let mut order = order_for("alice");
        store.insert(&order).await.unwrap();

        order.mark_paid("TXN_00000001").unwrap();
        store.update_status(&order).await.unwrap();

        let loaded = store.get(order.id()).await.unwrap().unwrap();
        assert_eq!(loaded.status(), OrderStatus::Paid);
        assert_eq!(loaded.payment_id(), Some("TXN_00000001"));
    }

    #[tokio::test]
    async fn test_terminal_order_is_never_overwritten() {
        let store = InMemoryOrderStore::new();
        let mut order = order_for("alice");
        store.insert(&order).await.unwrap();

        let mut cancelled = order.clone();
        cancelled.cancel("Card declined").unwrap();
        store.update_status(&cancelled).await.unwrap();

        order.mark_paid("TXN_LATE").unwrap();
        let result = store.update_status(&order).await;
        assert!(matches!(
            result,
            Err(OrderStoreError::TerminalStatus {
                status: OrderStatus::Cancelled,
                ..
            })
        ));

        let loaded = store.get(order.id()).await.unwrap().unwrap();
        assert_eq!(loaded.status(), OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_update_unknown_order() {
        let store = InMemoryOrderStore::new();
        let order = order_for("alice");
        let result = store.update_status(&order).await;
        assert!(matches!(result, Err(OrderStoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_find_by_customer_filters() {
        let store = InMemoryOrderStore::new();
        store.insert(&order_for("alice")).await.unwrap();
        store.insert(&order_for("alice")).await.unwrap();
        store.insert(&order_for("bob")).await.unwrap();

        let alice = store
            .find_by_customer(&CustomerId::new("alice"))
            .await
            .unwrap();
        assert_eq!(alice.len(), 2);
        assert!(alice.iter().all(|o| o.customer_id().as_str() == "alice"));
        assert!(alice[0].created_at() >= alice[1].created_at());

        let nobody = store
            .find_by_customer(&CustomerId::new("carol"))
            .await
            .unwrap();
        assert!(nobody.is_empty());
    }
}
