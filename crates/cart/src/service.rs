use std::sync::Arc;

use async_trait::async_trait;
use common::CustomerId;

use crate::{AuthContext, Cart, Result};

/// Contract of the external cart service.
///
/// Implementations make a single attempt; callers bound them with a timeout.
#[async_trait]
pub trait CartService: Send + Sync {
    /// Fetches the customer's current cart. `None` means the customer has
    /// no cart.
    async fn get_cart(&self, customer_id: &CustomerId, auth: &AuthContext) -> Result<Option<Cart>>;

    /// Removes every line from the customer's cart. Clearing an empty or
    /// missing cart succeeds.
    async fn clear_cart(&self, customer_id: &CustomerId) -> Result<()>;
}

#[async_trait]
impl<C: CartService + ?Sized> CartService for Arc<C> {
    async fn get_cart(&self, customer_id: &CustomerId, auth: &AuthContext) -> Result<Option<Cart>> {
        (**self).get_cart(customer_id, auth).await
    }

    async fn clear_cart(&self, customer_id: &CustomerId) -> Result<()> {
        (**self).clear_cart(customer_id).await
    }
}
