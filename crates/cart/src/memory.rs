//! In-process cart service.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use common::{CustomerId, ProductId};

use crate::{AuthContext, Cart, CartError, CartLine, CartService, Result};

#[derive(Debug, Default)]
struct CartState {
    carts: HashMap<CustomerId, Vec<CartLine>>,
    get_failure: Option<String>,
    clear_failure: Option<String>,
    get_delay: Option<Duration>,
    clears: HashMap<CustomerId, usize>,
}

/// In-memory cart service for tests and the default binary.
///
/// Adding a product already in the cart increases its quantity.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCartService {
    state: Arc<Mutex<CartState>>,
}

impl InMemoryCartService {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, CartState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a line to the customer's cart.
    pub fn add_line(&self, customer_id: &CustomerId, line: CartLine) {
        let mut state = self.state();
        let lines = state.carts.entry(customer_id.clone()).or_default();
        match lines.iter_mut().find(|l| l.product_id == line.product_id) {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(line.quantity);
            }
            None => lines.push(line),
        }
    }

    /// Removes a product from the customer's cart.
    pub fn remove_line(&self, customer_id: &CustomerId, product_id: &ProductId) {
        if let Some(lines) = self.state().carts.get_mut(customer_id) {
            lines.retain(|l| &l.product_id != product_id);
        }
    }

    /// Returns the customer's current lines.
    pub fn lines(&self, customer_id: &CustomerId) -> Vec<CartLine> {
        self.state()
            .carts
            .get(customer_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Makes every `get_cart` fail with the given message; `None` resets.
    pub fn set_get_failure(&self, message: Option<&str>) {
        self.state().get_failure = message.map(str::to_string);
    }

    /// Makes every `clear_cart` fail with the given message; `None` resets.
    pub fn set_clear_failure(&self, message: Option<&str>) {
        self.state().clear_failure = message.map(str::to_string);
    }

    /// Delays every `get_cart`, to exercise caller timeouts.
    pub fn set_get_delay(&self, delay: Option<Duration>) {
        self.state().get_delay = delay;
    }

    /// Returns how many times the customer's cart was cleared.
    pub fn clear_count(&self, customer_id: &CustomerId) -> usize {
        self.state().clears.get(customer_id).copied().unwrap_or(0)
    }
}

#[async_trait]
impl CartService for InMemoryCartService {
    async fn get_cart(&self, customer_id: &CustomerId, _auth: &AuthContext) -> Result<Option<Cart>> {
        let delay = self.state().get_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let state = self.state();
        if let Some(message) = &state.get_failure {
            return Err(CartError::Unavailable(message.clone()));
        }
        Ok(state.carts.get(customer_id).cloned().map(Cart::new))
    }

    async fn clear_cart(&self, customer_id: &CustomerId) -> Result<()> {
        let mut state = self.state();
        if let Some(message) = &state.clear_failure {
            return Err(CartError::Unavailable(message.clone()));
        }
        if let Some(lines) = state.carts.get_mut(customer_id) {
            lines.clear();
        }
        *state.clears.entry(customer_id.clone()).or_default() += 1;
        Ok(())
    }
}
