//! The order placement saga.

use std::time::{Duration, Instant};

use cart::{AuthContext, CartService};
use common::{CustomerId, OrderId};
use event_channel::{EventChannel, OrderEventPublisher, OrderOutcomeEvent};
use orders::{Order, OrderError, OrderItem, OrderStatus, OrderStore};
use payment::{PaymentOutcome, PaymentRequest};

use crate::{PaymentClient, PaymentClientError, Result, SagaError};

/// Failure reason recorded when the payment endpoint errors or times out.
pub const PAYMENT_SERVICE_UNAVAILABLE: &str = "Payment service unavailable";

/// Timeouts for the saga's two network calls.
#[derive(Debug, Clone)]
pub struct SagaConfig {
    pub cart_timeout: Duration,
    pub payment_timeout: Duration,
}

impl Default for SagaConfig {
    fn default() -> Self {
        Self {
            cart_timeout: Duration::from_secs(5),
            payment_timeout: Duration::from_secs(10),
        }
    }
}

/// How the payment step ended.
enum PaymentResult {
    Approved(String),
    Declined(String),
}

/// Orchestrates order placement.
///
/// The order store is the only state the saga writes directly. Payments go
/// through the [`PaymentClient`]; cart cleanup happens downstream of the
/// outcome event.
pub struct OrderSaga<O, C, P, E>
where
    O: OrderStore,
    C: CartService,
    P: PaymentClient,
    E: EventChannel,
{
    orders: O,
    carts: C,
    payments: P,
    publisher: OrderEventPublisher<E>,
    config: SagaConfig,
}

impl<O, C, P, E> OrderSaga<O, C, P, E>
where
    O: OrderStore,
    C: CartService,
    P: PaymentClient,
    E: EventChannel,
{
    /// Creates a saga with the default timeouts.
    pub fn new(orders: O, carts: C, payments: P, publisher: OrderEventPublisher<E>) -> Self {
        Self::with_config(orders, carts, payments, publisher, SagaConfig::default())
    }

    pub fn with_config(
        orders: O,
        carts: C,
        payments: P,
        publisher: OrderEventPublisher<E>,
        config: SagaConfig,
    ) -> Self {
        Self {
            orders,
            carts,
            payments,
            publisher,
            config,
        }
    }

    pub fn orders(&self) -> &O {
        &self.orders
    }

    /// Places an order for the customer's current cart.
    ///
    /// Returns the order in a terminal status. Errors are returned only when
    /// no order was created (`EmptyCart`, `CartUnavailable`, `InvalidCart`)
    /// or when the order store itself fails.
    #[tracing::instrument(skip(self, auth), fields(customer = %customer_id))]
    pub async fn place_order(&self, customer_id: &CustomerId, auth: &AuthContext) -> Result<Order> {
        metrics::counter!("saga_executions_total").increment(1);
        let saga_start = Instant::now();

        let result = self.run(customer_id, auth).await;

        metrics::histogram!("saga_duration_seconds").record(saga_start.elapsed().as_secs_f64());
        result
    }

    async fn run(&self, customer_id: &CustomerId, auth: &AuthContext) -> Result<Order> {
        // 1. Snapshot the cart
        let items = self.fetch_cart_items(customer_id, auth).await?;

        // 2. Build and persist the PENDING order
        let mut order = Order::from_cart(customer_id.clone(), items).map_err(|e| match e {
            OrderError::NoItems => SagaError::EmptyCart,
            other => SagaError::InvalidCart(other),
        })?;
        self.orders.insert(&order).await?;
        tracing::info!(order_id = %order.id(), total = %order.total_amount(), "order created");

        // 3. Pay, then record the terminal status
        let event = match self.pay(&order).await {
            PaymentResult::Approved(transaction_id) => {
                order
                    .mark_paid(transaction_id)
                    .map_err(SagaError::InvalidTransition)?;
                OrderOutcomeEvent::completed(customer_id.clone(), order.id())
            }
            PaymentResult::Declined(reason) => {
                order
                    .cancel(reason.clone())
                    .map_err(SagaError::InvalidTransition)?;
                OrderOutcomeEvent::cancelled(customer_id.clone(), order.id(), reason)
            }
        };

        if let Err(e) = self.orders.update_status(&order).await {
            tracing::error!(order_id = %order.id(), error = %e, "failed to persist terminal status");
            return Err(e.into());
        }

        match order.status() {
            OrderStatus::Paid => {
                tracing::info!(order_id = %order.id(), "order paid");
                metrics::counter!("orders_paid_total").increment(1);
            }
            _ => {
                tracing::warn!(
                    order_id = %order.id(),
                    reason = order.failure_reason().unwrap_or_default(),
                    "order cancelled"
                );
                metrics::counter!("orders_cancelled_total").increment(1);
            }
        }

        // 4. Notify, only after the terminal status is durable
        self.publisher.publish(&event).await;

        Ok(order)
    }

    async fn fetch_cart_items(
        &self,
        customer_id: &CustomerId,
        auth: &AuthContext,
    ) -> Result<Vec<OrderItem>> {
        let cart = tokio::time::timeout(
            self.config.cart_timeout,
            self.carts.get_cart(customer_id, auth),
        )
        .await
        .map_err(|_| {
            tracing::warn!(timeout = ?self.config.cart_timeout, "cart fetch timed out");
            SagaError::CartUnavailable(format!(
                "no response within {:?}",
                self.config.cart_timeout
            ))
        })?
        .map_err(|e| {
            tracing::warn!(error = %e, "cart fetch failed");
            SagaError::CartUnavailable(e.to_string())
        })?;

        let cart = match cart {
            Some(cart) if !cart.is_empty() => cart,
            _ => return Err(SagaError::EmptyCart),
        };

        Ok(cart
            .items
            .into_iter()
            .map(|line| {
                OrderItem::new(
                    line.product_id,
                    line.product_name,
                    line.unit_price,
                    line.quantity,
                )
            })
            .collect())
    }

    /// Calls the payment endpoint. Never fails: errors and timeouts become a
    /// decline with a generic reason.
    async fn pay(&self, order: &Order) -> PaymentResult {
        let request = PaymentRequest::new(order.id(), order.customer_id().clone(), order.total_amount());

        let outcome: std::result::Result<PaymentOutcome, PaymentClientError> =
            match tokio::time::timeout(
                self.config.payment_timeout,
                self.payments.process_payment(request),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(PaymentClientError::Unavailable(format!(
                    "no response within {:?}",
                    self.config.payment_timeout
                ))),
            };

        match outcome {
            Ok(outcome) if outcome.is_success() => {
                let reference = outcome
                    .transaction_id
                    .unwrap_or_else(|| outcome.payment_id.to_string());
                PaymentResult::Approved(reference)
            }
            Ok(outcome) => {
                let reason = outcome
                    .failure_reason
                    .filter(|r| !r.trim().is_empty())
                    .unwrap_or_else(|| PAYMENT_SERVICE_UNAVAILABLE.to_string());
                tracing::warn!(order_id = %order.id(), %reason, "payment declined");
                PaymentResult::Declined(reason)
            }
            Err(e) => {
                tracing::error!(order_id = %order.id(), error = %e, "payment call failed");
                PaymentResult::Declined(PAYMENT_SERVICE_UNAVAILABLE.to_string())
            }
        }
    }

    /// Lists a customer's orders, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn orders_for_customer(&self, customer_id: &CustomerId) -> Result<Vec<Order>> {
        Ok(self.orders.find_by_customer(customer_id).await?)
    }

    /// Loads one order.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.get(order_id).await?)
    }
}
