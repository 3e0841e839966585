//! Integration tests for the order placement saga.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cart::{
    AuthContext, CartClearingConsumer, CartLine, ConsumerRunner, InMemoryCartService,
};
use common::{CustomerId, Money, OrderId};
use event_channel::{
    EventChannel, InMemoryEventChannel, ORDER_EVENTS_TOPIC, OrderEventPublisher,
    OrderOutcomeEvent,
};
use orders::{
    InMemoryOrderStore, Order, OrderError, OrderStatus, OrderStore, OrderStoreError,
};
use payment::{
    InMemoryPaymentLedger, PaymentLedger, PaymentOutcome, PaymentProcessor, PaymentRequest,
    PaymentStatus, ScriptedGateway,
};
use saga::{
    LocalPaymentClient, OrderSaga, PAYMENT_SERVICE_UNAVAILABLE, PaymentClient,
    PaymentClientError, SagaConfig, SagaError,
};

type Payments = LocalPaymentClient<InMemoryPaymentLedger, ScriptedGateway>;
type TestSaga = OrderSaga<InMemoryOrderStore, InMemoryCartService, Payments, InMemoryEventChannel>;

struct TestHarness {
    saga: Arc<TestSaga>,
    orders: InMemoryOrderStore,
    carts: InMemoryCartService,
    ledger: InMemoryPaymentLedger,
    gateway: ScriptedGateway,
    channel: InMemoryEventChannel,
}

impl TestHarness {
    fn new() -> Self {
        Self::with_config(SagaConfig::default())
    }

    fn with_config(config: SagaConfig) -> Self {
        let orders = InMemoryOrderStore::new();
        let carts = InMemoryCartService::new();
        let ledger = InMemoryPaymentLedger::new();
        let gateway = ScriptedGateway::new();
        let channel = InMemoryEventChannel::new(4);

        let processor = Arc::new(PaymentProcessor::new(ledger.clone(), gateway.clone()));
        let saga = OrderSaga::with_config(
            orders.clone(),
            carts.clone(),
            LocalPaymentClient::new(processor),
            OrderEventPublisher::new(channel.clone()),
            config,
        );

        Self {
            saga: Arc::new(saga),
            orders,
            carts,
            ledger,
            gateway,
            channel,
        }
    }

    /// Keyboard 10.00 x2 + Mouse pad 5.50 x1 = 25.50
    fn fill_cart(&self, customer: &CustomerId) {
        self.carts
            .add_line(customer, CartLine::new("1", "Keyboard", Money::from_cents(1000), 2));
        self.carts
            .add_line(customer, CartLine::new("2", "Mouse pad", Money::from_cents(550), 1));
    }

    async fn events(&self) -> Vec<OrderOutcomeEvent> {
        self.channel
            .records(ORDER_EVENTS_TOPIC)
            .await
            .iter()
            .map(|r| OrderOutcomeEvent::decode(&r.payload).unwrap())
            .collect()
    }
}

fn alice() -> CustomerId {
    CustomerId::new("alice")
}

async fn place(h: &TestHarness, customer: &CustomerId) -> Result<Order, SagaError> {
    h.saga
        .place_order(customer, &AuthContext::bearer("token"))
        .await
}

#[tokio::test]
async fn test_approved_payment_marks_order_paid_and_emits_completed() {
    let h = TestHarness::new();
    h.fill_cart(&alice());

    let order = place(&h, &alice()).await.unwrap();

    assert_eq!(order.status(), OrderStatus::Paid);
    assert_eq!(order.total_amount(), Money::from_cents(2550));
    assert_eq!(order.total_amount().to_decimal_string(), "25.50");
    assert!(order.failure_reason().is_none());

    let stored = h.orders.get(order.id()).await.unwrap().unwrap();
    assert_eq!(stored, order);

    let payment = h.ledger.find_by_order_id(order.id()).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Success);
    assert_eq!(payment.amount, order.total_amount());
    assert_eq!(order.payment_id(), payment.transaction_id.as_deref());

    assert_eq!(
        h.events().await,
        vec![OrderOutcomeEvent::completed(alice(), order.id())]
    );
}

#[tokio::test]
async fn test_decline_cancels_order_with_reason_and_keeps_cart() {
    let h = TestHarness::new();
    h.fill_cart(&alice());
    h.gateway.decline_next("Insufficient funds");

    let order = place(&h, &alice()).await.unwrap();

    assert_eq!(order.status(), OrderStatus::Cancelled);
    assert_eq!(order.failure_reason(), Some("Insufficient funds"));
    assert!(order.payment_id().is_none());

    assert_eq!(
        h.events().await,
        vec![OrderOutcomeEvent::cancelled(
            alice(),
            order.id(),
            "Insufficient funds"
        )]
    );
    assert_eq!(h.carts.lines(&alice()).len(), 2);
    assert_eq!(h.carts.clear_count(&alice()), 0);
}

#[tokio::test(start_paused = true)]
async fn test_payment_timeout_cancels_with_generic_reason() {
    let h = TestHarness::with_config(SagaConfig {
        cart_timeout: Duration::from_secs(5),
        payment_timeout: Duration::from_millis(200),
    });
    h.fill_cart(&alice());
    h.gateway.set_delay(Duration::from_secs(60));

    let order = place(&h, &alice()).await.unwrap();

    assert_eq!(order.status(), OrderStatus::Cancelled);
    assert_eq!(order.failure_reason(), Some(PAYMENT_SERVICE_UNAVAILABLE));
    let stored = h.orders.get(order.id()).await.unwrap().unwrap();
    assert_eq!(stored.status(), OrderStatus::Cancelled);
}

struct FailingPaymentClient;

#[async_trait]
impl PaymentClient for FailingPaymentClient {
    async fn process_payment(
        &self,
        _request: PaymentRequest,
    ) -> Result<PaymentOutcome, PaymentClientError> {
        Err(PaymentClientError::Unavailable("connection refused".to_string()))
    }
}

#[tokio::test]
async fn test_payment_error_cancels_and_never_leaves_order_pending() {
    let orders = InMemoryOrderStore::new();
    let carts = InMemoryCartService::new();
    let channel = InMemoryEventChannel::new(2);
    let saga = OrderSaga::new(
        orders.clone(),
        carts.clone(),
        FailingPaymentClient,
        OrderEventPublisher::new(channel.clone()),
    );
    carts.add_line(&alice(), CartLine::new("1", "Keyboard", Money::from_cents(1000), 1));

    let order = saga
        .place_order(&alice(), &AuthContext::anonymous())
        .await
        .unwrap();

    assert_eq!(order.status(), OrderStatus::Cancelled);
    assert_eq!(order.failure_reason(), Some(PAYMENT_SERVICE_UNAVAILABLE));
    let stored = orders.get(order.id()).await.unwrap().unwrap();
    assert_eq!(stored.status(), OrderStatus::Cancelled);
    assert_eq!(channel.record_count(ORDER_EVENTS_TOPIC).await, 1);
}

#[tokio::test]
async fn test_empty_or_missing_cart_creates_no_order() {
    let h = TestHarness::new();

    let missing = place(&h, &alice()).await;
    assert!(matches!(missing, Err(SagaError::EmptyCart)));

    h.fill_cart(&alice());
    h.carts.remove_line(&alice(), &"1".into());
    h.carts.remove_line(&alice(), &"2".into());
    let empty = place(&h, &alice()).await;
    assert!(matches!(empty, Err(SagaError::EmptyCart)));

    assert_eq!(h.orders.count().await.unwrap(), 0);
    assert!(h.ledger.is_empty().await);
    assert_eq!(h.gateway.request_count(), 0);
    assert!(h.events().await.is_empty());
}

#[tokio::test]
async fn test_cart_failure_is_fatal_before_order_exists() {
    let h = TestHarness::new();
    h.fill_cart(&alice());
    h.carts.set_get_failure(Some("connection refused"));

    let result = place(&h, &alice()).await;

    assert!(matches!(result, Err(SagaError::CartUnavailable(_))));
    assert_eq!(h.orders.count().await.unwrap(), 0);
    assert_eq!(h.gateway.request_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_cart_timeout_is_cart_unavailable() {
    let h = TestHarness::with_config(SagaConfig {
        cart_timeout: Duration::from_millis(100),
        payment_timeout: Duration::from_secs(10),
    });
    h.fill_cart(&alice());
    h.carts.set_get_delay(Some(Duration::from_secs(30)));

    let result = place(&h, &alice()).await;

    assert!(matches!(result, Err(SagaError::CartUnavailable(_))));
    assert_eq!(h.orders.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_zero_quantity_line_is_invalid_cart() {
    let h = TestHarness::new();
    h.carts
        .add_line(&alice(), CartLine::new("1", "Keyboard", Money::from_cents(1000), 0));

    let result = place(&h, &alice()).await;

    assert!(matches!(result, Err(SagaError::InvalidCart(_))));
    assert_eq!(h.orders.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_non_positive_price_is_invalid_cart() {
    let h = TestHarness::new();
    h.carts
        .add_line(&alice(), CartLine::new("1", "Keyboard", Money::from_cents(1000), 1));
    h.carts
        .add_line(&alice(), CartLine::new("2", "Coupon", Money::from_cents(-500), 1));

    let result = place(&h, &alice()).await;

    assert!(matches!(
        result,
        Err(SagaError::InvalidCart(OrderError::InvalidPrice { .. }))
    ));
    assert_eq!(h.orders.count().await.unwrap(), 0);
    assert!(h.ledger.is_empty().await);
    assert_eq!(h.gateway.request_count(), 0);
    assert!(h.events().await.is_empty());
}

#[tokio::test]
async fn test_overflowing_cart_total_is_invalid_cart() {
    let h = TestHarness::new();
    let line: CartLine = serde_json::from_str(
        r#"{"productId":1,"productName":"Keyboard","price":"92233720368547758.07","quantity":2}"#,
    )
    .unwrap();
    h.carts.add_line(&alice(), line);

    let result = place(&h, &alice()).await;

    assert!(matches!(
        result,
        Err(SagaError::InvalidCart(OrderError::AmountOverflow))
    ));
    assert_eq!(h.orders.count().await.unwrap(), 0);
    assert!(h.events().await.is_empty());
}

#[tokio::test]
async fn test_order_keeps_price_snapshot_after_cart_changes() {
    let h = TestHarness::new();
    h.fill_cart(&alice());

    let order = place(&h, &alice()).await.unwrap();

    h.carts.remove_line(&alice(), &"1".into());
    h.carts
        .add_line(&alice(), CartLine::new("1", "Keyboard v2", Money::from_cents(9999), 1));

    let stored = h.saga.get_order(order.id()).await.unwrap().unwrap();
    assert_eq!(stored.items()[0].product_name, "Keyboard");
    assert_eq!(stored.items()[0].unit_price, Money::from_cents(1000));
    assert_eq!(stored.total_amount(), Money::from_cents(2550));
}

#[tokio::test]
async fn test_publish_failure_does_not_affect_order() {
    let h = TestHarness::new();
    h.fill_cart(&alice());
    h.channel.set_fail_on_publish(true);

    let order = place(&h, &alice()).await.unwrap();

    assert_eq!(order.status(), OrderStatus::Paid);
    let stored = h.orders.get(order.id()).await.unwrap().unwrap();
    assert_eq!(stored.status(), OrderStatus::Paid);
    assert!(h.events().await.is_empty());
}

/// Sends every payment for the same fixed order id, as a retried or
/// duplicated request would.
struct FixedOrderIdClient {
    inner: Payments,
    order_id: OrderId,
}

#[async_trait]
impl PaymentClient for FixedOrderIdClient {
    async fn process_payment(
        &self,
        mut request: PaymentRequest,
    ) -> Result<PaymentOutcome, PaymentClientError> {
        request.order_id = self.order_id;
        self.inner.process_payment(request).await
    }
}

#[tokio::test]
async fn test_duplicated_payment_order_id_is_rejected_and_first_record_kept() {
    let ledger = InMemoryPaymentLedger::new();
    let gateway = ScriptedGateway::new();
    let payments = LocalPaymentClient::new(Arc::new(PaymentProcessor::new(
        ledger.clone(),
        gateway.clone(),
    )));
    let fixed = OrderId::new();

    let direct = payments
        .process_payment(PaymentRequest::new(fixed, alice(), Money::from_cents(2550)))
        .await
        .unwrap();
    let again = payments
        .process_payment(PaymentRequest::new(fixed, alice(), Money::from_cents(2550)))
        .await;
    assert!(matches!(again, Err(PaymentClientError::DuplicatePayment(id)) if id == fixed));

    // Through the saga, the duplicate cancels the second order.
    let orders = InMemoryOrderStore::new();
    let carts = InMemoryCartService::new();
    carts.add_line(&alice(), CartLine::new("1", "Keyboard", Money::from_cents(1000), 1));
    let saga = OrderSaga::new(
        orders.clone(),
        carts,
        FixedOrderIdClient {
            inner: payments.clone(),
            order_id: fixed,
        },
        OrderEventPublisher::new(InMemoryEventChannel::new(1)),
    );
    let order = saga
        .place_order(&alice(), &AuthContext::anonymous())
        .await
        .unwrap();
    assert_eq!(order.status(), OrderStatus::Cancelled);

    let record = ledger.find_by_order_id(fixed).await.unwrap().unwrap();
    assert_eq!(record.id, direct.payment_id);
    assert_eq!(record.status, PaymentStatus::Success);
    assert_eq!(ledger.len().await, 1);
    assert_eq!(gateway.request_count(), 1);
}

/// Wraps the in-memory store and fails every status update.
#[derive(Clone)]
struct FailingUpdateStore {
    inner: InMemoryOrderStore,
}

#[async_trait]
impl OrderStore for FailingUpdateStore {
    async fn insert(&self, order: &Order) -> orders::Result<()> {
        self.inner.insert(order).await
    }

    async fn update_status(&self, order: &Order) -> orders::Result<()> {
        Err(OrderStoreError::Corrupt(format!(
            "simulated write failure for {}",
            order.id()
        )))
    }

    async fn get(&self, order_id: OrderId) -> orders::Result<Option<Order>> {
        self.inner.get(order_id).await
    }

    async fn find_by_customer(&self, customer_id: &CustomerId) -> orders::Result<Vec<Order>> {
        self.inner.find_by_customer(customer_id).await
    }

    async fn count(&self) -> orders::Result<usize> {
        self.inner.count().await
    }
}

#[tokio::test]
async fn test_terminal_write_failure_surfaces_and_publishes_nothing() {
    let inner = InMemoryOrderStore::new();
    let carts = InMemoryCartService::new();
    let channel = InMemoryEventChannel::new(2);
    carts.add_line(&alice(), CartLine::new("1", "Keyboard", Money::from_cents(1000), 1));
    let saga = OrderSaga::new(
        FailingUpdateStore {
            inner: inner.clone(),
        },
        carts,
        LocalPaymentClient::new(Arc::new(PaymentProcessor::new(
            InMemoryPaymentLedger::new(),
            ScriptedGateway::new(),
        ))),
        OrderEventPublisher::new(channel.clone()),
    );

    let result = saga.place_order(&alice(), &AuthContext::anonymous()).await;

    assert!(matches!(result, Err(SagaError::Store(_))));
    assert_eq!(inner.count().await.unwrap(), 1);
    assert_eq!(channel.record_count(ORDER_EVENTS_TOPIC).await, 0);
}

#[tokio::test]
async fn test_orders_for_customer_lists_history() {
    let h = TestHarness::new();
    h.fill_cart(&alice());
    h.gateway.decline_next("Card declined");

    let cancelled = place(&h, &alice()).await.unwrap();
    let paid = place(&h, &alice()).await.unwrap();

    let history = h.saga.orders_for_customer(&alice()).await.unwrap();
    let ids: Vec<_> = history.iter().map(Order::id).collect();
    assert_eq!(history.len(), 2);
    assert!(ids.contains(&cancelled.id()));
    assert!(ids.contains(&paid.id()));
    assert!(h.saga.orders_for_customer(&"bob".into()).await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_placements_for_one_customer_are_not_serialized() {
    let h = TestHarness::new();
    h.fill_cart(&alice());

    let placements = (0..2).map(|_| {
        let saga = Arc::clone(&h.saga);
        tokio::spawn(async move { saga.place_order(&alice(), &AuthContext::anonymous()).await })
    });
    let results = futures_util::future::join_all(placements).await;

    // Both see the same cart snapshot: two distinct paid orders, two payments.
    let orders: Vec<Order> = results
        .into_iter()
        .map(|r| r.unwrap().unwrap())
        .collect();
    assert_ne!(orders[0].id(), orders[1].id());
    assert!(orders.iter().all(|o| o.status() == OrderStatus::Paid));
    assert!(orders.iter().all(|o| o.total_amount() == Money::from_cents(2550)));
    assert_eq!(h.ledger.len().await, 2);
}

#[tokio::test]
async fn test_consumer_clears_cart_only_for_completed_orders() {
    let h = TestHarness::new();
    let bob = CustomerId::new("bob");
    h.fill_cart(&alice());
    h.fill_cart(&bob);

    let runner = ConsumerRunner::new(
        h.channel.clone(),
        CartClearingConsumer::new(h.carts.clone()),
    );
    let offsets = runner.offsets();
    let (stop, shutdown) = tokio::sync::watch::channel(false);
    let handle = runner.spawn(shutdown);

    place(&h, &alice()).await.unwrap();
    h.gateway.decline_next("Insufficient funds");
    place(&h, &bob).await.unwrap();

    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let consumed: u64 = offsets
                .iter()
                .map(|o| o.load(std::sync::atomic::Ordering::SeqCst))
                .sum();
            if consumed >= 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    assert!(h.carts.lines(&alice()).is_empty());
    assert_eq!(h.carts.lines(&bob).len(), 2);
    assert_eq!(h.channel.partition_count(), 4);

    stop.send(true).unwrap();
    handle.await.unwrap();
}
