//! Per-key ordering under concurrent publishers.

use std::collections::HashMap;

use common::{CustomerId, OrderId};
use event_channel::{
    EventChannel, InMemoryEventChannel, ORDER_EVENTS_TOPIC, OrderEventPublisher,
    OrderOutcomeEvent,
};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_each_customer_sees_events_in_emission_order() {
    let channel = InMemoryEventChannel::new(3);
    let customers = ["alice", "bob", "carol", "dave", "erin"];

    let publishers = customers.iter().map(|customer| {
        let publisher = OrderEventPublisher::new(channel.clone());
        let customer = CustomerId::new(*customer);
        tokio::spawn(async move {
            let mut emitted = Vec::new();
            for _ in 0..20 {
                let event = OrderOutcomeEvent::completed(customer.clone(), OrderId::new());
                publisher.publish(&event).await.unwrap();
                emitted.push(event.order_id());
                tokio::task::yield_now().await;
            }
            (customer, emitted)
        })
    });
    let emitted: HashMap<_, _> = futures_util::future::join_all(publishers)
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();

    let mut seen: HashMap<CustomerId, Vec<OrderId>> = HashMap::new();
    let mut partition_of: HashMap<CustomerId, u32> = HashMap::new();
    for partition in 0..channel.partition_count() {
        let records = channel
            .poll(ORDER_EVENTS_TOPIC, partition, 0, usize::MAX)
            .await
            .unwrap();
        for (expected_offset, record) in records.iter().enumerate() {
            assert_eq!(record.offset, expected_offset as u64);
            let event = OrderOutcomeEvent::decode(&record.payload).unwrap();
            let previous = partition_of.insert(event.customer().clone(), partition);
            assert!(previous.is_none_or(|p| p == partition));
            seen.entry(event.customer().clone())
                .or_default()
                .push(event.order_id());
        }
    }

    assert_eq!(seen, emitted);
}
