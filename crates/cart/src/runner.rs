//! Drives the cart-clearing consumer over every partition.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use event_channel::{EventChannel, ORDER_EVENTS_TOPIC};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::{CartClearingConsumer, CartService};

/// Consumer runner configuration.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub topic: String,

    /// Maximum records fetched per poll.
    pub batch_size: usize,

    /// Pause after a failed poll.
    pub retry_backoff: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            topic: ORDER_EVENTS_TOPIC.to_string(),
            batch_size: 64,
            retry_backoff: Duration::from_millis(250),
        }
    }
}

/// Runs one consumer task per partition.
///
/// Records within a partition are handled in order. Partitions never wait
/// on each other, so a slow customer does not hold up unrelated ones.
pub struct ConsumerRunner<E, C>
where
    E: EventChannel + Clone + 'static,
    C: CartService + Clone + 'static,
{
    channel: E,
    consumer: CartClearingConsumer<C>,
    config: RunnerConfig,
    offsets: Arc<Vec<AtomicU64>>,
}

impl<E, C> ConsumerRunner<E, C>
where
    E: EventChannel + Clone + 'static,
    C: CartService + Clone + 'static,
{
    pub fn new(channel: E, consumer: CartClearingConsumer<C>) -> Self {
        Self::with_config(channel, consumer, RunnerConfig::default())
    }

    pub fn with_config(channel: E, consumer: CartClearingConsumer<C>, config: RunnerConfig) -> Self {
        let offsets = (0..channel.partition_count())
            .map(|_| AtomicU64::new(0))
            .collect();
        Self {
            channel,
            consumer,
            config,
            offsets: Arc::new(offsets),
        }
    }

    /// Shared view of the next offset to consume, per partition.
    pub fn offsets(&self) -> Arc<Vec<AtomicU64>> {
        Arc::clone(&self.offsets)
    }

    /// Spawns the partition tasks. The returned handle completes once every
    /// task has observed `shutdown` turning `true` or its sender dropping.
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        let tasks: Vec<_> = (0..self.channel.partition_count())
            .map(|partition| {
                let worker = PartitionWorker {
                    channel: self.channel.clone(),
                    consumer: self.consumer.clone(),
                    config: self.config.clone(),
                    offsets: Arc::clone(&self.offsets),
                    partition,
                };
                tokio::spawn(worker.run(shutdown.clone()))
            })
            .collect();

        tracing::info!(
            topic = %self.config.topic,
            partitions = tasks.len(),
            "cart consumer started"
        );

        tokio::spawn(async move {
            for result in futures_util::future::join_all(tasks).await {
                if let Err(e) = result {
                    tracing::error!(error = %e, "cart consumer task panicked");
                }
            }
            tracing::info!("cart consumer stopped");
        })
    }
}

struct PartitionWorker<E, C: CartService> {
    channel: E,
    consumer: CartClearingConsumer<C>,
    config: RunnerConfig,
    offsets: Arc<Vec<AtomicU64>>,
    partition: u32,
}

impl<E: EventChannel, C: CartService> PartitionWorker<E, C> {
    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let topic = self.config.topic.as_str();
        let mut offset = 0u64;

        while !*shutdown.borrow() {
            let records = match self
                .channel
                .poll(topic, self.partition, offset, self.config.batch_size)
                .await
            {
                Ok(records) => records,
                Err(e) => {
                    tracing::warn!(partition = self.partition, error = %e, "poll failed");
                    tokio::select! {
                        _ = tokio::time::sleep(self.config.retry_backoff) => {}
                        changed = shutdown.changed() => if changed.is_err() { break },
                    }
                    continue;
                }
            };

            if records.is_empty() {
                tokio::select! {
                    result = self.channel.wait_for_records(topic, self.partition, offset) => {
                        if let Err(e) = result {
                            tracing::warn!(partition = self.partition, error = %e, "wait failed");
                            tokio::time::sleep(self.config.retry_backoff).await;
                        }
                    }
                    changed = shutdown.changed() => if changed.is_err() { break },
                }
                continue;
            }

            for record in &records {
                self.consumer.handle(record).await;
                offset = record.offset + 1;
                if let Some(slot) = self.offsets.get(self.partition as usize) {
                    slot.store(offset, Ordering::SeqCst);
                }
            }
        }
    }
}
