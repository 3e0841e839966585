use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{RwLock, watch};

use crate::{ChannelError, EventChannel, EventRecord, Result, partition_for_key};

/// Default number of partitions per topic.
pub const DEFAULT_PARTITIONS: u32 = 8;

struct Inner {
    partitions: u32,
    topics: RwLock<HashMap<String, Vec<Vec<EventRecord>>>>,
    published: watch::Sender<u64>,
    fail_publish: AtomicBool,
}

/// In-memory event channel.
///
/// Each topic is a fixed set of append-only partition logs. Clones share the
/// same logs.
///
/// Retention is unbounded: records are never trimmed, so memory grows with
/// every publish for the lifetime of the channel. Polling does not consume
/// records and any offset can be replayed. Long-running deployments should
/// use a broker with its own retention policy.
#[derive(Clone)]
pub struct InMemoryEventChannel {
    inner: Arc<Inner>,
}

impl Default for InMemoryEventChannel {
    fn default() -> Self {
        Self::new(DEFAULT_PARTITIONS)
    }
}

impl InMemoryEventChannel {
    /// Creates a channel with the given number of partitions per topic.
    pub fn new(partitions: u32) -> Self {
        let (published, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                partitions: partitions.max(1),
                topics: RwLock::new(HashMap::new()),
                published,
                fail_publish: AtomicBool::new(false),
            }),
        }
    }

    /// Makes every subsequent publish fail until reset.
    pub fn set_fail_on_publish(&self, fail: bool) {
        self.inner.fail_publish.store(fail, Ordering::SeqCst);
    }

    /// Returns every record of a topic, partition by partition.
    pub async fn records(&self, topic: &str) -> Vec<EventRecord> {
        self.inner
            .topics
            .read()
            .await
            .get(topic)
            .map(|logs| logs.iter().flatten().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns the number of records in a topic.
    pub async fn record_count(&self, topic: &str) -> usize {
        self.inner
            .topics
            .read()
            .await
            .get(topic)
            .map(|logs| logs.iter().map(Vec::len).sum())
            .unwrap_or(0)
    }

    fn check_partition(&self, topic: &str, partition: u32) -> Result<()> {
        if partition >= self.inner.partitions {
            return Err(ChannelError::PartitionOutOfRange {
                topic: topic.to_string(),
                partition,
                count: self.inner.partitions,
            });
        }
        Ok(())
    }

    async fn partition_len(&self, topic: &str, partition: u32) -> u64 {
        self.inner
            .topics
            .read()
            .await
            .get(topic)
            .and_then(|logs| logs.get(partition as usize))
            .map(|log| log.len() as u64)
            .unwrap_or(0)
    }
}

#[async_trait]
impl EventChannel for InMemoryEventChannel {
    async fn publish(&self, topic: &str, key: &str, payload: String) -> Result<EventRecord> {
        if self.inner.fail_publish.load(Ordering::SeqCst) {
            return Err(ChannelError::Unavailable(
                "publishing disabled".to_string(),
            ));
        }

        let partition = partition_for_key(key, self.inner.partitions);
        let record = {
            let mut topics = self.inner.topics.write().await;
            let logs = topics
                .entry(topic.to_string())
                .or_insert_with(|| vec![Vec::new(); self.inner.partitions as usize]);
            let log = &mut logs[partition as usize];

            let record = EventRecord {
                topic: topic.to_string(),
                partition,
                offset: log.len() as u64,
                key: key.to_string(),
                payload,
                timestamp: Utc::now(),
            };
            log.push(record.clone());
            record
        };

        self.inner.published.send_modify(|count| *count += 1);
        Ok(record)
    }

    async fn poll(
        &self,
        topic: &str,
        partition: u32,
        offset: u64,
        max: usize,
    ) -> Result<Vec<EventRecord>> {
        self.check_partition(topic, partition)?;

        let topics = self.inner.topics.read().await;
        let records = topics
            .get(topic)
            .and_then(|logs| logs.get(partition as usize))
            .map(|log| {
                log.iter()
                    .skip(offset as usize)
                    .take(max)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(records)
    }

    fn partition_count(&self) -> u32 {
        self.inner.partitions
    }

    async fn wait_for_records(&self, topic: &str, partition: u32, offset: u64) -> Result<()> {
        self.check_partition(topic, partition)?;

        // Subscribe before checking so a publish between the check and the
        // wait is still observed.
        let mut published = self.inner.published.subscribe();
        loop {
            if self.partition_len(topic, partition).await > offset {
                return Ok(());
            }
            if published.changed().await.is_err() {
                return Err(ChannelError::Unavailable("channel closed".to_string()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_key_keeps_order_in_one_partition() {
        let channel = InMemoryEventChannel::new(4);

        let first = channel.publish("t", "alice", "1".into()).await.unwrap();
        let second = channel.publish("t", "alice", "2".into()).await.unwrap();

        assert_eq!(first.partition, second.partition);
        assert_eq!(first.offset, 0);
        assert_eq!(second.offset, 1);

        let polled = channel.poll("t", first.partition, 0, 10).await.unwrap();
        let payloads: Vec<_> = polled.iter().map(|r| r.payload.as_str()).collect();
        assert_eq!(payloads, ["1", "2"]);
    }

    #[tokio::test]
    async fn test_poll_respects_offset_and_max() {
        let channel = InMemoryEventChannel::new(1);
        for i in 0..5 {
            channel.publish("t", "k", i.to_string()).await.unwrap();
        }

        let polled = channel.poll("t", 0, 2, 2).await.unwrap();
        let offsets: Vec<_> = polled.iter().map(|r| r.offset).collect();
        assert_eq!(offsets, [2, 3]);

        assert!(channel.poll("t", 0, 5, 10).await.unwrap().is_empty());
        assert!(channel.poll("other", 0, 0, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_polled_records_are_retained() {
        let channel = InMemoryEventChannel::new(1);
        for i in 0..3 {
            channel.publish("t", "k", i.to_string()).await.unwrap();
        }

        let first = channel.poll("t", 0, 0, 10).await.unwrap();
        let replay = channel.poll("t", 0, 0, 10).await.unwrap();

        assert_eq!(first.len(), 3);
        assert_eq!(replay.len(), 3);
        assert_eq!(channel.record_count("t").await, 3);
    }

    #[tokio::test]
    async fn test_poll_rejects_unknown_partition() {
        let channel = InMemoryEventChannel::new(2);
        let result = channel.poll("t", 2, 0, 10).await;
        assert!(matches!(
            result,
            Err(ChannelError::PartitionOutOfRange { partition: 2, .. })
        ));
    }

    #[tokio::test]
    async fn test_failure_hook() {
        let channel = InMemoryEventChannel::new(2);
        channel.set_fail_on_publish(true);
        assert!(channel.publish("t", "k", "x".into()).await.is_err());
        assert_eq!(channel.record_count("t").await, 0);

        channel.set_fail_on_publish(false);
        assert!(channel.publish("t", "k", "x".into()).await.is_ok());
        assert_eq!(channel.record_count("t").await, 1);
    }

    #[tokio::test]
    async fn test_wait_for_records_wakes_on_publish() {
        let channel = InMemoryEventChannel::new(1);
        let waiter = {
            let channel = channel.clone();
            tokio::spawn(async move { channel.wait_for_records("t", 0, 0).await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        channel.publish("t", "k", "x".into()).await.unwrap();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_wait_returns_immediately_when_records_exist() {
        let channel = InMemoryEventChannel::new(1);
        channel.publish("t", "k", "x".into()).await.unwrap();
        channel.wait_for_records("t", 0, 0).await.unwrap();
    }
}
