use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Result;

/// A record as stored in a partition log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub topic: String,
    pub partition: u32,

    /// Position within the partition, starting at 0.
    pub offset: u64,

    /// Routing key. Records with the same key land in the same partition.
    pub key: String,

    /// Encoded event.
    pub payload: String,
    pub timestamp: DateTime<Utc>,
}

/// A keyed, partitioned, append-only message log.
///
/// Records with equal keys are appended to the same partition and keep their
/// publication order. No order is promised across partitions. Consumers
/// track their own offsets and poll from them.
#[async_trait]
pub trait EventChannel: Send + Sync {
    /// Appends a record to the partition owning `key`.
    async fn publish(&self, topic: &str, key: &str, payload: String) -> Result<EventRecord>;

    /// Returns up to `max` records of one partition starting at `offset`.
    async fn poll(
        &self,
        topic: &str,
        partition: u32,
        offset: u64,
        max: usize,
    ) -> Result<Vec<EventRecord>>;

    /// Number of partitions per topic.
    fn partition_count(&self) -> u32;

    /// Resolves once the partition holds a record at or beyond `offset`.
    async fn wait_for_records(&self, topic: &str, partition: u32, offset: u64) -> Result<()>;
}

/// Maps a key to a partition with 32-bit FNV-1a.
///
/// The hash is fixed so a key keeps its partition across restarts.
pub fn partition_for_key(key: &str, partitions: u32) -> u32 {
    const OFFSET_BASIS: u32 = 0x811c_9dc5;
    const PRIME: u32 = 0x0100_0193;

    let hash = key.bytes().fold(OFFSET_BASIS, |hash, byte| {
        (hash ^ u32::from(byte)).wrapping_mul(PRIME)
    });
    hash % partitions.max(1)
}
