//! Event channel error types.

use thiserror::Error;

/// Errors raised while encoding or decoding an order outcome event.
#[derive(Debug, Error)]
pub enum EventError {
    /// The payload is not a JSON object with a string `eventType`, or its
    /// fields do not match the tagged variant.
    #[error("Malformed event payload: {0}")]
    Malformed(String),

    /// The payload carries an `eventType` this service does not know.
    #[error("Unknown event type: {0}")]
    UnknownEventType(String),

    /// The event could not be serialized.
    #[error("Event encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Errors that can occur when interacting with the event channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The requested partition does not exist.
    #[error("Partition {partition} out of range for topic {topic} ({count} partitions)")]
    PartitionOutOfRange {
        topic: String,
        partition: u32,
        count: u32,
    },

    /// The channel refused or could not accept the record.
    #[error("Event channel unavailable: {0}")]
    Unavailable(String),
}

/// Convenience type alias for channel results.
pub type Result<T> = std::result::Result<T, ChannelError>;
