//! Order outcome events and the channel that carries them.
//!
//! This crate provides:
//! - [`OrderOutcomeEvent`], a closed tagged enum with a JSON wire form
//! - [`EventChannel`], a keyed, partitioned, append-only log with
//!   consumer-tracked offsets
//! - [`InMemoryEventChannel`], the in-process channel
//! - [`OrderEventPublisher`], the best-effort publisher used after an order
//!   reaches a terminal status

pub mod channel;
pub mod error;
pub mod event;
pub mod memory;
pub mod publisher;

pub use channel::{EventChannel, EventRecord, partition_for_key};
pub use error::{ChannelError, EventError, Result};
pub use event::OrderOutcomeEvent;
pub use memory::{DEFAULT_PARTITIONS, InMemoryEventChannel};
pub use publisher::{ORDER_EVENTS_TOPIC, OrderEventPublisher};
