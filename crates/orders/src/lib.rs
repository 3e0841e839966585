//! Orders: the persisted result of a checkout.
//!
//! This crate provides:
//! - [`Order`] with immutable line-item snapshots and a total computed once
//! - [`OrderStatus`] state machine (`PENDING` → `PAID` | `CANCELLED`)
//! - [`OrderStore`] trait with in-memory and PostgreSQL implementations

pub mod error;
pub mod memory;
pub mod order;
pub mod postgres;
pub mod status;
pub mod store;

pub use error::{OrderError, OrderStoreError, Result};
pub use memory::InMemoryOrderStore;
pub use order::{Order, OrderItem};
pub use postgres::PostgresOrderStore;
pub use status::OrderStatus;
pub use store::OrderStore;
