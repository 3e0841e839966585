//! The cart as seen by order placement.
//!
//! This crate provides:
//! - [`CartService`], the contract of the external cart service, with an
//!   in-memory implementation and a reqwest-based HTTP client
//! - [`CartClearingConsumer`], which clears a customer's cart after a
//!   completed order and keeps it after a cancelled one
//! - [`ConsumerRunner`], which drives the consumer over every partition of
//!   the order events topic

pub mod consumer;
pub mod error;
pub mod http;
pub mod memory;
pub mod model;
pub mod runner;
pub mod service;

pub use consumer::{CartClearingConsumer, ConsumeOutcome};
pub use error::{CartError, Result};
pub use http::HttpCartService;
pub use memory::InMemoryCartService;
pub use model::{AuthContext, Cart, CartLine};
pub use runner::{ConsumerRunner, RunnerConfig};
pub use service::CartService;
