//! Shared types for the order placement services.

pub mod money;
pub mod types;

pub use money::{Money, ParseMoneyError};
pub use types::{CustomerId, OrderId, PaymentId, ProductId};
