//! Payment processing for placed orders.
//!
//! The [`PaymentProcessor`] is the payment endpoint: it records a `PENDING`
//! payment in the [`PaymentLedger`] before calling the external
//! [`PaymentGateway`], then resolves the record to `SUCCESS` or `FAILED`.
//! A declined card is a normal [`PaymentOutcome`], not an error.
//!
//! The ledger holds at most one payment per order. A second attempt for the
//! same order is rejected with [`PaymentError::DuplicatePayment`].

pub mod error;
pub mod gateway;
pub mod ledger;
pub mod memory;
pub mod payment;
pub mod postgres;
pub mod processor;

pub use error::{GatewayError, LedgerError, PaymentError};
pub use gateway::{GatewayDecision, GatewayRequest, PaymentGateway, ScriptedGateway};
pub use ledger::PaymentLedger;
pub use memory::InMemoryPaymentLedger;
pub use payment::{Payment, PaymentOutcome, PaymentRequest, PaymentStatus};
pub use postgres::PostgresPaymentLedger;
pub use processor::{GATEWAY_UNAVAILABLE, PaymentConfig, PaymentProcessor};
