//! Order placement saga.
//!
//! [`OrderSaga::place_order`] turns a customer's cart into an order and
//! drives it to a terminal status without distributed transactions:
//!
//! 1. Fetch the cart snapshot (fatal on failure, nothing to compensate yet)
//! 2. Persist the order as `PENDING`
//! 3. Call the payment endpoint
//! 4. Persist `PAID`, or compensate by persisting `CANCELLED`
//! 5. Publish the outcome event, best effort
//!
//! Once step 2 succeeds the order always reaches a terminal status; payment
//! errors and timeouts become a cancellation, never an error to the caller.

pub mod error;
pub mod orchestrator;
pub mod payment_client;

pub use error::{PaymentClientError, Result, SagaError};
pub use orchestrator::{OrderSaga, PAYMENT_SERVICE_UNAVAILABLE, SagaConfig};
pub use payment_client::{HttpPaymentClient, LocalPaymentClient, PaymentClient};
