//! Payment gateway trait and a scripted in-process implementation.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use common::{CustomerId, Money, OrderId};
use uuid::Uuid;

use crate::error::GatewayError;

/// What the gateway is asked to authorize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayRequest {
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub amount: Money,
}

/// The gateway's answer. A decline is a normal answer, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayDecision {
    Approved {
        transaction_id: String,
        raw_response: Option<String>,
    },
    Declined {
        reason: String,
        raw_response: Option<String>,
    },
}

/// Adapter for an external payment authority.
///
/// Implementations make a single attempt. Timeouts and retry policy belong
/// to the caller.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Asks the gateway to approve a charge.
    async fn authorize(&self, request: &GatewayRequest) -> Result<GatewayDecision, GatewayError>;
}

#[async_trait]
impl<G: PaymentGateway + ?Sized> PaymentGateway for Arc<G> {
    async fn authorize(&self, request: &GatewayRequest) -> Result<GatewayDecision, GatewayError> {
        (**self).authorize(request).await
    }
}

/// Generates a transaction id in the gateway's `TXN_XXXXXXXX` format.
pub fn new_transaction_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("TXN_{}", hex[..8].to_uppercase())
}

#[derive(Debug, Clone)]
enum Scripted {
    Approve,
    Decline(String),
    Fail(String),
}

#[derive(Debug, Default)]
struct ScriptedState {
    script: VecDeque<Scripted>,
    decline_all: Option<String>,
    delay: Option<Duration>,
    requests: Vec<GatewayRequest>,
}

/// In-process gateway whose answers are scripted.
///
/// Approves everything unless told otherwise. Queued answers are consumed in
/// order; `decline_all` applies once the queue is empty.
#[derive(Debug, Clone, Default)]
pub struct ScriptedGateway {
    state: Arc<Mutex<ScriptedState>>,
}

impl ScriptedGateway {
    /// Creates a gateway that approves every request.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ScriptedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues an approval.
    pub fn approve_next(&self) {
        self.state().script.push_back(Scripted::Approve);
    }

    /// Queues a decline with the given reason.
    pub fn decline_next(&self, reason: impl Into<String>) {
        self.state().script.push_back(Scripted::Decline(reason.into()));
    }

    /// Queues a transport failure.
    pub fn fail_next(&self, message: impl Into<String>) {
        self.state().script.push_back(Scripted::Fail(message.into()));
    }

    /// Declines every unscripted request with the given reason.
    pub fn decline_all(&self, reason: impl Into<String>) {
        self.state().decline_all = Some(reason.into());
    }

    /// Delays every answer, to exercise caller timeouts.
    pub fn set_delay(&self, delay: Duration) {
        self.state().delay = Some(delay);
    }

    /// Returns the number of requests received.
    pub fn request_count(&self) -> usize {
        self.state().requests.len()
    }

    /// Returns every request received so far.
    pub fn requests(&self) -> Vec<GatewayRequest> {
        self.state().requests.clone()
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn authorize(&self, request: &GatewayRequest) -> Result<GatewayDecision, GatewayError> {
        let (next, delay) = {
            let mut state = self.state();
            state.requests.push(request.clone());
            let next = state.script.pop_front().unwrap_or_else(|| {
                match &state.decline_all {
                    Some(reason) => Scripted::Decline(reason.clone()),
                    None => Scripted::Approve,
                }
            });
            (next, state.delay)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match next {
            Scripted::Approve => Ok(GatewayDecision::Approved {
                transaction_id: new_transaction_id(),
                raw_response: Some("Scripted gateway approved the transaction".to_string()),
            }),
            Scripted::Decline(reason) => Ok(GatewayDecision::Declined {
                reason,
                raw_response: Some("Scripted gateway declined the transaction".to_string()),
            }),
            Scripted::Fail(message) => Err(GatewayError::Unavailable(message)),
        }
    }
}
