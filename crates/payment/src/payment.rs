//! Payment record and the endpoint's request/response shapes.

use chrono::{DateTime, Utc};
use common::{CustomerId, Money, OrderId, PaymentId};
use serde::{Deserialize, Serialize};

/// Lifecycle of a payment record.
///
/// ```text
/// Pending ──┬──► Success
///           └──► Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
}

impl PaymentStatus {
    /// Returns true once the gateway outcome has been recorded.
    pub fn is_resolved(&self) -> bool {
        matches!(self, PaymentStatus::Success | PaymentStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Success => "SUCCESS",
            PaymentStatus::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(PaymentStatus::Pending),
            "SUCCESS" => Some(PaymentStatus::Success),
            "FAILED" => Some(PaymentStatus::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A request to charge a customer for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    #[serde(with = "common::money::decimal")]
    pub amount: Money,
}

impl PaymentRequest {
    pub fn new(order_id: OrderId, customer_id: CustomerId, amount: Money) -> Self {
        Self {
            order_id,
            customer_id,
            amount,
        }
    }
}

/// One payment attempt, persisted in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    #[serde(with = "common::money::decimal")]
    pub amount: Money,
    pub status: PaymentStatus,

    /// Present only on `Success`.
    pub transaction_id: Option<String>,

    /// Raw gateway text, kept for diagnostics only.
    pub gateway_response: Option<String>,

    /// Present only on `Failed`.
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// Creates a `Pending` record for a request.
    pub fn pending(request: &PaymentRequest) -> Self {
        Self {
            id: PaymentId::new(),
            order_id: request.order_id,
            customer_id: request.customer_id.clone(),
            amount: request.amount,
            status: PaymentStatus::Pending,
            transaction_id: None,
            gateway_response: None,
            failure_reason: None,
            created_at: Utc::now(),
        }
    }

    pub(crate) fn succeed(&mut self, transaction_id: String, raw_response: Option<String>) {
        self.status = PaymentStatus::Success;
        self.transaction_id = Some(transaction_id);
        self.gateway_response = raw_response;
    }

    pub(crate) fn fail(&mut self, reason: String, raw_response: Option<String>) {
        self.status = PaymentStatus::Failed;
        self.failure_reason = Some(reason);
        self.gateway_response = raw_response;
    }
}

/// What the payment endpoint returns for a processed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOutcome {
    pub payment_id: PaymentId,
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    #[serde(with = "common::money::decimal")]
    pub amount: Money,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub failure_reason: Option<String>,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl PaymentOutcome {
    /// Builds the outcome for a resolved payment record.
    pub fn from_payment(payment: &Payment) -> Self {
        let message = match payment.status {
            PaymentStatus::Success => "Payment processed successfully",
            PaymentStatus::Failed => "Payment failed",
            PaymentStatus::Pending => "Payment pending",
        };

        Self {
            payment_id: payment.id,
            order_id: payment.order_id,
            customer_id: payment.customer_id.clone(),
            amount: payment.amount,
            status: payment.status,
            transaction_id: payment.transaction_id.clone(),
            failure_reason: payment.failure_reason.clone(),
            message: message.to_string(),
            timestamp: payment.created_at,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == PaymentStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> PaymentRequest {
        PaymentRequest::new(
            OrderId::new(),
            CustomerId::new("alice"),
            Money::from_cents(2550),
        )
    }

    #[test]
    fn test_pending_copies_request() {
        let req = request();
        let payment = Payment::pending(&req);

        assert_eq!(payment.order_id, req.order_id);
        assert_eq!(payment.customer_id, req.customer_id);
        assert_eq!(payment.amount, req.amount);
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert!(payment.transaction_id.is_none());
    }

    #[test]
    fn test_outcome_messages() {
        let mut payment = Payment::pending(&request());
        payment.succeed("TXN_1234ABCD".to_string(), None);
        let outcome = PaymentOutcome::from_payment(&payment);
        assert!(outcome.is_success());
        assert_eq!(outcome.message, "Payment processed successfully");
        assert_eq!(outcome.transaction_id.as_deref(), Some("TXN_1234ABCD"));

        let mut payment = Payment::pending(&request());
        payment.fail("Card declined".to_string(), None);
        let outcome = PaymentOutcome::from_payment(&payment);
        assert!(!outcome.is_success());
        assert_eq!(outcome.message, "Payment failed");
        assert_eq!(outcome.failure_reason.as_deref(), Some("Card declined"));
    }

    #[test]
    fn test_request_wire_format() {
        let req = request();
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["orderId"], req.order_id.to_string());
        assert_eq!(json["customerId"], "alice");
        assert_eq!(json["amount"], "25.50");
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Success).unwrap(),
            "\"SUCCESS\""
        );
        assert_eq!(PaymentStatus::parse("FAILED"), Some(PaymentStatus::Failed));
        assert!(!PaymentStatus::Pending.is_resolved());
        assert!(PaymentStatus::Failed.is_resolved());
    }
}
