//! The payment endpoint.

use std::time::Duration;

use common::OrderId;

use crate::{
    GatewayDecision, GatewayError, GatewayRequest, Payment, PaymentError, PaymentGateway,
    PaymentLedger, PaymentOutcome, PaymentRequest,
};

/// Failure reason recorded when the gateway errors or times out.
pub const GATEWAY_UNAVAILABLE: &str = "Payment gateway unavailable";

const MAX_GATEWAY_RESPONSE_LEN: usize = 500;
const MAX_FAILURE_REASON_LEN: usize = 255;

/// Payment endpoint configuration.
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    /// Upper bound on a single gateway call.
    pub gateway_timeout: Duration,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            gateway_timeout: Duration::from_secs(5),
        }
    }
}

/// Drives the ledger and the gateway for one payment request.
pub struct PaymentProcessor<L, G>
where
    L: PaymentLedger,
    G: PaymentGateway,
{
    ledger: L,
    gateway: G,
    config: PaymentConfig,
}

impl<L, G> PaymentProcessor<L, G>
where
    L: PaymentLedger,
    G: PaymentGateway,
{
    /// Creates a processor with the default configuration.
    pub fn new(ledger: L, gateway: G) -> Self {
        Self::with_config(ledger, gateway, PaymentConfig::default())
    }

    pub fn with_config(ledger: L, gateway: G, config: PaymentConfig) -> Self {
        Self {
            ledger,
            gateway,
            config,
        }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Processes a payment request.
    ///
    /// The `PENDING` record is persisted before the gateway is called. A
    /// decline, gateway error or timeout resolves the record to `FAILED` and
    /// comes back as a normal outcome.
    #[tracing::instrument(skip(self, request), fields(order_id = %request.order_id, customer = %request.customer_id))]
    pub async fn process_payment(
        &self,
        request: PaymentRequest,
    ) -> Result<PaymentOutcome, PaymentError> {
        if !request.amount.is_positive() {
            return Err(PaymentError::InvalidAmount(request.amount));
        }

        let mut payment = Payment::pending(&request);
        if let Err(e) = self.ledger.insert(&payment).await {
            let e = PaymentError::from(e);
            if matches!(e, PaymentError::DuplicatePayment(_)) {
                metrics::counter!("payments_processed_total", "status" => "DUPLICATE").increment(1);
                tracing::warn!("payment already recorded for order");
            }
            return Err(e);
        }

        let gateway_request = GatewayRequest {
            order_id: request.order_id,
            customer_id: request.customer_id.clone(),
            amount: request.amount,
        };

        let decision = tokio::time::timeout(
            self.config.gateway_timeout,
            self.gateway.authorize(&gateway_request),
        )
        .await
        .unwrap_or(Err(GatewayError::Timeout(self.config.gateway_timeout)));

        match decision {
            Ok(GatewayDecision::Approved {
                transaction_id,
                raw_response,
            }) => {
                tracing::info!(%transaction_id, "payment approved");
                payment.succeed(transaction_id, truncate(raw_response, MAX_GATEWAY_RESPONSE_LEN));
            }
            Ok(GatewayDecision::Declined {
                reason,
                raw_response,
            }) => {
                tracing::warn!(%reason, "payment declined");
                payment.fail(
                    clip(reason, MAX_FAILURE_REASON_LEN),
                    truncate(raw_response, MAX_GATEWAY_RESPONSE_LEN),
                );
            }
            Err(e) => {
                tracing::error!(error = %e, "payment gateway call failed");
                payment.fail(
                    GATEWAY_UNAVAILABLE.to_string(),
                    Some(clip(e.to_string(), MAX_GATEWAY_RESPONSE_LEN)),
                );
            }
        }

        self.ledger.update(&payment).await?;
        metrics::counter!("payments_processed_total", "status" => payment.status.as_str())
            .increment(1);

        Ok(PaymentOutcome::from_payment(&payment))
    }

    /// Returns the payment recorded for an order.
    #[tracing::instrument(skip(self))]
    pub async fn get_payment_by_order_id(&self, order_id: OrderId) -> Result<Payment, PaymentError> {
        self.ledger
            .find_by_order_id(order_id)
            .await?
            .ok_or(PaymentError::NotFound(order_id))
    }
}

fn clip(mut text: String, max_chars: usize) -> String {
    if let Some((idx, _)) = text.char_indices().nth(max_chars) {
        text.truncate(idx);
    }
    text
}

fn truncate(text: Option<String>, max_chars: usize) -> Option<String> {
    text.map(|t| clip(t, max_chars))
}
