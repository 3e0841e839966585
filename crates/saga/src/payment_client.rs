//! The saga's view of the payment endpoint.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use payment::{
    PaymentError, PaymentGateway, PaymentLedger, PaymentOutcome, PaymentProcessor, PaymentRequest,
};
use reqwest::{Client, StatusCode};

use crate::PaymentClientError;

/// Calls the payment endpoint for one order.
#[async_trait]
pub trait PaymentClient: Send + Sync {
    /// Requests payment. A decline comes back as a `FAILED` outcome.
    async fn process_payment(
        &self,
        request: PaymentRequest,
    ) -> Result<PaymentOutcome, PaymentClientError>;
}

#[async_trait]
impl<P: PaymentClient + ?Sized> PaymentClient for Arc<P> {
    async fn process_payment(
        &self,
        request: PaymentRequest,
    ) -> Result<PaymentOutcome, PaymentClientError> {
        (**self).process_payment(request).await
    }
}

/// Calls an in-process payment endpoint.
pub struct LocalPaymentClient<L: PaymentLedger, G: PaymentGateway> {
    processor: Arc<PaymentProcessor<L, G>>,
}

impl<L: PaymentLedger, G: PaymentGateway> LocalPaymentClient<L, G> {
    pub fn new(processor: Arc<PaymentProcessor<L, G>>) -> Self {
        Self { processor }
    }

    pub fn processor(&self) -> &Arc<PaymentProcessor<L, G>> {
        &self.processor
    }
}

impl<L: PaymentLedger, G: PaymentGateway> Clone for LocalPaymentClient<L, G> {
    fn clone(&self) -> Self {
        Self {
            processor: Arc::clone(&self.processor),
        }
    }
}

#[async_trait]
impl<L: PaymentLedger, G: PaymentGateway> PaymentClient for LocalPaymentClient<L, G> {
    async fn process_payment(
        &self,
        request: PaymentRequest,
    ) -> Result<PaymentOutcome, PaymentClientError> {
        self.processor
            .process_payment(request)
            .await
            .map_err(|e| match e {
                PaymentError::DuplicatePayment(order_id) => {
                    PaymentClientError::DuplicatePayment(order_id)
                }
                invalid @ PaymentError::InvalidAmount(_) => {
                    PaymentClientError::Rejected(invalid.to_string())
                }
                other => PaymentClientError::Unavailable(other.to_string()),
            })
    }
}

/// Calls the payment endpoint over HTTP at `{base}/api/payments/process`.
///
/// `200` and `402` carry an outcome; `409` is a duplicate; `400` a rejected
/// request; anything else means the endpoint is unavailable.
#[derive(Debug, Clone)]
pub struct HttpPaymentClient {
    client: Client,
    base_url: String,
}

impl HttpPaymentClient {
    /// Creates a client. `timeout` bounds every request end to end.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, PaymentClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(2)))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl PaymentClient for HttpPaymentClient {
    #[tracing::instrument(skip(self, request), fields(order_id = %request.order_id, base_url = %self.base_url))]
    async fn process_payment(
        &self,
        request: PaymentRequest,
    ) -> Result<PaymentOutcome, PaymentClientError> {
        let response = self
            .client
            .post(format!("{}/api/payments/process", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    PaymentClientError::Unavailable(format!("{}: {e}", self.base_url))
                } else {
                    PaymentClientError::Http(e)
                }
            })?;

        match response.status() {
            StatusCode::OK | StatusCode::PAYMENT_REQUIRED => response
                .json::<PaymentOutcome>()
                .await
                .map_err(|e| PaymentClientError::Unavailable(format!("invalid outcome: {e}"))),
            StatusCode::CONFLICT => Err(PaymentClientError::DuplicatePayment(request.order_id)),
            StatusCode::BAD_REQUEST => {
                let body = response.text().await.unwrap_or_default();
                Err(PaymentClientError::Rejected(body))
            }
            status => Err(PaymentClientError::Unavailable(format!(
                "payment service returned {status}"
            ))),
        }
    }
}
