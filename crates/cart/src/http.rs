//! HTTP client for the external cart service.

use std::time::Duration;

use async_trait::async_trait;
use common::CustomerId;
use reqwest::{Client, StatusCode, header::AUTHORIZATION};

use crate::{AuthContext, Cart, CartError, CartService, Result};

/// Header naming the customer whose cart a service-to-service call targets.
pub const CUSTOMER_ID_HEADER: &str = "X-Customer-Id";

/// Cart service reached over HTTP.
///
/// - `GET {base}/api/cart` with the caller's `Authorization` header
/// - `DELETE {base}/api/cart/clear`
#[derive(Debug, Clone)]
pub struct HttpCartService {
    client: Client,
    base_url: String,
}

impl HttpCartService {
    /// Creates a client. `timeout` bounds every request end to end.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
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

    fn map_send_error(&self, e: reqwest::Error) -> CartError {
        if e.is_connect() || e.is_timeout() {
            CartError::Unavailable(format!("{}: {e}", self.base_url))
        } else {
            CartError::Http(e)
        }
    }
}

#[async_trait]
impl CartService for HttpCartService {
    #[tracing::instrument(skip(self, auth), fields(base_url = %self.base_url))]
    async fn get_cart(&self, customer_id: &CustomerId, auth: &AuthContext) -> Result<Option<Cart>> {
        let mut request = self
            .client
            .get(format!("{}/api/cart", self.base_url))
            .header(CUSTOMER_ID_HEADER, customer_id.as_str());
        if let Some(authorization) = auth.authorization() {
            request = request.header(AUTHORIZATION, authorization);
        }

        let response = request.send().await.map_err(|e| self.map_send_error(e))?;

        match response.status() {
            StatusCode::NOT_FOUND | StatusCode::NO_CONTENT => return Ok(None),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Err(CartError::Unauthorized),
            status if !status.is_success() => {
                return Err(CartError::Unavailable(format!("cart service returned {status}")));
            }
            _ => {}
        }

        let body = response.bytes().await.map_err(|e| self.map_send_error(e))?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        let cart: Option<Cart> = serde_json::from_slice(&body)
            .map_err(|e| CartError::InvalidResponse(e.to_string()))?;
        Ok(cart)
    }

    #[tracing::instrument(skip(self), fields(base_url = %self.base_url))]
    async fn clear_cart(&self, customer_id: &CustomerId) -> Result<()> {
        let response = self
            .client
            .delete(format!("{}/api/cart/clear", self.base_url))
            .header(CUSTOMER_ID_HEADER, customer_id.as_str())
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        match response.status() {
            status if status.is_success() || status == StatusCode::NOT_FOUND => Ok(()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(CartError::Unauthorized),
            status => Err(CartError::Unavailable(format!(
                "cart service returned {status}"
            ))),
        }
    }
}
