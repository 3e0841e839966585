//! Identity of the customer making a request.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use cart::AuthContext;
use common::CustomerId;

use crate::error::ApiError;

/// Header carrying the authenticated customer, set by the gateway in front
/// of this service.
pub const CUSTOMER_ID_HEADER: &str = "x-customer-id";

/// The authenticated customer and the credentials to forward on their
/// behalf.
#[derive(Debug, Clone)]
pub struct Caller {
    pub customer_id: CustomerId,
    pub auth: AuthContext,
}

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let customer_id = parts
            .headers
            .get(CUSTOMER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::Unauthorized("Missing X-Customer-Id header".to_string()))?;

        let auth = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(AuthContext::from_header)
            .unwrap_or_default();

        Ok(Self {
            customer_id: CustomerId::new(customer_id),
            auth,
        })
    }
}
