//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use payment::PaymentError;
use saga::SagaError;
use thiserror::Error;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// The request carries no customer identity.
    Unauthorized(String),
    /// Order placement failed before the order reached a terminal status.
    Saga(SagaError),
    /// The payment endpoint refused the request.
    Payment(PaymentError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Saga(err) => saga_error_to_response(err),
            ApiError::Payment(err) => payment_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn saga_error_to_response(err: SagaError) -> (StatusCode, String) {
    match &err {
        SagaError::EmptyCart | SagaError::InvalidCart(_) => {
            (StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
        }
        SagaError::CartUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, err.to_string()),
        SagaError::InvalidTransition(_) | SagaError::Store(_) => {
            tracing::error!(error = %err, "order placement failed");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

fn payment_error_to_response(err: PaymentError) -> (StatusCode, String) {
    match &err {
        PaymentError::DuplicatePayment(_) => (StatusCode::CONFLICT, err.to_string()),
        PaymentError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        PaymentError::InvalidAmount(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        PaymentError::Ledger(_) => {
            tracing::error!(error = %err, "payment ledger failed");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl From<SagaError> for ApiError {
    fn from(err: SagaError) -> Self {
        ApiError::Saga(err)
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        ApiError::Payment(err)
    }
}

/// Errors that stop the process before it starts serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Database connection failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Order store setup failed: {0}")]
    OrderStore(#[from] orders::OrderStoreError),

    #[error("Payment ledger setup failed: {0}")]
    Ledger(#[from] payment::LedgerError),

    #[error("Cart client setup failed: {0}")]
    Cart(#[from] cart::CartError),

    #[error("Payment client setup failed: {0}")]
    PaymentClient(#[from] saga::PaymentClientError),

    #[error("Metrics recorder setup failed: {0}")]
    Metrics(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
