//! Cart error types.

use thiserror::Error;

/// Errors that can occur when talking to the cart service.
#[derive(Debug, Error)]
pub enum CartError {
    /// The service could not be reached or answered with a server error.
    #[error("Cart service unavailable: {0}")]
    Unavailable(String),

    /// The service rejected the caller's credentials.
    #[error("Cart service rejected the authorization context")]
    Unauthorized,

    /// The service answered with a body that is not a cart.
    #[error("Invalid cart response: {0}")]
    InvalidResponse(String),

    /// The HTTP client failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Convenience type alias for cart results.
pub type Result<T> = std::result::Result<T, CartError>;
