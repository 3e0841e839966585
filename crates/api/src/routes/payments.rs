//! The payment endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use payment::{Payment, PaymentOutcome, PaymentRequest};

use crate::AppState;
use crate::error::ApiError;
use crate::routes::orders::parse_order_id;

/// POST /api/payments/process: charge an order.
///
/// `200` when the gateway approved, `402` with the same body when it
/// declined. A second attempt for an order is `409`.
#[tracing::instrument(skip(state, request), fields(order_id = %request.order_id))]
pub async fn process(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PaymentRequest>,
) -> Result<(StatusCode, Json<PaymentOutcome>), ApiError> {
    let outcome = state.payments.process_payment(request).await?;
    let status = if outcome.is_success() {
        StatusCode::OK
    } else {
        StatusCode::PAYMENT_REQUIRED
    };
    Ok((status, Json(outcome)))
}

/// GET /api/payments/order/{order_id}: the payment recorded for an order.
#[tracing::instrument(skip(state))]
pub async fn get_by_order(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<String>,
) -> Result<Json<Payment>, ApiError> {
    let order_id = parse_order_id(&order_id)?;
    let payment = state.payments.get_payment_by_order_id(order_id).await?;
    Ok(Json(payment))
}
