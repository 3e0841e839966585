//! Order placement and order history endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use common::{Money, OrderId};
use orders::{Order, OrderItem, OrderStatus};
use serde::Serialize;

use crate::AppState;
use crate::error::ApiError;
use crate::routes::caller::Caller;

// -- Response types --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub product_id: String,
    pub product_name: String,
    #[serde(with = "common::money::decimal")]
    pub unit_price: Money,
    pub quantity: u32,
    #[serde(with = "common::money::decimal")]
    pub line_total: Money,
}

impl From<&OrderItem> for OrderItemResponse {
    fn from(item: &OrderItem) -> Self {
        Self {
            product_id: item.product_id.to_string(),
            product_name: item.product_name.clone(),
            unit_price: item.unit_price,
            quantity: item.quantity,
            line_total: item.line_total(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: String,
    pub customer_id: String,
    pub items: Vec<OrderItemResponse>,
    #[serde(with = "common::money::decimal")]
    pub total_amount: Money,
    pub status: OrderStatus,
    pub payment_id: Option<String>,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id().to_string(),
            customer_id: order.customer_id().to_string(),
            items: order.items().iter().map(OrderItemResponse::from).collect(),
            total_amount: order.total_amount(),
            status: order.status(),
            payment_id: order.payment_id().map(String::from),
            failure_reason: order.failure_reason().map(String::from),
            created_at: order.created_at(),
        }
    }
}

/// POST /api/orders: place an order from the caller's cart.
///
/// Answers `200` with the order in its terminal status, whether paid or
/// cancelled.
#[tracing::instrument(skip(state, caller), fields(customer = %caller.customer_id))]
pub async fn place(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state
        .saga
        .place_order(&caller.customer_id, &caller.auth)
        .await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// GET /api/orders: the caller's orders, newest first.
#[tracing::instrument(skip(state, caller), fields(customer = %caller.customer_id))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.saga.orders_for_customer(&caller.customer_id).await?;
    Ok(Json(orders.iter().map(OrderResponse::from).collect()))
}

/// GET /api/orders/{id}: one of the caller's orders.
///
/// Another customer's order reads as not found.
#[tracing::instrument(skip(state, caller), fields(customer = %caller.customer_id))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state
        .saga
        .get_order(order_id)
        .await?
        .filter(|order| order.customer_id() == &caller.customer_id)
        .ok_or_else(|| ApiError::NotFound(format!("Order {id} not found")))?;

    Ok(Json(OrderResponse::from(&order)))
}

pub(crate) fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    id.parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid order ID format: {e}")))
}
