//! HTTP surface for order placement.
//!
//! Serves the order endpoints (backed by the [`OrderSaga`]), the payment
//! endpoint (backed by a [`PaymentProcessor`]), a health check and
//! Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;
pub mod wiring;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use cart::CartService;
use event_channel::InMemoryEventChannel;
use metrics_exporter_prometheus::PrometheusHandle;
use orders::OrderStore;
use payment::{PaymentLedger, PaymentProcessor, ScriptedGateway};
use saga::{OrderSaga, PaymentClient};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use wiring::{Services, build_services};

pub type SharedOrderStore = Arc<dyn OrderStore>;
pub type SharedCartService = Arc<dyn CartService>;
pub type SharedPaymentClient = Arc<dyn PaymentClient>;
pub type SharedLedger = Arc<dyn PaymentLedger>;

/// The saga as wired by this binary; backends are picked at startup.
pub type AppSaga =
    OrderSaga<SharedOrderStore, SharedCartService, SharedPaymentClient, InMemoryEventChannel>;

/// The payment endpoint as wired by this binary.
pub type AppPaymentProcessor = PaymentProcessor<SharedLedger, ScriptedGateway>;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub saga: AppSaga,
    pub payments: Arc<AppPaymentProcessor>,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/api/orders/health", get(routes::health::check))
        .route(
            "/api/orders",
            post(routes::orders::place).get(routes::orders::list),
        )
        .route("/api/orders/{id}", get(routes::orders::get))
        .route("/api/payments/process", post(routes::payments::process))
        .route(
            "/api/payments/order/{order_id}",
            get(routes::payments::get_by_order),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
