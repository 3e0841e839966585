//! Health check endpoint.

use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub service: &'static str,
    pub status: &'static str,
}

/// GET /health: reports the service as up.
pub async fn check() -> Json<HealthResponse> {
    Json(HealthResponse {
        service: "order-service",
        status: "UP",
    })
}
