//! HttpPaymentClient against a stub payment endpoint served by axum.

use std::time::Duration;

use axum::{Json, Router, http::StatusCode, response::IntoResponse, routing::post};
use common::{CustomerId, Money, OrderId, PaymentId};
use payment::{PaymentOutcome, PaymentRequest, PaymentStatus};
use saga::{HttpPaymentClient, PaymentClient, PaymentClientError};
use serde_json::json;
use tokio::net::TcpListener;

fn outcome(request: &PaymentRequest, status: PaymentStatus) -> PaymentOutcome {
    let success = status == PaymentStatus::Success;
    PaymentOutcome {
        payment_id: PaymentId::new(),
        order_id: request.order_id,
        customer_id: request.customer_id.clone(),
        amount: request.amount,
        status,
        transaction_id: success.then(|| "TXN_0A1B2C3D".to_string()),
        failure_reason: (!success).then(|| "Insufficient funds".to_string()),
        message: if success {
            "Payment processed successfully"
        } else {
            "Payment failed"
        }
        .to_string(),
        timestamp: chrono::Utc::now(),
    }
}

async fn process(Json(request): Json<PaymentRequest>) -> axum::response::Response {
    match request.customer_id.as_str() {
        "declined" => (
            StatusCode::PAYMENT_REQUIRED,
            Json(outcome(&request, PaymentStatus::Failed)),
        )
            .into_response(),
        "duplicate" => (
            StatusCode::CONFLICT,
            Json(json!({"error": "Payment already processed"})),
        )
            .into_response(),
        "invalid" => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Invalid payment amount"})),
        )
            .into_response(),
        "broken" => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        "slow" => {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Json(outcome(&request, PaymentStatus::Success)).into_response()
        }
        _ => Json(outcome(&request, PaymentStatus::Success)).into_response(),
    }
}

async fn start_stub() -> HttpPaymentClient {
    let app = Router::new().route("/api/payments/process", post(process));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    HttpPaymentClient::new(format!("http://{addr}/"), Duration::from_millis(500)).unwrap()
}

fn request(customer: &str) -> PaymentRequest {
    PaymentRequest::new(OrderId::new(), CustomerId::new(customer), Money::from_cents(2550))
}

#[tokio::test]
async fn test_success_and_decline_both_carry_outcomes() {
    let client = start_stub().await;

    let paid = client.process_payment(request("alice")).await.unwrap();
    assert!(paid.is_success());
    assert_eq!(paid.transaction_id.as_deref(), Some("TXN_0A1B2C3D"));
    assert_eq!(paid.amount, Money::from_cents(2550));

    let declined = client.process_payment(request("declined")).await.unwrap();
    assert_eq!(declined.status, PaymentStatus::Failed);
    assert_eq!(declined.failure_reason.as_deref(), Some("Insufficient funds"));
}

#[tokio::test]
async fn test_error_statuses_are_mapped() {
    let client = start_stub().await;

    let req = request("duplicate");
    let order_id = req.order_id;
    let duplicate = client.process_payment(req).await;
    assert!(matches!(duplicate, Err(PaymentClientError::DuplicatePayment(id)) if id == order_id));

    let invalid = client.process_payment(request("invalid")).await;
    assert!(matches!(invalid, Err(PaymentClientError::Rejected(_))));

    let broken = client.process_payment(request("broken")).await;
    assert!(matches!(broken, Err(PaymentClientError::Unavailable(_))));
}

#[tokio::test]
async fn test_slow_endpoint_times_out_as_unavailable() {
    let client = start_stub().await;
    let result = client.process_payment(request("slow")).await;
    assert!(matches!(result, Err(PaymentClientError::Unavailable(_))));
}
