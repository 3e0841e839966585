use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CustomerId, Money, OrderId, PaymentId};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{LedgerError, Payment, PaymentLedger, PaymentStatus};

/// PostgreSQL-backed payment ledger.
///
/// The `unique_payment_order` constraint enforces one payment per order.
#[derive(Clone)]
pub struct PostgresPaymentLedger {
    pool: PgPool,
}

impl PostgresPaymentLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<(), LedgerError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_payment(row: &PgRow) -> Result<Payment, LedgerError> {
        let status: String = row.try_get("status")?;
        let status = PaymentStatus::parse(&status)
            .ok_or_else(|| LedgerError::Corrupt(format!("status {status}")))?;

        Ok(Payment {
            id: PaymentId::from_uuid(row.try_get::<Uuid, _>("id")?),
            order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
            customer_id: CustomerId::new(row.try_get::<String, _>("customer_id")?),
            amount: Money::from_cents(row.try_get("amount_cents")?),
            status,
            transaction_id: row.try_get("transaction_id")?,
            gateway_response: row.try_get("gateway_response")?,
            failure_reason: row.try_get("failure_reason")?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        })
    }
}

#[async_trait]
impl PaymentLedger for PostgresPaymentLedger {
    async fn insert(&self, payment: &Payment) -> Result<(), LedgerError> {
        sqlx::query(
            r#"
            INSERT INTO payments (id, order_id, customer_id, amount_cents, status,
                                  transaction_id, gateway_response, failure_reason, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(payment.order_id.as_uuid())
        .bind(payment.customer_id.as_str())
        .bind(payment.amount.cents())
        .bind(payment.status.as_str())
        .bind(payment.transaction_id.as_deref())
        .bind(payment.gateway_response.as_deref())
        .bind(payment.failure_reason.as_deref())
        .bind(payment.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("unique_payment_order")
            {
                return LedgerError::DuplicatePayment(payment.order_id);
            }
            LedgerError::Database(e)
        })?;

        Ok(())
    }

    async fn update(&self, payment: &Payment) -> Result<(), LedgerError> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = $2, transaction_id = $3, gateway_response = $4, failure_reason = $5
            WHERE id = $1 AND status = 'PENDING'
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(payment.status.as_str())
        .bind(payment.transaction_id.as_deref())
        .bind(payment.gateway_response.as_deref())
        .bind(payment.failure_reason.as_deref())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        let exists: Option<String> = sqlx::query_scalar("SELECT status FROM payments WHERE id = $1")
            .bind(payment.id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        match exists {
            None => Err(LedgerError::NotFound(payment.id)),
            Some(_) => Err(LedgerError::AlreadyResolved(payment.id)),
        }
    }

    async fn find_by_order_id(&self, order_id: OrderId) -> Result<Option<Payment>, LedgerError> {
        let row = sqlx::query(
            r#"
            SELECT id, order_id, customer_id, amount_cents, status,
                   transaction_id, gateway_response, failure_reason, created_at
            FROM payments
            WHERE order_id = $1
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_payment).transpose()
    }
}
