use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CustomerId, Money, OrderId};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{Order, OrderItem, OrderStatus, OrderStore, OrderStoreError, Result};

/// PostgreSQL-backed order store.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_item(row: &PgRow) -> Result<OrderItem> {
        let quantity: i64 = row.try_get("quantity")?;
        let quantity = u32::try_from(quantity)
            .map_err(|_| OrderStoreError::Corrupt(format!("quantity {quantity}")))?;

        Ok(OrderItem::new(
            row.try_get::<String, _>("product_id")?,
            row.try_get::<String, _>("product_name")?,
            Money::from_cents(row.try_get("unit_price_cents")?),
            quantity,
        ))
    }

    fn row_to_order(row: &PgRow, items: Vec<OrderItem>) -> Result<Order> {
        let status: String = row.try_get("status")?;
        let status = OrderStatus::parse(&status)
            .ok_or_else(|| OrderStoreError::Corrupt(format!("status {status}")))?;

        Ok(Order::from_parts(
            OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            CustomerId::new(row.try_get::<String, _>("customer_id")?),
            items,
            Money::from_cents(row.try_get("total_cents")?),
            status,
            row.try_get("payment_id")?,
            row.try_get("failure_reason")?,
            row.try_get::<DateTime<Utc>, _>("created_at")?,
        ))
    }

    async fn load_items(&self, order_id: Uuid) -> Result<Vec<OrderItem>> {
        let rows = sqlx::query(
            r#"
            SELECT product_id, product_name, unit_price_cents, quantity
            FROM order_items
            WHERE order_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_item).collect()
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    #[tracing::instrument(skip(self, order), fields(order_id = %order.id()))]
    async fn insert(&self, order: &Order) -> Result<()> {
        let order_id = order.id();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, customer_id, total_cents, status, payment_id, failure_reason, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(order_id.as_uuid())
        .bind(order.customer_id().as_str())
        .bind(order.total_amount().cents())
        .bind(order.status().as_str())
        .bind(order.payment_id())
        .bind(order.failure_reason())
        .bind(order.created_at())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("orders_pkey")
            {
                return OrderStoreError::AlreadyExists(order_id);
            }
            OrderStoreError::Database(e)
        })?;

        for (position, item) in order.items().iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, position, product_id, product_name, unit_price_cents, quantity)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(order_id.as_uuid())
            .bind(position as i32)
            .bind(item.product_id.as_str())
            .bind(&item.product_name)
            .bind(item.unit_price.cents())
            .bind(i64::from(item.quantity))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::debug!(items = order.items().len(), "order inserted");
        Ok(())
    }

    #[tracing::instrument(skip(self, order), fields(order_id = %order.id(), status = %order.status()))]
    async fn update_status(&self, order: &Order) -> Result<()> {
        let order_id = order.id();

        // Only a PENDING row may change; the WHERE clause makes the check and
        // the write a single statement.
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $2, payment_id = $3, failure_reason = $4
            WHERE id = $1 AND status = 'PENDING'
            "#,
        )
        .bind(order_id.as_uuid())
        .bind(order.status().as_str())
        .bind(order.payment_id())
        .bind(order.failure_reason())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        let current: Option<String> =
            sqlx::query_scalar("SELECT status FROM orders WHERE id = $1")
                .bind(order_id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;

        match current {
            None => Err(OrderStoreError::NotFound(order_id)),
            Some(status) => Err(OrderStoreError::TerminalStatus {
                order_id,
                status: OrderStatus::parse(&status)
                    .ok_or_else(|| OrderStoreError::Corrupt(format!("status {status}")))?,
            }),
        }
    }

    async fn get(&self, order_id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(
            r#"
            SELECT id, customer_id, total_cents, status, payment_id, failure_reason, created_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let items = self.load_items(order_id.as_uuid()).await?;
                Ok(Some(Self::row_to_order(&row, items)?))
            }
            None => Ok(None),
        }
    }

    async fn find_by_customer(&self, customer_id: &CustomerId) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT id, customer_id, total_cents, status, payment_id, failure_reason, created_at
            FROM orders
            WHERE customer_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(customer_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in &rows {
            let id: Uuid = row.try_get("id")?;
            let items = self.load_items(id).await?;
            orders.push(Self::row_to_order(row, items)?);
        }
        Ok(orders)
    }

    async fn count(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }
}
