use async_trait::async_trait;
use common::{CustomerId, OrderId, ProductId, RecordId, RestaurantId, TrackingId, Version};
use domain::{DeliveryAddress, Money, Order, OrderItem, OrderStatus, Product, Restaurant};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::outbox::{OutboxEventType, OutboxRecord, RelayStatus, SagaStatus};
use crate::store::{MarkOutcome, OrderStore, UpdateOutcome};
use crate::{Result, StoreError};

/// Returns the record set a given event type is stored in.
///
/// Payment and refund requests both target the payment domain and share the
/// `payment_outbox` table; approval requests live in `approval_outbox`.
fn outbox_table(event_type: OutboxEventType) -> &'static str {
    match event_type {
        OutboxEventType::PaymentRequest | OutboxEventType::RefundRequest => "payment_outbox",
        OutboxEventType::ApprovalRequest => "approval_outbox",
    }
}

/// PostgreSQL-backed order store implementation.
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
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_record(row: PgRow) -> Result<OutboxRecord> {
        let event_type_raw: String = row.try_get("event_type")?;
        let saga_status_raw: String = row.try_get("saga_status")?;
        let relay_status_raw: String = row.try_get("relay_status")?;

        Ok(OutboxRecord {
            id: RecordId::from_uuid(row.try_get::<Uuid, _>("id")?),
            saga_id: TrackingId::from_uuid(row.try_get::<Uuid, _>("saga_id")?),
            event_type: OutboxEventType::parse(&event_type_raw).ok_or_else(|| {
                StoreError::InvalidRow(format!("unknown event type {event_type_raw}"))
            })?,
            payload: row.try_get("payload")?,
            saga_status: SagaStatus::parse(&saga_status_raw).ok_or_else(|| {
                StoreError::InvalidRow(format!("unknown saga status {saga_status_raw}"))
            })?,
            relay_status: RelayStatus::parse(&relay_status_raw).ok_or_else(|| {
                StoreError::InvalidRow(format!("unknown relay status {relay_status_raw}"))
            })?,
            attempts: row.try_get::<i32, _>("attempts")? as u32,
            created_at: row.try_get("created_at")?,
            version: Version::new(row.try_get("version")?),
        })
    }

    async fn insert_record<'e, E>(executor: E, record: &OutboxRecord) -> Result<()>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let table = outbox_table(record.event_type);
        let sql = format!(
            r#"
            INSERT INTO {table}
                (id, saga_id, event_type, payload, saga_status, relay_status, attempts, created_at, version)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#
        );

        sqlx::query(&sql)
            .bind(record.id.as_uuid())
            .bind(record.saga_id.as_uuid())
            .bind(record.event_type.as_str())
            .bind(&record.payload)
            .bind(record.saga_status.as_str())
            .bind(record.relay_status.as_str())
            .bind(record.attempts as i32)
            .bind(record.created_at)
            .bind(record.version.as_i64())
            .execute(executor)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err
                        .constraint()
                        .is_some_and(|c| c.ends_with("saga_step"))
                {
                    return StoreError::DuplicateRecord {
                        saga_id: record.saga_id,
                        event_type: record.event_type.as_str().to_string(),
                    };
                }
                StoreError::Database(e)
            })?;

        Ok(())
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn create_order(&self, order: &Order, record: &OutboxRecord) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders
                (id, tracking_id, customer_id, restaurant_id, street, postal_code, city,
                 amount_cents, status, failure_messages, version)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(order.id().as_uuid())
        .bind(order.tracking_id().as_uuid())
        .bind(order.customer_id().as_uuid())
        .bind(order.restaurant_id().as_uuid())
        .bind(&order.address().street)
        .bind(&order.address().postal_code)
        .bind(&order.address().city)
        .bind(order.amount().cents())
        .bind(order.status().as_str())
        .bind(serde_json::to_value(order.failure_messages())?)
        .bind(order.version().as_i64())
        .execute(&mut *tx)
        .await?;

        for (index, item) in order.items().iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, item_index, product_id, quantity, price_cents)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(order.id().as_uuid())
            .bind(index as i32)
            .bind(item.product_id.as_uuid())
            .bind(item.quantity as i32)
            .bind(item.price.cents())
            .execute(&mut *tx)
            .await?;
        }

        Self::insert_record(&mut *tx, record).await?;

        tx.commit().await?;
        tracing::debug!(
            order_id = %order.id(),
            saga_id = %order.tracking_id(),
            "order and outbox record committed"
        );
        Ok(())
    }

    async fn update_order(
        &self,
        order: &Order,
        expected_version: Version,
        record: Option<&OutboxRecord>,
    ) -> Result<UpdateOutcome> {
        let new_version = expected_version.next();
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE orders
            SET status = $1, failure_messages = $2, version = $3
            WHERE id = $4 AND version = $5
            "#,
        )
        .bind(order.status().as_str())
        .bind(serde_json::to_value(order.failure_messages())?)
        .bind(new_version.as_i64())
        .bind(order.id().as_uuid())
        .bind(expected_version.as_i64())
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            // Another writer advanced the row; dropping the transaction
            // rolls back without having written anything.
            tracing::debug!(
                order_id = %order.id(),
                expected = expected_version.as_i64(),
                "version check failed, update rolled back"
            );
            return Ok(UpdateOutcome::Conflict);
        }

        if let Some(record) = record {
            Self::insert_record(&mut *tx, record).await?;
        }

        tx.commit().await?;
        Ok(UpdateOutcome::Updated(new_version))
    }

    async fn find_by_tracking_id(&self, tracking_id: TrackingId) -> Result<Option<Order>> {
        let Some(row) = sqlx::query(
            r#"
            SELECT id, tracking_id, customer_id, restaurant_id, street, postal_code, city,
                   amount_cents, status, failure_messages, version
            FROM orders
            WHERE tracking_id = $1
            "#,
        )
        .bind(tracking_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let order_id: Uuid = row.try_get("id")?;

        let item_rows = sqlx::query(
            r#"
            SELECT product_id, quantity, price_cents
            FROM order_items
            WHERE order_id = $1
            ORDER BY item_index ASC
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        let items = item_rows
            .into_iter()
            .map(|item_row| {
                Ok(OrderItem::new(
                    ProductId::from_uuid(item_row.try_get("product_id")?),
                    item_row.try_get::<i32, _>("quantity")? as u32,
                    Money::from_cents(item_row.try_get("price_cents")?),
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        let status_raw: String = row.try_get("status")?;
        let status = OrderStatus::parse(&status_raw)
            .ok_or_else(|| StoreError::InvalidRow(format!("unknown order status {status_raw}")))?;
        let failure_messages: Vec<String> = serde_json::from_value(row.try_get("failure_messages")?)?;

        Ok(Some(Order::from_storage(
            OrderId::from_uuid(order_id),
            TrackingId::from_uuid(row.try_get("tracking_id")?),
            CustomerId::from_uuid(row.try_get("customer_id")?),
            RestaurantId::from_uuid(row.try_get("restaurant_id")?),
            DeliveryAddress::new(
                row.try_get::<String, _>("street")?,
                row.try_get::<String, _>("postal_code")?,
                row.try_get::<String, _>("city")?,
            ),
            Money::from_cents(row.try_get("amount_cents")?),
            items,
            status,
            failure_messages,
            Version::new(row.try_get("version")?),
        )))
    }

    async fn find_pending_outbox(
        &self,
        event_type: OutboxEventType,
        limit: u32,
    ) -> Result<Vec<OutboxRecord>> {
        let table = outbox_table(event_type);
        let sql = format!(
            r#"
            SELECT id, saga_id, event_type, payload, saga_status, relay_status,
                   attempts, created_at, version
            FROM {table}
            WHERE event_type = $1 AND relay_status = 'PENDING' AND saga_status = 'STARTED'
            ORDER BY created_at ASC
            LIMIT $2
            "#
        );

        let rows = sqlx::query(&sql)
            .bind(event_type.as_str())
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_record).collect()
    }

    async fn mark_delivered(&self, record: &OutboxRecord) -> Result<MarkOutcome> {
        let table = outbox_table(record.event_type);
        let sql = format!(
            r#"
            UPDATE {table}
            SET saga_status = 'COMPLETED', relay_status = 'DELIVERED', version = version + 1
            WHERE id = $1 AND version = $2
            "#
        );

        let updated = sqlx::query(&sql)
            .bind(record.id.as_uuid())
            .bind(record.version.as_i64())
            .execute(&self.pool)
            .await?;

        if updated.rows_affected() == 0 {
            Ok(MarkOutcome::StaleVersion)
        } else {
            Ok(MarkOutcome::Completed)
        }
    }

    async fn record_attempt(&self, record: &OutboxRecord) -> Result<u32> {
        let table = outbox_table(record.event_type);
        let sql = format!(
            "UPDATE {table} SET attempts = attempts + 1 WHERE id = $1 RETURNING attempts"
        );

        let attempts: Option<i32> = sqlx::query_scalar(&sql)
            .bind(record.id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        attempts
            .map(|a| a as u32)
            .ok_or(StoreError::RecordNotFound(record.id))
    }

    async fn mark_failed(&self, record: &OutboxRecord) -> Result<()> {
        let table = outbox_table(record.event_type);
        let sql = format!("UPDATE {table} SET saga_status = 'FAILED' WHERE id = $1");

        let updated = sqlx::query(&sql)
            .bind(record.id.as_uuid())
            .execute(&self.pool)
            .await?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::RecordNotFound(record.id));
        }
        tracing::warn!(
            record_id = %record.id,
            saga_id = %record.saga_id,
            event_type = record.event_type.as_str(),
            "outbox record marked failed"
        );
        Ok(())
    }

    async fn find_restaurant(&self, restaurant_id: RestaurantId) -> Result<Option<Restaurant>> {
        let Some(row) = sqlx::query("SELECT id, name, active FROM restaurants WHERE id = $1")
            .bind(restaurant_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let product_rows = sqlx::query(
            "SELECT product_id, name, price_cents FROM restaurant_products WHERE restaurant_id = $1",
        )
        .bind(restaurant_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        let products = product_rows
            .into_iter()
            .map(|p| {
                Ok(Product {
                    id: ProductId::from_uuid(p.try_get("product_id")?),
                    name: p.try_get("name")?,
                    price: Money::from_cents(p.try_get("price_cents")?),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(Restaurant {
            id: RestaurantId::from_uuid(row.try_get("id")?),
            name: row.try_get("name")?,
            active: row.try_get("active")?,
            products,
        }))
    }

    async fn upsert_restaurant(&self, restaurant: &Restaurant) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO restaurants (id, name, active)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, active = EXCLUDED.active
            "#,
        )
        .bind(restaurant.id.as_uuid())
        .bind(&restaurant.name)
        .bind(restaurant.active)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM restaurant_products WHERE restaurant_id = $1")
            .bind(restaurant.id.as_uuid())
            .execute(&mut *tx)
            .await?;

        for product in &restaurant.products {
            sqlx::query(
                r#"
                INSERT INTO restaurant_products (restaurant_id, product_id, name, price_cents)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(restaurant.id.as_uuid())
            .bind(product.id.as_uuid())
            .bind(&product.name)
            .bind(product.price.cents())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
