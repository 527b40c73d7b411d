use std::sync::Arc;

use async_trait::async_trait;
use common::{CourierId, OrderId, Version};
use domain::{Aggregate, Location, Order, OrderEvent, OrderStatus};
use outbox::EventRegistry;
use sqlx::{Postgres, Row, Transaction, postgres::PgRow};
use uuid::Uuid;

use super::map_insert_error;
use super::outbox_store::insert_events;
use crate::error::{PersistenceError, Result};
use crate::repository::OrderRepository;

const SELECT_ORDER: &str = r#"
    SELECT id, courier_id, location_x, location_y, volume, status, created_at, version
    FROM orders
"#;

/// PostgreSQL-backed order repository.
#[derive(Debug, Clone)]
pub struct PostgresOrderRepository {
    registry: Arc<EventRegistry<OrderEvent>>,
}

impl PostgresOrderRepository {
    pub fn new(registry: Arc<EventRegistry<OrderEvent>>) -> Self {
        Self { registry }
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let id = OrderId::from_uuid(row.try_get::<Uuid, _>("id")?);
        let corrupted = |source| PersistenceError::corrupted::<Order>(id, source);

        let location = Location::new(row.try_get("location_x")?, row.try_get("location_y")?)
            .map_err(corrupted)?;
        let status: OrderStatus = row
            .try_get::<String, _>("status")?
            .parse()
            .map_err(corrupted)?;

        Order::restore(
            id,
            row.try_get::<Option<Uuid>, _>("courier_id")?
                .map(CourierId::from_uuid),
            location,
            row.try_get("volume")?,
            status,
            row.try_get("created_at")?,
            Version::new(row.try_get("version")?),
        )
        .map_err(corrupted)
    }
}

#[async_trait]
impl OrderRepository<Transaction<'static, Postgres>> for PostgresOrderRepository {
    async fn add(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        order: &Order,
        events: &[OrderEvent],
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, courier_id, location_x, location_y, volume, status, created_at, version)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(order.id().as_uuid())
        .bind(order.courier_id().map(|id| id.as_uuid()))
        .bind(order.location().x())
        .bind(order.location().y())
        .bind(order.volume())
        .bind(order.status().as_str())
        .bind(order.created_at())
        .bind(order.version().as_i64())
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            map_insert_error(
                e,
                "orders_pkey",
                PersistenceError::already_exists::<Order>(order.id()),
            )
        })?;

        insert_events(&mut **tx, &self.registry, events).await
    }

    async fn update(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        order: &mut Order,
        events: &[OrderEvent],
    ) -> Result<()> {
        let exists: Option<i64> = sqlx::query_scalar("SELECT version FROM orders WHERE id = $1")
            .bind(order.id().as_uuid())
            .fetch_optional(&mut **tx)
            .await?;
        if exists.is_none() {
            return Err(PersistenceError::not_found::<Order>(order.id()));
        }

        let result = sqlx::query(
            r#"
            UPDATE orders
            SET courier_id = $3, location_x = $4, location_y = $5, volume = $6, status = $7,
                version = version + 1
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(order.id().as_uuid())
        .bind(order.version().as_i64())
        .bind(order.courier_id().map(|id| id.as_uuid()))
        .bind(order.location().x())
        .bind(order.location().y())
        .bind(order.volume())
        .bind(order.status().as_str())
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::version_conflict(&*order));
        }

        insert_events(&mut **tx, &self.registry, events).await?;
        order.set_version(order.version().next());
        Ok(())
    }

    async fn get(&self, tx: &mut Transaction<'static, Postgres>, id: OrderId) -> Result<Order> {
        let row = sqlx::query(&format!("{SELECT_ORDER} WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| PersistenceError::not_found::<Order>(id))?;

        Self::row_to_order(row)
    }

    async fn get_first_in_created_status(
        &self,
        tx: &mut Transaction<'static, Postgres>,
    ) -> Result<Option<Order>> {
        let row = sqlx::query(&format!(
            "{SELECT_ORDER} WHERE status = $1 ORDER BY created_at ASC, id ASC LIMIT 1"
        ))
        .bind(OrderStatus::Created.as_str())
        .fetch_optional(&mut **tx)
        .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn get_all_in_assigned_status(
        &self,
        tx: &mut Transaction<'static, Postgres>,
    ) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "{SELECT_ORDER} WHERE status = $1 ORDER BY created_at ASC, id ASC"
        ))
        .bind(OrderStatus::Assigned.as_str())
        .fetch_all(&mut **tx)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn get_all_uncompleted(
        &self,
        tx: &mut Transaction<'static, Postgres>,
    ) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "{SELECT_ORDER} WHERE status <> $1 ORDER BY created_at ASC, id ASC"
        ))
        .bind(OrderStatus::Completed.as_str())
        .fetch_all(&mut **tx)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }
}
