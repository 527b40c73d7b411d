use std::collections::HashMap;

use async_trait::async_trait;
use common::{CourierId, OrderId, StoragePlaceId, Version};
use domain::{Aggregate, Courier, Location, StoragePlace};
use sqlx::{PgConnection, Postgres, Row, Transaction, postgres::PgRow};
use uuid::Uuid;

use super::map_insert_error;
use crate::error::{PersistenceError, Result};
use crate::repository::CourierRepository;

const SELECT_COURIER: &str = r#"
    SELECT c.id, c.name, c.speed, c.location_x, c.location_y, c.created_at, c.version
    FROM couriers c
"#;

/// PostgreSQL-backed courier repository.
///
/// Storage places live in their own table and are rewritten on every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresCourierRepository;

impl PostgresCourierRepository {
    async fn insert_storage_places(conn: &mut PgConnection, courier: &Courier) -> Result<()> {
        for (position, place) in courier.storage_places().iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO storage_places (id, courier_id, position, name, total_volume, order_id)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(place.id().as_uuid())
            .bind(courier.id().as_uuid())
            .bind(position as i32)
            .bind(place.name())
            .bind(place.total_volume())
            .bind(place.order_id().map(|id| id.as_uuid()))
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    /// Loads storage places for the given couriers, keyed by courier id.
    async fn load_storage_places(
        conn: &mut PgConnection,
        courier_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<StoragePlace>>> {
        let rows = sqlx::query(
            r#"
            SELECT id, courier_id, name, total_volume, order_id
            FROM storage_places
            WHERE courier_id = ANY($1)
            ORDER BY courier_id, position ASC
            "#,
        )
        .bind(courier_ids)
        .fetch_all(&mut *conn)
        .await?;

        let mut places: HashMap<Uuid, Vec<StoragePlace>> = HashMap::new();
        for row in rows {
            let courier_id: Uuid = row.try_get("courier_id")?;
            let place = StoragePlace::restore(
                StoragePlaceId::from_uuid(row.try_get("id")?),
                row.try_get("name")?,
                row.try_get("total_volume")?,
                row.try_get::<Option<Uuid>, _>("order_id")?
                    .map(OrderId::from_uuid),
            );
            places.entry(courier_id).or_default().push(place);
        }
        Ok(places)
    }

    fn row_to_courier(row: PgRow, storage_places: Vec<StoragePlace>) -> Result<Courier> {
        let id = CourierId::from_uuid(row.try_get::<Uuid, _>("id")?);
        let corrupted = |source| PersistenceError::corrupted::<Courier>(id, source);

        let location = Location::new(row.try_get("location_x")?, row.try_get("location_y")?)
            .map_err(corrupted)?;

        Courier::restore(
            id,
            row.try_get("name")?,
            row.try_get("speed")?,
            location,
            storage_places,
            row.try_get("created_at")?,
            Version::new(row.try_get("version")?),
        )
        .map_err(corrupted)
    }

    async fn hydrate(conn: &mut PgConnection, rows: Vec<PgRow>) -> Result<Vec<Courier>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids = rows
            .iter()
            .map(|row| row.try_get::<Uuid, _>("id"))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let mut places = Self::load_storage_places(conn, &ids).await?;

        rows.into_iter()
            .zip(ids)
            .map(|(row, id)| Self::row_to_courier(row, places.remove(&id).unwrap_or_default()))
            .collect()
    }
}

#[async_trait]
impl CourierRepository<Transaction<'static, Postgres>> for PostgresCourierRepository {
    async fn add(&self, tx: &mut Transaction<'static, Postgres>, courier: &Courier) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO couriers (id, name, speed, location_x, location_y, created_at, version)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(courier.id().as_uuid())
        .bind(courier.name())
        .bind(courier.speed())
        .bind(courier.location().x())
        .bind(courier.location().y())
        .bind(courier.created_at())
        .bind(courier.version().as_i64())
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            map_insert_error(
                e,
                "couriers_pkey",
                PersistenceError::already_exists::<Courier>(courier.id()),
            )
        })?;

        Self::insert_storage_places(&mut **tx, courier).await
    }

    async fn update(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        courier: &mut Courier,
    ) -> Result<()> {
        let exists: Option<i64> = sqlx::query_scalar("SELECT version FROM couriers WHERE id = $1")
            .bind(courier.id().as_uuid())
            .fetch_optional(&mut **tx)
            .await?;
        if exists.is_none() {
            return Err(PersistenceError::not_found::<Courier>(courier.id()));
        }

        let result = sqlx::query(
            r#"
            UPDATE couriers
            SET name = $3, speed = $4, location_x = $5, location_y = $6, version = version + 1
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(courier.id().as_uuid())
        .bind(courier.version().as_i64())
        .bind(courier.name())
        .bind(courier.speed())
        .bind(courier.location().x())
        .bind(courier.location().y())
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::version_conflict(&*courier));
        }

        sqlx::query("DELETE FROM storage_places WHERE courier_id = $1")
            .bind(courier.id().as_uuid())
            .execute(&mut **tx)
            .await?;
        Self::insert_storage_places(&mut **tx, courier).await?;

        courier.set_version(courier.version().next());
        Ok(())
    }

    async fn get(&self, tx: &mut Transaction<'static, Postgres>, id: CourierId) -> Result<Courier> {
        let row = sqlx::query(&format!("{SELECT_COURIER} WHERE c.id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| PersistenceError::not_found::<Courier>(id))?;

        let mut couriers = Self::hydrate(&mut **tx, vec![row]).await?;
        couriers
            .pop()
            .ok_or_else(|| PersistenceError::not_found::<Courier>(id))
    }

    async fn get_all_free_couriers(
        &self,
        tx: &mut Transaction<'static, Postgres>,
    ) -> Result<Vec<Courier>> {
        let rows = sqlx::query(&format!(
            r#"{SELECT_COURIER}
            WHERE NOT EXISTS (
                SELECT 1 FROM storage_places sp
                WHERE sp.courier_id = c.id AND sp.order_id IS NOT NULL
            )
            ORDER BY c.created_at ASC, c.id ASC"#
        ))
        .fetch_all(&mut **tx)
        .await?;

        Self::hydrate(&mut **tx, rows).await
    }

    async fn get_all(&self, tx: &mut Transaction<'static, Postgres>) -> Result<Vec<Courier>> {
        let rows = sqlx::query(&format!(
            "{SELECT_COURIER} ORDER BY c.created_at ASC, c.id ASC"
        ))
        .fetch_all(&mut **tx)
        .await?;

        Self::hydrate(&mut **tx, rows).await
    }
}
