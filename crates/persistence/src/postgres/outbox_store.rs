use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::EventId;
use domain::OrderEvent;
use outbox::{EventRegistry, OutboxMessage, OutboxStore};
use sqlx::{PgConnection, PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::error::{PersistenceError, Result};

/// Encodes `events` and inserts them into the outbox on `conn`.
pub(super) async fn insert_events(
    conn: &mut PgConnection,
    registry: &EventRegistry<OrderEvent>,
    events: &[OrderEvent],
) -> Result<()> {
    for event in events {
        let message = registry.encode(event)?;
        sqlx::query(
            r#"
            INSERT INTO outbox (id, event_name, event_payload, occurred_at, processed_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(message.id.as_uuid())
        .bind(&message.event_name)
        .bind(&message.payload)
        .bind(message.occurred_at)
        .bind(message.processed_at)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Outbox reader used by the relay.
#[derive(Debug, Clone)]
pub struct PostgresOutboxStore {
    pool: PgPool,
}

impl PostgresOutboxStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_message(row: PgRow) -> Result<OutboxMessage> {
        Ok(OutboxMessage {
            id: EventId::from_uuid(row.try_get::<Uuid, _>("id")?),
            event_name: row.try_get("event_name")?,
            payload: row.try_get("event_payload")?,
            occurred_at: row.try_get("occurred_at")?,
            processed_at: row.try_get("processed_at")?,
        })
    }
}

#[async_trait]
impl OutboxStore for PostgresOutboxStore {
    type Error = PersistenceError;

    async fn fetch_unprocessed(&self, limit: usize) -> Result<Vec<OutboxMessage>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query(
            r#"
            SELECT id, event_name, event_payload, occurred_at, processed_at
            FROM outbox
            WHERE processed_at IS NULL
            ORDER BY occurred_at ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_message).collect()
    }

    async fn mark_processed(&self, id: EventId, at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE outbox SET processed_at = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
