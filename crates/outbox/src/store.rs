use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::EventId;

use crate::message::OutboxMessage;

/// Read side of the outbox used by the relay.
///
/// Only the relay reads unprocessed messages or sets `processed_at`.
#[async_trait]
pub trait OutboxStore: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns up to `limit` unprocessed messages, oldest `occurred_at` first.
    async fn fetch_unprocessed(&self, limit: usize) -> Result<Vec<OutboxMessage>, Self::Error>;

    /// Records that a message was published.
    async fn mark_processed(&self, id: EventId, at: DateTime<Utc>) -> Result<(), Self::Error>;
}
