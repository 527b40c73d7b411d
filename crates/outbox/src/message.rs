use chrono::{DateTime, Utc};
use common::EventId;
use serde::{Deserialize, Serialize};

/// A durable record of a domain event waiting to be published.
///
/// Written in the same transaction as the aggregate change that raised the
/// event. Only `processed_at` ever changes afterwards, and only the relay
/// sets it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxMessage {
    /// Id of the domain event.
    pub id: EventId,

    /// Registry key of the event type, e.g. `OrderCreated`.
    pub event_name: String,

    /// Self-describing encoded event.
    pub payload: Vec<u8>,

    pub occurred_at: DateTime<Utc>,

    /// When the relay published the message.
    pub processed_at: Option<DateTime<Utc>>,
}

impl OutboxMessage {
    pub fn is_processed(&self) -> bool {
        self.processed_at.is_some()
    }
}
