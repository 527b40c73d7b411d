//! Outbox error types.

use common::EventId;
use thiserror::Error;

/// Errors that can occur while encoding, decoding or relaying events.
#[derive(Debug, Error)]
pub enum OutboxError {
    /// No codec is registered for the event type.
    #[error("Unknown event type: {0}")]
    UnknownEventType(String),

    /// The event could not be serialized.
    #[error("Failed to encode {event_type}: {source}")]
    Encode {
        event_type: String,
        #[source]
        source: serde_json::Error,
    },

    /// The stored payload could not be turned back into an event.
    #[error("Failed to decode {event_type} message {message_id}: {reason}")]
    Decode {
        event_type: String,
        message_id: EventId,
        reason: String,
    },

    /// Publishing to the message bus failed.
    #[error(transparent)]
    Publish(#[from] PublishError),
}

/// Errors returned by [`crate::EventPublisher`] implementations.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The broker rejected or did not acknowledge the message.
    #[error("Failed to publish to {topic}: {reason}")]
    Failed { topic: String, reason: String },

    /// The publisher could not be set up.
    #[error("Publisher configuration error: {0}")]
    Configuration(String),
}

/// Result type for outbox operations.
pub type Result<T> = std::result::Result<T, OutboxError>;
