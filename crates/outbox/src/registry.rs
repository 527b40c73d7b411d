//! Event type registry used to encode and decode outbox messages.
//!
//! The registry is built once at startup and is immutable afterwards. It is
//! shared by reference between the repositories that write outbox rows and
//! the relay that reads them.

use std::collections::HashMap;

use common::{EventId, OrderId};
use domain::{DomainEvent, OrderCompletedData, OrderCreatedData, OrderEvent};
use serde::{Deserialize, Serialize};

use crate::error::{OutboxError, Result};
use crate::message::OutboxMessage;

/// Encode/decode function pair for one event type.
pub struct EventCodec<E> {
    pub encode: fn(&E) -> Result<Vec<u8>>,
    pub decode: fn(&OutboxMessage) -> Result<E>,
}

/// Immutable mapping from event type name to its codec.
pub struct EventRegistry<E> {
    codecs: HashMap<&'static str, EventCodec<E>>,
}

impl<E> std::fmt::Debug for EventRegistry<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.codecs.keys().collect();
        names.sort();
        f.debug_struct("EventRegistry")
            .field("event_types", &names)
            .finish()
    }
}

impl<E: DomainEvent> EventRegistry<E> {
    pub fn builder() -> EventRegistryBuilder<E> {
        EventRegistryBuilder {
            codecs: HashMap::new(),
        }
    }

    /// Returns true if a codec is registered for the event type.
    pub fn contains(&self, event_type: &str) -> bool {
        self.codecs.contains_key(event_type)
    }

    /// Encodes a domain event into an unprocessed outbox message.
    pub fn encode(&self, event: &E) -> Result<OutboxMessage> {
        let event_type = event.event_type();
        let codec = self
            .codecs
            .get(event_type)
            .ok_or_else(|| OutboxError::UnknownEventType(event_type.to_string()))?;

        Ok(OutboxMessage {
            id: event.event_id(),
            event_name: event_type.to_string(),
            payload: (codec.encode)(event)?,
            occurred_at: event.occurred_at(),
            processed_at: None,
        })
    }

    /// Decodes an outbox message back into its domain event.
    pub fn decode(&self, message: &OutboxMessage) -> Result<E> {
        let codec = self
            .codecs
            .get(message.event_name.as_str())
            .ok_or_else(|| OutboxError::UnknownEventType(message.event_name.clone()))?;
        (codec.decode)(message)
    }
}

/// Collects codecs before the registry is frozen.
pub struct EventRegistryBuilder<E> {
    codecs: HashMap<&'static str, EventCodec<E>>,
}

impl<E: DomainEvent> EventRegistryBuilder<E> {
    /// Registers a codec under `event_type`, replacing any earlier one.
    pub fn register(mut self, event_type: &'static str, codec: EventCodec<E>) -> Self {
        self.codecs.insert(event_type, codec);
        self
    }

    pub fn build(self) -> EventRegistry<E> {
        EventRegistry {
            codecs: self.codecs,
        }
    }
}

/// Registry for every order event kind.
pub fn order_event_registry() -> EventRegistry<OrderEvent> {
    EventRegistry::builder()
        .register(
            "OrderCreated",
            EventCodec {
                encode: encode_order_event,
                decode: decode_order_created,
            },
        )
        .register(
            "OrderCompleted",
            EventCodec {
                encode: encode_order_event,
                decode: decode_order_completed,
            },
        )
        .build()
}

/// Stable payload layout of order events.
#[derive(Debug, Serialize, Deserialize)]
struct OrderEventPayload {
    id: EventId,
    name: String,
    order_id: OrderId,
}

fn encode_order_event(event: &OrderEvent) -> Result<Vec<u8>> {
    let payload = OrderEventPayload {
        id: event.event_id(),
        name: event.name().to_string(),
        order_id: event.order_id(),
    };
    serde_json::to_vec(&payload).map_err(|source| OutboxError::Encode {
        event_type: event.event_type().to_string(),
        source,
    })
}

fn read_payload(message: &OutboxMessage, expected_name: &str) -> Result<OrderEventPayload> {
    let decode_error = |reason: String| OutboxError::Decode {
        event_type: message.event_name.clone(),
        message_id: message.id,
        reason,
    };

    let payload: OrderEventPayload =
        serde_json::from_slice(&message.payload).map_err(|e| decode_error(e.to_string()))?;
    if payload.name != expected_name {
        return Err(decode_error(format!(
            "expected event name '{expected_name}', found '{}'",
            payload.name
        )));
    }
    Ok(payload)
}

fn decode_order_created(message: &OutboxMessage) -> Result<OrderEvent> {
    let payload = read_payload(message, "order_created")?;
    Ok(OrderEvent::OrderCreated(OrderCreatedData {
        event_id: payload.id,
        order_id: payload.order_id,
        occurred_at: message.occurred_at,
    }))
}

fn decode_order_completed(message: &OutboxMessage) -> Result<OrderEvent> {
    let payload = read_payload(message, "order_completed")?;
    Ok(OrderEvent::OrderCompleted(OrderCompletedData {
        event_id: payload.id,
        order_id: payload.order_id,
        occurred_at: message.occurred_at,
    }))
}
