//! Order domain events.

use chrono::{DateTime, Utc};
use common::{EventId, OrderId};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

/// Events raised by the order aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    /// Order was created.
    OrderCreated(OrderCreatedData),

    /// Order was delivered.
    OrderCompleted(OrderCompletedData),
}

impl DomainEvent for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderCreated(_) => "OrderCreated",
            OrderEvent::OrderCompleted(_) => "OrderCompleted",
        }
    }

    fn event_id(&self) -> EventId {
        match self {
            OrderEvent::OrderCreated(data) => data.event_id,
            OrderEvent::OrderCompleted(data) => data.event_id,
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            OrderEvent::OrderCreated(data) => data.occurred_at,
            OrderEvent::OrderCompleted(data) => data.occurred_at,
        }
    }
}

impl OrderEvent {
    pub(crate) fn order_created(order_id: OrderId) -> Self {
        OrderEvent::OrderCreated(OrderCreatedData {
            event_id: EventId::new(),
            order_id,
            occurred_at: Utc::now(),
        })
    }

    pub(crate) fn order_completed(order_id: OrderId) -> Self {
        OrderEvent::OrderCompleted(OrderCompletedData {
            event_id: EventId::new(),
            order_id,
            occurred_at: Utc::now(),
        })
    }

    /// Returns the event name carried in published payloads.
    pub fn name(&self) -> &'static str {
        match self {
            OrderEvent::OrderCreated(_) => "order_created",
            OrderEvent::OrderCompleted(_) => "order_completed",
        }
    }

    /// Returns the id of the order the event belongs to.
    pub fn order_id(&self) -> OrderId {
        match self {
            OrderEvent::OrderCreated(data) => data.order_id,
            OrderEvent::OrderCompleted(data) => data.order_id,
        }
    }
}

/// Data for OrderCreated event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCreatedData {
    pub event_id: EventId,
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Data for OrderCompleted event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCompletedData {
    pub event_id: EventId,
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_and_name() {
        let order_id = OrderId::new();
        let created = OrderEvent::order_created(order_id);
        let completed = OrderEvent::order_completed(order_id);

        assert_eq!(created.event_type(), "OrderCreated");
        assert_eq!(created.name(), "order_created");
        assert_eq!(completed.event_type(), "OrderCompleted");
        assert_eq!(completed.name(), "order_completed");
        assert_eq!(created.order_id(), order_id);
        assert_ne!(created.event_id(), completed.event_id());
    }

    #[test]
    fn test_serialization_is_tagged() {
        let event = OrderEvent::order_created(OrderId::new());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "OrderCreated");

        let back: OrderEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
