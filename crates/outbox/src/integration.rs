use chrono::{DateTime, Utc};
use common::{EventId, OrderId};
use domain::{DomainEvent, OrderEvent, OrderStatus};
use serde::{Deserialize, Serialize};

/// Event published to external consumers when an order changes.
///
/// Consumers receive each event at least once and should deduplicate on
/// `event_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationEvent {
    pub event_id: EventId,
    pub event_type: String,
    pub order_id: OrderId,
    pub order_status: OrderStatus,
    pub occurred_at: DateTime<Utc>,
}

impl IntegrationEvent {
    /// Message key used for partitioning on the bus.
    pub fn key(&self) -> String {
        self.order_id.to_string()
    }

    pub fn to_payload(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

impl From<&OrderEvent> for IntegrationEvent {
    fn from(event: &OrderEvent) -> Self {
        let order_status = match event {
            OrderEvent::OrderCreated(_) => OrderStatus::Created,
            OrderEvent::OrderCompleted(_) => OrderStatus::Completed,
        };

        Self {
            event_id: event.event_id(),
            event_type: event.name().to_string(),
            order_id: event.order_id(),
            order_status,
            occurred_at: event.occurred_at(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{Aggregate, Location, Order};

    #[test]
    fn built_from_order_created() {
        let (order, event) = Order::create(OrderId::new(), Location::new(1, 2).unwrap(), 2).unwrap();
        let integration = IntegrationEvent::from(&event);

        assert_eq!(integration.event_id, event.event_id());
        assert_eq!(integration.event_type, "order_created");
        assert_eq!(integration.order_status, OrderStatus::Created);
        assert_eq!(integration.key(), order.id().to_string());

        let json: serde_json::Value =
            serde_json::from_slice(&integration.to_payload().unwrap()).unwrap();
        assert_eq!(json["order_status"], "Created");
        assert_eq!(json["order_id"], order.id().to_string());
    }
}
