//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::{CourierId, OrderId, Version};

use crate::aggregate::Aggregate;
use crate::error::{DomainError, Result};
use crate::kernel::Location;

use super::{OrderEvent, OrderStatus};

/// Order aggregate root.
///
/// A delivery of `volume` units to `location`. The courier reference is
/// present exactly when the status is `Assigned` or `Completed`.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    id: OrderId,
    courier_id: Option<CourierId>,
    location: Location,
    volume: i32,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    version: Version,
}

impl Aggregate for Order {
    type Id = OrderId;

    fn aggregate_type() -> &'static str {
        "Order"
    }

    fn id(&self) -> OrderId {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }
}

// Construction
impl Order {
    /// Creates a new order in `Created` status.
    ///
    /// Returns the order together with its `OrderCreated` event.
    pub fn create(id: OrderId, location: Location, volume: i32) -> Result<(Self, OrderEvent)> {
        if id.is_nil() {
            return Err(DomainError::ValueRequired { field: "order_id" });
        }
        if volume <= 0 {
            return Err(DomainError::invalid(
                "volume",
                format!("{volume} must be greater than 0"),
            ));
        }

        let order = Self {
            id,
            courier_id: None,
            location,
            volume,
            status: OrderStatus::Created,
            created_at: Utc::now(),
            version: Version::initial(),
        };
        Ok((order, OrderEvent::order_created(id)))
    }

    /// Rebuilds an order from stored state without raising any event.
    pub fn restore(
        id: OrderId,
        courier_id: Option<CourierId>,
        location: Location,
        volume: i32,
        status: OrderStatus,
        created_at: DateTime<Utc>,
        version: Version,
    ) -> Result<Self> {
        if status.has_courier() != courier_id.is_some() {
            return Err(DomainError::invalid(
                "courier_id",
                format!("order in {status} status with courier {courier_id:?}"),
            ));
        }

        Ok(Self {
            id,
            courier_id,
            location,
            volume,
            status,
            created_at,
            version,
        })
    }
}

// Query methods
impl Order {
    pub fn courier_id(&self) -> Option<CourierId> {
        self.courier_id
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn volume(&self) -> i32 {
        self.volume
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

// Command methods
impl Order {
    /// Binds the order to a courier (`Created -> Assigned`).
    pub fn assign(&mut self, courier_id: CourierId) -> Result<()> {
        self.transition_to(OrderStatus::Assigned)?;
        self.courier_id = Some(courier_id);
        Ok(())
    }

    /// Marks the order delivered (`Assigned -> Completed`).
    ///
    /// Completing an already completed order is an error.
    pub fn complete(&mut self) -> Result<OrderEvent> {
        self.transition_to(OrderStatus::Completed)?;
        Ok(OrderEvent::order_completed(self.id))
    }

    fn transition_to(&mut self, target: OrderStatus) -> Result<()> {
        if !self.status.can_transition_to(target) {
            return Err(DomainError::InvalidState {
                current: self.status,
                target,
            });
        }
        self.status = target;
        Ok(())
    }
}
