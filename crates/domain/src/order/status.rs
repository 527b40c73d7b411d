//! Order status machine.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// The status of an order in its lifecycle.
///
/// Transitions are strictly forward:
/// ```text
/// Created ──► Assigned ──► Completed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Waiting for a courier.
    #[default]
    Created,

    /// Bound to a courier that is travelling to the delivery point.
    Assigned,

    /// Delivered (terminal state).
    Completed,
}

impl OrderStatus {
    /// Returns true if the machine allows moving from this status to `target`.
    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        matches!(
            (self, target),
            (OrderStatus::Created, OrderStatus::Assigned)
                | (OrderStatus::Assigned, OrderStatus::Completed)
        )
    }

    /// Returns true if an order in this status must reference a courier.
    pub fn has_courier(&self) -> bool {
        matches!(self, OrderStatus::Assigned | OrderStatus::Completed)
    }

    /// Returns true for statuses that are still waiting on delivery.
    pub fn is_uncompleted(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "Created",
            OrderStatus::Assigned => "Assigned",
            OrderStatus::Completed => "Completed",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Created" => Ok(OrderStatus::Created),
            "Assigned" => Ok(OrderStatus::Assigned),
            "Completed" => Ok(OrderStatus::Completed),
            other => Err(DomainError::invalid(
                "status",
                format!("unknown order status '{other}'"),
            )),
        }
    }
}
