//! Domain error types.

use common::OrderId;
use thiserror::Error;

use crate::order::OrderStatus;

/// Errors raised by domain constructors, mutations and the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// A mandatory value was missing.
    #[error("Value is required: {field}")]
    ValueRequired { field: &'static str },

    /// A numeric value fell outside its allowed range.
    #[error("Value out of range: {field} = {value} (expected {min}..={max})")]
    ValueOutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    /// A value was present but not acceptable.
    #[error("Invalid value for {field}: {reason}")]
    ValueInvalid { field: &'static str, reason: String },

    /// The order status machine does not allow the requested transition.
    #[error("Invalid state transition: cannot move order from {current} to {target}")]
    InvalidState {
        current: OrderStatus,
        target: OrderStatus,
    },

    /// A referenced entity does not exist inside the aggregate.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The order cannot be dispatched or taken.
    #[error("Invalid order {order_id}: {reason}")]
    InvalidOrder {
        order_id: OrderId,
        reason: &'static str,
    },

    /// The dispatcher was called with unusable input.
    #[error("Invalid input: {0}")]
    InvalidInput(&'static str),

    /// No courier is able to take the order.
    #[error("No courier can take order {order_id}")]
    NoCandidate { order_id: OrderId },
}

impl DomainError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        DomainError::ValueInvalid {
            field,
            reason: reason.into(),
        }
    }

    /// Returns true for invalid values, including out-of-range and capacity violations.
    pub fn is_value_invalid(&self) -> bool {
        matches!(
            self,
            DomainError::ValueInvalid { .. } | DomainError::ValueOutOfRange { .. }
        )
    }

    /// Returns true for errors caused by bad caller-supplied values.
    pub fn is_validation(&self) -> bool {
        self.is_value_invalid() || matches!(self, DomainError::ValueRequired { .. })
    }
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_counts_as_invalid_value() {
        let err = DomainError::ValueOutOfRange {
            field: "x",
            value: 11,
            min: 1,
            max: 10,
        };
        assert!(err.is_value_invalid());
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "Value out of range: x = 11 (expected 1..=10)");
    }

    #[test]
    fn state_errors_are_not_validation_errors() {
        let err = DomainError::InvalidState {
            current: OrderStatus::Completed,
            target: OrderStatus::Assigned,
        };
        assert!(!err.is_validation());
        assert_eq!(
            err.to_string(),
            "Invalid state transition: cannot move order from Completed to Assigned"
        );
    }
}
