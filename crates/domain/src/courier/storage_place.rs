use common::{OrderId, StoragePlaceId};
use serde::Serialize;

use crate::error::{DomainError, Result};

/// A named capacity slot on a courier.
///
/// Holds at most one order, and only one whose volume fits `total_volume`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoragePlace {
    id: StoragePlaceId,
    name: String,
    total_volume: i32,
    order_id: Option<OrderId>,
}

impl StoragePlace {
    /// Creates an empty storage place.
    pub fn new(name: impl Into<String>, total_volume: i32) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::ValueRequired { field: "name" });
        }
        if total_volume <= 0 {
            return Err(DomainError::invalid(
                "total_volume",
                format!("{total_volume} must be greater than 0"),
            ));
        }

        Ok(Self {
            id: StoragePlaceId::new(),
            name,
            total_volume,
            order_id: None,
        })
    }

    /// Rebuilds a storage place from stored state.
    pub fn restore(
        id: StoragePlaceId,
        name: String,
        total_volume: i32,
        order_id: Option<OrderId>,
    ) -> Self {
        Self {
            id,
            name,
            total_volume,
            order_id,
        }
    }

    pub fn id(&self) -> StoragePlaceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn total_volume(&self) -> i32 {
        self.total_volume
    }

    /// Returns the order currently stored here.
    pub fn order_id(&self) -> Option<OrderId> {
        self.order_id
    }

    pub fn is_occupied(&self) -> bool {
        self.order_id.is_some()
    }

    /// Returns true if the place is empty and large enough for `volume`.
    pub fn can_store(&self, volume: i32) -> bool {
        !self.is_occupied() && volume <= self.total_volume
    }

    /// Puts an order into the place.
    pub fn store(&mut self, order_id: OrderId, volume: i32) -> Result<()> {
        if let Some(current) = self.order_id {
            return Err(DomainError::invalid(
                "storage_place",
                format!("{} already holds order {current}", self.name),
            ));
        }
        if volume > self.total_volume {
            return Err(DomainError::invalid(
                "volume",
                format!(
                    "{volume} exceeds capacity {} of {}",
                    self.total_volume, self.name
                ),
            ));
        }
        self.order_id = Some(order_id);
        Ok(())
    }

    /// Removes the given order from the place.
    pub fn clear(&mut self, order_id: OrderId) -> Result<()> {
        if self.order_id != Some(order_id) {
            return Err(DomainError::NotFound {
                entity: "Order in storage place",
                id: order_id.to_string(),
            });
        }
        self.order_id = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_place_is_empty() {
        let place = StoragePlace::new("Trunk", 20).unwrap();
        assert_eq!(place.name(), "Trunk");
        assert_eq!(place.total_volume(), 20);
        assert!(!place.is_occupied());
    }

    #[test]
    fn new_rejects_blank_name_and_bad_volume() {
        assert_eq!(
            StoragePlace::new("  ", 5).unwrap_err(),
            DomainError::ValueRequired { field: "name" }
        );
        assert!(StoragePlace::new("Bag", 0).unwrap_err().is_value_invalid());
    }

    #[test]
    fn store_respects_capacity_and_single_occupancy() {
        let mut place = StoragePlace::new("Bag", 10).unwrap();
        assert!(place.can_store(10));
        assert!(!place.can_store(11));
        assert!(place.store(OrderId::new(), 11).unwrap_err().is_value_invalid());

        place.store(OrderId::new(), 4).unwrap();
        assert!(!place.can_store(1));
        assert!(place.store(OrderId::new(), 1).is_err());
    }

    #[test]
    fn clear_only_releases_the_stored_order() {
        let mut place = StoragePlace::new("Bag", 10).unwrap();
        let order_id = OrderId::new();
        place.store(order_id, 2).unwrap();

        assert!(matches!(
            place.clear(OrderId::new()),
            Err(DomainError::NotFound { .. })
        ));
        assert_eq!(place.order_id(), Some(order_id));

        place.clear(order_id).unwrap();
        assert!(!place.is_occupied());
    }
}
