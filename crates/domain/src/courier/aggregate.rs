//! Courier aggregate implementation.

use chrono::{DateTime, Utc};
use common::{CourierId, OrderId, StoragePlaceId, Version};

use crate::aggregate::Aggregate;
use crate::error::{DomainError, Result};
use crate::kernel::Location;
use crate::order::Order;

use super::StoragePlace;

/// Name of the storage place every new courier starts with.
pub const DEFAULT_STORAGE_PLACE_NAME: &str = "Bag";

/// Capacity of the default storage place.
pub const DEFAULT_STORAGE_PLACE_VOLUME: i32 = 10;

/// Courier aggregate root.
///
/// Moves on the grid at `speed` steps per tick and carries orders in its
/// storage places. Storage places keep their declaration order, which
/// decides where an order is put when several places fit.
#[derive(Debug, Clone, PartialEq)]
pub struct Courier {
    id: CourierId,
    name: String,
    speed: i32,
    location: Location,
    storage_places: Vec<StoragePlace>,
    created_at: DateTime<Utc>,
    version: Version,
}

impl Aggregate for Courier {
    type Id = CourierId;

    fn aggregate_type() -> &'static str {
        "Courier"
    }

    fn id(&self) -> CourierId {
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
impl Courier {
    /// Creates a courier with the default storage place.
    pub fn new(name: impl Into<String>, speed: i32, location: Location) -> Result<Self> {
        let name = name.into();
        validate(&name, speed)?;
        let bag = StoragePlace::new(DEFAULT_STORAGE_PLACE_NAME, DEFAULT_STORAGE_PLACE_VOLUME)?;

        Ok(Self {
            id: CourierId::new(),
            name,
            speed,
            location,
            storage_places: vec![bag],
            created_at: Utc::now(),
            version: Version::initial(),
        })
    }

    /// Rebuilds a courier from stored state.
    pub fn restore(
        id: CourierId,
        name: String,
        speed: i32,
        location: Location,
        storage_places: Vec<StoragePlace>,
        created_at: DateTime<Utc>,
        version: Version,
    ) -> Result<Self> {
        validate(&name, speed)?;

        Ok(Self {
            id,
            name,
            speed,
            location,
            storage_places,
            created_at,
            version,
        })
    }
}

fn validate(name: &str, speed: i32) -> Result<()> {
    if name.trim().is_empty() {
        return Err(DomainError::ValueRequired { field: "name" });
    }
    if speed <= 0 {
        return Err(DomainError::invalid(
            "speed",
            format!("{speed} must be greater than 0"),
        ));
    }
    Ok(())
}

// Query methods
impl Courier {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn speed(&self) -> i32 {
        self.speed
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn storage_places(&self) -> &[StoragePlace] {
        &self.storage_places
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns true if no storage place holds an order.
    pub fn is_free(&self) -> bool {
        !self.storage_places.iter().any(StoragePlace::is_occupied)
    }

    /// Returns true if some empty storage place can hold the order.
    pub fn can_take_order(&self, order: &Order) -> bool {
        self.storage_places
            .iter()
            .any(|place| place.can_store(order.volume()))
    }

    /// Ticks needed to reach `target` at the courier's speed.
    pub fn calculate_time_to_location(&self, target: &Location) -> f64 {
        f64::from(self.location.distance_to(target)) / f64::from(self.speed)
    }
}

// Command methods
impl Courier {
    /// Appends a storage place and returns its id.
    pub fn add_storage_place(
        &mut self,
        name: impl Into<String>,
        total_volume: i32,
    ) -> Result<StoragePlaceId> {
        let place = StoragePlace::new(name, total_volume)?;
        let id = place.id();
        self.storage_places.push(place);
        Ok(id)
    }

    /// Stores the order in the first empty place large enough for it.
    pub fn take_order(&mut self, order: &Order) -> Result<StoragePlaceId> {
        let place = self
            .storage_places
            .iter_mut()
            .find(|place| place.can_store(order.volume()))
            .ok_or(DomainError::InvalidOrder {
                order_id: order.id(),
                reason: "no storage place can hold the order",
            })?;
        place.store(order.id(), order.volume())?;
        Ok(place.id())
    }

    /// Frees the storage place holding the delivered order.
    pub fn complete_order(&mut self, order: &Order) -> Result<()> {
        self.release_order(order.id())
    }

    /// Frees the storage place holding `order_id`.
    pub fn release_order(&mut self, order_id: OrderId) -> Result<()> {
        let place = self
            .storage_places
            .iter_mut()
            .find(|place| place.order_id() == Some(order_id))
            .ok_or_else(|| DomainError::NotFound {
                entity: "Order in courier storage",
                id: order_id.to_string(),
            })?;
        place.clear(order_id)
    }

    /// Advances one tick towards `target`.
    ///
    /// Spends at most `speed` steps, X axis first, and any remaining budget
    /// on the Y axis.
    pub fn move_towards(&mut self, target: &Location) -> Result<()> {
        let budget = self.speed;
        let dx = (target.x() - self.location.x()).clamp(-budget, budget);
        let remaining = budget - dx.abs();
        let dy = (target.y() - self.location.y()).clamp(-remaining, remaining);

        self.location = Location::new(self.location.x() + dx, self.location.y() + dy)?;
        Ok(())
    }
}
