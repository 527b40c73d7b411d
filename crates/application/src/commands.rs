//! Use case commands.

use common::{CourierId, OrderId};

/// Command to create a delivery order for a street address.
#[derive(Debug, Clone)]
pub struct CreateOrder {
    pub order_id: OrderId,
    pub street: String,
    pub volume: i32,
}

impl CreateOrder {
    pub fn new(order_id: OrderId, street: impl Into<String>, volume: i32) -> Self {
        Self {
            order_id,
            street: street.into(),
            volume,
        }
    }
}

/// Command to register a courier.
#[derive(Debug, Clone)]
pub struct CreateCourier {
    pub name: String,
    pub speed: i32,
}

impl CreateCourier {
    pub fn new(name: impl Into<String>, speed: i32) -> Self {
        Self {
            name: name.into(),
            speed,
        }
    }
}

/// Command to give a courier another storage place.
#[derive(Debug, Clone)]
pub struct AddStoragePlace {
    pub courier_id: CourierId,
    pub name: String,
    pub total_volume: i32,
}

impl AddStoragePlace {
    pub fn new(courier_id: CourierId, name: impl Into<String>, total_volume: i32) -> Self {
        Self {
            courier_id,
            name: name.into(),
            total_volume,
        }
    }
}
