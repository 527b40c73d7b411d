//! Domain layer for the delivery service.
//!
//! This crate provides the core domain model:
//! - `Location` grid value object
//! - `Courier` aggregate with its capacity-bounded storage places
//! - `Order` aggregate with a forward-only status machine and domain events
//! - `CourierDispatcher` selecting the best courier for a pending order

pub mod aggregate;
pub mod courier;
pub mod error;
pub mod kernel;
pub mod order;
pub mod services;

pub use aggregate::{Aggregate, DomainEvent};
pub use courier::{
    Courier, DEFAULT_STORAGE_PLACE_NAME, DEFAULT_STORAGE_PLACE_VOLUME, StoragePlace,
};
pub use error::{DomainError, Result};
pub use kernel::Location;
pub use order::{Order, OrderCompletedData, OrderCreatedData, OrderEvent, OrderStatus};
pub use services::{CourierDispatcher, Dispatcher};
