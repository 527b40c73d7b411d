//! Shared types used across the delivery service crates.
//!
//! Identifiers are distinct newtypes over [`uuid::Uuid`] so an order id can
//! never be passed where a courier id is expected.

mod types;
mod version;

pub use types::{CourierId, EventId, OrderId, StoragePlaceId};
pub use version::Version;
