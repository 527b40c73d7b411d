//! Courier aggregate and its storage places.

mod aggregate;
mod storage_place;

pub use aggregate::{Courier, DEFAULT_STORAGE_PLACE_NAME, DEFAULT_STORAGE_PLACE_VOLUME};
pub use storage_place::StoragePlace;
