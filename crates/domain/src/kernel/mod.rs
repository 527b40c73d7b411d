//! Shared value objects.

mod location;

pub use location::{Location, MAX_COORDINATE, MIN_COORDINATE};
