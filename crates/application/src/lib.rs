//! Application layer for the delivery service.
//!
//! This crate provides:
//! - `DeliveryService` with the courier and order use cases
//! - The dispatch and movement workflows, each one transaction per run
//! - The `GeoClient` port used to resolve delivery addresses
//! - Periodic `Job`s and the `Scheduler` that drives them

pub mod commands;
pub mod dispatch;
pub mod error;
pub mod geo;
pub mod jobs;
pub mod movement;
pub mod queries;
pub mod service;

pub use commands::{AddStoragePlace, CreateCourier, CreateOrder};
pub use dispatch::Assignment;
pub use error::{ApplicationError, Result};
pub use geo::{FixedGeoClient, GeoClient, GeoError, RandomGeoClient};
pub use jobs::{
    AssignOrdersJob, Job, JobError, MoveCouriersJob, RelayOutboxJob, Schedule, Scheduler, run_tick,
};
pub use movement::MovementReport;
pub use queries::{CourierView, OrderView};
pub use service::{DEFAULT_GEO_TIMEOUT, DeliveryService};
