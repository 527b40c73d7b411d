//! Persistence for the delivery service.
//!
//! This crate provides:
//! - Repository contracts for orders and couriers with version-checked writes
//! - The [`UnitOfWork`] transaction boundary and [`run_in_transaction`]
//! - In-memory and PostgreSQL implementations of both, each also acting as
//!   the [`outbox::OutboxStore`] read by the relay
//!
//! Every repository call takes the transaction explicitly. Domain events
//! passed to `add`/`update` are encoded into outbox rows inside the same
//! transaction.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod repository;
pub mod unit_of_work;

pub use error::{PersistenceError, Result};
pub use memory::{MemoryCourierRepository, MemoryOrderRepository, MemoryTransaction, MemoryUnitOfWork};
pub use postgres::{
    PostgresCourierRepository, PostgresOrderRepository, PostgresOutboxStore, PostgresUnitOfWork,
};
pub use repository::{CourierRepository, OrderRepository};
pub use unit_of_work::{UnitOfWork, run_in_transaction};
