//! Repository contracts.
//!
//! `Tx` is the transaction type of the owning [`crate::UnitOfWork`]. Writes
//! are conditional on the aggregate's version: `update` fails with
//! `NotFound` when no row has the id and with `VersionConflict` when the row
//! exists but was changed since it was loaded. A successful `update` bumps
//! the aggregate's version in place.

use async_trait::async_trait;
use common::{CourierId, OrderId};
use domain::{Courier, Order, OrderEvent};

use crate::error::Result;

#[async_trait]
pub trait OrderRepository<Tx: Send + 'static>: Send + Sync {
    /// Inserts a new order and writes `events` to the outbox.
    async fn add(&self, tx: &mut Tx, order: &Order, events: &[OrderEvent]) -> Result<()>;

    /// Stores the order if its version is current and writes `events` to the outbox.
    async fn update(&self, tx: &mut Tx, order: &mut Order, events: &[OrderEvent]) -> Result<()>;

    async fn get(&self, tx: &mut Tx, id: OrderId) -> Result<Order>;

    /// Returns the oldest order still waiting for a courier.
    async fn get_first_in_created_status(&self, tx: &mut Tx) -> Result<Option<Order>>;

    async fn get_all_in_assigned_status(&self, tx: &mut Tx) -> Result<Vec<Order>>;

    /// Returns orders in `Created` or `Assigned` status, oldest first.
    async fn get_all_uncompleted(&self, tx: &mut Tx) -> Result<Vec<Order>>;
}

#[async_trait]
pub trait CourierRepository<Tx: Send + 'static>: Send + Sync {
    async fn add(&self, tx: &mut Tx, courier: &Courier) -> Result<()>;

    /// Stores the courier and its storage places if its version is current.
    async fn update(&self, tx: &mut Tx, courier: &mut Courier) -> Result<()>;

    async fn get(&self, tx: &mut Tx, id: CourierId) -> Result<Courier>;

    /// Returns couriers with no occupied storage place, oldest first.
    async fn get_all_free_couriers(&self, tx: &mut Tx) -> Result<Vec<Courier>>;

    async fn get_all(&self, tx: &mut Tx) -> Result<Vec<Courier>>;
}
