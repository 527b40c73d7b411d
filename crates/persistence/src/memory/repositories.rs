use std::sync::Arc;

use async_trait::async_trait;
use common::{CourierId, OrderId};
use domain::{Aggregate, Courier, Order, OrderEvent, OrderStatus};
use outbox::EventRegistry;

use super::MemoryTransaction;
use crate::error::{PersistenceError, Result};
use crate::repository::{CourierRepository, OrderRepository};

/// Order repository over a [`MemoryTransaction`].
#[derive(Debug, Clone)]
pub struct MemoryOrderRepository {
    registry: Arc<EventRegistry<OrderEvent>>,
}

impl MemoryOrderRepository {
    pub fn new(registry: Arc<EventRegistry<OrderEvent>>) -> Self {
        Self { registry }
    }

    fn stage_events(&self, tx: &mut MemoryTransaction, events: &[OrderEvent]) -> Result<()> {
        for event in events {
            tx.outbox.push(self.registry.encode(event)?);
        }
        Ok(())
    }
}

fn sorted_orders<'a>(orders: impl Iterator<Item = &'a Order>) -> Vec<Order> {
    let mut orders: Vec<Order> = orders.cloned().collect();
    orders.sort_by_key(|order| (order.created_at(), order.id()));
    orders
}

#[async_trait]
impl OrderRepository<MemoryTransaction> for MemoryOrderRepository {
    async fn add(
        &self,
        tx: &mut MemoryTransaction,
        order: &Order,
        events: &[OrderEvent],
    ) -> Result<()> {
        if tx.tables.orders.contains_key(&order.id()) {
            return Err(PersistenceError::already_exists::<Order>(order.id()));
        }
        self.stage_events(tx, events)?;
        tx.tables.orders.insert(order.id(), order.clone());
        tx.record_order_write(order.id(), None);
        Ok(())
    }

    async fn update(
        &self,
        tx: &mut MemoryTransaction,
        order: &mut Order,
        events: &[OrderEvent],
    ) -> Result<()> {
        let stored = tx
            .tables
            .orders
            .get(&order.id())
            .ok_or_else(|| PersistenceError::not_found::<Order>(order.id()))?;
        if stored.version() != order.version() {
            return Err(PersistenceError::version_conflict(&*order));
        }
        let base = stored.version();

        self.stage_events(tx, events)?;
        order.set_version(order.version().next());
        tx.tables.orders.insert(order.id(), order.clone());
        tx.record_order_write(order.id(), Some(base));
        Ok(())
    }

    async fn get(&self, tx: &mut MemoryTransaction, id: OrderId) -> Result<Order> {
        tx.tables
            .orders
            .get(&id)
            .cloned()
            .ok_or_else(|| PersistenceError::not_found::<Order>(id))
    }

    async fn get_first_in_created_status(
        &self,
        tx: &mut MemoryTransaction,
    ) -> Result<Option<Order>> {
        Ok(tx
            .tables
            .orders
            .values()
            .filter(|order| order.status() == OrderStatus::Created)
            .min_by_key(|order| (order.created_at(), order.id()))
            .cloned())
    }

    async fn get_all_in_assigned_status(&self, tx: &mut MemoryTransaction) -> Result<Vec<Order>> {
        Ok(sorted_orders(
            tx.tables
                .orders
                .values()
                .filter(|order| order.status() == OrderStatus::Assigned),
        ))
    }

    async fn get_all_uncompleted(&self, tx: &mut MemoryTransaction) -> Result<Vec<Order>> {
        Ok(sorted_orders(
            tx.tables
                .orders
                .values()
                .filter(|order| order.status().is_uncompleted()),
        ))
    }
}

/// Courier repository over a [`MemoryTransaction`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryCourierRepository;

fn sorted_couriers<'a>(couriers: impl Iterator<Item = &'a Courier>) -> Vec<Courier> {
    let mut couriers: Vec<Courier> = couriers.cloned().collect();
    couriers.sort_by_key(|courier| (courier.created_at(), courier.id()));
    couriers
}

#[async_trait]
impl CourierRepository<MemoryTransaction> for MemoryCourierRepository {
    async fn add(&self, tx: &mut MemoryTransaction, courier: &Courier) -> Result<()> {
        if tx.tables.couriers.contains_key(&courier.id()) {
            return Err(PersistenceError::already_exists::<Courier>(courier.id()));
        }
        tx.tables.couriers.insert(courier.id(), courier.clone());
        tx.record_courier_write(courier.id(), None);
        Ok(())
    }

    async fn update(&self, tx: &mut MemoryTransaction, courier: &mut Courier) -> Result<()> {
        let stored = tx
            .tables
            .couriers
            .get(&courier.id())
            .ok_or_else(|| PersistenceError::not_found::<Courier>(courier.id()))?;
        if stored.version() != courier.version() {
            return Err(PersistenceError::version_conflict(&*courier));
        }
        let base = stored.version();

        courier.set_version(courier.version().next());
        tx.tables.couriers.insert(courier.id(), courier.clone());
        tx.record_courier_write(courier.id(), Some(base));
        Ok(())
    }

    async fn get(&self, tx: &mut MemoryTransaction, id: CourierId) -> Result<Courier> {
        tx.tables
            .couriers
            .get(&id)
            .cloned()
            .ok_or_else(|| PersistenceError::not_found::<Courier>(id))
    }

    async fn get_all_free_couriers(&self, tx: &mut MemoryTransaction) -> Result<Vec<Courier>> {
        Ok(sorted_couriers(
            tx.tables.couriers.values().filter(|courier| courier.is_free()),
        ))
    }

    async fn get_all(&self, tx: &mut MemoryTransaction) -> Result<Vec<Courier>> {
        Ok(sorted_couriers(tx.tables.couriers.values()))
    }
}
