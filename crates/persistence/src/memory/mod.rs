//! In-memory unit of work for tests and local runs.
//!
//! A transaction works on a private copy of the aggregate tables; the
//! outbox is append-only and never copied. On commit, every
//! row it wrote is checked against the shared tables: if another
//! transaction committed a newer version first, the commit fails with
//! `VersionConflict` and nothing is applied. Dropping a transaction without
//! committing discards it.

mod repositories;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CourierId, EventId, OrderId, Version};
use domain::{Aggregate, Courier, Order, OrderEvent};
use outbox::{EventRegistry, OutboxMessage, OutboxStore, order_event_registry};
use tokio::sync::RwLock;

use crate::error::{PersistenceError, Result};
use crate::unit_of_work::UnitOfWork;

pub use repositories::{MemoryCourierRepository, MemoryOrderRepository};

#[derive(Debug, Clone, Default)]
struct Tables {
    orders: HashMap<OrderId, Order>,
    couriers: HashMap<CourierId, Courier>,
}

#[derive(Debug, Default)]
struct Store {
    tables: Tables,
    outbox: Vec<OutboxMessage>,
}

/// Transaction handle of [`MemoryUnitOfWork`].
#[derive(Debug)]
pub struct MemoryTransaction {
    tables: Tables,
    /// Version each written order had when the transaction first touched it;
    /// `None` for inserts.
    order_writes: HashMap<OrderId, Option<Version>>,
    courier_writes: HashMap<CourierId, Option<Version>>,
    outbox: Vec<OutboxMessage>,
}

impl MemoryTransaction {
    fn record_order_write(&mut self, id: OrderId, base: Option<Version>) {
        self.order_writes.entry(id).or_insert(base);
    }

    fn record_courier_write(&mut self, id: CourierId, base: Option<Version>) {
        self.courier_writes.entry(id).or_insert(base);
    }
}

/// Unit of work over process-local tables.
#[derive(Debug, Clone)]
pub struct MemoryUnitOfWork {
    store: Arc<RwLock<Store>>,
    orders: MemoryOrderRepository,
    couriers: MemoryCourierRepository,
}

impl MemoryUnitOfWork {
    /// Creates an empty store using the order event registry.
    pub fn new() -> Self {
        Self::with_registry(Arc::new(order_event_registry()))
    }

    pub fn with_registry(registry: Arc<EventRegistry<OrderEvent>>) -> Self {
        Self {
            store: Arc::new(RwLock::new(Store::default())),
            orders: MemoryOrderRepository::new(registry),
            couriers: MemoryCourierRepository,
        }
    }

    /// Returns every outbox message in insertion order.
    pub async fn outbox_messages(&self) -> Vec<OutboxMessage> {
        self.store.read().await.outbox.clone()
    }
}

impl Default for MemoryUnitOfWork {
    fn default() -> Self {
        Self::new()
    }
}

fn check_base<A: Aggregate>(
    id: A::Id,
    base: Option<Version>,
    current: Option<&A>,
) -> Result<()> {
    match (base, current) {
        (None, None) => Ok(()),
        (None, Some(_)) => Err(PersistenceError::already_exists::<A>(id)),
        (Some(base), Some(current)) if current.version() == base => Ok(()),
        (Some(base), _) => Err(PersistenceError::VersionConflict {
            aggregate_type: A::aggregate_type(),
            id: id.to_string(),
            expected: base,
        }),
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    type Tx = MemoryTransaction;
    type Orders = MemoryOrderRepository;
    type Couriers = MemoryCourierRepository;

    async fn begin(&self) -> Result<MemoryTransaction> {
        Ok(MemoryTransaction {
            tables: self.store.read().await.tables.clone(),
            order_writes: HashMap::new(),
            courier_writes: HashMap::new(),
            outbox: Vec::new(),
        })
    }

    async fn commit(&self, mut tx: MemoryTransaction) -> Result<()> {
        let mut store = self.store.write().await;
        let Store { tables, outbox } = &mut *store;

        for (id, base) in &tx.order_writes {
            check_base(*id, *base, tables.orders.get(id))?;
        }
        for (id, base) in &tx.courier_writes {
            check_base(*id, *base, tables.couriers.get(id))?;
        }

        for id in tx.order_writes.keys() {
            if let Some(order) = tx.tables.orders.remove(id) {
                tables.orders.insert(*id, order);
            }
        }
        for id in tx.courier_writes.keys() {
            if let Some(courier) = tx.tables.couriers.remove(id) {
                tables.couriers.insert(*id, courier);
            }
        }
        outbox.append(&mut tx.outbox);
        Ok(())
    }

    async fn rollback(&self, _tx: MemoryTransaction) -> Result<()> {
        Ok(())
    }

    fn orders(&self) -> &MemoryOrderRepository {
        &self.orders
    }

    fn couriers(&self) -> &MemoryCourierRepository {
        &self.couriers
    }
}

#[async_trait]
impl OutboxStore for MemoryUnitOfWork {
    type Error = PersistenceError;

    async fn fetch_unprocessed(&self, limit: usize) -> Result<Vec<OutboxMessage>> {
        let store = self.store.read().await;
        let mut pending: Vec<OutboxMessage> = store
            .outbox
            .iter()
            .filter(|message| !message.is_processed())
            .cloned()
            .collect();
        pending.sort_by_key(|message| message.occurred_at);
        pending.truncate(limit);
        Ok(pending)
    }

    async fn mark_processed(&self, id: EventId, at: DateTime<Utc>) -> Result<()> {
        let mut store = self.store.write().await;
        if let Some(message) = store.outbox.iter_mut().find(|message| message.id == id) {
            message.processed_at = Some(at);
        }
        Ok(())
    }
}
