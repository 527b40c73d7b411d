//! PostgreSQL implementation backed by `sqlx`.

mod courier;
mod order;
mod outbox_store;

use std::sync::Arc;

use async_trait::async_trait;
use domain::OrderEvent;
use outbox::EventRegistry;
use sqlx::{PgPool, Postgres, Transaction};

use crate::error::{PersistenceError, Result};
use crate::unit_of_work::UnitOfWork;

pub use courier::PostgresCourierRepository;
pub use order::PostgresOrderRepository;
pub use outbox_store::PostgresOutboxStore;

/// Unit of work over a PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct PostgresUnitOfWork {
    pool: PgPool,
    orders: PostgresOrderRepository,
    couriers: PostgresCourierRepository,
}

impl PostgresUnitOfWork {
    pub fn new(pool: PgPool, registry: Arc<EventRegistry<OrderEvent>>) -> Self {
        Self {
            pool,
            orders: PostgresOrderRepository::new(registry),
            couriers: PostgresCourierRepository,
        }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    type Tx = Transaction<'static, Postgres>;
    type Orders = PostgresOrderRepository;
    type Couriers = PostgresCourierRepository;

    async fn begin(&self) -> Result<Self::Tx> {
        Ok(self.pool.begin().await?)
    }

    async fn commit(&self, tx: Self::Tx) -> Result<()> {
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(&self, tx: Self::Tx) -> Result<()> {
        tx.rollback().await?;
        Ok(())
    }

    fn orders(&self) -> &PostgresOrderRepository {
        &self.orders
    }

    fn couriers(&self) -> &PostgresCourierRepository {
        &self.couriers
    }
}

/// Maps a primary key violation to `AlreadyExists`.
fn map_insert_error(
    err: sqlx::Error,
    constraint: &str,
    already_exists: PersistenceError,
) -> PersistenceError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.constraint() == Some(constraint)
    {
        return already_exists;
    }
    PersistenceError::Database(err)
}
