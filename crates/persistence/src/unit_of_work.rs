//! Transaction boundary shared by every workflow.

use async_trait::async_trait;
use futures_util::future::BoxFuture;

use crate::error::{PersistenceError, Result};
use crate::repository::{CourierRepository, OrderRepository};

/// Opens transactions and hands out the repositories that work inside them.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    type Tx: Send + 'static;
    type Orders: OrderRepository<Self::Tx>;
    type Couriers: CourierRepository<Self::Tx>;

    async fn begin(&self) -> Result<Self::Tx>;

    /// Makes every write of the transaction visible, outbox rows included.
    async fn commit(&self, tx: Self::Tx) -> Result<()>;

    async fn rollback(&self, tx: Self::Tx) -> Result<()>;

    fn orders(&self) -> &Self::Orders;

    fn couriers(&self) -> &Self::Couriers;
}

/// Runs `f` inside a fresh transaction.
///
/// Commits when `f` succeeds and rolls back when it fails. A failed rollback
/// is logged and the original error returned. Nothing is retried.
pub async fn run_in_transaction<U, T, E, F>(uow: &U, f: F) -> std::result::Result<T, E>
where
    U: UnitOfWork,
    T: Send,
    E: From<PersistenceError> + Send,
    F: for<'t> FnOnce(&'t U, &'t mut U::Tx) -> BoxFuture<'t, std::result::Result<T, E>> + Send,
{
    let mut tx = uow.begin().await?;
    match f(uow, &mut tx).await {
        Ok(value) => {
            uow.commit(tx).await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = uow.rollback(tx).await {
                tracing::warn!(error = %rollback_err, "Transaction rollback failed");
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryUnitOfWork;
    use common::OrderId;
    use domain::{Aggregate, Location, Order};

    fn new_order() -> (Order, domain::OrderEvent) {
        Order::create(OrderId::new(), Location::new(2, 2).unwrap(), 1).unwrap()
    }

    #[tokio::test]
    async fn test_commits_on_success() {
        let uow = MemoryUnitOfWork::new();
        let (order, event) = new_order();
        let id = order.id();

        run_in_transaction(&uow, move |uow, tx| {
            Box::pin(async move { uow.orders().add(tx, &order, &[event]).await })
        })
        .await
        .unwrap();

        let stored = run_in_transaction(&uow, move |uow, tx| {
            Box::pin(async move { uow.orders().get(tx, id).await })
        })
        .await
        .unwrap();
        assert_eq!(stored.volume(), 1);
        assert_eq!(uow.outbox_messages().await.len(), 1);
    }

    #[tokio::test]
    async fn test_rolls_back_on_error() {
        let uow = MemoryUnitOfWork::new();
        let (order, event) = new_order();
        let id = order.id();

        let result: std::result::Result<(), PersistenceError> =
            run_in_transaction(&uow, move |uow, tx| {
                Box::pin(async move {
                    uow.orders().add(tx, &order, &[event]).await?;
                    Err(PersistenceError::NotFound {
                        aggregate_type: "Order",
                        id: "forced".to_string(),
                    })
                })
            })
            .await;
        assert!(result.unwrap_err().is_not_found());

        let lookup = run_in_transaction(&uow, move |uow, tx| {
            Box::pin(async move { uow.orders().get(tx, id).await })
        })
        .await;
        assert!(lookup.unwrap_err().is_not_found());
        assert!(uow.outbox_messages().await.is_empty());
    }
}
