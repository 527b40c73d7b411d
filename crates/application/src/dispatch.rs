//! Dispatch workflow.

use std::sync::Arc;

use common::{CourierId, OrderId};
use domain::{Aggregate, DomainError};
use persistence::{CourierRepository, OrderRepository, UnitOfWork, run_in_transaction};

use crate::error::{ApplicationError, Result};
use crate::geo::GeoClient;
use crate::service::DeliveryService;

/// An order bound to a courier by one dispatch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    pub order_id: OrderId,
    pub courier_id: CourierId,
}

impl<U: UnitOfWork, G: GeoClient> DeliveryService<U, G> {
    /// Assigns the oldest pending order to the best free courier.
    ///
    /// Returns `None` when there is no pending order or no free courier can
    /// take it. Both aggregates are written in one transaction; a version
    /// conflict rolls it back and is returned to the caller.
    #[tracing::instrument(skip(self))]
    pub async fn assign_order(&self) -> Result<Option<Assignment>> {
        let dispatcher = Arc::clone(&self.dispatcher);

        let assignment = run_in_transaction(&self.uow, move |uow, tx| {
            Box::pin(async move {
                let Some(mut order) = uow.orders().get_first_in_created_status(tx).await? else {
                    return Ok(None);
                };
                let mut couriers = uow.couriers().get_all_free_couriers(tx).await?;

                let courier = match dispatcher.dispatch(&mut order, &mut couriers) {
                    Ok(courier) => courier,
                    Err(DomainError::InvalidInput(_) | DomainError::NoCandidate { .. }) => {
                        tracing::debug!(order_id = %order.id(), "No free courier can take the order");
                        return Ok(None);
                    }
                    Err(err) => return Err(err.into()),
                };
                let courier_id = courier.id();

                uow.couriers().update(tx, courier).await?;
                uow.orders().update(tx, &mut order, &[]).await?;

                Ok::<_, ApplicationError>(Some(Assignment {
                    order_id: order.id(),
                    courier_id,
                }))
            })
        })
        .await?;

        if let Some(assignment) = assignment {
            metrics::counter!("orders_dispatched_total").increment(1);
            tracing::info!(
                order_id = %assignment.order_id,
                courier_id = %assignment.courier_id,
                "Order assigned"
            );
        }
        Ok(assignment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{CreateCourier, CreateOrder};
    use crate::geo::FixedGeoClient;
    use domain::{Location, OrderStatus};
    use persistence::MemoryUnitOfWork;

    fn service() -> DeliveryService<MemoryUnitOfWork, FixedGeoClient> {
        DeliveryService::new(
            MemoryUnitOfWork::new(),
            FixedGeoClient::always(Location::new(5, 5).unwrap()),
        )
    }

    #[tokio::test]
    async fn test_no_orders_is_a_no_op() {
        let service = service();
        service
            .create_courier(CreateCourier::new("Ivan", 1))
            .await
            .unwrap();
        assert_eq!(service.assign_order().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_no_couriers_is_a_no_op() {
        let service = service();
        let order_id = OrderId::new();
        service
            .create_order(CreateOrder::new(order_id, "Arbat", 1))
            .await
            .unwrap();

        assert_eq!(service.assign_order().await.unwrap(), None);
        let orders = service.get_uncompleted_orders().await.unwrap();
        assert_eq!(orders[0].status, OrderStatus::Created);
    }

    #[tokio::test]
    async fn test_too_large_order_is_a_no_op() {
        let service = service();
        service
            .create_courier(CreateCourier::new("Ivan", 1))
            .await
            .unwrap();
        service
            .create_order(CreateOrder::new(OrderId::new(), "Arbat", 50))
            .await
            .unwrap();

        assert_eq!(service.assign_order().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_assigns_oldest_order_first() {
        let service = service();
        let courier_id = service
            .create_courier(CreateCourier::new("Ivan", 1))
            .await
            .unwrap();
        let first = OrderId::new();
        let second = OrderId::new();
        service
            .create_order(CreateOrder::new(first, "Arbat", 1))
            .await
            .unwrap();
        service
            .create_order(CreateOrder::new(second, "Arbat", 1))
            .await
            .unwrap();

        let assignment = service.assign_order().await.unwrap().unwrap();
        assert_eq!(
            assignment,
            Assignment {
                order_id: first,
                courier_id,
            }
        );

        // The only courier is busy now.
        assert_eq!(service.assign_order().await.unwrap(), None);

        let orders = service.get_uncompleted_orders().await.unwrap();
        let first_view = orders.iter().find(|o| o.id == first).unwrap();
        assert_eq!(first_view.status, OrderStatus::Assigned);
        assert_eq!(first_view.courier_id, Some(courier_id));
        let second_view = orders.iter().find(|o| o.id == second).unwrap();
        assert_eq!(second_view.status, OrderStatus::Created);
    }
}
