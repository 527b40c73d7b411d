//! Movement and completion workflow.

use std::collections::HashSet;

use domain::{Aggregate, DomainError};
use persistence::{CourierRepository, OrderRepository, UnitOfWork, run_in_transaction};
use serde::Serialize;

use crate::error::{ApplicationError, Result};
use crate::geo::GeoClient;
use crate::service::DeliveryService;

/// Outcome of one movement tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MovementReport {
    pub moved: usize,
    pub completed: usize,
}

impl<U: UnitOfWork, G: GeoClient> DeliveryService<U, G> {
    /// Advances every courier with an assigned order by one tick.
    ///
    /// Orders whose courier reaches the delivery point are completed and the
    /// courier's storage place is freed. All changes of a tick, including the
    /// `OrderCompleted` outbox rows, are committed together.
    #[tracing::instrument(skip(self))]
    pub async fn move_couriers(&self) -> Result<MovementReport> {
        let report = run_in_transaction(&self.uow, |uow, tx| {
            Box::pin(async move {
                let mut report = MovementReport::default();
                let mut moved = HashSet::new();

                for mut order in uow.orders().get_all_in_assigned_status(tx).await? {
                    let courier_id = order
                        .courier_id()
                        .ok_or(DomainError::ValueRequired { field: "courier_id" })?;
                    // One step per courier per tick.
                    if !moved.insert(courier_id) {
                        tracing::debug!(%courier_id, order_id = %order.id(), "Courier already moved this tick");
                        continue;
                    }

                    let mut courier = uow.couriers().get(tx, courier_id).await?;
                    courier.move_towards(order.location())?;
                    report.moved += 1;

                    let mut events = Vec::new();
                    if courier.location() == order.location() {
                        events.push(order.complete()?);
                        courier.complete_order(&order)?;
                        report.completed += 1;
                        tracing::info!(order_id = %order.id(), %courier_id, "Order delivered");
                    }

                    uow.couriers().update(tx, &mut courier).await?;
                    uow.orders().update(tx, &mut order, &events).await?;
                }

                Ok::<_, ApplicationError>(report)
            })
        })
        .await?;

        if report.completed > 0 {
            metrics::counter!("orders_completed_total").increment(report.completed as u64);
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{CreateCourier, CreateOrder};
    use crate::geo::FixedGeoClient;
    use common::OrderId;
    use domain::{Courier, Location, OrderStatus};
    use persistence::MemoryUnitOfWork;

    fn service() -> DeliveryService<MemoryUnitOfWork, FixedGeoClient> {
        DeliveryService::new(
            MemoryUnitOfWork::new(),
            FixedGeoClient::always(Location::new(10, 10).unwrap()),
        )
    }

    #[tokio::test]
    async fn test_no_assigned_orders_moves_nothing() {
        let service = service();
        service
            .create_order(CreateOrder::new(OrderId::new(), "Arbat", 1))
            .await
            .unwrap();

        assert_eq!(
            service.move_couriers().await.unwrap(),
            MovementReport::default()
        );
    }

    #[tokio::test]
    async fn test_courier_walks_to_order_and_completes_it() {
        let service = service();
        let courier_id = service
            .create_courier(CreateCourier::new("Ivan", 3))
            .await
            .unwrap();
        let order_id = OrderId::new();
        service
            .create_order(CreateOrder::new(order_id, "Arbat", 1))
            .await
            .unwrap();
        service.assign_order().await.unwrap().unwrap();

        // At most 18 steps on the grid, 3 per tick.
        let mut completed = 0;
        for _ in 0..6 {
            let report = service.move_couriers().await.unwrap();
            completed += report.completed;
            if report.completed > 0 {
                break;
            }
            assert_eq!(report.moved, 1);
        }
        assert_eq!(completed, 1);

        assert!(service.get_uncompleted_orders().await.unwrap().is_empty());
        let couriers = service.get_all_couriers().await.unwrap();
        assert_eq!(couriers[0].id, courier_id);
        assert_eq!(couriers[0].location, Location::new(10, 10).unwrap());
        assert!(couriers[0].storage_places.iter().all(|p| !p.is_occupied()));

        let names: Vec<_> = service
            .uow()
            .outbox_messages()
            .await
            .into_iter()
            .map(|m| m.event_name)
            .collect();
        assert_eq!(names, vec!["OrderCreated", "OrderCompleted"]);

        // Nothing left to move.
        assert_eq!(
            service.move_couriers().await.unwrap(),
            MovementReport::default()
        );
    }

    #[tokio::test]
    async fn test_order_stays_assigned_until_arrival() {
        let service = DeliveryService::new(
            MemoryUnitOfWork::new(),
            FixedGeoClient::always(Location::new(3, 1).unwrap()),
        );
        let courier = Courier::new("Slow", 1, Location::new(1, 1).unwrap()).unwrap();
        let courier_id = courier.id();
        let mut tx = service.uow().begin().await.unwrap();
        service.uow().couriers().add(&mut tx, &courier).await.unwrap();
        service.uow().commit(tx).await.unwrap();

        let order_id = OrderId::new();
        service
            .create_order(CreateOrder::new(order_id, "Arbat", 1))
            .await
            .unwrap();
        service.assign_order().await.unwrap().unwrap();

        let report = service.move_couriers().await.unwrap();
        assert_eq!(report, MovementReport { moved: 1, completed: 0 });
        let orders = service.get_uncompleted_orders().await.unwrap();
        assert_eq!(orders[0].id, order_id);
        assert_eq!(orders[0].status, OrderStatus::Assigned);
        assert_eq!(orders[0].courier_id, Some(courier_id));
        let couriers = service.get_all_couriers().await.unwrap();
        assert_eq!(couriers[0].location, Location::new(2, 1).unwrap());

        let report = service.move_couriers().await.unwrap();
        assert_eq!(report, MovementReport { moved: 1, completed: 1 });
        assert!(service.get_uncompleted_orders().await.unwrap().is_empty());
    }
}
