//! Read-side queries.

use common::{CourierId, OrderId};
use domain::{Aggregate, Courier, Location, Order, OrderStatus, StoragePlace};
use persistence::{CourierRepository, OrderRepository, UnitOfWork, run_in_transaction};
use serde::Serialize;

use crate::error::{ApplicationError, Result};
use crate::geo::GeoClient;
use crate::service::DeliveryService;

/// Courier as shown to clients.
#[derive(Debug, Clone, Serialize)]
pub struct CourierView {
    pub id: CourierId,
    pub name: String,
    pub speed: i32,
    pub location: Location,
    pub storage_places: Vec<StoragePlace>,
}

impl From<Courier> for CourierView {
    fn from(courier: Courier) -> Self {
        Self {
            id: courier.id(),
            name: courier.name().to_string(),
            speed: courier.speed(),
            location: *courier.location(),
            storage_places: courier.storage_places().to_vec(),
        }
    }
}

/// Order as shown to clients.
#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    pub id: OrderId,
    pub courier_id: Option<CourierId>,
    pub location: Location,
    pub volume: i32,
    pub status: OrderStatus,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        Self {
            id: order.id(),
            courier_id: order.courier_id(),
            location: *order.location(),
            volume: order.volume(),
            status: order.status(),
        }
    }
}

impl<U: UnitOfWork, G: GeoClient> DeliveryService<U, G> {
    /// Returns every courier, oldest first.
    pub async fn get_all_couriers(&self) -> Result<Vec<CourierView>> {
        run_in_transaction(&self.uow, |uow, tx| {
            Box::pin(async move {
                let couriers = uow.couriers().get_all(tx).await?;
                Ok::<_, ApplicationError>(couriers.into_iter().map(CourierView::from).collect())
            })
        })
        .await
    }

    /// Returns orders that are not yet delivered, oldest first.
    pub async fn get_uncompleted_orders(&self) -> Result<Vec<OrderView>> {
        run_in_transaction(&self.uow, |uow, tx| {
            Box::pin(async move {
                let orders = uow.orders().get_all_uncompleted(tx).await?;
                Ok::<_, ApplicationError>(orders.into_iter().map(OrderView::from).collect())
            })
        })
        .await
    }
}
