//! Delivery use cases.

use std::sync::Arc;
use std::time::Duration;

use common::{CourierId, OrderId, StoragePlaceId};
use domain::{Aggregate, Courier, CourierDispatcher, Dispatcher, Location, Order};
use persistence::{CourierRepository, OrderRepository, UnitOfWork, run_in_transaction};

use crate::commands::{AddStoragePlace, CreateCourier, CreateOrder};
use crate::error::{ApplicationError, Result};
use crate::geo::GeoClient;

/// Upper bound on a single geolocation lookup.
pub const DEFAULT_GEO_TIMEOUT: Duration = Duration::from_secs(1);

/// Service running the delivery use cases against a unit of work.
///
/// Each use case and workflow runs in exactly one transaction. Calls to the
/// geolocation service happen before the transaction is opened.
pub struct DeliveryService<U, G> {
    pub(crate) uow: U,
    geo: G,
    pub(crate) dispatcher: Arc<dyn Dispatcher>,
    geo_timeout: Duration,
}

impl<U: UnitOfWork, G: GeoClient> DeliveryService<U, G> {
    /// Creates a service using the greedy courier dispatcher.
    pub fn new(uow: U, geo: G) -> Self {
        Self {
            uow,
            geo,
            dispatcher: Arc::new(CourierDispatcher::new()),
            geo_timeout: DEFAULT_GEO_TIMEOUT,
        }
    }

    pub fn with_dispatcher(mut self, dispatcher: Arc<dyn Dispatcher>) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn with_geo_timeout(mut self, timeout: Duration) -> Self {
        self.geo_timeout = timeout;
        self
    }

    /// Returns the unit of work the service writes through.
    pub fn uow(&self) -> &U {
        &self.uow
    }

    /// Registers a courier at a random location with the default storage place.
    #[tracing::instrument(skip(self))]
    pub async fn create_courier(&self, cmd: CreateCourier) -> Result<CourierId> {
        let courier = Courier::new(cmd.name, cmd.speed, Location::random())?;
        let courier_id = courier.id();

        run_in_transaction(&self.uow, move |uow, tx| {
            Box::pin(async move {
                uow.couriers().add(tx, &courier).await?;
                Ok::<_, ApplicationError>(())
            })
        })
        .await?;

        tracing::info!(%courier_id, "Courier created");
        Ok(courier_id)
    }

    /// Adds a storage place to an existing courier.
    #[tracing::instrument(skip(self))]
    pub async fn add_storage_place(&self, cmd: AddStoragePlace) -> Result<StoragePlaceId> {
        run_in_transaction(&self.uow, move |uow, tx| {
            Box::pin(async move {
                let mut courier = uow.couriers().get(tx, cmd.courier_id).await?;
                let place_id = courier.add_storage_place(cmd.name, cmd.total_volume)?;
                uow.couriers().update(tx, &mut courier).await?;
                Ok::<_, ApplicationError>(place_id)
            })
        })
        .await
    }

    /// Creates an order for a street address.
    ///
    /// The address is resolved first, outside the transaction and bounded by
    /// the geolocation timeout. The order and its `OrderCreated` outbox row
    /// are then written together.
    #[tracing::instrument(skip(self))]
    pub async fn create_order(&self, cmd: CreateOrder) -> Result<OrderId> {
        if cmd.order_id.is_nil() {
            return Err(ApplicationError::InvalidCommand(
                "order id is required".to_string(),
            ));
        }
        if cmd.street.trim().is_empty() {
            return Err(ApplicationError::InvalidCommand(
                "street is required".to_string(),
            ));
        }

        let location = tokio::time::timeout(self.geo_timeout, self.geo.resolve(&cmd.street))
            .await
            .map_err(|_| ApplicationError::Timeout {
                operation: "geolocation lookup",
                timeout: self.geo_timeout,
            })??;

        let (order, event) = Order::create(cmd.order_id, location, cmd.volume)?;
        let order_id = order.id();

        run_in_transaction(&self.uow, move |uow, tx| {
            Box::pin(async move {
                uow.orders().add(tx, &order, &[event]).await?;
                Ok::<_, ApplicationError>(())
            })
        })
        .await?;

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(%order_id, %location, "Order created");
        Ok(order_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{FixedGeoClient, GeoError};
    use async_trait::async_trait;
    use domain::{DEFAULT_STORAGE_PLACE_NAME, OrderStatus};
    use persistence::{MemoryUnitOfWork, PersistenceError};

    fn service() -> DeliveryService<MemoryUnitOfWork, FixedGeoClient> {
        DeliveryService::new(
            MemoryUnitOfWork::new(),
            FixedGeoClient::new().with_street("Tverskaya", Location::new(4, 7).unwrap()),
        )
    }

    #[tokio::test]
    async fn test_create_order_resolves_street_and_writes_outbox() {
        let service = service();
        let order_id = OrderId::new();

        service
            .create_order(CreateOrder::new(order_id, "Tverskaya", 3))
            .await
            .unwrap();

        let orders = service.get_uncompleted_orders().await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].id, order_id);
        assert_eq!(orders[0].location, Location::new(4, 7).unwrap());
        assert_eq!(orders[0].status, OrderStatus::Created);

        let outbox = service.uow().outbox_messages().await;
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox[0].event_name, "OrderCreated");
    }

    #[tokio::test]
    async fn test_create_order_rejects_bad_commands() {
        let service = service();

        let nil = OrderId::from_uuid(Default::default());
        assert!(matches!(
            service.create_order(CreateOrder::new(nil, "Tverskaya", 1)).await,
            Err(ApplicationError::InvalidCommand(_))
        ));
        assert!(matches!(
            service
                .create_order(CreateOrder::new(OrderId::new(), "  ", 1))
                .await,
            Err(ApplicationError::InvalidCommand(_))
        ));

        let err = service
            .create_order(CreateOrder::new(OrderId::new(), "Tverskaya", 0))
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::Domain(e) if e.is_value_invalid()));
        assert!(service.uow().outbox_messages().await.is_empty());
    }

    #[tokio::test]
    async fn test_create_order_twice_already_exists() {
        let service = service();
        let cmd = CreateOrder::new(OrderId::new(), "Tverskaya", 1);

        service.create_order(cmd.clone()).await.unwrap();
        let err = service.create_order(cmd).await.unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::Persistence(PersistenceError::AlreadyExists { .. })
        ));
        assert_eq!(service.uow().outbox_messages().await.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_street_is_a_geo_error() {
        let service = service();
        let err = service
            .create_order(CreateOrder::new(OrderId::new(), "Arbat", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::Geo(GeoError::StreetNotFound(_))));
    }

    struct SlowGeo;

    #[async_trait]
    impl GeoClient for SlowGeo {
        async fn resolve(&self, _street: &str) -> std::result::Result<Location, GeoError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Location::new(1, 1).unwrap())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_geolocation_times_out() {
        let service = DeliveryService::new(MemoryUnitOfWork::new(), SlowGeo)
            .with_geo_timeout(Duration::from_millis(50));

        let err = service
            .create_order(CreateOrder::new(OrderId::new(), "Arbat", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::Timeout { .. }));
        assert!(service.uow().outbox_messages().await.is_empty());
    }

    #[tokio::test]
    async fn test_create_courier_and_add_storage_place() {
        let service = service();
        let courier_id = service
            .create_courier(CreateCourier::new("Ivan", 2))
            .await
            .unwrap();

        service
            .add_storage_place(AddStoragePlace::new(courier_id, "Trunk", 40))
            .await
            .unwrap();

        let couriers = service.get_all_couriers().await.unwrap();
        assert_eq!(couriers.len(), 1);
        let names: Vec<_> = couriers[0]
            .storage_places
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(names, vec![DEFAULT_STORAGE_PLACE_NAME, "Trunk"]);
    }

    #[tokio::test]
    async fn test_invalid_courier_commands() {
        let service = service();
        assert!(matches!(
            service.create_courier(CreateCourier::new("", 2)).await,
            Err(ApplicationError::Domain(_))
        ));

        let err = service
            .add_storage_place(AddStoragePlace::new(CourierId::new(), "Trunk", 5))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
