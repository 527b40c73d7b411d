//! HTTP API server and background jobs for the delivery service.
//!
//! Provides REST endpoints for couriers and orders, drives the dispatch,
//! movement and outbox relay jobs, and exposes structured logging (tracing)
//! and Prometheus metrics.

pub mod config;
pub mod error;
#[cfg(feature = "kafka")]
pub mod kafka;
pub mod routes;

use std::sync::Arc;

use application::{
    AssignOrdersJob, DeliveryService, GeoClient, MoveCouriersJob, RelayOutboxJob, Schedule,
    Scheduler,
};
use axum::Router;
use axum::routing::{get, post};
use domain::OrderEvent;
use metrics_exporter_prometheus::PrometheusHandle;
use outbox::{EventPublisher, EventRegistry, OutboxRelay, OutboxStore, PublishError, TracingPublisher};
use persistence::UnitOfWork;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<U, G>(state: Arc<AppState<U, G>>, metrics_handle: PrometheusHandle) -> Router
where
    U: UnitOfWork + 'static,
    G: GeoClient + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health))
        .route("/couriers", post(routes::couriers::create::<U, G>))
        .route("/couriers", get(routes::couriers::list::<U, G>))
        .route(
            "/couriers/{id}/storage-places",
            post(routes::couriers::add_storage_place::<U, G>),
        )
        .route("/orders", post(routes::orders::create::<U, G>))
        .route("/orders", get(routes::orders::list::<U, G>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state over a unit of work and geolocation client.
pub fn create_state<U: UnitOfWork, G: GeoClient>(
    uow: U,
    geo: G,
    config: &Config,
) -> Arc<AppState<U, G>> {
    let service = DeliveryService::new(uow, geo).with_geo_timeout(config.geo_timeout);
    Arc::new(AppState {
        service: Arc::new(service),
    })
}

/// Picks the bus publisher for the relay.
///
/// Uses Kafka when brokers are configured and the `kafka` feature is
/// enabled; otherwise events are only logged.
pub fn create_publisher(config: &Config) -> Result<Arc<dyn EventPublisher>, PublishError> {
    match config.kafka_brokers.as_deref() {
        #[cfg(feature = "kafka")]
        Some(brokers) => Ok(Arc::new(kafka::KafkaPublisher::new(brokers)?)),
        #[cfg(not(feature = "kafka"))]
        Some(_) => {
            tracing::warn!("KAFKA_BROKERS is set but the kafka feature is disabled, logging events instead");
            Ok(Arc::new(TracingPublisher))
        }
        None => Ok(Arc::new(TracingPublisher)),
    }
}

/// Schedules the dispatch, movement and relay jobs.
pub fn spawn_jobs<U, G, S>(
    scheduler: &mut Scheduler,
    state: &AppState<U, G>,
    registry: Arc<EventRegistry<OrderEvent>>,
    publisher: Arc<dyn EventPublisher>,
    store: Arc<S>,
    config: &Config,
) where
    U: UnitOfWork + 'static,
    G: GeoClient + 'static,
    S: OutboxStore + 'static,
{
    let relay = OutboxRelay::new(registry, publisher, config.order_events_topic.clone())
        .with_batch_size(config.relay_batch_size);

    scheduler.spawn(
        Arc::new(AssignOrdersJob::new(state.service.clone())),
        Schedule::new(config.dispatch_interval, config.job_timeout),
    );
    scheduler.spawn(
        Arc::new(MoveCouriersJob::new(state.service.clone())),
        Schedule::new(config.move_interval, config.job_timeout),
    );
    scheduler.spawn(
        Arc::new(RelayOutboxJob::new(Arc::new(relay), store)),
        Schedule::new(config.relay_interval, config.job_timeout),
    );
}
