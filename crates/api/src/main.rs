//! API server entry point.

use std::error::Error;
use std::sync::Arc;

use api::config::Config;
use application::{GeoClient, RandomGeoClient, Scheduler};
use domain::OrderEvent;
use metrics_exporter_prometheus::PrometheusHandle;
use outbox::{EventRegistry, OutboxStore, order_event_registry};
use persistence::{MemoryUnitOfWork, PostgresOutboxStore, PostgresUnitOfWork, UnitOfWork};
use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

type BoxError = Box<dyn Error + Send + Sync>;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

/// Serves HTTP and runs the background jobs until a shutdown signal.
async fn run<U, G, S>(
    config: &Config,
    uow: U,
    geo: G,
    store: Arc<S>,
    registry: Arc<EventRegistry<OrderEvent>>,
    metrics_handle: PrometheusHandle,
) -> Result<(), BoxError>
where
    U: UnitOfWork + 'static,
    G: GeoClient + 'static,
    S: OutboxStore + 'static,
{
    let state = api::create_state(uow, geo, config);
    let publisher = api::create_publisher(config)?;

    let mut scheduler = Scheduler::new();
    api::spawn_jobs(&mut scheduler, &state, registry, publisher, store, config);

    let app = api::create_app(state, metrics_handle);

    let addr = config.addr();
    tracing::info!(%addr, "starting API server");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown().await;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = Config::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()?;

    // 3. Pick storage and start serving
    let registry = Arc::new(order_event_registry());
    match config.database_url.as_deref() {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(url)
                .await?;
            let uow = PostgresUnitOfWork::new(pool.clone(), registry.clone());
            uow.run_migrations().await?;
            tracing::info!("using PostgreSQL storage");

            let store = Arc::new(PostgresOutboxStore::new(pool));
            run(&config, uow, RandomGeoClient, store, registry, metrics_handle).await?;
        }
        None => {
            tracing::warn!("DATABASE_URL is not set, using in-memory storage");
            let uow = MemoryUnitOfWork::with_registry(registry.clone());
            let store = Arc::new(uow.clone());
            run(&config, uow, RandomGeoClient, store, registry, metrics_handle).await?;
        }
    }

    tracing::info!("server shut down gracefully");
    Ok(())
}
