//! Periodic jobs and the scheduler that drives them.
//!
//! Every job runs on its own cadence in its own task. A tick is bounded by
//! a timeout; when a tick overruns its interval the missed ticks are skipped
//! rather than queued, so one job never runs concurrently with itself.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use outbox::{OutboxRelay, OutboxStore};
use persistence::UnitOfWork;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::error::ApplicationError;
use crate::geo::GeoClient;
use crate::service::DeliveryService;

/// Errors from a single job tick.
#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Application(#[from] ApplicationError),

    #[error("Outbox store error: {0}")]
    OutboxStore(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Job timed out after {0:?}")]
    Timeout(Duration),
}

impl JobError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, JobError::Application(e) if e.is_conflict())
    }
}

/// A unit of periodic work.
#[async_trait]
pub trait Job: Send + Sync {
    /// Stable name used in logs and metric labels.
    fn name(&self) -> &'static str;

    async fn run(&self) -> Result<(), JobError>;
}

/// Assigns one pending order per tick.
pub struct AssignOrdersJob<U, G> {
    service: Arc<DeliveryService<U, G>>,
}

impl<U, G> AssignOrdersJob<U, G> {
    pub fn new(service: Arc<DeliveryService<U, G>>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<U: UnitOfWork, G: GeoClient> Job for AssignOrdersJob<U, G> {
    fn name(&self) -> &'static str {
        "assign_orders"
    }

    async fn run(&self) -> Result<(), JobError> {
        self.service.assign_order().await?;
        Ok(())
    }
}

/// Moves every busy courier one step per tick.
pub struct MoveCouriersJob<U, G> {
    service: Arc<DeliveryService<U, G>>,
}

impl<U, G> MoveCouriersJob<U, G> {
    pub fn new(service: Arc<DeliveryService<U, G>>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<U: UnitOfWork, G: GeoClient> Job for MoveCouriersJob<U, G> {
    fn name(&self) -> &'static str {
        "move_couriers"
    }

    async fn run(&self) -> Result<(), JobError> {
        let report = self.service.move_couriers().await?;
        tracing::debug!(moved = report.moved, completed = report.completed, "Couriers moved");
        Ok(())
    }
}

/// Relays one batch of outbox messages per tick.
pub struct RelayOutboxJob<S> {
    relay: Arc<OutboxRelay>,
    store: Arc<S>,
}

impl<S> RelayOutboxJob<S> {
    pub fn new(relay: Arc<OutboxRelay>, store: Arc<S>) -> Self {
        Self { relay, store }
    }
}

#[async_trait]
impl<S: OutboxStore> Job for RelayOutboxJob<S> {
    fn name(&self) -> &'static str {
        "relay_outbox"
    }

    async fn run(&self) -> Result<(), JobError> {
        let report = self
            .relay
            .run_once(self.store.as_ref())
            .await
            .map_err(|e| JobError::OutboxStore(Box::new(e)))?;
        if report.fetched > 0 {
            tracing::debug!(
                fetched = report.fetched,
                published = report.published,
                failed = report.failed,
                "Outbox relayed"
            );
        }
        Ok(())
    }
}

/// Cadence of a scheduled job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Schedule {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }
}

/// Runs one tick of `job` bounded by `timeout`, recording its outcome.
///
/// Errors are logged and returned; the caller keeps scheduling. Version
/// conflicts are expected under concurrent jobs and only logged at debug.
pub async fn run_tick(job: &dyn Job, timeout: Duration) -> Result<(), JobError> {
    let name = job.name();
    let start = Instant::now();

    let result = match tokio::time::timeout(timeout, job.run()).await {
        Ok(result) => result,
        Err(_) => Err(JobError::Timeout(timeout)),
    };

    let outcome = match &result {
        Ok(()) => "success",
        Err(e) if e.is_conflict() => "conflict",
        Err(JobError::Timeout(_)) => "timeout",
        Err(_) => "error",
    };
    metrics::counter!("job_runs_total", "job" => name, "outcome" => outcome).increment(1);
    metrics::histogram!("job_duration_seconds", "job" => name)
        .record(start.elapsed().as_secs_f64());

    match &result {
        Ok(()) => {}
        Err(e) if e.is_conflict() => tracing::debug!(job = name, error = %e, "Job hit a version conflict"),
        Err(e) => tracing::warn!(job = name, error = %e, "Job failed"),
    }
    result
}

/// Drives jobs on independent intervals until cancelled.
pub struct Scheduler {
    token: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            handles: Vec::new(),
        }
    }

    /// Starts `job` in its own task. The first tick fires immediately.
    pub fn spawn(&mut self, job: Arc<dyn Job>, schedule: Schedule) {
        let token = self.token.child_token();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(schedule.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            tracing::info!(job = job.name(), interval = ?schedule.interval, "Job scheduled");

            let mut failed_ticks = 0u32;
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {
                        // Failures are logged by run_tick and retried on the next tick.
                        match run_tick(job.as_ref(), schedule.timeout).await {
                            Ok(()) if failed_ticks > 0 => {
                                tracing::info!(job = job.name(), failed_ticks, "Job recovered");
                                failed_ticks = 0;
                            }
                            Ok(()) => {}
                            Err(_) => failed_ticks += 1,
                        }
                    }
                }
            }
            tracing::info!(job = job.name(), "Job stopped");
        });
        self.handles.push(handle);
    }

    /// Token that stops every job when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Cancels all jobs and waits for in-flight ticks to finish.
    pub async fn shutdown(self) {
        self.token.cancel();
        for handle in self.handles {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Job task ended abnormally");
            }
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
