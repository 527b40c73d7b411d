//! Background relay from the outbox to the message bus.

use std::sync::Arc;

use chrono::Utc;
use domain::OrderEvent;

use crate::error::OutboxError;
use crate::integration::IntegrationEvent;
use crate::message::OutboxMessage;
use crate::publisher::EventPublisher;
use crate::registry::EventRegistry;
use crate::store::OutboxStore;

/// Number of messages read per poll unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Outcome of one relay poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayReport {
    /// Unprocessed messages read from the store.
    pub fetched: usize,
    /// Messages published and marked processed.
    pub published: usize,
    /// Messages left unprocessed because a step failed.
    pub failed: usize,
}

/// Republishes unprocessed outbox messages.
///
/// A message is marked processed only after the publisher accepted it, so a
/// crash in between leads to a duplicate publish on the next poll. Failures
/// are isolated per message and never abort the batch; a message that can
/// never be decoded is retried on every poll.
pub struct OutboxRelay {
    registry: Arc<EventRegistry<OrderEvent>>,
    publisher: Arc<dyn EventPublisher>,
    topic: String,
    batch_size: usize,
}

impl OutboxRelay {
    pub fn new(
        registry: Arc<EventRegistry<OrderEvent>>,
        publisher: Arc<dyn EventPublisher>,
        topic: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            publisher,
            topic: topic.into(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Sets how many messages are read per poll.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Polls the store once and relays every message it returns.
    ///
    /// Only a failure to read the batch is returned as an error.
    #[tracing::instrument(skip(self, store), fields(topic = %self.topic))]
    pub async fn run_once<S>(&self, store: &S) -> Result<RelayReport, S::Error>
    where
        S: OutboxStore + ?Sized,
    {
        let messages = store.fetch_unprocessed(self.batch_size).await?;
        let mut report = RelayReport {
            fetched: messages.len(),
            ..RelayReport::default()
        };

        for message in &messages {
            if let Err(err) = self.relay(message).await {
                let stage = match err {
                    OutboxError::Publish(_) => "publish",
                    _ => "decode",
                };
                tracing::warn!(
                    message_id = %message.id,
                    event_name = %message.event_name,
                    error = %err,
                    "Failed to relay outbox message"
                );
                metrics::counter!("outbox_relay_failures_total", "stage" => stage).increment(1);
                report.failed += 1;
                continue;
            }

            if let Err(err) = store.mark_processed(message.id, Utc::now()).await {
                tracing::warn!(
                    message_id = %message.id,
                    error = %err,
                    "Published outbox message could not be marked processed"
                );
                metrics::counter!("outbox_relay_failures_total", "stage" => "mark_processed")
                    .increment(1);
                report.failed += 1;
                continue;
            }

            metrics::counter!("outbox_messages_published_total").increment(1);
            report.published += 1;
        }

        if report.fetched > 0 {
            tracing::info!(
                fetched = report.fetched,
                published = report.published,
                failed = report.failed,
                "Outbox relay batch finished"
            );
        }
        Ok(report)
    }

    async fn relay(&self, message: &OutboxMessage) -> Result<(), OutboxError> {
        let event = self.registry.decode(message)?;
        let integration = IntegrationEvent::from(&event);
        let payload = integration
            .to_payload()
            .map_err(|source| OutboxError::Encode {
                event_type: message.event_name.clone(),
                source,
            })?;

        self.publisher
            .publish(&self.topic, &integration.key(), &payload)
            .await?;
        Ok(())
    }
}

impl std::fmt::Debug for OutboxRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutboxRelay")
            .field("registry", &self.registry)
            .field("topic", &self.topic)
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}
