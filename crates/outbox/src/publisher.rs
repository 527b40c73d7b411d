//! Message bus publisher port and simple implementations.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::PublishError;

/// Sends encoded messages to an external message bus.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publishes `payload` on `topic` with the given partition `key`.
    async fn publish(&self, topic: &str, key: &str, payload: &[u8]) -> Result<(), PublishError>;
}

/// A message accepted by [`InMemoryPublisher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub topic: String,
    pub key: String,
    pub payload: Vec<u8>,
}

#[derive(Debug, Default)]
struct InMemoryPublisherState {
    published: Vec<PublishedMessage>,
    fail_on_publish: bool,
}

/// Publisher that records messages in memory, for tests and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPublisher {
    state: Arc<RwLock<InMemoryPublisherState>>,
}

impl InMemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following publish call fail until reset.
    pub async fn set_fail_on_publish(&self, fail: bool) {
        self.state.write().await.fail_on_publish = fail;
    }

    /// Returns all messages published so far.
    pub async fn published(&self) -> Vec<PublishedMessage> {
        self.state.read().await.published.clone()
    }

    pub async fn published_count(&self) -> usize {
        self.state.read().await.published.len()
    }
}

#[async_trait]
impl EventPublisher for InMemoryPublisher {
    async fn publish(&self, topic: &str, key: &str, payload: &[u8]) -> Result<(), PublishError> {
        let mut state = self.state.write().await;
        if state.fail_on_publish {
            return Err(PublishError::Failed {
                topic: topic.to_string(),
                reason: "publisher configured to fail".to_string(),
            });
        }

        state.published.push(PublishedMessage {
            topic: topic.to_string(),
            key: key.to_string(),
            payload: payload.to_vec(),
        });
        Ok(())
    }
}

/// Publisher that only logs messages.
///
/// Used when no broker is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingPublisher;

#[async_trait]
impl EventPublisher for TracingPublisher {
    async fn publish(&self, topic: &str, key: &str, payload: &[u8]) -> Result<(), PublishError> {
        tracing::info!(
            topic,
            key,
            payload = %String::from_utf8_lossy(payload),
            "Publishing event"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_published_messages() {
        let publisher = InMemoryPublisher::new();
        publisher.publish("orders", "k1", b"one").await.unwrap();
        publisher.publish("orders", "k2", b"two").await.unwrap();

        let published = publisher.published().await;
        assert_eq!(published.len(), 2);
        assert_eq!(published[0].key, "k1");
        assert_eq!(published[1].payload, b"two".to_vec());
    }

    #[tokio::test]
    async fn test_fail_on_publish() {
        let publisher = InMemoryPublisher::new();
        publisher.set_fail_on_publish(true).await;

        let result = publisher.publish("orders", "k", b"x").await;
        assert!(matches!(result, Err(PublishError::Failed { .. })));
        assert_eq!(publisher.published_count().await, 0);

        publisher.set_fail_on_publish(false).await;
        publisher.publish("orders", "k", b"x").await.unwrap();
        assert_eq!(publisher.published_count().await, 1);
    }

    #[tokio::test]
    async fn test_tracing_publisher_accepts_everything() {
        TracingPublisher.publish("orders", "k", b"{}").await.unwrap();
    }
}
