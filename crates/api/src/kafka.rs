//! Kafka-compatible bus publisher.

use std::time::Duration;

use async_trait::async_trait;
use outbox::{EventPublisher, PublishError};
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;

const SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Publishes integration events through an rdkafka producer.
pub struct KafkaPublisher {
    producer: FutureProducer,
}

impl KafkaPublisher {
    pub fn new(brokers: &str) -> Result<Self, PublishError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()
            .map_err(|e| PublishError::Configuration(e.to_string()))?;
        tracing::info!(%brokers, "Kafka producer created");
        Ok(Self { producer })
    }
}

#[async_trait]
impl EventPublisher for KafkaPublisher {
    async fn publish(&self, topic: &str, key: &str, payload: &[u8]) -> Result<(), PublishError> {
        let record = FutureRecord::to(topic).key(key).payload(payload);
        self.producer
            .send(record, Timeout::After(SEND_TIMEOUT))
            .await
            .map_err(|(e, _)| PublishError::Failed {
                topic: topic.to_string(),
                reason: e.to_string(),
            })?;
        tracing::debug!(%topic, %key, "Published to Kafka");
        Ok(())
    }
}
