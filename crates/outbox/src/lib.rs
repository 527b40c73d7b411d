//! Transactional outbox for domain events.
//!
//! Domain events are encoded into [`OutboxMessage`]s by an [`EventRegistry`]
//! and written in the same transaction as the state change that raised them.
//! The [`OutboxRelay`] later reads unprocessed messages from an
//! [`OutboxStore`], republishes them through an [`EventPublisher`] and marks
//! them processed. Delivery is at-least-once.

pub mod error;
pub mod integration;
pub mod message;
pub mod publisher;
pub mod registry;
pub mod relay;
pub mod store;

pub use error::{OutboxError, PublishError, Result};
pub use integration::IntegrationEvent;
pub use message::OutboxMessage;
pub use publisher::{EventPublisher, InMemoryPublisher, PublishedMessage, TracingPublisher};
pub use registry::{EventCodec, EventRegistry, EventRegistryBuilder, order_event_registry};
pub use relay::{DEFAULT_BATCH_SIZE, OutboxRelay, RelayReport};
pub use store::OutboxStore;
