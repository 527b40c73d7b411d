//! Core aggregate and domain event traits.

use chrono::{DateTime, Utc};
use common::{EventId, Version};

/// Trait for domain events.
///
/// Domain events represent facts that have happened in the domain.
/// They are immutable and named in past tense.
pub trait DomainEvent: Send + Sync + Clone {
    /// Returns the stable event type name.
    ///
    /// Used as the lookup key when events are written to and read from the outbox.
    fn event_type(&self) -> &'static str;

    /// Returns the unique id of this event occurrence.
    fn event_id(&self) -> EventId;

    /// Returns when the event happened.
    fn occurred_at(&self) -> DateTime<Utc>;
}

/// Trait for aggregates persisted with optimistic concurrency.
///
/// An aggregate is a consistency boundary whose invariants are enforced by
/// its own methods. Persistence compares the stored version with
/// [`Aggregate::version`] on every update and advances it on success.
pub trait Aggregate: Send + Sync {
    /// Identifier type of the aggregate.
    type Id: Copy + std::fmt::Display + Send + Sync;

    /// Returns the aggregate type name.
    fn aggregate_type() -> &'static str;

    /// Returns the aggregate's unique identifier.
    fn id(&self) -> Self::Id;

    /// Returns the version the aggregate was loaded at.
    fn version(&self) -> Version;

    /// Sets the aggregate version.
    ///
    /// Called by repositories after a successful write.
    fn set_version(&mut self, version: Version);
}
