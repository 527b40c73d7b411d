//! Persistence error types.

use common::Version;
use domain::{Aggregate, DomainError};
use outbox::OutboxError;
use thiserror::Error;

/// Errors that can occur when reading or writing aggregates.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// No row exists with the given id.
    #[error("{aggregate_type} not found: {id}")]
    NotFound {
        aggregate_type: &'static str,
        id: String,
    },

    /// The stored version differs from the one the aggregate was loaded at,
    /// or the row vanished while the update ran.
    #[error("Version conflict for {aggregate_type} {id}: expected version {expected}")]
    VersionConflict {
        aggregate_type: &'static str,
        id: String,
        expected: Version,
    },

    /// A row with the same id already exists.
    #[error("{aggregate_type} already exists: {id}")]
    AlreadyExists {
        aggregate_type: &'static str,
        id: String,
    },

    /// A stored row does not satisfy the aggregate's invariants.
    #[error("Corrupted {aggregate_type} {id}: {source}")]
    Corrupted {
        aggregate_type: &'static str,
        id: String,
        #[source]
        source: DomainError,
    },

    /// Encoding a domain event into the outbox failed.
    #[error("Outbox error: {0}")]
    Outbox(#[from] OutboxError),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl PersistenceError {
    pub(crate) fn not_found<A: Aggregate>(id: A::Id) -> Self {
        PersistenceError::NotFound {
            aggregate_type: A::aggregate_type(),
            id: id.to_string(),
        }
    }

    pub(crate) fn version_conflict<A: Aggregate>(aggregate: &A) -> Self {
        PersistenceError::VersionConflict {
            aggregate_type: A::aggregate_type(),
            id: aggregate.id().to_string(),
            expected: aggregate.version(),
        }
    }

    pub(crate) fn already_exists<A: Aggregate>(id: A::Id) -> Self {
        PersistenceError::AlreadyExists {
            aggregate_type: A::aggregate_type(),
            id: id.to_string(),
        }
    }

    pub(crate) fn corrupted<A: Aggregate>(id: impl ToString, source: DomainError) -> Self {
        PersistenceError::Corrupted {
            aggregate_type: A::aggregate_type(),
            id: id.to_string(),
            source,
        }
    }

    /// Returns true if the caller should give up and retry with fresh state.
    pub fn is_conflict(&self) -> bool {
        matches!(self, PersistenceError::VersionConflict { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PersistenceError::NotFound { .. })
    }
}

/// Result type for persistence operations.
pub type Result<T> = std::result::Result<T, PersistenceError>;
