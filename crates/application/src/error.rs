//! Application error types.

use std::time::Duration;

use domain::DomainError;
use persistence::PersistenceError;
use thiserror::Error;

use crate::geo::GeoError;

/// Errors returned by use cases and workflows.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// The command is malformed before any domain rule is checked.
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// A domain rule rejected the operation.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Reading or writing aggregates failed.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// The delivery address could not be resolved.
    #[error(transparent)]
    Geo(#[from] GeoError),

    /// An external call did not finish in time.
    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },
}

impl ApplicationError {
    /// Returns true for optimistic-locking conflicts.
    ///
    /// The transaction was rolled back and the next run sees fresh state.
    pub fn is_conflict(&self) -> bool {
        matches!(self, ApplicationError::Persistence(e) if e.is_conflict())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ApplicationError::Persistence(PersistenceError::NotFound { .. })
                | ApplicationError::Domain(DomainError::NotFound { .. })
        )
    }
}

/// Result type for application operations.
pub type Result<T> = std::result::Result<T, ApplicationError>;
