use common::{Classify, ErrorKind};
use thiserror::Error;

use crate::Version;

/// Errors that can occur when interacting with a repository.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The stored version did not match the version the aggregate was
    /// loaded at.
    #[error(
        "Concurrency conflict for {aggregate_type} {id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        aggregate_type: &'static str,
        id: String,
        expected: Version,
        actual: Version,
    },

    /// The aggregate was not found.
    #[error("{aggregate_type} not found: {id}")]
    NotFound {
        aggregate_type: &'static str,
        id: String,
    },

    /// An aggregate without identity was handed to the repository.
    #[error("{aggregate_type} has no identity and cannot be stored")]
    MissingIdentity { aggregate_type: &'static str },

    /// The underlying store failed or was unreachable.
    #[error("Infrastructure error: {0}")]
    Infrastructure(String),
}

impl Classify for RepositoryError {
    fn kind(&self) -> ErrorKind {
        match self {
            RepositoryError::ConcurrencyConflict { .. } => ErrorKind::Conflict,
            RepositoryError::NotFound { .. } => ErrorKind::NotFound,
            RepositoryError::MissingIdentity { .. } | RepositoryError::Infrastructure(_) => {
                ErrorKind::Infrastructure
            }
        }
    }
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;
