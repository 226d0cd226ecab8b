//! Domain error types.

use common::{Classify, ErrorKind};
use repository::RepositoryError;
use thiserror::Error;

use crate::harvesting::HarvestError;
use crate::ledger::LedgerError;
use crate::trait_budget::TraitBudgetError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in a repository.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// A ledger account rejected the command.
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// A resource node or node definition rejected the command.
    #[error("Harvest error: {0}")]
    Harvest(#[from] HarvestError),

    /// A trait budget rejected the command.
    #[error("Trait budget error: {0}")]
    TraitBudget(#[from] TraitBudgetError),

    /// Aggregate not found.
    #[error("Aggregate not found: {aggregate_type} with id {aggregate_id}")]
    AggregateNotFound {
        aggregate_type: &'static str,
        aggregate_id: String,
    },
}

impl Classify for DomainError {
    fn kind(&self) -> ErrorKind {
        match self {
            DomainError::Repository(error) => error.kind(),
            DomainError::Ledger(error) => error.kind(),
            DomainError::Harvest(error) => error.kind(),
            DomainError::TraitBudget(error) => error.kind(),
            DomainError::AggregateNotFound { .. } => ErrorKind::NotFound,
        }
    }
}
