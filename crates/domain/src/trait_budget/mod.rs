//! Per-character trait point budgets.

mod budget;
mod commands;
mod events;
mod service;

pub use budget::TraitBudget;
pub use commands::{GetTraitBudget, GrantTraitBudget, RefundTraitPoints, SpendTraitPoints};
pub use events::{TraitBudgetEvent, TraitBudgetGranted, TraitPointsRefunded, TraitPointsSpent};
pub use service::TraitBudgetService;

use common::{Classify, ErrorKind};
use thiserror::Error;

/// Errors that can occur during trait budget operations.
#[derive(Debug, Error)]
pub enum TraitBudgetError {
    /// Points must be greater than zero.
    #[error("Invalid points: {points} (must be greater than 0)")]
    InvalidPoints { points: u32 },

    /// Trait name is required.
    #[error("Trait name is required")]
    TraitNameRequired,

    /// Not enough unspent points.
    #[error("Insufficient trait points: {available} available, {requested} requested")]
    InsufficientTraitPoints { available: u32, requested: u32 },

    /// The new total would be lower than what is already spent.
    #[error("Budget of {total} is below the {spent} points already spent")]
    BudgetBelowSpent { total: u32, spent: u32 },

    /// More points refunded than were spent on the trait.
    #[error("Cannot refund {requested} points from {trait_name}: only {spent} spent")]
    RefundExceedsSpent {
        trait_name: String,
        spent: u32,
        requested: u32,
    },

    /// No budget has been granted.
    #[error("Trait budget not granted")]
    BudgetNotGranted,
}

impl Classify for TraitBudgetError {
    fn kind(&self) -> ErrorKind {
        match self {
            TraitBudgetError::InvalidPoints { .. } | TraitBudgetError::TraitNameRequired => {
                ErrorKind::Validation
            }
            TraitBudgetError::InsufficientTraitPoints { .. }
            | TraitBudgetError::BudgetBelowSpent { .. }
            | TraitBudgetError::RefundExceedsSpent { .. } => ErrorKind::Conflict,
            TraitBudgetError::BudgetNotGranted => ErrorKind::NotFound,
        }
    }
}
