//! Domain layer of the world economy.
//!
//! This crate provides:
//! - the Aggregate trait and the load-lock-mutate-save executor
//! - per-instance locks serializing mutations of one aggregate
//! - coinhouse ledger accounts with atomic transfers
//! - resource node definitions, placed nodes and harvesting
//! - per-character trait budgets
//!
//! Each feature exposes a service implementing the dispatch handler traits
//! for its commands and queries; [`WorldServices`] registers them all.

pub mod aggregate;
pub mod error;
pub mod executor;
pub mod harvesting;
pub mod ledger;
pub mod locks;
pub mod registry;
pub mod trait_budget;

pub use aggregate::Aggregate;
pub use error::DomainError;
pub use executor::{CommandExecutor, CommandResult, PairResult, Removal, SharedRepository};
pub use harvesting::{HarvestError, HarvestingService, NodeState, ResourceNode, ResourceNodeDefinition};
pub use ledger::{Gold, LedgerAccount, LedgerError, LedgerService, Transaction};
pub use locks::InstanceLocks;
pub use registry::{Repositories, WorldServices};
pub use trait_budget::{TraitBudget, TraitBudgetError, TraitBudgetService};
