//! Trait budget commands and queries.

use common::PersonaId;
use dispatch::{Command, Query};

use crate::error::DomainError;

use super::TraitBudget;

/// Command to grant a character a trait budget, or change its total.
#[derive(Debug, Clone, Copy)]
pub struct GrantTraitBudget {
    pub character: PersonaId,
    pub total: u32,
}

impl GrantTraitBudget {
    pub fn new(character: PersonaId, total: u32) -> Self {
        Self { character, total }
    }
}

impl Command for GrantTraitBudget {
    type Error = DomainError;
}

/// Command to spend points on a trait.
#[derive(Debug, Clone)]
pub struct SpendTraitPoints {
    pub character: PersonaId,
    pub trait_name: String,
    pub cost: u32,
}

impl SpendTraitPoints {
    pub fn new(character: PersonaId, trait_name: impl Into<String>, cost: u32) -> Self {
        Self {
            character,
            trait_name: trait_name.into(),
            cost,
        }
    }
}

impl Command for SpendTraitPoints {
    type Error = DomainError;
}

/// Command to return points spent on a trait.
#[derive(Debug, Clone)]
pub struct RefundTraitPoints {
    pub character: PersonaId,
    pub trait_name: String,
    pub points: u32,
}

impl RefundTraitPoints {
    pub fn new(character: PersonaId, trait_name: impl Into<String>, points: u32) -> Self {
        Self {
            character,
            trait_name: trait_name.into(),
            points,
        }
    }
}

impl Command for RefundTraitPoints {
    type Error = DomainError;
}

/// Query for a character's trait budget.
#[derive(Debug, Clone, Copy)]
pub struct GetTraitBudget {
    pub character: PersonaId,
}

impl GetTraitBudget {
    pub fn new(character: PersonaId) -> Self {
        Self { character }
    }
}

impl Query for GetTraitBudget {
    type Output = Option<TraitBudget>;
    type Error = DomainError;
}
