//! Trait budget domain events.

use common::PersonaId;
use dispatch::{DomainEvent, EventMetadata, RaisedEvent};
use serde::{Deserialize, Serialize};

/// Events that can occur on a trait budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum TraitBudgetEvent {
    Granted(TraitBudgetGranted),
    Spent(TraitPointsSpent),
    Refunded(TraitPointsRefunded),
}

impl TraitBudgetEvent {
    /// Erases the event for publication.
    pub fn into_raised(self) -> RaisedEvent {
        match self {
            TraitBudgetEvent::Granted(event) => RaisedEvent::new(event),
            TraitBudgetEvent::Spent(event) => RaisedEvent::new(event),
            TraitBudgetEvent::Refunded(event) => RaisedEvent::new(event),
        }
    }

    pub(crate) fn granted(character: PersonaId, total: u32, previous_total: u32) -> Self {
        TraitBudgetEvent::Granted(TraitBudgetGranted {
            meta: EventMetadata::now(),
            character,
            total,
            previous_total,
        })
    }

    pub(crate) fn spent(character: PersonaId, trait_name: &str, cost: u32, available: u32) -> Self {
        TraitBudgetEvent::Spent(TraitPointsSpent {
            meta: EventMetadata::now(),
            character,
            trait_name: trait_name.to_owned(),
            cost,
            available,
        })
    }

    pub(crate) fn refunded(character: PersonaId, trait_name: &str, points: u32, available: u32) -> Self {
        TraitBudgetEvent::Refunded(TraitPointsRefunded {
            meta: EventMetadata::now(),
            character,
            trait_name: trait_name.to_owned(),
            points,
            available,
        })
    }
}

/// A character's trait budget was granted or changed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraitBudgetGranted {
    pub meta: EventMetadata,
    pub character: PersonaId,
    pub total: u32,
    pub previous_total: u32,
}

/// Points were spent on a trait.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraitPointsSpent {
    pub meta: EventMetadata,
    pub character: PersonaId,
    pub trait_name: String,
    pub cost: u32,
    /// Unspent points afterwards.
    pub available: u32,
}

/// Points spent on a trait were returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraitPointsRefunded {
    pub meta: EventMetadata,
    pub character: PersonaId,
    pub trait_name: String,
    pub points: u32,
    /// Unspent points afterwards.
    pub available: u32,
}

impl DomainEvent for TraitBudgetGranted {
    fn metadata(&self) -> &EventMetadata {
        &self.meta
    }
}

impl DomainEvent for TraitPointsSpent {
    fn metadata(&self) -> &EventMetadata {
        &self.meta
    }
}

impl DomainEvent for TraitPointsRefunded {
    fn metadata(&self) -> &EventMetadata {
        &self.meta
    }
}
