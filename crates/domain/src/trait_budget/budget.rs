//! Trait budget aggregate implementation.

use std::collections::BTreeMap;

use common::PersonaId;
use repository::{Version, Versioned};
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;

use super::{TraitBudgetError, TraitBudgetEvent};

/// Trait budget aggregate root.
///
/// Invariant: `spent <= total`, and `spent` equals the sum of the points
/// allocated to each trait.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TraitBudget {
    character: Option<PersonaId>,

    #[serde(default)]
    version: Version,

    total: u32,

    spent: u32,

    /// Points spent per trait.
    allocations: BTreeMap<String, u32>,
}

impl Versioned for TraitBudget {
    type Id = PersonaId;

    fn aggregate_type() -> &'static str {
        "TraitBudget"
    }

    fn id(&self) -> Option<PersonaId> {
        self.character
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }
}

impl Aggregate for TraitBudget {
    type Event = TraitBudgetEvent;
    type Error = TraitBudgetError;

    fn apply(&mut self, event: Self::Event) {
        match event {
            TraitBudgetEvent::Granted(data) => {
                self.character = Some(data.character);
                self.total = data.total;
            }
            TraitBudgetEvent::Spent(data) => {
                self.spent += data.cost;
                *self.allocations.entry(data.trait_name).or_default() += data.cost;
            }
            TraitBudgetEvent::Refunded(data) => {
                self.spent = self.spent.saturating_sub(data.points);
                if let Some(allocated) = self.allocations.get_mut(&data.trait_name) {
                    *allocated -= data.points;
                    if *allocated == 0 {
                        self.allocations.remove(&data.trait_name);
                    }
                }
            }
        }
    }
}

// Query methods
impl TraitBudget {
    pub fn character(&self) -> Option<PersonaId> {
        self.character
    }

    /// Returns the total points granted.
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Returns the points spent across all traits.
    pub fn spent(&self) -> u32 {
        self.spent
    }

    /// Returns the unspent points.
    pub fn available(&self) -> u32 {
        self.total.saturating_sub(self.spent)
    }

    /// Returns the points spent on one trait.
    pub fn allocated_to(&self, trait_name: &str) -> u32 {
        self.allocations.get(trait_name).copied().unwrap_or(0)
    }

    /// Returns every trait with points spent on it.
    pub fn allocations(&self) -> impl Iterator<Item = (&str, u32)> {
        self.allocations
            .iter()
            .map(|(name, points)| (name.as_str(), *points))
    }
}

// Command methods (return events)
impl TraitBudget {
    /// Grants a budget, or changes the total of an existing one.
    pub fn grant(&self, character: PersonaId, total: u32) -> Result<Vec<TraitBudgetEvent>, TraitBudgetError> {
        if total < self.spent {
            return Err(TraitBudgetError::BudgetBelowSpent {
                total,
                spent: self.spent,
            });
        }
        if self.character.is_some() && total == self.total {
            return Ok(vec![]);
        }

        Ok(vec![TraitBudgetEvent::granted(character, total, self.total)])
    }

    /// Spends points on a trait.
    pub fn spend(&self, trait_name: &str, cost: u32) -> Result<Vec<TraitBudgetEvent>, TraitBudgetError> {
        let character = self.require_granted()?;
        validate(trait_name, cost)?;

        let available = self.available();
        if cost > available {
            return Err(TraitBudgetError::InsufficientTraitPoints {
                available,
                requested: cost,
            });
        }

        Ok(vec![TraitBudgetEvent::spent(
            character,
            trait_name,
            cost,
            available - cost,
        )])
    }

    /// Returns points previously spent on a trait.
    pub fn refund(&self, trait_name: &str, points: u32) -> Result<Vec<TraitBudgetEvent>, TraitBudgetError> {
        let character = self.require_granted()?;
        validate(trait_name, points)?;

        let spent = self.allocated_to(trait_name);
        if points > spent {
            return Err(TraitBudgetError::RefundExceedsSpent {
                trait_name: trait_name.to_owned(),
                spent,
                requested: points,
            });
        }

        Ok(vec![TraitBudgetEvent::refunded(
            character,
            trait_name,
            points,
            self.available() + points,
        )])
    }

    fn require_granted(&self) -> Result<PersonaId, TraitBudgetError> {
        self.character.ok_or(TraitBudgetError::BudgetNotGranted)
    }
}

fn validate(trait_name: &str, points: u32) -> Result<(), TraitBudgetError> {
    if trait_name.trim().is_empty() {
        return Err(TraitBudgetError::TraitNameRequired);
    }
    if points == 0 {
        return Err(TraitBudgetError::InvalidPoints { points });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn granted(total: u32) -> TraitBudget {
        let mut budget = TraitBudget::default();
        let events = budget.grant(PersonaId::new(), total).unwrap();
        budget.apply_events(events);
        budget
    }

    fn spend(budget: &mut TraitBudget, name: &str, cost: u32) {
        let events = budget.spend(name, cost).unwrap();
        budget.apply_events(events);
    }

    #[test]
    fn test_overspent_budget_reports_nothing_available() {
        let budget: TraitBudget = serde_json::from_str(
            r#"{"character":null,"total":3,"spent":5,"allocations":{"stealth":5}}"#,
        )
        .unwrap();

        assert_eq!(budget.available(), 0);
    }

    #[test]
    fn test_grant() {
        let budget = granted(10);
        assert_eq!(budget.total(), 10);
        assert_eq!(budget.available(), 10);
    }

    #[test]
    fn test_regrant_same_total_is_a_no_op() {
        let budget = granted(10);
        let character = budget.character().unwrap();
        assert!(budget.grant(character, 10).unwrap().is_empty());
    }

    #[test]
    fn test_spend_and_refund() {
        let mut budget = granted(10);
        spend(&mut budget, "toughness", 3);
        spend(&mut budget, "alertness", 2);
        spend(&mut budget, "toughness", 1);

        assert_eq!(budget.spent(), 6);
        assert_eq!(budget.available(), 4);
        assert_eq!(budget.allocated_to("toughness"), 4);

        let events = budget.refund("toughness", 4).unwrap();
        budget.apply_events(events);
        assert_eq!(budget.spent(), 2);
        assert_eq!(budget.allocated_to("toughness"), 0);
        assert_eq!(budget.allocations().count(), 1);
    }

    #[test]
    fn test_overspend_fails() {
        let mut budget = granted(5);
        spend(&mut budget, "toughness", 4);
        assert!(matches!(
            budget.spend("alertness", 2),
            Err(TraitBudgetError::InsufficientTraitPoints {
                available: 1,
                requested: 2
            })
        ));
    }

    #[test]
    fn test_lowering_total_below_spent_fails() {
        let mut budget = granted(5);
        spend(&mut budget, "toughness", 4);
        let character = budget.character().unwrap();
        assert!(matches!(
            budget.grant(character, 3),
            Err(TraitBudgetError::BudgetBelowSpent { total: 3, spent: 4 })
        ));
    }

    #[test]
    fn test_refund_more_than_spent_fails() {
        let mut budget = granted(5);
        spend(&mut budget, "toughness", 1);
        assert!(matches!(
            budget.refund("toughness", 2),
            Err(TraitBudgetError::RefundExceedsSpent { .. })
        ));
        assert!(matches!(
            budget.refund("alertness", 1),
            Err(TraitBudgetError::RefundExceedsSpent { spent: 0, .. })
        ));
    }

    #[test]
    fn test_invalid_input_rejected() {
        let budget = granted(5);
        assert!(matches!(
            budget.spend("toughness", 0),
            Err(TraitBudgetError::InvalidPoints { points: 0 })
        ));
        assert!(matches!(
            budget.spend(" ", 1),
            Err(TraitBudgetError::TraitNameRequired)
        ));
    }

    #[test]
    fn test_spend_without_budget_fails() {
        assert!(matches!(
            TraitBudget::default().spend("toughness", 1),
            Err(TraitBudgetError::BudgetNotGranted)
        ));
    }
}
