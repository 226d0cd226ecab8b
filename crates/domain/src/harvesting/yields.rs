//! Yield resolution: base yield table, node quality and harvest effects.
//!
//! Effects come from a harvester's knowledge and are scoped to a node tag
//! (and optionally a single item). Every effect that applies to an entry is
//! combined by its declared operation:
//!
//! ```text
//! value = (base + sum(add)) * product(multiply)
//! ```
//!
//! A resulting chance is clamped to `[0, 1]`; a resulting quantity is then
//! scaled by the node's quality and rounded.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{HarvestError, ItemTag, NodeQuality, NodeTag, YieldEntry};

/// Which yield value an effect adjusts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectTarget {
    Chance,
    Quantity,
}

/// How an effect combines with the base value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectOperation {
    Add,
    Multiply,
}

/// A modifier to the yield of nodes with a given tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarvestEffect {
    /// Nodes this effect applies to.
    pub node_tag: NodeTag,

    /// Restricts the effect to one item; `None` applies to every item.
    pub item: Option<ItemTag>,

    pub target: EffectTarget,

    pub operation: EffectOperation,

    pub value: f32,
}

impl HarvestEffect {
    /// Creates an effect applying to every item of a node tag.
    pub fn new(node_tag: NodeTag, target: EffectTarget, operation: EffectOperation, value: f32) -> Self {
        Self {
            node_tag,
            item: None,
            target,
            operation,
            value,
        }
    }

    /// Restricts the effect to one item.
    pub fn for_item(mut self, item: ItemTag) -> Self {
        self.item = Some(item);
        self
    }

    /// Returns true if the effect adjusts `target` for `item` on nodes of `node_tag`.
    pub fn applies_to(&self, node_tag: &NodeTag, item: &ItemTag, target: EffectTarget) -> bool {
        self.target == target
            && &self.node_tag == node_tag
            && self.item.as_ref().is_none_or(|only| only == item)
    }

    /// Checks the effect value is usable.
    pub fn validate(&self) -> Result<(), HarvestError> {
        if !self.value.is_finite() {
            return Err(HarvestError::InvalidEffect {
                reason: "value must be finite",
            });
        }
        if self.operation == EffectOperation::Multiply && self.value < 0.0 {
            return Err(HarvestError::InvalidEffect {
                reason: "multiplier must not be negative",
            });
        }
        Ok(())
    }
}

/// An item produced by a harvest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestedItem {
    pub item: ItemTag,
    pub quantity: u32,
}

/// Source of randomness for yield resolution.
pub trait YieldRoller: Send + Sync {
    /// Returns a value in `[0, 1)`; an entry yields when the roll is below
    /// its chance.
    fn roll_chance(&self) -> f32;

    /// Returns a quantity in `[min, max]`.
    fn roll_quantity(&self, min: u32, max: u32) -> u32;
}

/// Rolls with the thread-local random number generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomRoller;

impl YieldRoller for RandomRoller {
    fn roll_chance(&self) -> f32 {
        rand::thread_rng().r#gen::<f32>()
    }

    fn roll_quantity(&self, min: u32, max: u32) -> u32 {
        if min >= max {
            return min;
        }
        rand::thread_rng().gen_range(min..=max)
    }
}

/// Always rolls the same values.
#[derive(Debug, Clone, Copy)]
pub struct FixedRoller {
    chance_roll: f32,
    highest_quantity: bool,
}

impl FixedRoller {
    /// Every chance roll returns `chance_roll`; quantities are the minimum.
    pub fn new(chance_roll: f32) -> Self {
        Self {
            chance_roll,
            highest_quantity: false,
        }
    }

    /// Rolls that hit every entry with a non-zero chance.
    pub fn lucky() -> Self {
        Self::new(0.0)
    }

    /// Makes quantity rolls return the maximum instead.
    pub fn with_highest_quantity(mut self) -> Self {
        self.highest_quantity = true;
        self
    }
}

impl YieldRoller for FixedRoller {
    fn roll_chance(&self) -> f32 {
        self.chance_roll
    }

    fn roll_quantity(&self, min: u32, max: u32) -> u32 {
        if self.highest_quantity { max.max(min) } else { min }
    }
}

fn combine<'a>(base: f32, effects: impl Iterator<Item = &'a HarvestEffect>) -> f32 {
    let (added, multiplier) = effects.fold((0.0, 1.0), |(added, multiplier), effect| {
        match effect.operation {
            EffectOperation::Add => (added + effect.value, multiplier),
            EffectOperation::Multiply => (added, multiplier * effect.value),
        }
    });
    (base + added) * multiplier
}

/// Resolves what one harvest of a node yields.
///
/// Entries that miss their chance roll or round down to zero produce
/// nothing; the result may be empty.
pub fn resolve_yield(
    node_tag: &NodeTag,
    yields: &[YieldEntry],
    quality: NodeQuality,
    effects: &[HarvestEffect],
    roller: &dyn YieldRoller,
) -> Vec<HarvestedItem> {
    yields
        .iter()
        .filter_map(|entry| {
            let applicable = |target| {
                effects
                    .iter()
                    .filter(move |effect| effect.applies_to(node_tag, &entry.item, target))
            };

            let chance = combine(entry.chance, applicable(EffectTarget::Chance)).clamp(0.0, 1.0);
            if roller.roll_chance() >= chance {
                return None;
            }

            let base = roller.roll_quantity(entry.min_quantity, entry.max_quantity) as f32;
            let quantity = combine(base, applicable(EffectTarget::Quantity)) * quality.multiplier();
            let quantity = quantity.round().clamp(0.0, u32::MAX as f32) as u32;

            (quantity > 0).then(|| HarvestedItem {
                item: entry.item.clone(),
                quantity,
            })
        })
        .collect()
}
