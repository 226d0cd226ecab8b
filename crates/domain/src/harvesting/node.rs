//! Placed resource node aggregate.

use chrono::{DateTime, Utc};
use common::{AreaId, NodeInstanceId, PersonaId};
use repository::{Version, Versioned};
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;

use super::events::{NodeRegistered, ResourceHarvested};
use super::{
    HarvestEffect, HarvestError, NodeState, NodeTag, ResourceNodeDefinition, ResourceNodeEvent,
    YieldRoller, resolve_yield,
};

/// Position and facing of a node within its area.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Facing in degrees.
    pub orientation: f32,
}

impl Location {
    pub fn new(x: f32, y: f32, z: f32, orientation: f32) -> Self {
        Self {
            x,
            y,
            z,
            orientation,
        }
    }

    /// Checks every component is a finite number.
    pub fn validate(&self) -> Result<(), HarvestError> {
        if ![self.x, self.y, self.z].iter().all(|c| c.is_finite()) {
            return Err(HarvestError::InvalidLocation {
                reason: "coordinates must be finite",
            });
        }
        if !self.orientation.is_finite() {
            return Err(HarvestError::InvalidLocation {
                reason: "orientation must be finite",
            });
        }
        Ok(())
    }
}

/// Quality of a placed node; scales yielded quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NodeQuality {
    Poor,
    #[default]
    Standard,
    Fine,
    Exceptional,
}

impl NodeQuality {
    /// Returns the quantity multiplier for this quality.
    pub fn multiplier(&self) -> f32 {
        match self {
            NodeQuality::Poor => 0.5,
            NodeQuality::Standard => 1.0,
            NodeQuality::Fine => 1.5,
            NodeQuality::Exceptional => 2.0,
        }
    }
}

/// Whether a node is harvestable as soon as it is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Activation {
    #[default]
    Immediate,
    /// Stays `Registered` until activated explicitly.
    Deferred,
}

/// Resource node aggregate root.
///
/// A concrete node placed in an area, created from a definition and
/// consumed by harvesting until its uses run out.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceNode {
    id: Option<NodeInstanceId>,

    #[serde(default)]
    version: Version,

    /// Definition the node was created from.
    definition: Option<NodeTag>,

    area: Option<AreaId>,

    location: Location,

    quality: NodeQuality,

    state: NodeState,

    remaining_uses: u32,

    registered_at: Option<DateTime<Utc>>,
}

impl Versioned for ResourceNode {
    type Id = NodeInstanceId;

    fn aggregate_type() -> &'static str {
        "ResourceNode"
    }

    fn id(&self) -> Option<NodeInstanceId> {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }
}

impl Aggregate for ResourceNode {
    type Event = ResourceNodeEvent;
    type Error = HarvestError;

    fn apply(&mut self, event: Self::Event) {
        match event {
            ResourceNodeEvent::NodeRegistered(data) => self.apply_node_registered(data),
            ResourceNodeEvent::NodeActivated(_) => {
                self.state = NodeState::Active;
            }
            ResourceNodeEvent::ResourceHarvested(data) => self.apply_resource_harvested(data),
            ResourceNodeEvent::NodeDepleted(_) => {
                self.state = NodeState::Depleted;
            }
            ResourceNodeEvent::NodeDestroyed(_) => {
                self.state = NodeState::Destroyed;
            }
        }
    }
}

// Query methods
impl ResourceNode {
    pub fn definition(&self) -> Option<&NodeTag> {
        self.definition.as_ref()
    }

    pub fn area(&self) -> Option<AreaId> {
        self.area
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn quality(&self) -> NodeQuality {
        self.quality
    }

    /// Returns the current state.
    pub fn state(&self) -> NodeState {
        self.state
    }

    /// Returns how many more times the node can be harvested.
    pub fn remaining_uses(&self) -> u32 {
        self.remaining_uses
    }

    pub fn registered_at(&self) -> Option<DateTime<Utc>> {
        self.registered_at
    }

    /// Returns true if the node is in the given area.
    pub fn is_in(&self, area: AreaId) -> bool {
        self.area == Some(area)
    }
}

// Command methods (return events)
impl ResourceNode {
    /// Places a node created from `definition`.
    #[allow(clippy::too_many_arguments)]
    pub fn register(
        &self,
        node: NodeInstanceId,
        definition: &ResourceNodeDefinition,
        area: AreaId,
        location: Location,
        uses: u32,
        quality: NodeQuality,
        activation: Activation,
    ) -> Result<Vec<ResourceNodeEvent>, HarvestError> {
        if let Some(existing) = self.id {
            return Err(HarvestError::NodeAlreadyRegistered { node: existing });
        }
        let tag = definition
            .tag()
            .cloned()
            .ok_or(HarvestError::DefinitionNotCreated)?;
        location.validate()?;
        if uses == 0 {
            return Err(HarvestError::InvalidUses { uses });
        }

        let state = match activation {
            Activation::Immediate => NodeState::Active,
            Activation::Deferred => NodeState::Registered,
        };

        Ok(vec![ResourceNodeEvent::node_registered(
            node, tag, area, location, uses, quality, state,
        )])
    }

    /// Makes a deferred node harvestable.
    pub fn activate(&self) -> Result<Vec<ResourceNodeEvent>, HarvestError> {
        let node = self.require_registered()?;
        if !self.state.can_activate() {
            return Err(HarvestError::InvalidStateTransition {
                current_state: self.state,
                action: "activate",
            });
        }

        Ok(vec![ResourceNodeEvent::node_activated(node)])
    }

    /// Harvests the node once.
    ///
    /// Emits `ResourceHarvested`, followed by `NodeDepleted` when this was
    /// the last use. A harvest that yields nothing still consumes a use.
    pub fn harvest(
        &self,
        harvester: PersonaId,
        definition: &ResourceNodeDefinition,
        effects: &[HarvestEffect],
        roller: &dyn YieldRoller,
    ) -> Result<Vec<ResourceNodeEvent>, HarvestError> {
        let node = self.require_registered()?;
        if !self.state.can_harvest() {
            return Err(HarvestError::InvalidStateTransition {
                current_state: self.state,
                action: "harvest",
            });
        }
        effects.iter().try_for_each(HarvestEffect::validate)?;

        let tag = self
            .definition
            .as_ref()
            .ok_or(HarvestError::NodeNotRegistered)?;
        if definition.tag() != Some(tag) {
            return Err(HarvestError::UnknownDefinition { tag: tag.clone() });
        }

        let items = resolve_yield(tag, definition.yields(), self.quality, effects, roller);
        let remaining_uses = self.remaining_uses.saturating_sub(1);

        let mut events = vec![ResourceNodeEvent::resource_harvested(
            node,
            harvester,
            items,
            remaining_uses,
        )];
        if remaining_uses == 0 {
            events.push(ResourceNodeEvent::node_depleted(node));
        }
        Ok(events)
    }

    /// Destroys the node. Destroying a destroyed node changes nothing.
    pub fn destroy(&self) -> Result<Vec<ResourceNodeEvent>, HarvestError> {
        let node = self.require_registered()?;
        if !self.state.can_destroy() {
            return Ok(vec![]);
        }

        Ok(vec![ResourceNodeEvent::node_destroyed(node, self.area)])
    }

    fn require_registered(&self) -> Result<NodeInstanceId, HarvestError> {
        self.id.ok_or(HarvestError::NodeNotRegistered)
    }
}

// Apply event helpers
impl ResourceNode {
    fn apply_node_registered(&mut self, data: NodeRegistered) {
        self.id = Some(data.node);
        self.definition = Some(data.definition);
        self.area = Some(data.area);
        self.location = data.location;
        self.quality = data.quality;
        self.state = data.state;
        self.remaining_uses = data.uses;
        self.registered_at = Some(data.meta.occurred_at);
    }

    fn apply_resource_harvested(&mut self, data: ResourceHarvested) {
        self.remaining_uses = data.remaining_uses;
    }
}
