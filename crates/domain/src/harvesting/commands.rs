//! Harvesting commands.

use common::{AreaId, NodeInstanceId, PersonaId};
use dispatch::Command;

use crate::error::DomainError;

use super::{Activation, HarvestEffect, Location, NodeDefinitionDetails, NodeQuality, NodeTag};

/// Command to create a node definition.
#[derive(Debug, Clone)]
pub struct CreateNodeDefinition {
    pub tag: NodeTag,
    pub details: NodeDefinitionDetails,
}

impl CreateNodeDefinition {
    pub fn new(tag: NodeTag, details: NodeDefinitionDetails) -> Self {
        Self { tag, details }
    }
}

impl Command for CreateNodeDefinition {
    type Error = DomainError;
}

/// Command to replace the details of an existing node definition.
#[derive(Debug, Clone)]
pub struct UpdateNodeDefinition {
    pub tag: NodeTag,
    pub details: NodeDefinitionDetails,
}

impl UpdateNodeDefinition {
    pub fn new(tag: NodeTag, details: NodeDefinitionDetails) -> Self {
        Self { tag, details }
    }
}

impl Command for UpdateNodeDefinition {
    type Error = DomainError;
}

/// Command to place a node in an area.
#[derive(Debug, Clone)]
pub struct RegisterNode {
    /// The node ID to register.
    pub node: NodeInstanceId,

    /// Tag of the definition to create the node from.
    pub definition: NodeTag,

    pub area: AreaId,

    pub location: Location,

    /// Number of harvests before the node is depleted.
    pub uses: u32,

    pub quality: NodeQuality,

    pub activation: Activation,
}

impl RegisterNode {
    /// Creates a RegisterNode command with a generated node ID, standard
    /// quality and immediate activation.
    pub fn new(definition: NodeTag, area: AreaId, location: Location, uses: u32) -> Self {
        Self {
            node: NodeInstanceId::new(),
            definition,
            area,
            location,
            uses,
            quality: NodeQuality::default(),
            activation: Activation::default(),
        }
    }

    /// Sets the node quality.
    pub fn with_quality(mut self, quality: NodeQuality) -> Self {
        self.quality = quality;
        self
    }

    /// Leaves the node `Registered` until it is activated.
    pub fn deferred(mut self) -> Self {
        self.activation = Activation::Deferred;
        self
    }
}

impl Command for RegisterNode {
    type Error = DomainError;
}

/// Command to make a deferred node harvestable.
#[derive(Debug, Clone, Copy)]
pub struct ActivateNode {
    pub node: NodeInstanceId,
}

impl ActivateNode {
    pub fn new(node: NodeInstanceId) -> Self {
        Self { node }
    }
}

impl Command for ActivateNode {
    type Error = DomainError;
}

/// Command to harvest a node once.
#[derive(Debug, Clone)]
pub struct HarvestResource {
    pub harvester: PersonaId,

    pub node: NodeInstanceId,

    /// The harvester's active effects; those for other node tags are ignored.
    pub effects: Vec<HarvestEffect>,
}

impl HarvestResource {
    pub fn new(harvester: PersonaId, node: NodeInstanceId) -> Self {
        Self {
            harvester,
            node,
            effects: Vec::new(),
        }
    }

    /// Sets the harvester's active effects.
    pub fn with_effects(mut self, effects: Vec<HarvestEffect>) -> Self {
        self.effects = effects;
        self
    }
}

impl Command for HarvestResource {
    type Error = DomainError;
}

/// Command to destroy a node. Succeeds if the node is already gone.
#[derive(Debug, Clone, Copy)]
pub struct DestroyNode {
    pub node: NodeInstanceId,
}

impl DestroyNode {
    pub fn new(node: NodeInstanceId) -> Self {
        Self { node }
    }
}

impl Command for DestroyNode {
    type Error = DomainError;
}

/// Command to destroy every node in an area.
#[derive(Debug, Clone, Copy)]
pub struct ClearAreaNodes {
    pub area: AreaId,
}

impl ClearAreaNodes {
    pub fn new(area: AreaId) -> Self {
        Self { area }
    }
}

impl Command for ClearAreaNodes {
    type Error = DomainError;
}
