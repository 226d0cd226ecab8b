//! Resource node definitions, placed nodes and harvesting.

mod commands;
mod definition;
mod events;
mod node;
mod queries;
mod service;
mod state;
mod yields;

pub use commands::{
    ActivateNode, ClearAreaNodes, CreateNodeDefinition, DestroyNode, HarvestResource,
    RegisterNode, UpdateNodeDefinition,
};
pub use definition::{ItemTag, NodeDefinitionDetails, NodeTag, ResourceNodeDefinition, ResourceType, YieldEntry};
pub use events::{
    NodeActivated, NodeDefinitionCreated, NodeDefinitionEvent, NodeDefinitionUpdated, NodeDepleted,
    NodeDestroyed, NodeRegistered, NodesCleared, ResourceHarvested, ResourceNodeEvent,
};
pub use node::{Activation, Location, NodeQuality, ResourceNode};
pub use queries::{GetNode, GetNodeDefinition, ListAreaNodes};
pub use service::HarvestingService;
pub use state::NodeState;
pub use yields::{
    EffectOperation, EffectTarget, FixedRoller, HarvestEffect, HarvestedItem, RandomRoller,
    YieldRoller, resolve_yield,
};

use common::{Classify, ErrorKind, NodeInstanceId};
use thiserror::Error;

/// Errors that can occur during harvesting operations.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// A tag is empty, too long or contains invalid characters.
    #[error("Invalid tag: {tag:?}")]
    InvalidTag { tag: String },

    /// Definition details are malformed.
    #[error("Invalid node definition: {reason}")]
    InvalidDefinition { reason: String },

    /// A definition with this tag already exists.
    #[error("Node definition already exists: {tag}")]
    DefinitionAlreadyExists { tag: NodeTag },

    /// No definition exists for the tag.
    #[error("Unknown node definition: {tag}")]
    UnknownDefinition { tag: NodeTag },

    /// The definition has not been created.
    #[error("Node definition not created")]
    DefinitionNotCreated,

    /// Coordinates or orientation are not finite.
    #[error("Invalid location: {reason}")]
    InvalidLocation { reason: &'static str },

    /// A node needs at least one use.
    #[error("Invalid uses: {uses} (must be greater than 0)")]
    InvalidUses { uses: u32 },

    /// A harvest effect is malformed.
    #[error("Invalid harvest effect: {reason}")]
    InvalidEffect { reason: &'static str },

    /// A node with this id is already registered.
    #[error("Node already registered: {node}")]
    NodeAlreadyRegistered { node: NodeInstanceId },

    /// The node has not been registered.
    #[error("Node not registered")]
    NodeNotRegistered,

    /// Node is not in the expected state.
    #[error("Invalid state transition: cannot {action} from {current_state} state")]
    InvalidStateTransition {
        current_state: NodeState,
        action: &'static str,
    },
}

impl Classify for HarvestError {
    fn kind(&self) -> ErrorKind {
        match self {
            HarvestError::InvalidTag { .. }
            | HarvestError::InvalidDefinition { .. }
            | HarvestError::UnknownDefinition { .. }
            | HarvestError::InvalidLocation { .. }
            | HarvestError::InvalidUses { .. }
            | HarvestError::InvalidEffect { .. } => ErrorKind::Validation,
            HarvestError::DefinitionAlreadyExists { .. }
            | HarvestError::NodeAlreadyRegistered { .. }
            | HarvestError::InvalidStateTransition { .. } => ErrorKind::Conflict,
            HarvestError::DefinitionNotCreated | HarvestError::NodeNotRegistered => {
                ErrorKind::NotFound
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depleted_harvest_is_a_conflict() {
        let error = HarvestError::InvalidStateTransition {
            current_state: NodeState::Depleted,
            action: "harvest",
        };
        assert_eq!(error.kind(), ErrorKind::Conflict);
        assert_eq!(
            error.to_string(),
            "Invalid state transition: cannot harvest from Depleted state"
        );
    }

    #[test]
    fn unknown_definition_is_a_validation_error() {
        let error = HarvestError::UnknownDefinition {
            tag: NodeTag::new("iron_vein").unwrap(),
        };
        assert_eq!(error.kind(), ErrorKind::Validation);
    }
}
