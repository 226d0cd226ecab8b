//! Harvesting domain events.

use common::{AreaId, NodeInstanceId, PersonaId};
use dispatch::{DomainEvent, EventMetadata, RaisedEvent};
use serde::{Deserialize, Serialize};

use super::{HarvestedItem, Location, NodeDefinitionDetails, NodeQuality, NodeState, NodeTag};

/// Events that can occur on a placed resource node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ResourceNodeEvent {
    NodeRegistered(NodeRegistered),
    NodeActivated(NodeActivated),
    ResourceHarvested(ResourceHarvested),
    NodeDepleted(NodeDepleted),
    NodeDestroyed(NodeDestroyed),
}

impl ResourceNodeEvent {
    /// Erases the event for publication.
    pub fn into_raised(self) -> RaisedEvent {
        match self {
            ResourceNodeEvent::NodeRegistered(event) => RaisedEvent::new(event),
            ResourceNodeEvent::NodeActivated(event) => RaisedEvent::new(event),
            ResourceNodeEvent::ResourceHarvested(event) => RaisedEvent::new(event),
            ResourceNodeEvent::NodeDepleted(event) => RaisedEvent::new(event),
            ResourceNodeEvent::NodeDestroyed(event) => RaisedEvent::new(event),
        }
    }
}

/// A node was placed in an area.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRegistered {
    pub meta: EventMetadata,
    pub node: NodeInstanceId,
    pub definition: NodeTag,
    pub area: AreaId,
    pub location: Location,
    pub uses: u32,
    pub quality: NodeQuality,
    /// `Active` unless activation was deferred.
    pub state: NodeState,
}

/// A deferred node became harvestable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeActivated {
    pub meta: EventMetadata,
    pub node: NodeInstanceId,
}

/// A harvester took one use of a node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceHarvested {
    pub meta: EventMetadata,
    pub node: NodeInstanceId,
    pub harvester: PersonaId,
    pub items: Vec<HarvestedItem>,
    pub remaining_uses: u32,
}

/// A node's last use was taken.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDepleted {
    pub meta: EventMetadata,
    pub node: NodeInstanceId,
}

/// A node was removed from the world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDestroyed {
    pub meta: EventMetadata,
    pub node: NodeInstanceId,
    pub area: Option<AreaId>,
}

/// Every node in an area was removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodesCleared {
    pub meta: EventMetadata,
    pub area: AreaId,
    pub nodes: Vec<NodeInstanceId>,
}

impl NodesCleared {
    pub fn new(area: AreaId, nodes: Vec<NodeInstanceId>) -> Self {
        Self {
            meta: EventMetadata::now(),
            area,
            nodes,
        }
    }
}

/// Events that can occur on a node definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum NodeDefinitionEvent {
    Created(NodeDefinitionCreated),
    Updated(NodeDefinitionUpdated),
}

impl NodeDefinitionEvent {
    /// Erases the event for publication.
    pub fn into_raised(self) -> RaisedEvent {
        match self {
            NodeDefinitionEvent::Created(event) => RaisedEvent::new(event),
            NodeDefinitionEvent::Updated(event) => RaisedEvent::new(event),
        }
    }

    pub(crate) fn created(tag: NodeTag, details: NodeDefinitionDetails) -> Self {
        NodeDefinitionEvent::Created(NodeDefinitionCreated {
            meta: EventMetadata::now(),
            tag,
            details,
        })
    }

    pub(crate) fn updated(tag: NodeTag, details: NodeDefinitionDetails) -> Self {
        NodeDefinitionEvent::Updated(NodeDefinitionUpdated {
            meta: EventMetadata::now(),
            tag,
            details,
        })
    }
}

/// A node definition was created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDefinitionCreated {
    pub meta: EventMetadata,
    pub tag: NodeTag,
    pub details: NodeDefinitionDetails,
}

/// A node definition's details were replaced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDefinitionUpdated {
    pub meta: EventMetadata,
    pub tag: NodeTag,
    pub details: NodeDefinitionDetails,
}

macro_rules! domain_events {
    ($($event:ty),* $(,)?) => {
        $(
            impl DomainEvent for $event {
                fn metadata(&self) -> &EventMetadata {
                    &self.meta
                }
            }
        )*
    };
}

domain_events!(
    NodeRegistered,
    NodeActivated,
    ResourceHarvested,
    NodeDepleted,
    NodeDestroyed,
    NodesCleared,
    NodeDefinitionCreated,
    NodeDefinitionUpdated,
);

// Convenience constructors for events
impl ResourceNodeEvent {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn node_registered(
        node: NodeInstanceId,
        definition: NodeTag,
        area: AreaId,
        location: Location,
        uses: u32,
        quality: NodeQuality,
        state: NodeState,
    ) -> Self {
        ResourceNodeEvent::NodeRegistered(NodeRegistered {
            meta: EventMetadata::now(),
            node,
            definition,
            area,
            location,
            uses,
            quality,
            state,
        })
    }

    pub(crate) fn node_activated(node: NodeInstanceId) -> Self {
        ResourceNodeEvent::NodeActivated(NodeActivated {
            meta: EventMetadata::now(),
            node,
        })
    }

    pub(crate) fn resource_harvested(
        node: NodeInstanceId,
        harvester: PersonaId,
        items: Vec<HarvestedItem>,
        remaining_uses: u32,
    ) -> Self {
        ResourceNodeEvent::ResourceHarvested(ResourceHarvested {
            meta: EventMetadata::now(),
            node,
            harvester,
            items,
            remaining_uses,
        })
    }

    pub(crate) fn node_depleted(node: NodeInstanceId) -> Self {
        ResourceNodeEvent::NodeDepleted(NodeDepleted {
            meta: EventMetadata::now(),
            node,
        })
    }

    pub(crate) fn node_destroyed(node: NodeInstanceId, area: Option<AreaId>) -> Self {
        ResourceNodeEvent::NodeDestroyed(NodeDestroyed {
            meta: EventMetadata::now(),
            node,
            area,
        })
    }
}
