//! Harvesting queries.

use common::{AreaId, NodeInstanceId};
use dispatch::Query;

use crate::error::DomainError;

use super::{NodeTag, ResourceNode, ResourceNodeDefinition};

/// Query for a placed node.
#[derive(Debug, Clone, Copy)]
pub struct GetNode {
    pub node: NodeInstanceId,
}

impl GetNode {
    pub fn new(node: NodeInstanceId) -> Self {
        Self { node }
    }
}

impl Query for GetNode {
    type Output = Option<ResourceNode>;
    type Error = DomainError;
}

/// Query for every node in an area, ordered by node id.
#[derive(Debug, Clone, Copy)]
pub struct ListAreaNodes {
    pub area: AreaId,
}

impl ListAreaNodes {
    pub fn new(area: AreaId) -> Self {
        Self { area }
    }
}

impl Query for ListAreaNodes {
    type Output = Vec<ResourceNode>;
    type Error = DomainError;
}

/// Query for a node definition by tag.
#[derive(Debug, Clone)]
pub struct GetNodeDefinition {
    pub tag: NodeTag,
}

impl GetNodeDefinition {
    pub fn new(tag: NodeTag) -> Self {
        Self { tag }
    }
}

impl Query for GetNodeDefinition {
    type Output = Option<ResourceNodeDefinition>;
    type Error = DomainError;
}
