//! Harvesting service: command and query handlers for node definitions and
//! placed nodes.

use std::sync::Arc;

use async_trait::async_trait;
use common::{AreaId, NodeInstanceId};
use dispatch::{CommandHandler, DispatcherBuilder, Outcome, QueryHandler, RegistrationError};
use repository::Versioned;

use crate::error::DomainError;
use crate::executor::{CommandExecutor, CommandResult, Removal, SharedRepository};

use super::{
    ActivateNode, ClearAreaNodes, CreateNodeDefinition, DestroyNode, GetNode, GetNodeDefinition,
    HarvestError, HarvestResource, ListAreaNodes, NodeDefinitionEvent, NodeState, NodeTag,
    NodesCleared, RandomRoller, RegisterNode, ResourceNode, ResourceNodeDefinition,
    ResourceNodeEvent, UpdateNodeDefinition, YieldRoller,
};

/// Service for managing node definitions and placed nodes.
///
/// Cloning is cheap; clones share the repositories, lock tables and roller.
#[derive(Clone)]
pub struct HarvestingService {
    definitions: CommandExecutor<ResourceNodeDefinition>,
    nodes: CommandExecutor<ResourceNode>,
    roller: Arc<dyn YieldRoller>,
}

impl HarvestingService {
    /// Creates a new harvesting service that rolls yields randomly.
    pub fn new(
        definitions: SharedRepository<ResourceNodeDefinition>,
        nodes: SharedRepository<ResourceNode>,
    ) -> Self {
        Self::with_roller(definitions, nodes, Arc::new(RandomRoller))
    }

    /// Creates a new harvesting service with the given yield roller.
    pub fn with_roller(
        definitions: SharedRepository<ResourceNodeDefinition>,
        nodes: SharedRepository<ResourceNode>,
        roller: Arc<dyn YieldRoller>,
    ) -> Self {
        Self {
            definitions: CommandExecutor::new(definitions),
            nodes: CommandExecutor::new(nodes),
            roller,
        }
    }

    /// Registers every harvesting command and query handler.
    pub fn register(&self, builder: &mut DispatcherBuilder) -> Result<(), RegistrationError> {
        builder
            .command::<CreateNodeDefinition, _>(self.clone())?
            .command::<UpdateNodeDefinition, _>(self.clone())?
            .command::<RegisterNode, _>(self.clone())?
            .command::<ActivateNode, _>(self.clone())?
            .command::<HarvestResource, _>(self.clone())?
            .command::<DestroyNode, _>(self.clone())?
            .command::<ClearAreaNodes, _>(self.clone())?
            .query::<GetNode, _>(self.clone())?
            .query::<ListAreaNodes, _>(self.clone())?
            .query::<GetNodeDefinition, _>(self.clone())?;
        Ok(())
    }

    /// Creates a node definition.
    #[tracing::instrument(skip(self, cmd), fields(tag = %cmd.tag))]
    pub async fn create_definition(
        &self,
        cmd: CreateNodeDefinition,
    ) -> Result<CommandResult<ResourceNodeDefinition>, DomainError> {
        let CreateNodeDefinition { tag, details } = cmd;

        self.definitions
            .upsert(&tag, |definition| definition.create(tag.clone(), details))
            .await
    }

    /// Replaces the details of a node definition.
    #[tracing::instrument(skip(self, cmd), fields(tag = %cmd.tag))]
    pub async fn update_definition(
        &self,
        cmd: UpdateNodeDefinition,
    ) -> Result<CommandResult<ResourceNodeDefinition>, DomainError> {
        let UpdateNodeDefinition { tag, details } = cmd;

        self.definitions
            .execute(&tag, |definition| definition.update(details))
            .await
    }

    /// Places a node in an area.
    ///
    /// The definition must exist; an unknown tag is rejected before the
    /// node is touched.
    #[tracing::instrument(skip(self))]
    pub async fn register_node(
        &self,
        cmd: RegisterNode,
    ) -> Result<CommandResult<ResourceNode>, DomainError> {
        let definition = self.require_definition(&cmd.definition).await?;

        self.nodes
            .upsert(&cmd.node, |node| {
                node.register(
                    cmd.node,
                    &definition,
                    cmd.area,
                    cmd.location,
                    cmd.uses,
                    cmd.quality,
                    cmd.activation,
                )
            })
            .await
    }

    /// Makes a deferred node harvestable.
    #[tracing::instrument(skip(self))]
    pub async fn activate_node(
        &self,
        cmd: ActivateNode,
    ) -> Result<CommandResult<ResourceNode>, DomainError> {
        self.nodes.execute(&cmd.node, |node| node.activate()).await
    }

    /// Harvests a node once.
    #[tracing::instrument(skip(self, cmd), fields(node = %cmd.node, harvester = %cmd.harvester))]
    pub async fn harvest(
        &self,
        cmd: HarvestResource,
    ) -> Result<CommandResult<ResourceNode>, DomainError> {
        let HarvestResource {
            harvester,
            node,
            effects,
        } = cmd;

        // A node's definition never changes, so it can be resolved before
        // taking the node's lock.
        let tag = self
            .nodes
            .load_existing(&node)
            .await?
            .definition()
            .cloned()
            .ok_or(HarvestError::NodeNotRegistered)?;
        let definition = self.require_definition(&tag).await?;

        let result = self
            .nodes
            .execute(&node, |current| {
                current.harvest(harvester, &definition, &effects, self.roller.as_ref())
            })
            .await?;

        metrics::counter!("harvest_resources_total").increment(1);
        if result.aggregate.state() == NodeState::Depleted {
            metrics::counter!("harvest_nodes_depleted_total").increment(1);
            tracing::debug!(%node, "node depleted");
        }
        Ok(result)
    }

    /// Destroys a node. Returns `None` if it was already gone.
    #[tracing::instrument(skip(self))]
    pub async fn destroy_node(
        &self,
        cmd: DestroyNode,
    ) -> Result<Option<Removal<ResourceNode>>, DomainError> {
        self.nodes.remove(&cmd.node, |node| node.destroy()).await
    }

    /// Destroys every node in an area.
    ///
    /// The nodes are removed together: if the delete fails, every node stays
    /// in place. Returns the `NodesCleared` event, or `None` if the area had
    /// no nodes.
    #[tracing::instrument(skip(self))]
    pub async fn clear_area(&self, cmd: ClearAreaNodes) -> Result<Option<NodesCleared>, DomainError> {
        let area = cmd.area;
        let ids: Vec<NodeInstanceId> = self
            .list_area_nodes(area)
            .await?
            .iter()
            .filter_map(|node| node.id())
            .collect();

        let removed = self.nodes.remove_all(&ids, |node| node.destroy()).await?;
        let cleared: Vec<NodeInstanceId> = removed
            .iter()
            .filter_map(|removal| removal.aggregate.id())
            .collect();

        if cleared.is_empty() {
            return Ok(None);
        }
        tracing::info!(%area, nodes = cleared.len(), "area nodes cleared");
        Ok(Some(NodesCleared::new(area, cleared)))
    }

    /// Loads a node.
    pub async fn get_node(&self, node: NodeInstanceId) -> Result<Option<ResourceNode>, DomainError> {
        self.nodes.load(&node).await
    }

    /// Returns every node in an area, ordered by node id.
    pub async fn list_area_nodes(&self, area: AreaId) -> Result<Vec<ResourceNode>, DomainError> {
        self.nodes.find_where(&move |node: &ResourceNode| node.is_in(area)).await
    }

    /// Loads a node definition.
    pub async fn get_definition(
        &self,
        tag: &NodeTag,
    ) -> Result<Option<ResourceNodeDefinition>, DomainError> {
        self.definitions.load(tag).await
    }

    async fn require_definition(&self, tag: &NodeTag) -> Result<ResourceNodeDefinition, DomainError> {
        self.get_definition(tag)
            .await?
            .ok_or_else(|| HarvestError::UnknownDefinition { tag: tag.clone() }.into())
    }
}

fn node_outcome(events: Vec<ResourceNodeEvent>) -> Outcome {
    Outcome::with_events(events.into_iter().map(ResourceNodeEvent::into_raised).collect())
}

fn definition_outcome(events: Vec<NodeDefinitionEvent>) -> Outcome {
    Outcome::with_events(events.into_iter().map(NodeDefinitionEvent::into_raised).collect())
}

#[async_trait]
impl CommandHandler<CreateNodeDefinition> for HarvestingService {
    async fn handle(&self, command: CreateNodeDefinition) -> Result<Outcome, DomainError> {
        Ok(definition_outcome(self.create_definition(command).await?.events))
    }
}

#[async_trait]
impl CommandHandler<UpdateNodeDefinition> for HarvestingService {
    async fn handle(&self, command: UpdateNodeDefinition) -> Result<Outcome, DomainError> {
        Ok(definition_outcome(self.update_definition(command).await?.events))
    }
}

#[async_trait]
impl CommandHandler<RegisterNode> for HarvestingService {
    async fn handle(&self, command: RegisterNode) -> Result<Outcome, DomainError> {
        Ok(node_outcome(self.register_node(command).await?.events))
    }
}

#[async_trait]
impl CommandHandler<ActivateNode> for HarvestingService {
    async fn handle(&self, command: ActivateNode) -> Result<Outcome, DomainError> {
        Ok(node_outcome(self.activate_node(command).await?.events))
    }
}

#[async_trait]
impl CommandHandler<HarvestResource> for HarvestingService {
    async fn handle(&self, command: HarvestResource) -> Result<Outcome, DomainError> {
        Ok(node_outcome(self.harvest(command).await?.events))
    }
}

#[async_trait]
impl CommandHandler<DestroyNode> for HarvestingService {
    async fn handle(&self, command: DestroyNode) -> Result<Outcome, DomainError> {
        match self.destroy_node(command).await? {
            Some(result) => Ok(node_outcome(result.events)),
            None => Ok(Outcome::done()),
        }
    }
}

#[async_trait]
impl CommandHandler<ClearAreaNodes> for HarvestingService {
    async fn handle(&self, command: ClearAreaNodes) -> Result<Outcome, DomainError> {
        match self.clear_area(command).await? {
            Some(cleared) => Ok(Outcome::done().raise(cleared)),
            None => Ok(Outcome::done()),
        }
    }
}

#[async_trait]
impl QueryHandler<GetNode> for HarvestingService {
    async fn handle(&self, query: GetNode) -> Result<Option<ResourceNode>, DomainError> {
        self.get_node(query.node).await
    }
}

#[async_trait]
impl QueryHandler<ListAreaNodes> for HarvestingService {
    async fn handle(&self, query: ListAreaNodes) -> Result<Vec<ResourceNode>, DomainError> {
        self.list_area_nodes(query.area).await
    }
}

#[async_trait]
impl QueryHandler<GetNodeDefinition> for HarvestingService {
    async fn handle(
        &self,
        query: GetNodeDefinition,
    ) -> Result<Option<ResourceNodeDefinition>, DomainError> {
        self.get_definition(&query.tag).await
    }
}
