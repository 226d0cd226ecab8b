//! Trait budget service.

use async_trait::async_trait;
use common::PersonaId;
use dispatch::{CommandHandler, DispatcherBuilder, Outcome, QueryHandler, RegistrationError};

use crate::error::DomainError;
use crate::executor::{CommandExecutor, CommandResult, SharedRepository};

use super::{
    GetTraitBudget, GrantTraitBudget, RefundTraitPoints, SpendTraitPoints, TraitBudget,
    TraitBudgetEvent,
};

/// Service for managing trait budgets.
#[derive(Clone)]
pub struct TraitBudgetService {
    budgets: CommandExecutor<TraitBudget>,
}

impl TraitBudgetService {
    /// Creates a new trait budget service over the given repository.
    pub fn new(repository: SharedRepository<TraitBudget>) -> Self {
        Self {
            budgets: CommandExecutor::new(repository),
        }
    }

    /// Registers every trait budget command and query handler.
    pub fn register(&self, builder: &mut DispatcherBuilder) -> Result<(), RegistrationError> {
        builder
            .command::<GrantTraitBudget, _>(self.clone())?
            .command::<SpendTraitPoints, _>(self.clone())?
            .command::<RefundTraitPoints, _>(self.clone())?
            .query::<GetTraitBudget, _>(self.clone())?;
        Ok(())
    }

    /// Grants a budget, creating it if needed.
    #[tracing::instrument(skip(self))]
    pub async fn grant(&self, cmd: GrantTraitBudget) -> Result<CommandResult<TraitBudget>, DomainError> {
        self.budgets
            .upsert(&cmd.character, |budget| budget.grant(cmd.character, cmd.total))
            .await
    }

    /// Spends points on a trait.
    #[tracing::instrument(skip(self))]
    pub async fn spend(&self, cmd: SpendTraitPoints) -> Result<CommandResult<TraitBudget>, DomainError> {
        self.budgets
            .execute(&cmd.character, |budget| budget.spend(&cmd.trait_name, cmd.cost))
            .await
    }

    /// Refunds points spent on a trait.
    #[tracing::instrument(skip(self))]
    pub async fn refund(&self, cmd: RefundTraitPoints) -> Result<CommandResult<TraitBudget>, DomainError> {
        self.budgets
            .execute(&cmd.character, |budget| budget.refund(&cmd.trait_name, cmd.points))
            .await
    }

    /// Loads a character's budget.
    pub async fn get(&self, character: PersonaId) -> Result<Option<TraitBudget>, DomainError> {
        self.budgets.load(&character).await
    }
}

fn raised(events: Vec<TraitBudgetEvent>) -> Outcome {
    Outcome::with_events(events.into_iter().map(TraitBudgetEvent::into_raised).collect())
}

#[async_trait]
impl CommandHandler<GrantTraitBudget> for TraitBudgetService {
    async fn handle(&self, command: GrantTraitBudget) -> Result<Outcome, DomainError> {
        Ok(raised(self.grant(command).await?.events))
    }
}

#[async_trait]
impl CommandHandler<SpendTraitPoints> for TraitBudgetService {
    async fn handle(&self, command: SpendTraitPoints) -> Result<Outcome, DomainError> {
        Ok(raised(self.spend(command).await?.events))
    }
}

#[async_trait]
impl CommandHandler<RefundTraitPoints> for TraitBudgetService {
    async fn handle(&self, command: RefundTraitPoints) -> Result<Outcome, DomainError> {
        Ok(raised(self.refund(command).await?.events))
    }
}

#[async_trait]
impl QueryHandler<GetTraitBudget> for TraitBudgetService {
    async fn handle(&self, query: GetTraitBudget) -> Result<Option<TraitBudget>, DomainError> {
        self.get(query.character).await
    }
}
