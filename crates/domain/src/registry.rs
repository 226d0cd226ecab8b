//! Start-up wiring of repositories and services.

use std::sync::Arc;

use dispatch::{DispatcherBuilder, RegistrationError};
use repository::{InMemoryRepository, RepositoryError};

use crate::executor::SharedRepository;
use crate::harvesting::{HarvestingService, ResourceNode, ResourceNodeDefinition, YieldRoller};
use crate::ledger::{LedgerAccount, LedgerService};
use crate::trait_budget::{TraitBudget, TraitBudgetService};

/// One repository per aggregate type, constructed once at start-up.
#[derive(Clone)]
pub struct Repositories {
    pub accounts: SharedRepository<LedgerAccount>,
    pub node_definitions: SharedRepository<ResourceNodeDefinition>,
    pub nodes: SharedRepository<ResourceNode>,
    pub trait_budgets: SharedRepository<TraitBudget>,
}

impl Repositories {
    /// Creates empty in-memory repositories.
    pub fn in_memory() -> Self {
        Self {
            accounts: Arc::new(InMemoryRepository::<LedgerAccount>::new()),
            node_definitions: Arc::new(InMemoryRepository::<ResourceNodeDefinition>::new()),
            nodes: Arc::new(InMemoryRepository::<ResourceNode>::new()),
            trait_budgets: Arc::new(InMemoryRepository::<TraitBudget>::new()),
        }
    }

    /// Flushes every repository. Called once at shutdown.
    pub async fn flush(&self) -> Result<(), RepositoryError> {
        self.accounts.flush().await?;
        self.node_definitions.flush().await?;
        self.nodes.flush().await?;
        self.trait_budgets.flush().await?;
        tracing::info!("repositories flushed");
        Ok(())
    }
}

/// Every domain service, ready to be registered on a dispatcher.
#[derive(Clone)]
pub struct WorldServices {
    pub ledger: LedgerService,
    pub harvesting: HarvestingService,
    pub trait_budgets: TraitBudgetService,
}

impl WorldServices {
    /// Creates the services over the given repositories.
    pub fn new(repositories: &Repositories) -> Self {
        Self {
            ledger: LedgerService::new(Arc::clone(&repositories.accounts)),
            harvesting: HarvestingService::new(
                Arc::clone(&repositories.node_definitions),
                Arc::clone(&repositories.nodes),
            ),
            trait_budgets: TraitBudgetService::new(Arc::clone(&repositories.trait_budgets)),
        }
    }

    /// Creates the services with a specific yield roller.
    pub fn with_roller(repositories: &Repositories, roller: Arc<dyn YieldRoller>) -> Self {
        Self {
            harvesting: HarvestingService::with_roller(
                Arc::clone(&repositories.node_definitions),
                Arc::clone(&repositories.nodes),
                roller,
            ),
            ..Self::new(repositories)
        }
    }

    /// Registers every command and query handler.
    pub fn register(&self, builder: &mut DispatcherBuilder) -> Result<(), RegistrationError> {
        self.ledger.register(builder)?;
        self.harvesting.register(builder)?;
        self.trait_budgets.register(builder)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use dispatch::Dispatcher;

    use super::*;
    use crate::harvesting::HarvestResource;
    use crate::ledger::{GetBalance, Transfer};
    use crate::trait_budget::GetTraitBudget;

    #[test]
    fn test_register_routes_every_feature() {
        let services = WorldServices::new(&Repositories::in_memory());
        let mut builder = Dispatcher::builder();
        services.register(&mut builder).unwrap();
        let dispatcher = builder.build();

        assert!(dispatcher.handles_command::<Transfer>());
        assert!(dispatcher.handles_command::<HarvestResource>());
        assert!(dispatcher.handles_query::<GetBalance>());
        assert!(dispatcher.handles_query::<GetTraitBudget>());
    }

    #[test]
    fn test_registering_twice_fails() {
        let services = WorldServices::new(&Repositories::in_memory());
        let mut builder = Dispatcher::builder();
        services.register(&mut builder).unwrap();
        assert!(services.register(&mut builder).is_err());
    }

    #[tokio::test]
    async fn test_flush() {
        Repositories::in_memory().flush().await.unwrap();
    }
}
