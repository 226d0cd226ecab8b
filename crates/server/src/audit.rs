//! Audit-log notification sink.
//!
//! Every domain event is written as one structured line to the `audit`
//! tracing target.

use async_trait::async_trait;
use dispatch::{DispatcherBuilder, DomainEvent, EventHandler, EventHandlerError};
use domain::harvesting::{
    NodeActivated, NodeDefinitionCreated, NodeDefinitionUpdated, NodeDepleted, NodeDestroyed,
    NodeRegistered, NodesCleared, ResourceHarvested,
};
use domain::ledger::{AccountOpened, GoldDeposited, GoldTransferred, GoldWithdrawn};
use domain::trait_budget::{TraitBudgetGranted, TraitPointsRefunded, TraitPointsSpent};
use serde::Serialize;

/// Writes each event it receives to the audit log.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuditLog;

#[async_trait]
impl<E: DomainEvent + Serialize> EventHandler<E> for AuditLog {
    fn name(&self) -> &'static str {
        "AuditLog"
    }

    async fn handle(&self, event: &E) -> Result<(), EventHandlerError> {
        let payload =
            serde_json::to_string(event).map_err(|e| EventHandlerError::Failed(e.to_string()))?;

        tracing::info!(
            target: "audit",
            event_type = event.event_type(),
            event_id = %event.event_id(),
            occurred_at = %event.occurred_at(),
            %payload,
            "domain event"
        );
        metrics::counter!("audit_events_logged_total").increment(1);
        Ok(())
    }
}

/// Subscribes the audit log to every domain event.
pub fn register(builder: &mut DispatcherBuilder) {
    builder
        // Ledger
        .event::<AccountOpened, _>(AuditLog)
        .event::<GoldDeposited, _>(AuditLog)
        .event::<GoldWithdrawn, _>(AuditLog)
        .event::<GoldTransferred, _>(AuditLog)
        // Harvesting
        .event::<NodeDefinitionCreated, _>(AuditLog)
        .event::<NodeDefinitionUpdated, _>(AuditLog)
        .event::<NodeRegistered, _>(AuditLog)
        .event::<NodeActivated, _>(AuditLog)
        .event::<ResourceHarvested, _>(AuditLog)
        .event::<NodeDepleted, _>(AuditLog)
        .event::<NodeDestroyed, _>(AuditLog)
        .event::<NodesCleared, _>(AuditLog)
        // Trait budgets
        .event::<TraitBudgetGranted, _>(AuditLog)
        .event::<TraitPointsSpent, _>(AuditLog)
        .event::<TraitPointsRefunded, _>(AuditLog);
}

#[cfg(test)]
mod tests {
    use common::{AreaId, NodeInstanceId};
    use dispatch::Dispatcher;

    use super::*;

    #[tokio::test]
    async fn test_audit_log_accepts_events() {
        let event = NodesCleared::new(AreaId::new(), vec![NodeInstanceId::new()]);
        let result = EventHandler::<NodesCleared>::handle(&AuditLog, &event).await;
        assert!(result.is_ok());
    }

    #[test]
    fn test_register_subscribes_every_event() {
        let mut builder = Dispatcher::builder();
        register(&mut builder);
        let dispatcher = builder.build();

        assert_eq!(dispatcher.event_handler_count::<GoldTransferred>(), 1);
        assert_eq!(dispatcher.event_handler_count::<NodeDepleted>(), 1);
        assert_eq!(dispatcher.event_handler_count::<TraitPointsSpent>(), 1);
    }
}
