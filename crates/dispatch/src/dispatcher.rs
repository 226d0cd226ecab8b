//! The immutable dispatcher.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use common::Classify;
use futures_util::FutureExt;

use crate::builder::DispatcherBuilder;
use crate::error::DispatchError;
use crate::event::{DomainEvent, RaisedEvent};
use crate::handler::{CommandHandler, ErasedEventHandler, QueryHandler};
use crate::message::{Command, Query, short_type_name};
use crate::publication::{self, Delivery, PublicationTracker};

/// A registered command or query handler, type-erased.
///
/// `handler` holds an `Arc<dyn CommandHandler<C>>` or `Arc<dyn QueryHandler<Q>>`
/// for the message type the route is keyed by.
pub(crate) struct Route {
    pub(crate) message: &'static str,
    pub(crate) handler: Box<dyn Any + Send + Sync>,
}

pub(crate) struct RoutingTable {
    pub(crate) commands: HashMap<TypeId, Route>,
    pub(crate) queries: HashMap<TypeId, Route>,
    pub(crate) events: HashMap<TypeId, Vec<Arc<dyn ErasedEventHandler>>>,
}

/// Routes commands and queries to their handler and publishes events.
///
/// The routing table is frozen at construction, so the dispatcher is cheap
/// to clone and safe to share between concurrent requests without locking.
/// Publishing requires a running Tokio runtime.
#[derive(Clone)]
pub struct Dispatcher {
    table: Arc<RoutingTable>,
    publications: Arc<PublicationTracker>,
}

impl Dispatcher {
    pub(crate) fn new(table: RoutingTable) -> Self {
        Self {
            table: Arc::new(table),
            publications: Arc::new(PublicationTracker::default()),
        }
    }

    /// Starts a new registration.
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    /// Dispatches a command to its handler.
    ///
    /// On success the raised events are handed to the publisher and this
    /// returns without waiting for their handlers.
    #[tracing::instrument(skip_all, fields(message = short_type_name::<C>()))]
    pub async fn dispatch<C: Command>(&self, command: C) -> Result<(), DispatchError<C::Error>> {
        let message = short_type_name::<C>();
        let Some(handler) = self.command_handler::<C>() else {
            metrics::counter!("dispatch_commands_total", "outcome" => "unrouted").increment(1);
            tracing::error!(message, "no handler registered");
            return Err(DispatchError::Unrouted { message });
        };

        match AssertUnwindSafe(handler.handle(command)).catch_unwind().await {
            Ok(Ok(outcome)) => {
                metrics::counter!("dispatch_commands_total", "outcome" => "ok").increment(1);
                self.publish_raised(outcome.into_events());
                Ok(())
            }
            Ok(Err(error)) => {
                let kind = error.kind();
                metrics::counter!("dispatch_commands_total", "outcome" => kind.as_str())
                    .increment(1);
                tracing::warn!(%kind, %error, "command rejected");
                Err(DispatchError::Rejected(error))
            }
            Err(_) => {
                metrics::counter!("dispatch_commands_total", "outcome" => "panicked").increment(1);
                tracing::error!(message, "command handler panicked");
                Err(DispatchError::Panicked { message })
            }
        }
    }

    /// Dispatches a query to its handler and returns the typed result.
    #[tracing::instrument(skip_all, fields(message = short_type_name::<Q>()))]
    pub async fn query<Q: Query>(&self, query: Q) -> Result<Q::Output, DispatchError<Q::Error>> {
        let message = short_type_name::<Q>();
        let Some(handler) = self.query_handler::<Q>() else {
            tracing::error!(message, "no handler registered");
            return Err(DispatchError::Unrouted { message });
        };

        metrics::counter!("dispatch_queries_total").increment(1);
        match AssertUnwindSafe(handler.handle(query)).catch_unwind().await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(error)) => {
                tracing::warn!(kind = %error.kind(), %error, "query failed");
                Err(DispatchError::Rejected(error))
            }
            Err(_) => {
                tracing::error!(message, "query handler panicked");
                Err(DispatchError::Panicked { message })
            }
        }
    }

    /// Publishes an event to every handler registered for its type.
    ///
    /// Fire-and-forget: delivery happens on a spawned task. Called outside a
    /// Tokio runtime, the event is logged and dropped.
    pub fn publish<E: DomainEvent>(&self, event: E) {
        self.publish_raised(vec![RaisedEvent::new(event)]);
    }

    /// Publishes already-erased events, preserving their order.
    pub fn publish_raised(&self, events: Vec<RaisedEvent>) {
        let batch: Vec<Delivery> = events
            .into_iter()
            .filter_map(|event| match self.table.events.get(&event.type_id()) {
                Some(handlers) if !handlers.is_empty() => Some((event, handlers.clone())),
                _ => {
                    tracing::debug!(
                        event_type = event.event_type(),
                        "no handlers registered for event"
                    );
                    None
                }
            })
            .collect();

        if batch.is_empty() {
            return;
        }

        // Handlers run on the runtime; without one there is nowhere to deliver
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            metrics::counter!("dispatch_events_dropped_total").increment(batch.len() as u64);
            tracing::error!(events = batch.len(), "no async runtime, events dropped");
            return;
        };

        let guard = self.publications.begin();
        runtime.spawn(async move {
            publication::deliver(batch).await;
            drop(guard);
        });
    }

    /// Waits until every publication started so far has been delivered.
    pub async fn drain(&self) {
        self.publications.wait_idle().await;
    }

    /// Returns the number of publications still being delivered.
    pub fn in_flight_publications(&self) -> usize {
        self.publications.in_flight()
    }

    /// Returns true if command type `C` has a handler.
    pub fn handles_command<C: Command>(&self) -> bool {
        self.table.commands.contains_key(&TypeId::of::<C>())
    }

    /// Returns true if query type `Q` has a handler.
    pub fn handles_query<Q: Query>(&self) -> bool {
        self.table.queries.contains_key(&TypeId::of::<Q>())
    }

    /// Returns the number of handlers registered for event type `E`.
    pub fn event_handler_count<E: DomainEvent>(&self) -> usize {
        self.table
            .events
            .get(&TypeId::of::<E>())
            .map(Vec::len)
            .unwrap_or(0)
    }

    fn command_handler<C: Command>(&self) -> Option<Arc<dyn CommandHandler<C>>> {
        let route = self.table.commands.get(&TypeId::of::<C>())?;
        let handler = route.handler.downcast_ref::<Arc<dyn CommandHandler<C>>>();
        if handler.is_none() {
            tracing::error!(message = route.message, "command route holds a mismatched handler");
        }
        handler.cloned()
    }

    fn query_handler<Q: Query>(&self) -> Option<Arc<dyn QueryHandler<Q>>> {
        let route = self.table.queries.get(&TypeId::of::<Q>())?;
        let handler = route.handler.downcast_ref::<Arc<dyn QueryHandler<Q>>>();
        if handler.is_none() {
            tracing::error!(message = route.message, "query route holds a mismatched handler");
        }
        handler.cloned()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("commands", &self.table.commands.len())
            .field("queries", &self.table.queries.len())
            .field("event_types", &self.table.events.len())
            .field("in_flight_publications", &self.publications.in_flight())
            .finish()
    }
}
