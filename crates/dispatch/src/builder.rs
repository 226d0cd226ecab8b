//! Start-up registration of handlers.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use crate::dispatcher::{Dispatcher, Route, RoutingTable};
use crate::error::RegistrationError;
use crate::event::DomainEvent;
use crate::handler::{CommandHandler, ErasedEventHandler, EventHandler, QueryHandler, TypedEventHandler};
use crate::message::{Command, Query, short_type_name};

/// Collects handler registrations and freezes them into a [`Dispatcher`].
///
/// Command and query types accept exactly one handler; a second
/// registration fails immediately. Event types accept any number.
#[derive(Default)]
pub struct DispatcherBuilder {
    commands: HashMap<TypeId, Route>,
    queries: HashMap<TypeId, Route>,
    events: HashMap<TypeId, Vec<Arc<dyn ErasedEventHandler>>>,
}

impl DispatcherBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the handler for command type `C`.
    pub fn command<C, H>(&mut self, handler: H) -> Result<&mut Self, RegistrationError>
    where
        C: Command,
        H: CommandHandler<C>,
    {
        let command = short_type_name::<C>();
        let handler: Arc<dyn CommandHandler<C>> = Arc::new(handler);

        match self.commands.entry(TypeId::of::<C>()) {
            Entry::Occupied(_) => Err(RegistrationError::DuplicateCommandHandler { command }),
            Entry::Vacant(slot) => {
                slot.insert(Route::new(command, handler));
                tracing::debug!(command, "registered command handler");
                Ok(self)
            }
        }
    }

    /// Registers the handler for query type `Q`.
    pub fn query<Q, H>(&mut self, handler: H) -> Result<&mut Self, RegistrationError>
    where
        Q: Query,
        H: QueryHandler<Q>,
    {
        let query = short_type_name::<Q>();
        let handler: Arc<dyn QueryHandler<Q>> = Arc::new(handler);

        match self.queries.entry(TypeId::of::<Q>()) {
            Entry::Occupied(_) => Err(RegistrationError::DuplicateQueryHandler { query }),
            Entry::Vacant(slot) => {
                slot.insert(Route::new(query, handler));
                tracing::debug!(query, "registered query handler");
                Ok(self)
            }
        }
    }

    /// Adds a handler for event type `E`.
    pub fn event<E, H>(&mut self, handler: H) -> &mut Self
    where
        E: DomainEvent,
        H: EventHandler<E>,
    {
        let handler: Arc<dyn ErasedEventHandler> = Arc::new(TypedEventHandler::new(handler));
        tracing::debug!(
            event = short_type_name::<E>(),
            handler = handler.name(),
            "registered event handler"
        );
        self.events
            .entry(TypeId::of::<E>())
            .or_default()
            .push(handler);
        self
    }

    /// Freezes the registrations into an immutable dispatcher.
    pub fn build(self) -> Dispatcher {
        tracing::info!(
            commands = self.commands.len(),
            queries = self.queries.len(),
            event_types = self.events.len(),
            "dispatcher routing table built"
        );
        Dispatcher::new(RoutingTable {
            commands: self.commands,
            queries: self.queries,
            events: self.events,
        })
    }
}

impl Route {
    fn new<T: Any + Send + Sync>(message: &'static str, handler: T) -> Self {
        Self {
            message,
            handler: Box::new(handler),
        }
    }
}
