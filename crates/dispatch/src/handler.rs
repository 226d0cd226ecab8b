//! Handler traits and their type-erased wrappers.

use std::marker::PhantomData;

use async_trait::async_trait;

use crate::error::EventHandlerError;
use crate::event::{DomainEvent, RaisedEvent};
use crate::message::{Command, Query, short_type_name};

/// Successful result of a command: the events it raised, in order.
#[derive(Debug, Default)]
#[must_use]
pub struct Outcome {
    events: Vec<RaisedEvent>,
}

impl Outcome {
    /// An outcome that raised no events.
    pub fn done() -> Self {
        Self::default()
    }

    /// An outcome with already-erased events.
    pub fn with_events(events: Vec<RaisedEvent>) -> Self {
        Self { events }
    }

    /// Appends an event; publication keeps this order.
    pub fn raise<E: DomainEvent>(mut self, event: E) -> Self {
        self.events.push(RaisedEvent::new(event));
        self
    }

    /// Returns the raised events.
    pub fn events(&self) -> &[RaisedEvent] {
        &self.events
    }

    /// Consumes the outcome, returning the raised events.
    pub fn into_events(self) -> Vec<RaisedEvent> {
        self.events
    }
}

/// Handles exactly one command type.
#[async_trait]
pub trait CommandHandler<C: Command>: Send + Sync + 'static {
    /// Executes the command, returning the events to publish on success.
    async fn handle(&self, command: C) -> Result<Outcome, C::Error>;
}

/// Handles exactly one query type.
#[async_trait]
pub trait QueryHandler<Q: Query>: Send + Sync + 'static {
    /// Answers the query.
    async fn handle(&self, query: Q) -> Result<Q::Output, Q::Error>;
}

/// Reacts to one event type. Any number may be registered per type.
#[async_trait]
pub trait EventHandler<E: DomainEvent>: Send + Sync + 'static {
    /// Returns the handler name used in logs.
    fn name(&self) -> &'static str {
        short_type_name::<Self>()
    }

    /// Handles a single event.
    async fn handle(&self, event: &E) -> Result<(), EventHandlerError>;
}

/// Event handler with the event type erased, as stored in the routing table.
#[async_trait]
pub(crate) trait ErasedEventHandler: Send + Sync {
    fn name(&self) -> &'static str;

    async fn handle_raised(&self, event: &RaisedEvent) -> Result<(), EventHandlerError>;
}

pub(crate) struct TypedEventHandler<E, H> {
    handler: H,
    _phantom: PhantomData<fn(&E)>,
}

impl<E: DomainEvent, H: EventHandler<E>> TypedEventHandler<E, H> {
    pub(crate) fn new(handler: H) -> Self {
        Self {
            handler,
            _phantom: PhantomData,
        }
    }
}

#[async_trait]
impl<E: DomainEvent, H: EventHandler<E>> ErasedEventHandler for TypedEventHandler<E, H> {
    fn name(&self) -> &'static str {
        self.handler.name()
    }

    async fn handle_raised(&self, event: &RaisedEvent) -> Result<(), EventHandlerError> {
        match event.downcast_ref::<E>() {
            Some(typed) => self.handler.handle(typed).await,
            None => Err(EventHandlerError::Failed(format!(
                "{} routed to handler for {}",
                event.event_type(),
                short_type_name::<E>()
            ))),
        }
    }
}
