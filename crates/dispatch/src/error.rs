//! Dispatch error types.

use common::{Classify, ErrorKind};
use thiserror::Error;

/// Errors returned by [`Dispatcher::dispatch`](crate::Dispatcher::dispatch)
/// and [`Dispatcher::query`](crate::Dispatcher::query).
#[derive(Debug, Error)]
pub enum DispatchError<E> {
    /// The handler rejected the message with a typed error.
    #[error(transparent)]
    Rejected(E),

    /// No handler is registered for the message type.
    #[error("No handler registered for {message}")]
    Unrouted { message: &'static str },

    /// The handler panicked. The request failed; the fabric is unaffected.
    #[error("Handler for {message} panicked")]
    Panicked { message: &'static str },
}

impl<E> DispatchError<E> {
    /// Returns the typed rejection, if that is what this is.
    pub fn rejection(&self) -> Option<&E> {
        match self {
            DispatchError::Rejected(error) => Some(error),
            _ => None,
        }
    }

    /// Consumes the error, returning the typed rejection if present.
    pub fn into_rejection(self) -> Option<E> {
        match self {
            DispatchError::Rejected(error) => Some(error),
            _ => None,
        }
    }
}

impl<E: Classify> Classify for DispatchError<E> {
    fn kind(&self) -> ErrorKind {
        match self {
            DispatchError::Rejected(error) => error.kind(),
            DispatchError::Unrouted { .. } | DispatchError::Panicked { .. } => {
                ErrorKind::Infrastructure
            }
        }
    }
}

/// Errors raised while building the routing table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// A command type already has a handler.
    #[error("Command {command} already has a handler")]
    DuplicateCommandHandler { command: &'static str },

    /// A query type already has a handler.
    #[error("Query {query} already has a handler")]
    DuplicateQueryHandler { query: &'static str },
}

/// Error returned by an event handler.
///
/// Logged by the fabric; never propagated to the command that raised the event.
#[derive(Debug, Error)]
pub enum EventHandlerError {
    /// The handler could not process the event.
    #[error("Event handler failed: {0}")]
    Failed(String),

    /// A downstream sink (broadcast, webhook, audit store) was unavailable.
    #[error("Event sink unavailable: {0}")]
    SinkUnavailable(String),
}
