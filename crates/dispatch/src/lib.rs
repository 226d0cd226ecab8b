//! In-process dispatch fabric.
//!
//! Every feature plugs into the same three message kinds:
//! - [`Command`]: intent to mutate, routed to exactly one [`CommandHandler`]
//! - [`Query`]: intent to read, routed to exactly one [`QueryHandler`]
//! - [`DomainEvent`]: a fact that already happened, delivered to every
//!   registered [`EventHandler`]
//!
//! Routes are registered on a [`DispatcherBuilder`] at start-up and frozen
//! into an immutable [`Dispatcher`].

pub mod builder;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod handler;
pub mod message;

mod publication;

pub use builder::DispatcherBuilder;
pub use dispatcher::Dispatcher;
pub use error::{DispatchError, EventHandlerError, RegistrationError};
pub use event::{DomainEvent, EventId, EventMetadata, RaisedEvent};
pub use handler::{CommandHandler, EventHandler, Outcome, QueryHandler};
pub use message::{Command, Query, short_type_name};
