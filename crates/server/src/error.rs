//! Server error types.

use dispatch::RegistrationError;
use repository::RepositoryError;
use thiserror::Error;

/// Errors raised while starting or stopping the world.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A handler could not be registered.
    #[error("Handler registration failed: {0}")]
    Registration(#[from] RegistrationError),

    /// Event handlers were still running when the drain timeout elapsed.
    #[error("{in_flight} event publications still in flight after drain timeout")]
    DrainTimedOut { in_flight: usize },

    /// A repository failed to flush at shutdown.
    #[error("Repository flush failed: {0}")]
    Flush(#[from] RepositoryError),
}
