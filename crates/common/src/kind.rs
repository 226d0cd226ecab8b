//! Error taxonomy shared by every layer.

use serde::{Deserialize, Serialize};

/// Coarse classification of a failed request.
///
/// Adapters decide retry behaviour from the kind alone: `Infrastructure` and
/// concurrency `Conflict`s may be retried after a reload, the rest may not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Malformed or out-of-range input, rejected before any mutation.
    Validation,
    /// The referenced aggregate does not exist.
    NotFound,
    /// The current state forbids the request.
    Conflict,
    /// Persistence was unavailable or failed.
    Infrastructure,
}

impl ErrorKind {
    /// Returns the kind name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Infrastructure => "infrastructure",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can be mapped onto an [`ErrorKind`].
pub trait Classify {
    fn kind(&self) -> ErrorKind;
}
