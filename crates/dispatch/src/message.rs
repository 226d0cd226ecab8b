//! Command and query message traits.

use common::Classify;

/// An intent to mutate state.
///
/// A command carries no result beyond success or a typed rejection; facts
/// produced by a successful command travel as domain events.
pub trait Command: Send + 'static {
    /// Error returned when the command is rejected.
    type Error: std::error::Error + Classify + Send + Sync + 'static;
}

/// An intent to read state.
///
/// Expected absence is part of `Output` (typically an `Option`), never an
/// error.
pub trait Query: Send + 'static {
    /// The typed result of the query.
    type Output: Send + 'static;

    /// Error returned when the query cannot be answered.
    type Error: std::error::Error + Classify + Send + Sync + 'static;
}

/// Returns the type name without its module path, for logs and errors.
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    match base.rfind("::") {
        Some(index) => &full[index + 2..],
        None => full,
    }
}
