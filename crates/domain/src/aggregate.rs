//! Core aggregate trait.

use repository::Versioned;

/// Trait for aggregates.
///
/// An aggregate is a consistency boundary: its invariants are enforced by
/// its own command methods only. Command methods validate against the
/// current state and return events; [`apply`](Aggregate::apply) folds an
/// event into the state.
///
/// State lives in the repository. Events are applied in memory once and
/// then published as notifications; they are not replayed.
pub trait Aggregate: Versioned + Default {
    /// The type of events this aggregate produces and consumes.
    type Event: Clone + Send + Sync;

    /// The type of errors this aggregate's command methods can produce.
    type Error: std::error::Error + Send + Sync;

    /// Applies an event to the aggregate, updating its state.
    ///
    /// This method must be pure and deterministic and must not fail: the
    /// command method that produced the event already validated it.
    fn apply(&mut self, event: Self::Event);

    /// Applies multiple events in sequence.
    fn apply_events(&mut self, events: impl IntoIterator<Item = Self::Event>) {
        for event in events {
            self.apply(event);
        }
    }
}
