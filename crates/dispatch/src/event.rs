//! Domain events and their type-erased form.

use std::any::{Any, TypeId};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::message::short_type_name;

/// Unique identifier for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates a new random event ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity and timestamp carried by every event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Unique identifier for this occurrence.
    pub event_id: EventId,

    /// When the fact occurred.
    pub occurred_at: DateTime<Utc>,
}

impl EventMetadata {
    /// Creates metadata for an event occurring now.
    pub fn now() -> Self {
        Self {
            event_id: EventId::new(),
            occurred_at: Utc::now(),
        }
    }
}

impl Default for EventMetadata {
    fn default() -> Self {
        Self::now()
    }
}

/// Trait for domain events.
///
/// Domain events represent facts that have happened. They are immutable,
/// named in past tense, and never dispatched as commands.
pub trait DomainEvent: std::fmt::Debug + Send + Sync + 'static {
    /// Returns the identity and timestamp of the event.
    fn metadata(&self) -> &EventMetadata;

    /// Returns the event type name.
    fn event_type(&self) -> &'static str {
        short_type_name::<Self>()
    }

    /// Returns the unique event id.
    fn event_id(&self) -> EventId {
        self.metadata().event_id
    }

    /// Returns when the event occurred.
    fn occurred_at(&self) -> DateTime<Utc> {
        self.metadata().occurred_at
    }
}

/// A domain event with its static type erased, ready for publication.
///
/// Cloning is cheap; all clones share the same payload.
#[derive(Clone)]
pub struct RaisedEvent {
    type_id: TypeId,
    event_type: &'static str,
    event_id: EventId,
    payload: Arc<dyn Any + Send + Sync>,
}

impl RaisedEvent {
    /// Erases a typed event.
    pub fn new<E: DomainEvent>(event: E) -> Self {
        Self {
            type_id: TypeId::of::<E>(),
            event_type: event.event_type(),
            event_id: event.event_id(),
            payload: Arc::new(event),
        }
    }

    /// Returns the routing key of the event.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the event type name.
    pub fn event_type(&self) -> &'static str {
        self.event_type
    }

    /// Returns the unique event id.
    pub fn event_id(&self) -> EventId {
        self.event_id
    }

    /// Returns the typed event if it is an `E`.
    pub fn downcast_ref<E: DomainEvent>(&self) -> Option<&E> {
        self.payload.downcast_ref::<E>()
    }

    /// Returns true if the event is an `E`.
    pub fn is<E: DomainEvent>(&self) -> bool {
        self.type_id == TypeId::of::<E>()
    }
}

impl std::fmt::Debug for RaisedEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RaisedEvent")
            .field("event_type", &self.event_type)
            .field("event_id", &self.event_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct SomethingHappened {
        meta: EventMetadata,
        value: u32,
    }

    impl DomainEvent for SomethingHappened {
        fn metadata(&self) -> &EventMetadata {
            &self.meta
        }
    }

    #[derive(Debug)]
    struct SomethingElse {
        meta: EventMetadata,
    }

    impl DomainEvent for SomethingElse {
        fn metadata(&self) -> &EventMetadata {
            &self.meta
        }

        fn event_type(&self) -> &'static str {
            "Else"
        }
    }

    #[test]
    fn default_event_type_is_short_type_name() {
        let event = SomethingHappened {
            meta: EventMetadata::now(),
            value: 1,
        };
        assert_eq!(event.event_type(), "SomethingHappened");
    }

    #[test]
    fn raised_event_downcasts_to_original_type() {
        let meta = EventMetadata::now();
        let raised = RaisedEvent::new(SomethingHappened { meta, value: 42 });

        assert!(raised.is::<SomethingHappened>());
        assert!(!raised.is::<SomethingElse>());
        assert_eq!(raised.event_id(), meta.event_id);
        assert_eq!(raised.downcast_ref::<SomethingHappened>().unwrap().value, 42);
        assert!(raised.downcast_ref::<SomethingElse>().is_none());
    }

    #[test]
    fn overridden_event_type_is_kept() {
        let raised = RaisedEvent::new(SomethingElse {
            meta: EventMetadata::now(),
        });
        assert_eq!(raised.event_type(), "Else");
    }
}
