//! Domain event abstractions.

use std::any::Any;
use std::sync::Arc;

use chrono::{DateTime, Utc};

/// Trait that all domain events implement.
///
/// Events are immutable facts. Once pushed onto an aggregate they are only
/// ever read, shared between the aggregate's outbox and the message bus.
pub trait DomainEvent: Send + Sync + std::fmt::Debug + 'static {
    /// Returns the event type name used for handler routing.
    fn event_type(&self) -> &'static str;

    /// Returns the moment the event was raised.
    fn published_at(&self) -> DateTime<Utc>;

    /// Serializes the event payload to JSON (used for logging).
    fn to_payload(&self) -> serde_json::Value;

    /// Returns `self` as `Any` so handlers can recover the concrete type.
    fn as_any(&self) -> &dyn Any;
}

impl dyn DomainEvent {
    /// Downcasts the event to a concrete event type.
    #[must_use]
    pub fn downcast_ref<T: DomainEvent>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// A domain event shared between the producing aggregate and its consumers.
pub type SharedEvent = Arc<dyn DomainEvent>;
