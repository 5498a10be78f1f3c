//! Aggregate root abstraction.

use std::sync::{Arc, Mutex, PoisonError};

use crate::event::{DomainEvent, SharedEvent};

/// Append-only buffer of events an aggregate raised and nobody has read yet.
///
/// Cloning an outbox yields a second handle to the same buffer. Repositories
/// keep such a handle for every aggregate they hand out so the unit of work
/// can harvest events from aggregates the business logic never saved.
#[derive(Debug, Clone, Default)]
pub struct EventOutbox {
    pending: Arc<Mutex<Vec<SharedEvent>>>,
}

impl EventOutbox {
    /// Creates an empty outbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event to the end of the pending sequence.
    pub fn push(&self, event: impl DomainEvent) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(event));
    }

    /// Returns every pending event in insertion order and leaves the outbox
    /// empty.
    pub fn pop(&self) -> Vec<SharedEvent> {
        std::mem::take(&mut *self.pending.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Number of pending events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if no events are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if both handles point at the same buffer.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.pending, &other.pending)
    }
}

/// Trait for aggregate roots that raise domain events.
pub trait AggregateRoot: Send + Sync {
    /// Returns the aggregate identity used to de-duplicate tracked instances.
    fn aggregate_id(&self) -> String;

    /// Returns the aggregate's event outbox.
    fn outbox(&self) -> &EventOutbox;

    /// Records a new event.
    fn push_event(&self, event: impl DomainEvent)
    where
        Self: Sized,
    {
        self.outbox().push(event);
    }

    /// Drains the events raised since the last pop.
    fn pop_events(&self) -> Vec<SharedEvent> {
        self.outbox().pop()
    }
}
