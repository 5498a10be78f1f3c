//! Per-transaction record of the aggregates a repository handed out.

use std::sync::{Arc, Mutex, PoisonError};

use indexmap::IndexMap;

use crate::aggregate::{AggregateRoot, EventOutbox};
use crate::event::SharedEvent;

/// Accumulates the outboxes of every aggregate loaded or created during one
/// transaction.
///
/// Entries are keyed by aggregate identity and kept in first-seen order.
/// Loading the same row twice yields two distinct in-memory instances; both
/// are kept, but tracking the same instance again is a no-op. Cloning
/// returns another handle to the same set.
#[derive(Debug, Clone, Default)]
pub struct SeenAggregates {
    seen: Arc<Mutex<IndexMap<String, Vec<EventOutbox>>>>,
}

impl SeenAggregates {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `aggregate` as seen.
    pub fn track<A: AggregateRoot + ?Sized>(&self, aggregate: &A) {
        let outbox = aggregate.outbox();
        let mut seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = seen.entry(aggregate.aggregate_id()).or_default();
        if !entry.iter().any(|known| known.same_as(outbox)) {
            entry.push(outbox.clone());
        }
    }

    /// Number of distinct aggregate identities seen.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if nothing was tracked since the last collection.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pops the pending events of every seen aggregate, in first-seen order,
    /// and clears the set.
    pub fn collect_events(&self) -> Vec<SharedEvent> {
        let drained = std::mem::take(&mut *self.seen.lock().unwrap_or_else(PoisonError::into_inner));
        drained
            .into_values()
            .flatten()
            .flat_map(|outbox| outbox.pop())
            .collect()
    }
}
