//! Storage transaction primitive.
//!
//! Adapters expose a root handle implementing [`Database`] whose `begin`
//! opens a physical transaction and returns its owning handle. Every
//! transaction handle is itself a [`Database`] whose `begin` returns a
//! non-owning view of the same transaction, so a unit of work nested inside
//! another shares the outer transaction instead of opening a second one.
//!
//! Only the owning handle ends the transaction. On a view, `commit` checks
//! that the transaction is still open and `rollback` does nothing; events
//! raised through a view wait in [`DeferredEvents`] until the owner commits.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use crate::error::StorageError;
use crate::event::SharedEvent;

/// Events handed over by nested units of work, shared by every handle on one
/// physical transaction.
#[derive(Debug, Clone, Default)]
pub struct DeferredEvents(Arc<Mutex<Vec<SharedEvent>>>);

impl DeferredEvents {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `events` in order.
    pub fn extend(&self, events: Vec<SharedEvent>) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(events);
    }

    /// Drains every deferred event.
    #[must_use]
    pub fn take(&self) -> Vec<SharedEvent> {
        std::mem::take(&mut *self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

/// A transaction-scoped storage handle.
#[async_trait]
pub trait Transaction: Send + Sync {
    /// Makes every write performed through this handle durable.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::TransactionClosed` if the transaction already
    /// finished, or a backend error if the commit fails.
    async fn commit(&self) -> Result<(), StorageError>;

    /// Discards every write performed through this handle. Rolling back a
    /// finished transaction is a no-op.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the rollback fails.
    async fn rollback(&self) -> Result<(), StorageError>;

    /// Returns `true` until the transaction is committed or rolled back.
    fn is_active(&self) -> bool;

    /// Returns `true` for the handle that opened the transaction, `false` for
    /// views returned by a transaction handle's `begin`.
    fn is_owner(&self) -> bool;

    /// Events nested units of work left for the owner to publish.
    fn deferred_events(&self) -> &DeferredEvents;
}

/// Something a transaction can be started from.
#[async_trait]
pub trait Database: Send + Sync {
    /// The transaction handle produced by `begin`.
    type Tx: Transaction + Clone + 'static;

    /// Starts a transaction (root handles) or returns a non-owning view of
    /// the current one (transaction handles).
    ///
    /// # Errors
    ///
    /// Returns a backend error if no transaction can be opened.
    async fn begin(&self) -> Result<Self::Tx, StorageError>;
}
