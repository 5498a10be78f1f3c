//! Transactional unit of work.
//!
//! [`UnitOfWork::atomic`] opens a transaction, builds a bounded-context
//! atomic context on top of it, runs the business function, and after a
//! successful commit hands every event raised by the aggregates the context
//! saw to the [`EventPublisher`].
//!
//! The business function commits explicitly through
//! [`AtomicContext::commit`]. Returning `Ok` without committing releases the
//! transaction by rolling it back and dispatches nothing.
//!
//! Nesting is flattened: a transaction handle is itself a
//! [`Database`](crate::storage::Database) whose `begin` returns a non-owning
//! view, so a unit of work built on it shares the outer transaction. Only the
//! unit of work that opened the transaction rolls it back or commits it. A
//! nested unit of work never ends it: a business error or panic propagates
//! to the caller untouched, and on success its events wait for the owner's
//! commit. Writes made by a failed nested call stay in the shared
//! transaction unless the owner rolls back.

use std::fmt::Display;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::error::StorageError;
use crate::event::SharedEvent;
use crate::message_bus::PublishError;
use crate::scope::Scope;
use crate::storage::{Database, Transaction};

/// Transaction-scoped bundle of repositories handed to business logic.
#[async_trait]
pub trait AtomicContext: Send + Sync + 'static {
    /// The cancellation scope of the enclosing `atomic` call.
    fn scope(&self) -> &Scope;

    /// Commits the underlying transaction.
    ///
    /// # Errors
    ///
    /// Returns a `StorageError` if the commit fails or the transaction is
    /// already closed.
    async fn commit(&self) -> Result<(), StorageError>;

    /// Releases every repository. Calling it more than once is harmless.
    async fn close(&self);

    /// Drains the events raised by every aggregate the repositories saw.
    fn collect_events(&self) -> Vec<SharedEvent>;
}

/// Sink for events harvested after a commit.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Hands `events` over for asynchronous dispatch.
    ///
    /// # Errors
    ///
    /// Returns a `PublishError` if the events cannot be enqueued.
    async fn publish_events(&self, events: Vec<SharedEvent>) -> Result<(), PublishError>;
}

/// Failure of an `atomic` call.
///
/// `Storage` and `Business` mean nothing was persisted. `Publish` means the
/// commit succeeded but the events were not handed to the bus.
#[derive(Debug, Error)]
pub enum AtomicError<E> {
    /// The transaction or the atomic context could not be set up.
    #[error("state rollback: {0}")]
    Storage(StorageError),

    /// The business function failed and the transaction was rolled back.
    #[error("state rollback: {0}")]
    Business(E),

    /// State was committed but dispatch could not be started.
    #[error("events not dispatched: {0}")]
    Publish(PublishError),
}

impl<E> AtomicError<E> {
    /// Returns `true` if nothing was persisted.
    #[must_use]
    pub fn is_rollback(&self) -> bool {
        !matches!(self, Self::Publish(_))
    }

    /// Returns the business error, if that is what this is.
    pub fn business(self) -> Option<E> {
        match self {
            Self::Business(err) => Some(err),
            _ => None,
        }
    }

    /// Returns a reference to the business error, if that is what this is.
    #[must_use]
    pub fn as_business(&self) -> Option<&E> {
        match self {
            Self::Business(err) => Some(err),
            _ => None,
        }
    }
}

/// Builds an atomic context from a child scope and a transaction handle.
pub type ContextFactory<D, C> =
    Arc<dyn Fn(Scope, <D as Database>::Tx) -> Result<C, StorageError> + Send + Sync>;

/// Runs business functions inside storage transactions and publishes their
/// events after commit.
pub struct UnitOfWork<D: Database, C: AtomicContext> {
    db: D,
    factory: ContextFactory<D, C>,
    publisher: Arc<dyn EventPublisher>,
}

impl<D, C> Clone for UnitOfWork<D, C>
where
    D: Database + Clone,
    C: AtomicContext,
{
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            factory: Arc::clone(&self.factory),
            publisher: Arc::clone(&self.publisher),
        }
    }
}

impl<D: Database, C: AtomicContext> std::fmt::Debug for UnitOfWork<D, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitOfWork")
            .field("context", &std::any::type_name::<C>())
            .finish_non_exhaustive()
    }
}

impl<D: Database, C: AtomicContext> UnitOfWork<D, C> {
    /// Creates a unit of work over `db`.
    pub fn new<F>(db: D, factory: F, publisher: Arc<dyn EventPublisher>) -> Self
    where
        F: Fn(Scope, D::Tx) -> Result<C, StorageError> + Send + Sync + 'static,
    {
        Self {
            db,
            factory: Arc::new(factory),
            publisher,
        }
    }

    /// Runs `work` inside a fresh transaction, or inside the caller's when
    /// `db` is a transaction handle.
    ///
    /// A panic inside `work` rolls an owned transaction back, closes the
    /// context and then resumes unwinding.
    ///
    /// # Errors
    ///
    /// See [`AtomicError`].
    pub async fn atomic<F, Fut, T, E>(&self, parent: &Scope, work: F) -> Result<T, AtomicError<E>>
    where
        F: FnOnce(Arc<C>) -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send,
        T: Send,
        E: Display + Send,
    {
        let tx = self.db.begin().await.map_err(AtomicError::Storage)?;

        let scope = parent.child();
        let _cancel = scope.cancel_on_drop();

        let ctx = match (self.factory)(scope, tx.clone()) {
            Ok(ctx) => Arc::new(ctx),
            Err(err) => {
                release(&tx).await;
                return Err(AtomicError::Storage(err));
            }
        };

        let handle = Arc::clone(&ctx);
        let outcome = AssertUnwindSafe(async move { work(handle).await })
            .catch_unwind()
            .await;

        match outcome {
            Err(panic) => {
                warn!(owner = tx.is_owner(), "business function panicked");
                release(&tx).await;
                ctx.close().await;
                std::panic::resume_unwind(panic)
            }
            Ok(Err(err)) => {
                debug!(error = %err, owner = tx.is_owner(), "business function failed");
                release(&tx).await;
                ctx.close().await;
                Err(AtomicError::Business(err))
            }
            Ok(Ok(value)) if !tx.is_owner() => {
                let events = ctx.collect_events();
                debug!(events = events.len(), "nested unit of work finished, deferring events");
                tx.deferred_events().extend(events);
                ctx.close().await;
                Ok(value)
            }
            Ok(Ok(value)) if tx.is_active() => {
                debug!("business function returned without committing, releasing transaction");
                release(&tx).await;
                ctx.close().await;
                Ok(value)
            }
            Ok(Ok(value)) => {
                let mut events = ctx.collect_events();
                events.extend(tx.deferred_events().take());
                ctx.close().await;
                let count = events.len();
                if let Err(err) = self.publisher.publish_events(events).await {
                    error!(error = %err, events = count, "failed to publish committed events");
                    return Err(AtomicError::Publish(err));
                }
                Ok(value)
            }
        }
    }
}

/// Rolls back a transaction this unit of work owns and drops the events
/// nested calls left on it. Views are left alone.
async fn release<T: Transaction>(tx: &T) {
    if !tx.is_owner() {
        return;
    }
    if let Err(err) = tx.rollback().await {
        error!(error = %err, "transaction rollback failed");
    }
    drop(tx.deferred_events().take());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("boom")]
    struct Boom;

    #[test]
    fn test_business_error_display_marks_rollback() {
        let err: AtomicError<Boom> = AtomicError::Business(Boom);

        assert_eq!(err.to_string(), "state rollback: boom");
        assert!(err.is_rollback());
    }

    #[test]
    fn test_publish_error_is_not_a_rollback() {
        let err: AtomicError<Boom> = AtomicError::Publish(PublishError::Closed);

        assert!(!err.is_rollback());
        assert!(err.business().is_none());
    }

    #[test]
    fn test_storage_error_display_marks_rollback() {
        let err: AtomicError<Boom> = AtomicError::Storage(StorageError::Cancelled);

        assert_eq!(err.to_string(), "state rollback: operation cancelled");
    }
}
