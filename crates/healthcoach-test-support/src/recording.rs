//! Recording doubles for the storage primitive, atomic context and publisher.
//!
//! Every double appends to a shared [`OperationLog`] so tests can assert on
//! the exact order of lifecycle steps across collaborators.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use healthcoach_core::aggregate::AggregateRoot;
use healthcoach_core::error::StorageError;
use healthcoach_core::event::SharedEvent;
use healthcoach_core::message_bus::PublishError;
use healthcoach_core::scope::Scope;
use healthcoach_core::storage::{Database, DeferredEvents, Transaction};
use healthcoach_core::tracking::SeenAggregates;
use healthcoach_core::unit_of_work::{AtomicContext, EventPublisher};

/// One recorded lifecycle step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// A transaction was opened.
    Begin,
    /// A transaction was committed.
    Commit,
    /// An active transaction was rolled back.
    Rollback,
    /// Events were collected from the context.
    CollectEvents,
    /// The context was closed.
    Close,
    /// Events were published; carries the event count.
    Publish(usize),
}

/// Shared, ordered log of operations.
#[derive(Debug, Clone, Default)]
pub struct OperationLog {
    entries: Arc<Mutex<Vec<Operation>>>,
}

impl OperationLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an operation.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn record(&self, op: Operation) {
        self.entries.lock().unwrap().push(op);
    }

    /// Returns a snapshot of every operation recorded so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn operations(&self) -> Vec<Operation> {
        self.entries.lock().unwrap().clone()
    }

    /// Returns `true` if `op` was recorded.
    #[must_use]
    pub fn contains(&self, op: Operation) -> bool {
        self.operations().contains(&op)
    }

    /// Returns the position of the first `op`, if any.
    #[must_use]
    pub fn position(&self, op: Operation) -> Option<usize> {
        self.operations().iter().position(|o| *o == op)
    }
}

/// Transaction double that logs commit and rollback.
///
/// Views returned by `begin` log nothing and cannot end the transaction.
#[derive(Debug, Clone)]
pub struct RecordingTransaction {
    log: OperationLog,
    active: Arc<AtomicBool>,
    owner: bool,
    deferred: DeferredEvents,
}

impl RecordingTransaction {
    /// Creates an active transaction that writes to `log`.
    #[must_use]
    pub fn new(log: OperationLog) -> Self {
        Self {
            log,
            active: Arc::new(AtomicBool::new(true)),
            owner: true,
            deferred: DeferredEvents::new(),
        }
    }
}

#[async_trait]
impl Transaction for RecordingTransaction {
    async fn commit(&self) -> Result<(), StorageError> {
        if !self.owner {
            return if self.is_active() {
                Ok(())
            } else {
                Err(StorageError::TransactionClosed)
            };
        }
        if !self.active.swap(false, Ordering::SeqCst) {
            return Err(StorageError::TransactionClosed);
        }
        self.log.record(Operation::Commit);
        Ok(())
    }

    async fn rollback(&self) -> Result<(), StorageError> {
        if self.owner && self.active.swap(false, Ordering::SeqCst) {
            self.log.record(Operation::Rollback);
        }
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn is_owner(&self) -> bool {
        self.owner
    }

    fn deferred_events(&self) -> &DeferredEvents {
        &self.deferred
    }
}

#[async_trait]
impl Database for RecordingTransaction {
    type Tx = RecordingTransaction;

    async fn begin(&self) -> Result<Self::Tx, StorageError> {
        Ok(Self {
            owner: false,
            ..self.clone()
        })
    }
}

/// Database double that hands out [`RecordingTransaction`]s.
#[derive(Debug, Clone, Default)]
pub struct RecordingDatabase {
    log: OperationLog,
    fail_begin: bool,
}

impl RecordingDatabase {
    /// Creates a database that writes to `log`.
    #[must_use]
    pub fn new(log: OperationLog) -> Self {
        Self {
            log,
            fail_begin: false,
        }
    }

    /// Creates a database whose `begin` always fails.
    #[must_use]
    pub fn failing(log: OperationLog) -> Self {
        Self {
            log,
            fail_begin: true,
        }
    }
}

#[async_trait]
impl Database for RecordingDatabase {
    type Tx = RecordingTransaction;

    async fn begin(&self) -> Result<Self::Tx, StorageError> {
        if self.fail_begin {
            return Err(StorageError::Backend("connection refused".into()));
        }
        self.log.record(Operation::Begin);
        Ok(RecordingTransaction::new(self.log.clone()))
    }
}

/// Atomic context double built on a [`RecordingTransaction`].
#[derive(Debug)]
pub struct RecordingContext {
    scope: Scope,
    tx: RecordingTransaction,
    seen: SeenAggregates,
    log: OperationLog,
    closed: AtomicBool,
}

impl RecordingContext {
    /// Creates a context over `tx`.
    #[must_use]
    pub fn new(scope: Scope, tx: RecordingTransaction, log: OperationLog) -> Self {
        Self {
            scope,
            tx,
            seen: SeenAggregates::new(),
            log,
            closed: AtomicBool::new(false),
        }
    }

    /// Tracks `aggregate` the way a repository would after loading it.
    pub fn track<A: AggregateRoot>(&self, aggregate: &A) {
        self.seen.track(aggregate);
    }

    /// The transaction this context runs in.
    #[must_use]
    pub fn transaction(&self) -> &RecordingTransaction {
        &self.tx
    }

    /// Returns `true` once the context was closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AtomicContext for RecordingContext {
    fn scope(&self) -> &Scope {
        &self.scope
    }

    async fn commit(&self) -> Result<(), StorageError> {
        self.tx.commit().await
    }

    async fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.log.record(Operation::Close);
        }
    }

    fn collect_events(&self) -> Vec<SharedEvent> {
        self.log.record(Operation::CollectEvents);
        self.seen.collect_events()
    }
}

/// Publisher double that keeps every published event.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    log: OperationLog,
    published: Mutex<Vec<SharedEvent>>,
    fail: bool,
}

impl RecordingPublisher {
    /// Creates a publisher that accepts everything.
    #[must_use]
    pub fn new(log: OperationLog) -> Self {
        Self {
            log,
            published: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    /// Creates a publisher that records the call and then reports a closed
    /// bus.
    #[must_use]
    pub fn failing(log: OperationLog) -> Self {
        Self {
            log,
            published: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Returns the event types published so far, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn published_types(&self) -> Vec<&'static str> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.event_type())
            .collect()
    }

    /// Returns the events published so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn published(&self) -> Vec<SharedEvent> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish_events(&self, events: Vec<SharedEvent>) -> Result<(), PublishError> {
        self.log.record(Operation::Publish(events.len()));
        if self.fail {
            return Err(PublishError::Closed);
        }
        self.published.lock().unwrap().extend(events);
        Ok(())
    }
}
