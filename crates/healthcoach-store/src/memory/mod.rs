//! In-process storage backend.
//!
//! Committed state lives behind an async mutex. `begin` takes the lock for
//! the whole transaction and works on a private copy; `commit` swaps the copy
//! in, `rollback` drops it. Transactions are therefore fully serialised,
//! which gives the same isolation a single `PostgreSQL` writer would.
//! `begin` on a transaction returns a view that shares the working copy but
//! cannot end the transaction.

mod groups;
mod invites;
mod metrics;
mod profiles;
mod users;

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use healthcoach_auth::domain::aggregates::User;
use healthcoach_core::error::StorageError;
use healthcoach_core::storage::{Database, DeferredEvents, Transaction};
use healthcoach_group::domain::aggregates::Group;
use healthcoach_invite::domain::aggregates::Invite;
use healthcoach_metric::domain::aggregates::Metric;
use healthcoach_profile::domain::aggregates::Profile;
use indexmap::IndexMap;
use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;

pub use groups::MemoryGroupRepository;
pub use invites::MemoryInviteRepository;
pub use metrics::MemoryMetricRepository;
pub use profiles::MemoryProfileRepository;
pub use users::MemoryUserRepository;

/// Every table of the in-memory store.
///
/// Stored aggregates never carry pending events: repositories store and
/// hand out detached copies.
#[derive(Debug, Clone, Default)]
pub struct Tables {
    /// Users with their sessions.
    pub users: IndexMap<Uuid, User>,
    /// Trainee and coach profiles by user id.
    pub profiles: IndexMap<Uuid, Profile>,
    /// Groups.
    pub groups: IndexMap<Uuid, Group>,
    /// Invites with their acceptances.
    pub invites: IndexMap<Uuid, Invite>,
    /// Metrics.
    pub metrics: IndexMap<Uuid, Metric>,
}

/// Root handle of the in-memory store. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    committed: Arc<tokio::sync::Mutex<Tables>>,
}

impl MemoryDatabase {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the committed state once no transaction is open.
    pub async fn snapshot(&self) -> Tables {
        self.committed.lock().await.clone()
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    type Tx = MemoryTransaction;

    async fn begin(&self) -> Result<MemoryTransaction, StorageError> {
        let guard = Arc::clone(&self.committed).lock_owned().await;
        let working = guard.clone();
        Ok(MemoryTransaction {
            state: Arc::new(Mutex::new(TxState {
                guard: Some(guard),
                working,
            })),
            owner: true,
            deferred: DeferredEvents::new(),
        })
    }
}

#[derive(Debug)]
struct TxState {
    guard: Option<OwnedMutexGuard<Tables>>,
    working: Tables,
}

/// An open in-memory transaction. Clones share the same transaction.
#[derive(Debug, Clone)]
pub struct MemoryTransaction {
    state: Arc<Mutex<TxState>>,
    owner: bool,
    deferred: DeferredEvents,
}

impl MemoryTransaction {
    fn lock(&self) -> std::sync::MutexGuard<'_, TxState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` against the working copy.
    pub(crate) fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> Result<R, StorageError> {
        let state = self.lock();
        if state.guard.is_none() {
            return Err(StorageError::TransactionClosed);
        }
        Ok(f(&state.working))
    }

    /// Runs `f` against the working copy, allowing changes.
    pub(crate) fn write<R>(&self, f: impl FnOnce(&mut Tables) -> R) -> Result<R, StorageError> {
        let mut state = self.lock();
        if state.guard.is_none() {
            return Err(StorageError::TransactionClosed);
        }
        Ok(f(&mut state.working))
    }
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn commit(&self) -> Result<(), StorageError> {
        if !self.owner {
            return if self.is_active() {
                Ok(())
            } else {
                Err(StorageError::TransactionClosed)
            };
        }
        let mut state = self.lock();
        let mut guard = state.guard.take().ok_or(StorageError::TransactionClosed)?;
        *guard = std::mem::take(&mut state.working);
        Ok(())
    }

    async fn rollback(&self) -> Result<(), StorageError> {
        if !self.owner {
            return Ok(());
        }
        let mut state = self.lock();
        if state.guard.take().is_some() {
            state.working = Tables::default();
        }
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.lock().guard.is_some()
    }

    fn is_owner(&self) -> bool {
        self.owner
    }

    fn deferred_events(&self) -> &DeferredEvents {
        &self.deferred
    }
}

#[async_trait]
impl Database for MemoryTransaction {
    type Tx = MemoryTransaction;

    async fn begin(&self) -> Result<MemoryTransaction, StorageError> {
        Ok(Self {
            owner: false,
            ..self.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn user(email: &str) -> User {
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        User::restore(Uuid::new_v4(), email.to_owned(), "hash".to_owned(), now, now, Vec::new())
    }

    #[tokio::test]
    async fn test_commit_publishes_working_copy() {
        // Arrange
        let db = MemoryDatabase::new();
        let tx = db.begin().await.unwrap();
        let stored = user("ada@example.com");
        let user_id = stored.user_id;

        // Act
        tx.write(|t| t.users.insert(user_id, stored)).unwrap();
        tx.commit().await.unwrap();

        // Assert
        assert!(!tx.is_active());
        assert!(db.snapshot().await.users.contains_key(&user_id));
    }

    #[tokio::test]
    async fn test_rollback_discards_working_copy() {
        let db = MemoryDatabase::new();
        let tx = db.begin().await.unwrap();
        let stored = user("grace@example.com");
        let user_id = stored.user_id;

        tx.write(|t| t.users.insert(user_id, stored)).unwrap();
        tx.rollback().await.unwrap();

        assert!(db.snapshot().await.users.is_empty());
        assert_eq!(tx.read(|t| t.users.len()), Err(StorageError::TransactionClosed));
    }

    #[tokio::test]
    async fn test_second_commit_reports_closed_transaction() {
        let db = MemoryDatabase::new();
        let tx = db.begin().await.unwrap();

        tx.commit().await.unwrap();

        assert_eq!(tx.commit().await, Err(StorageError::TransactionClosed));
        assert_eq!(tx.rollback().await, Ok(()));
    }

    #[tokio::test]
    async fn test_transactions_are_serialised() {
        // Arrange
        let db = MemoryDatabase::new();
        let first = db.begin().await.unwrap();

        // Act
        let waiting = tokio::spawn({
            let db = db.clone();
            async move { db.begin().await.map(|tx| tx.is_active()) }
        });
        tokio::task::yield_now().await;
        let blocked = !waiting.is_finished();
        first.rollback().await.unwrap();

        // Assert
        assert!(blocked);
        assert_eq!(waiting.await.unwrap(), Ok(true));
    }

    #[tokio::test]
    async fn test_transaction_begin_returns_view_of_same_transaction() {
        // Arrange
        let db = MemoryDatabase::new();
        let outer = db.begin().await.unwrap();
        let stored = user("ada@example.com");
        let user_id = stored.user_id;
        outer.write(|t| t.users.insert(user_id, stored)).unwrap();

        // Act
        let inner = outer.begin().await.unwrap();
        let visible = inner.read(|t| t.users.contains_key(&user_id)).unwrap();
        inner.commit().await.unwrap();
        inner.rollback().await.unwrap();

        // Assert
        assert!(visible);
        assert!(!inner.is_owner());
        assert!(outer.is_active());
        outer.commit().await.unwrap();
        assert!(db.snapshot().await.users.contains_key(&user_id));
    }

    #[tokio::test]
    async fn test_view_commit_fails_once_owner_finished() {
        let db = MemoryDatabase::new();
        let outer = db.begin().await.unwrap();
        let inner = outer.begin().await.unwrap();

        outer.rollback().await.unwrap();

        assert!(!inner.is_active());
        assert_eq!(inner.commit().await, Err(StorageError::TransactionClosed));
    }
}
