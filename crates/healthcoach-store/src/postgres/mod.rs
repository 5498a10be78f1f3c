//! `PostgreSQL` storage backend.
//!
//! [`PgDatabase`] opens one `sqlx` transaction per unit of work. The
//! transaction is shared by every repository of the atomic context through
//! [`PgTransaction`]; each statement runs under the context's scope so a
//! cancelled request aborts its in-flight query. `begin` on a transaction
//! returns a view that runs on the same connection but cannot end it.

mod groups;
mod invites;
mod metrics;
mod profiles;
mod users;

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use healthcoach_core::error::StorageError;
use healthcoach_core::scope::Scope;
use healthcoach_core::storage::{Database, DeferredEvents, Transaction};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgConnection, PgPool, Postgres};
use tokio::sync::{Mutex, MutexGuard};

pub use groups::PgGroupRepository;
pub use invites::PgInviteRepository;
pub use metrics::PgMetricRepository;
pub use profiles::PgProfileRepository;
pub use users::PgUserRepository;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Migrations embedded from the workspace `migrations/` directory.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

/// Root handle of the `PostgreSQL` backend. Clones share the pool.
#[derive(Debug, Clone)]
pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    /// Wraps an existing pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a pool of at most `max_connections` to `url`.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the database is unreachable.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Applies pending migrations.
    ///
    /// # Errors
    ///
    /// Returns a backend error if a migration fails.
    pub async fn migrate(&self) -> Result<(), StorageError> {
        MIGRATOR.run(&self.pool).await.map_err(StorageError::backend)
    }

    /// The underlying pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Database for PgDatabase {
    type Tx = PgTransaction;

    async fn begin(&self) -> Result<PgTransaction, StorageError> {
        let tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        Ok(PgTransaction {
            inner: Arc::new(Mutex::new(Some(tx))),
            active: Arc::new(AtomicBool::new(true)),
            owner: true,
            deferred: DeferredEvents::new(),
        })
    }
}

type Inner = Option<sqlx::Transaction<'static, Postgres>>;

/// An open `PostgreSQL` transaction. Clones share the same transaction.
#[derive(Clone)]
pub struct PgTransaction {
    inner: Arc<Mutex<Inner>>,
    active: Arc<AtomicBool>,
    owner: bool,
    deferred: DeferredEvents,
}

impl std::fmt::Debug for PgTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgTransaction")
            .field("active", &self.is_active())
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}

impl PgTransaction {
    /// Locks the transaction for the duration of one repository call.
    pub(crate) async fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().await
    }
}

/// The connection of a locked transaction.
pub(crate) fn connection(inner: &mut Inner) -> Result<&mut PgConnection, StorageError> {
    inner.as_deref_mut().ok_or(StorageError::TransactionClosed)
}

#[async_trait]
impl Transaction for PgTransaction {
    async fn commit(&self) -> Result<(), StorageError> {
        if !self.owner {
            return if self.is_active() {
                Ok(())
            } else {
                Err(StorageError::TransactionClosed)
            };
        }
        let tx = self
            .inner
            .lock()
            .await
            .take()
            .ok_or(StorageError::TransactionClosed)?;
        self.active.store(false, Ordering::SeqCst);
        tx.commit().await.map_err(map_sqlx_error)
    }

    async fn rollback(&self) -> Result<(), StorageError> {
        if !self.owner {
            return Ok(());
        }
        let Some(tx) = self.inner.lock().await.take() else {
            return Ok(());
        };
        self.active.store(false, Ordering::SeqCst);
        tx.rollback().await.map_err(map_sqlx_error)
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
impl Database for PgTransaction {
    type Tx = PgTransaction;

    async fn begin(&self) -> Result<PgTransaction, StorageError> {
        Ok(Self {
            owner: false,
            ..self.clone()
        })
    }
}

/// Runs one statement under `scope`.
pub(crate) async fn run<F, T>(scope: &Scope, statement: F) -> Result<T, StorageError>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    scope.run(statement).await?.map_err(map_sqlx_error)
}

/// Maps a driver error to a [`StorageError`], keeping constraint violations
/// distinguishable.
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    if let sqlx::Error::Database(db) = &err {
        let constraint = db.constraint().unwrap_or_default().to_owned();
        match db.code().as_deref() {
            Some(UNIQUE_VIOLATION) => return StorageError::Conflict(constraint),
            Some(FOREIGN_KEY_VIOLATION) => return StorageError::ForeignKey(constraint),
            _ => {}
        }
    }
    StorageError::backend(err)
}
