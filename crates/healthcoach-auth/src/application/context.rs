//! Atomic context for the Auth context.

use std::sync::Arc;

use async_trait::async_trait;
use healthcoach_core::error::StorageError;
use healthcoach_core::event::SharedEvent;
use healthcoach_core::scope::Scope;
use healthcoach_core::storage::Transaction;
use healthcoach_core::unit_of_work::{AtomicContext, UnitOfWork};

use crate::domain::repository::UserRepository;

/// Transaction handle plus the user repository built on it.
pub struct AuthContext {
    scope: Scope,
    tx: Arc<dyn Transaction>,
    users: Box<dyn UserRepository>,
}

/// Unit of work running business functions against an [`AuthContext`].
pub type AuthUnitOfWork<D> = UnitOfWork<D, AuthContext>;

impl AuthContext {
    /// Bundles `tx` with `users`.
    pub fn new(
        scope: Scope,
        tx: impl Transaction + 'static,
        users: impl UserRepository + 'static,
    ) -> Self {
        Self {
            scope,
            tx: Arc::new(tx),
            users: Box::new(users),
        }
    }

    /// The user repository.
    #[must_use]
    pub fn users(&self) -> &dyn UserRepository {
        self.users.as_ref()
    }
}

impl std::fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthContext")
            .field("active", &self.tx.is_active())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AtomicContext for AuthContext {
    fn scope(&self) -> &Scope {
        &self.scope
    }

    async fn commit(&self) -> Result<(), StorageError> {
        self.tx.commit().await
    }

    async fn close(&self) {
        self.users.close().await;
    }

    fn collect_events(&self) -> Vec<SharedEvent> {
        self.users.collect_events()
    }
}
