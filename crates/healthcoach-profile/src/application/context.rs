//! Atomic context for the Profile context.

use std::sync::Arc;

use async_trait::async_trait;
use healthcoach_core::error::StorageError;
use healthcoach_core::event::SharedEvent;
use healthcoach_core::scope::Scope;
use healthcoach_core::storage::Transaction;
use healthcoach_core::unit_of_work::{AtomicContext, UnitOfWork};

use crate::domain::repository::ProfileRepository;

/// Transaction handle plus the profile repository built on it.
pub struct ProfileContext {
    scope: Scope,
    tx: Arc<dyn Transaction>,
    profiles: Box<dyn ProfileRepository>,
}

/// Unit of work running business functions against a [`ProfileContext`].
pub type ProfileUnitOfWork<D> = UnitOfWork<D, ProfileContext>;

impl ProfileContext {
    /// Bundles `tx` with `profiles`.
    pub fn new(
        scope: Scope,
        tx: impl Transaction + 'static,
        profiles: impl ProfileRepository + 'static,
    ) -> Self {
        Self {
            scope,
            tx: Arc::new(tx),
            profiles: Box::new(profiles),
        }
    }

    /// The profile repository.
    #[must_use]
    pub fn profiles(&self) -> &dyn ProfileRepository {
        self.profiles.as_ref()
    }
}

#[async_trait]
impl AtomicContext for ProfileContext {
    fn scope(&self) -> &Scope {
        &self.scope
    }

    async fn commit(&self) -> Result<(), StorageError> {
        self.tx.commit().await
    }

    async fn close(&self) {
        self.profiles.close().await;
    }

    fn collect_events(&self) -> Vec<SharedEvent> {
        self.profiles.collect_events()
    }
}
