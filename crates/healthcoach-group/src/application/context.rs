//! Atomic context for the Group context.

use std::sync::Arc;

use async_trait::async_trait;
use healthcoach_core::error::StorageError;
use healthcoach_core::event::SharedEvent;
use healthcoach_core::scope::Scope;
use healthcoach_core::storage::Transaction;
use healthcoach_core::unit_of_work::{AtomicContext, UnitOfWork};
use healthcoach_profile::domain::repository::ProfileRepository;

use crate::domain::repository::GroupRepository;

/// Transaction handle plus the group and profile repositories built on it.
pub struct GroupContext {
    scope: Scope,
    tx: Arc<dyn Transaction>,
    groups: Box<dyn GroupRepository>,
    profiles: Box<dyn ProfileRepository>,
}

/// Unit of work running business functions against a [`GroupContext`].
pub type GroupUnitOfWork<D> = UnitOfWork<D, GroupContext>;

impl GroupContext {
    /// Bundles `tx` with both repositories.
    pub fn new(
        scope: Scope,
        tx: impl Transaction + 'static,
        groups: impl GroupRepository + 'static,
        profiles: impl ProfileRepository + 'static,
    ) -> Self {
        Self {
            scope,
            tx: Arc::new(tx),
            groups: Box::new(groups),
            profiles: Box::new(profiles),
        }
    }

    /// The group repository.
    #[must_use]
    pub fn groups(&self) -> &dyn GroupRepository {
        self.groups.as_ref()
    }

    /// The profile repository.
    #[must_use]
    pub fn profiles(&self) -> &dyn ProfileRepository {
        self.profiles.as_ref()
    }
}

#[async_trait]
impl AtomicContext for GroupContext {
    fn scope(&self) -> &Scope {
        &self.scope
    }

    async fn commit(&self) -> Result<(), StorageError> {
        self.tx.commit().await
    }

    async fn close(&self) {
        self.groups.close().await;
        self.profiles.close().await;
    }

    fn collect_events(&self) -> Vec<SharedEvent> {
        let mut events = self.groups.collect_events();
        events.extend(self.profiles.collect_events());
        events
    }
}
