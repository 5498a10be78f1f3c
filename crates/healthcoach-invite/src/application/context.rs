//! Atomic context for the Invite context.

use std::sync::Arc;

use async_trait::async_trait;
use healthcoach_core::error::StorageError;
use healthcoach_core::event::SharedEvent;
use healthcoach_core::scope::Scope;
use healthcoach_core::storage::Transaction;
use healthcoach_core::unit_of_work::{AtomicContext, UnitOfWork};
use healthcoach_profile::domain::repository::ProfileRepository;

use crate::domain::repository::InviteRepository;

/// Transaction handle plus the invite and profile repositories built on it.
pub struct InviteContext {
    scope: Scope,
    tx: Arc<dyn Transaction>,
    invites: Box<dyn InviteRepository>,
    profiles: Box<dyn ProfileRepository>,
}

/// Unit of work running business functions against an [`InviteContext`].
pub type InviteUnitOfWork<D> = UnitOfWork<D, InviteContext>;

impl InviteContext {
    /// Bundles `tx` with both repositories.
    pub fn new(
        scope: Scope,
        tx: impl Transaction + 'static,
        invites: impl InviteRepository + 'static,
        profiles: impl ProfileRepository + 'static,
    ) -> Self {
        Self {
            scope,
            tx: Arc::new(tx),
            invites: Box::new(invites),
            profiles: Box::new(profiles),
        }
    }

    /// The invite repository.
    #[must_use]
    pub fn invites(&self) -> &dyn InviteRepository {
        self.invites.as_ref()
    }

    /// The profile repository.
    #[must_use]
    pub fn profiles(&self) -> &dyn ProfileRepository {
        self.profiles.as_ref()
    }
}

#[async_trait]
impl AtomicContext for InviteContext {
    fn scope(&self) -> &Scope {
        &self.scope
    }

    async fn commit(&self) -> Result<(), StorageError> {
        self.tx.commit().await
    }

    async fn close(&self) {
        self.invites.close().await;
        self.profiles.close().await;
    }

    fn collect_events(&self) -> Vec<SharedEvent> {
        let mut events = self.invites.collect_events();
        events.extend(self.profiles.collect_events());
        events
    }
}
