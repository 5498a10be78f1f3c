//! Shared application state.

use std::sync::Arc;

use healthcoach_auth::application::authorizer::SessionAuthorizer;
use healthcoach_auth::application::context::AuthUnitOfWork;
use healthcoach_core::clock::Clock;
use healthcoach_core::rng::TokenGenerator;
use healthcoach_core::unit_of_work::{EventPublisher, UnitOfWork};
use healthcoach_group::application::context::GroupUnitOfWork;
use healthcoach_invite::application::context::InviteUnitOfWork;
use healthcoach_metric::application::context::MetricUnitOfWork;
use healthcoach_profile::application::context::ProfileUnitOfWork;
use healthcoach_store::StorageBackend;

/// Application state shared across all request handlers.
///
/// Every unit of work runs against the same database and hands its events to
/// the same publisher.
#[derive(Clone)]
pub struct AppState<D: StorageBackend> {
    /// Users and sessions.
    pub auth: AuthUnitOfWork<D>,
    /// Trainee and coach profiles.
    pub profiles: ProfileUnitOfWork<D>,
    /// Groups and their members.
    pub groups: GroupUnitOfWork<D>,
    /// Invites.
    pub invites: InviteUnitOfWork<D>,
    /// Body metrics.
    pub metrics: MetricUnitOfWork<D>,
    /// Password checks and access tokens.
    pub authorizer: SessionAuthorizer,
    /// Time source for aggregates.
    pub clock: Arc<dyn Clock>,
    /// Source of invite secrets.
    pub tokens: Arc<dyn TokenGenerator>,
}

impl<D: StorageBackend> AppState<D> {
    /// Create new application state.
    pub fn new(
        db: D,
        publisher: Arc<dyn EventPublisher>,
        authorizer: SessionAuthorizer,
        clock: Arc<dyn Clock>,
        tokens: Arc<dyn TokenGenerator>,
    ) -> Self {
        Self {
            auth: UnitOfWork::new(db.clone(), D::auth_context, Arc::clone(&publisher)),
            profiles: UnitOfWork::new(db.clone(), D::profile_context, Arc::clone(&publisher)),
            groups: UnitOfWork::new(db.clone(), D::group_context, Arc::clone(&publisher)),
            invites: UnitOfWork::new(db.clone(), D::invite_context, Arc::clone(&publisher)),
            metrics: UnitOfWork::new(db, D::metric_context, publisher),
            authorizer,
            clock,
            tokens,
        }
    }
}

impl<D: StorageBackend> std::fmt::Debug for AppState<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("authorizer", &self.authorizer)
            .finish_non_exhaustive()
    }
}
