//! Binding of a storage backend to the bounded-context atomic contexts.

use healthcoach_auth::application::context::AuthContext;
use healthcoach_core::error::StorageError;
use healthcoach_core::scope::Scope;
use healthcoach_core::storage::Database;
use healthcoach_group::application::context::GroupContext;
use healthcoach_invite::application::context::InviteContext;
use healthcoach_metric::application::context::MetricContext;
use healthcoach_profile::application::context::ProfileContext;

use crate::memory::{
    MemoryDatabase, MemoryGroupRepository, MemoryInviteRepository, MemoryMetricRepository,
    MemoryProfileRepository, MemoryTransaction, MemoryUserRepository,
};
use crate::postgres::{
    PgDatabase, PgGroupRepository, PgInviteRepository, PgMetricRepository, PgProfileRepository,
    PgTransaction, PgUserRepository,
};

/// A database whose transactions can back every atomic context.
///
/// Each method is a context factory suitable for
/// [`UnitOfWork::new`](healthcoach_core::unit_of_work::UnitOfWork::new).
pub trait StorageBackend: Database + Clone + 'static {
    /// Builds the auth context over `tx`.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the context cannot be built.
    fn auth_context(scope: Scope, tx: Self::Tx) -> Result<AuthContext, StorageError>;

    /// Builds the profile context over `tx`.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the context cannot be built.
    fn profile_context(scope: Scope, tx: Self::Tx) -> Result<ProfileContext, StorageError>;

    /// Builds the group context over `tx`.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the context cannot be built.
    fn group_context(scope: Scope, tx: Self::Tx) -> Result<GroupContext, StorageError>;

    /// Builds the invite context over `tx`.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the context cannot be built.
    fn invite_context(scope: Scope, tx: Self::Tx) -> Result<InviteContext, StorageError>;

    /// Builds the metric context over `tx`.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the context cannot be built.
    fn metric_context(scope: Scope, tx: Self::Tx) -> Result<MetricContext, StorageError>;
}

impl StorageBackend for MemoryDatabase {
    fn auth_context(scope: Scope, tx: MemoryTransaction) -> Result<AuthContext, StorageError> {
        let users = MemoryUserRepository::new(scope.clone(), tx.clone());
        Ok(AuthContext::new(scope, tx, users))
    }

    fn profile_context(
        scope: Scope,
        tx: MemoryTransaction,
    ) -> Result<ProfileContext, StorageError> {
        let profiles = MemoryProfileRepository::new(scope.clone(), tx.clone());
        Ok(ProfileContext::new(scope, tx, profiles))
    }

    fn group_context(scope: Scope, tx: MemoryTransaction) -> Result<GroupContext, StorageError> {
        let groups = MemoryGroupRepository::new(scope.clone(), tx.clone());
        let profiles = MemoryProfileRepository::new(scope.clone(), tx.clone());
        Ok(GroupContext::new(scope, tx, groups, profiles))
    }

    fn invite_context(scope: Scope, tx: MemoryTransaction) -> Result<InviteContext, StorageError> {
        let invites = MemoryInviteRepository::new(scope.clone(), tx.clone());
        let profiles = MemoryProfileRepository::new(scope.clone(), tx.clone());
        Ok(InviteContext::new(scope, tx, invites, profiles))
    }

    fn metric_context(scope: Scope, tx: MemoryTransaction) -> Result<MetricContext, StorageError> {
        let metrics = MemoryMetricRepository::new(scope.clone(), tx.clone());
        Ok(MetricContext::new(scope, tx, metrics))
    }
}

impl StorageBackend for PgDatabase {
    fn auth_context(scope: Scope, tx: PgTransaction) -> Result<AuthContext, StorageError> {
        let users = PgUserRepository::new(scope.clone(), tx.clone());
        Ok(AuthContext::new(scope, tx, users))
    }

    fn profile_context(scope: Scope, tx: PgTransaction) -> Result<ProfileContext, StorageError> {
        let profiles = PgProfileRepository::new(scope.clone(), tx.clone());
        Ok(ProfileContext::new(scope, tx, profiles))
    }

    fn group_context(scope: Scope, tx: PgTransaction) -> Result<GroupContext, StorageError> {
        let groups = PgGroupRepository::new(scope.clone(), tx.clone());
        let profiles = PgProfileRepository::new(scope.clone(), tx.clone());
        Ok(GroupContext::new(scope, tx, groups, profiles))
    }

    fn invite_context(scope: Scope, tx: PgTransaction) -> Result<InviteContext, StorageError> {
        let invites = PgInviteRepository::new(scope.clone(), tx.clone());
        let profiles = PgProfileRepository::new(scope.clone(), tx.clone());
        Ok(InviteContext::new(scope, tx, invites, profiles))
    }

    fn metric_context(scope: Scope, tx: PgTransaction) -> Result<MetricContext, StorageError> {
        let metrics = PgMetricRepository::new(scope.clone(), tx.clone());
        Ok(MetricContext::new(scope, tx, metrics))
    }
}
