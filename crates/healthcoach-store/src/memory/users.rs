//! In-memory user repository.

use async_trait::async_trait;
use healthcoach_auth::domain::aggregates::User;
use healthcoach_auth::domain::errors::AuthError;
use healthcoach_auth::domain::repository::UserRepository;
use healthcoach_core::event::SharedEvent;
use healthcoach_core::scope::Scope;
use healthcoach_core::tracking::SeenAggregates;
use uuid::Uuid;

use super::{MemoryTransaction, Tables};

/// [`UserRepository`] over a [`MemoryTransaction`].
#[derive(Debug)]
pub struct MemoryUserRepository {
    tx: MemoryTransaction,
    scope: Scope,
    seen: SeenAggregates,
}

impl MemoryUserRepository {
    /// Creates a repository bound to `tx`.
    #[must_use]
    pub fn new(scope: Scope, tx: MemoryTransaction) -> Self {
        Self {
            tx,
            scope,
            seen: SeenAggregates::new(),
        }
    }

    fn find(&self, predicate: impl Fn(&User) -> bool) -> Result<User, AuthError> {
        self.scope.ensure_active()?;
        let user = self
            .tx
            .read(|t| t.users.values().find(|u| predicate(u)).map(detach))?
            .ok_or(AuthError::UserNotFound)?;
        self.seen.track(&user);
        Ok(user)
    }
}

fn detach(user: &User) -> User {
    User::restore(
        user.user_id,
        user.email.clone(),
        user.password_hash.clone(),
        user.created_at,
        user.updated_at,
        user.authorizations.clone(),
    )
}

fn email_taken(tables: &Tables, user: &User) -> bool {
    tables
        .users
        .values()
        .any(|u| u.user_id != user.user_id && u.email == user.email)
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn add(&self, user: &User) -> Result<(), AuthError> {
        self.scope.ensure_active()?;
        self.tx.write(|t| {
            if t.users.contains_key(&user.user_id) || email_taken(t, user) {
                return Err(AuthError::UserExists);
            }
            t.users.insert(user.user_id, detach(user));
            Ok(())
        })??;
        self.seen.track(user);
        Ok(())
    }

    async fn get_by_id(&self, user_id: Uuid) -> Result<User, AuthError> {
        self.find(|u| u.user_id == user_id)
    }

    async fn get_by_email(&self, email: &str) -> Result<User, AuthError> {
        self.find(|u| u.email == email)
    }

    async fn get_by_authorization_secret(&self, secret: &str) -> Result<User, AuthError> {
        self.find(|u| u.get_authorization_by_secret(secret).is_some())
    }

    async fn persist(&self, user: &User) -> Result<(), AuthError> {
        self.scope.ensure_active()?;
        self.tx.write(|t| {
            if !t.users.contains_key(&user.user_id) {
                return Err(AuthError::UserNotFound);
            }
            if email_taken(t, user) {
                return Err(AuthError::UserExists);
            }
            t.users.insert(user.user_id, detach(user));
            Ok(())
        })??;
        self.seen.track(user);
        Ok(())
    }

    fn collect_events(&self) -> Vec<SharedEvent> {
        self.seen.collect_events()
    }

    async fn close(&self) {
        tracing::trace!(tracked = self.seen.len(), "user repository closed");
    }
}
