//! Repository contract for users.

use async_trait::async_trait;
use healthcoach_core::event::SharedEvent;
use uuid::Uuid;

use crate::domain::aggregates::User;
use crate::domain::errors::AuthError;

/// Transaction-scoped access to users and their sessions.
///
/// Every user returned by a lookup or passed to `add` is tracked so
/// `collect_events` can harvest its events even if it is never persisted.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts a new user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserExists` if the id or email is taken.
    async fn add(&self, user: &User) -> Result<(), AuthError>;

    /// Loads a user by id.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if no user matches.
    async fn get_by_id(&self, user_id: Uuid) -> Result<User, AuthError>;

    /// Loads a user by email.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if no user matches.
    async fn get_by_email(&self, email: &str) -> Result<User, AuthError>;

    /// Loads the user owning the session with refresh secret `secret`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if no session matches.
    async fn get_by_authorization_secret(&self, secret: &str) -> Result<User, AuthError>;

    /// Writes back the changed state of a loaded or added user: profile
    /// fields, new sessions and session expiry/logout.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserExists` on a uniqueness violation.
    async fn persist(&self, user: &User) -> Result<(), AuthError>;

    /// Drains the events of every user this repository handed out.
    fn collect_events(&self) -> Vec<SharedEvent>;

    /// Releases the repository.
    async fn close(&self);
}
