//! Repository contract for invites.

use async_trait::async_trait;
use healthcoach_core::event::SharedEvent;
use uuid::Uuid;

use crate::domain::aggregates::Invite;
use crate::domain::errors::InviteError;

/// Transaction-scoped access to invites and their acceptances.
#[async_trait]
pub trait InviteRepository: Send + Sync {
    /// Inserts a new invite.
    ///
    /// # Errors
    ///
    /// Returns `InviteError::InviteExists` on a duplicate id and
    /// `InviteError::GroupNotFound` if the group does not exist.
    async fn add(&self, invite: &Invite) -> Result<(), InviteError>;

    /// Loads an invite with its acceptances.
    ///
    /// # Errors
    ///
    /// Returns `InviteError::InviteNotFound` if no invite matches.
    async fn get_by_id(&self, invite_id: Uuid) -> Result<Invite, InviteError>;

    /// Loads the most recent invite carrying `secret`.
    ///
    /// # Errors
    ///
    /// Returns `InviteError::InviteNotFound` if no invite matches.
    async fn get_by_secret(&self, secret: &str) -> Result<Invite, InviteError>;

    /// Stores acceptances added since the invite was loaded.
    ///
    /// # Errors
    ///
    /// Returns `InviteError::InviteNotFound` if the invite was never stored.
    async fn persist(&self, invite: &Invite) -> Result<(), InviteError>;

    /// Drains the events of every invite this repository handed out.
    fn collect_events(&self) -> Vec<SharedEvent>;

    /// Releases the repository.
    async fn close(&self);
}
