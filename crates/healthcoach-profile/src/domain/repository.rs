//! Repository contract for profiles.

use async_trait::async_trait;
use healthcoach_core::event::SharedEvent;
use uuid::Uuid;

use crate::domain::aggregates::Profile;
use crate::domain::errors::ProfileError;

/// Transaction-scoped access to profiles.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Inserts a new profile.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::ProfileExists` if the user already has one.
    async fn add(&self, profile: &Profile) -> Result<(), ProfileError>;

    /// Loads the profile of `user_id`, whichever kind it is.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::ProfileNotFound` if the user has none.
    async fn get_by_id(&self, user_id: Uuid) -> Result<Profile, ProfileError>;

    /// Drains the events of every profile this repository handed out.
    fn collect_events(&self) -> Vec<SharedEvent>;

    /// Releases the repository.
    async fn close(&self);
}
