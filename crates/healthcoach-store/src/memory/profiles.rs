//! In-memory profile repository.

use async_trait::async_trait;
use healthcoach_core::error::StorageError;
use healthcoach_core::event::SharedEvent;
use healthcoach_core::scope::Scope;
use healthcoach_core::tracking::SeenAggregates;
use healthcoach_profile::domain::aggregates::{Coach, Profile, Trainee};
use healthcoach_profile::domain::errors::ProfileError;
use healthcoach_profile::domain::repository::ProfileRepository;
use uuid::Uuid;

use super::MemoryTransaction;

/// [`ProfileRepository`] over a [`MemoryTransaction`].
#[derive(Debug)]
pub struct MemoryProfileRepository {
    tx: MemoryTransaction,
    scope: Scope,
    seen: SeenAggregates,
}

impl MemoryProfileRepository {
    /// Creates a repository bound to `tx`.
    #[must_use]
    pub fn new(scope: Scope, tx: MemoryTransaction) -> Self {
        Self {
            tx,
            scope,
            seen: SeenAggregates::new(),
        }
    }
}

pub(crate) fn detach(profile: &Profile) -> Profile {
    match profile {
        Profile::Trainee(t) => Profile::Trainee(Trainee::restore(
            t.user_id,
            t.first_name.clone(),
            t.last_name.clone(),
            t.birth_date,
        )),
        Profile::Coach(c) => Profile::Coach(Coach::restore(
            c.user_id,
            c.first_name.clone(),
            c.last_name.clone(),
            c.birth_date,
            c.years_experience,
            c.bio.clone(),
        )),
    }
}

#[async_trait]
impl ProfileRepository for MemoryProfileRepository {
    async fn add(&self, profile: &Profile) -> Result<(), ProfileError> {
        self.scope.ensure_active()?;
        let user_id = profile.user_id();
        self.tx.write(|t| {
            if t.profiles.contains_key(&user_id) {
                return Err(ProfileError::ProfileExists);
            }
            if !t.users.contains_key(&user_id) {
                return Err(StorageError::ForeignKey(format!("profile user {user_id}")).into());
            }
            t.profiles.insert(user_id, detach(profile));
            Ok(())
        })??;
        self.seen.track(profile);
        Ok(())
    }

    async fn get_by_id(&self, user_id: Uuid) -> Result<Profile, ProfileError> {
        self.scope.ensure_active()?;
        let profile = self
            .tx
            .read(|t| t.profiles.get(&user_id).map(detach))?
            .ok_or(ProfileError::ProfileNotFound)?;
        self.seen.track(&profile);
        Ok(profile)
    }

    fn collect_events(&self) -> Vec<SharedEvent> {
        self.seen.collect_events()
    }

    async fn close(&self) {
        tracing::trace!(tracked = self.seen.len(), "profile repository closed");
    }
}
