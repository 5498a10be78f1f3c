//! In-memory invite repository.

use async_trait::async_trait;
use healthcoach_core::event::SharedEvent;
use healthcoach_core::scope::Scope;
use healthcoach_core::tracking::SeenAggregates;
use healthcoach_invite::domain::aggregates::Invite;
use healthcoach_invite::domain::errors::InviteError;
use healthcoach_invite::domain::repository::InviteRepository;
use healthcoach_profile::domain::aggregates::Profile;
use uuid::Uuid;

use super::MemoryTransaction;

/// [`InviteRepository`] over a [`MemoryTransaction`].
#[derive(Debug)]
pub struct MemoryInviteRepository {
    tx: MemoryTransaction,
    scope: Scope,
    seen: SeenAggregates,
}

impl MemoryInviteRepository {
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

fn detach(invite: &Invite) -> Invite {
    Invite::restore(
        invite.invite_id,
        invite.group_id,
        invite.secret.clone(),
        invite.created_at,
        invite.valid_until,
        invite.accepted_by.clone(),
    )
}

#[async_trait]
impl InviteRepository for MemoryInviteRepository {
    async fn add(&self, invite: &Invite) -> Result<(), InviteError> {
        self.scope.ensure_active()?;
        self.tx.write(|t| {
            if t.invites.contains_key(&invite.invite_id) {
                return Err(InviteError::InviteExists);
            }
            if !t.groups.contains_key(&invite.group_id) {
                return Err(InviteError::GroupNotFound);
            }
            t.invites.insert(invite.invite_id, detach(invite));
            Ok(())
        })??;
        self.seen.track(invite);
        Ok(())
    }

    async fn get_by_id(&self, invite_id: Uuid) -> Result<Invite, InviteError> {
        self.scope.ensure_active()?;
        let invite = self
            .tx
            .read(|t| t.invites.get(&invite_id).map(detach))?
            .ok_or(InviteError::InviteNotFound)?;
        self.seen.track(&invite);
        Ok(invite)
    }

    async fn get_by_secret(&self, secret: &str) -> Result<Invite, InviteError> {
        self.scope.ensure_active()?;
        let invite = self
            .tx
            .read(|t| {
                t.invites
                    .values()
                    .filter(|i| i.secret == secret)
                    .max_by_key(|i| i.created_at)
                    .map(detach)
            })?
            .ok_or(InviteError::InviteNotFound)?;
        self.seen.track(&invite);
        Ok(invite)
    }

    async fn persist(&self, invite: &Invite) -> Result<(), InviteError> {
        self.scope.ensure_active()?;
        self.tx.write(|t| {
            if !t.invites.contains_key(&invite.invite_id) {
                return Err(InviteError::InviteNotFound);
            }
            let all_trainees = invite
                .accepted_by
                .keys()
                .all(|id| matches!(t.profiles.get(id), Some(Profile::Trainee(_))));
            if !all_trainees {
                return Err(InviteError::TraineeNotFound);
            }
            t.invites.insert(invite.invite_id, detach(invite));
            Ok(())
        })??;
        self.seen.track(invite);
        Ok(())
    }

    fn collect_events(&self) -> Vec<SharedEvent> {
        self.seen.collect_events()
    }

    async fn close(&self) {
        tracing::trace!(tracked = self.seen.len(), "invite repository closed");
    }
}
