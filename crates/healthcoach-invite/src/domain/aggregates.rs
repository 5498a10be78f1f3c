//! Aggregate root for the Invite context.

use chrono::{DateTime, Duration, Utc};
use healthcoach_core::aggregate::{AggregateRoot, EventOutbox};
use healthcoach_core::clock::Clock;
use healthcoach_core::rng::TokenGenerator;
use indexmap::IndexMap;
use uuid::Uuid;

use crate::domain::errors::InviteError;
use crate::domain::events::{InviteAccepted, InviteCreated, InviteEvent, InviteEventKind};

/// Minutes an invite stays open after creation.
pub const INVITE_TTL_MINUTES: i64 = 10;
/// Random bytes in an invite secret (hex-encoded to twice as many chars).
pub const INVITE_SECRET_BYTES: usize = 3;

/// A time-limited secret that lets trainees join a group.
#[derive(Debug, Clone)]
pub struct Invite {
    /// Aggregate identifier.
    pub invite_id: Uuid,
    /// The group the invite joins.
    pub group_id: Uuid,
    /// Short secret shared by the coach.
    pub secret: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// End of the validity window.
    pub valid_until: DateTime<Utc>,
    /// Trainees that accepted, with their acceptance time, in acceptance order.
    pub accepted_by: IndexMap<Uuid, DateTime<Utc>>,
    outbox: EventOutbox,
}

impl Invite {
    /// Opens an invite with a fresh secret and raises `invite.created`.
    #[must_use]
    pub fn open(
        invite_id: Uuid,
        group_id: Uuid,
        generator: &dyn TokenGenerator,
        clock: &dyn Clock,
    ) -> Self {
        let now = clock.now();
        let invite = Self::restore(
            invite_id,
            group_id,
            generator.hex_token(INVITE_SECRET_BYTES),
            now,
            now + Duration::minutes(INVITE_TTL_MINUTES),
            IndexMap::new(),
        );
        invite.push_event(InviteEvent {
            invite_id,
            occurred_at: now,
            kind: InviteEventKind::InviteCreated(InviteCreated {
                group_id,
                valid_until: invite.valid_until,
            }),
        });
        invite
    }

    /// Rebuilds an invite from storage without raising events.
    #[must_use]
    pub fn restore(
        invite_id: Uuid,
        group_id: Uuid,
        secret: String,
        created_at: DateTime<Utc>,
        valid_until: DateTime<Utc>,
        accepted_by: IndexMap<Uuid, DateTime<Utc>>,
    ) -> Self {
        Self {
            invite_id,
            group_id,
            secret,
            created_at,
            valid_until,
            accepted_by,
            outbox: EventOutbox::new(),
        }
    }

    /// Returns `true` while the invite can still be accepted.
    #[must_use]
    pub fn is_open_at(&self, at: DateTime<Utc>) -> bool {
        at <= self.valid_until
    }

    /// Records `trainee_id` as a member and raises `invite.accepted`.
    ///
    /// # Errors
    ///
    /// Returns `InviteError::AlreadyAccepted` if the trainee accepted before,
    /// `InviteError::InvalidSecret` if `secret` does not match and
    /// `InviteError::Expired` once the validity window has passed.
    pub fn accept(
        &mut self,
        trainee_id: Uuid,
        secret: &str,
        clock: &dyn Clock,
    ) -> Result<DateTime<Utc>, InviteError> {
        if self.accepted_by.contains_key(&trainee_id) {
            return Err(InviteError::AlreadyAccepted);
        }
        if self.secret != secret {
            return Err(InviteError::InvalidSecret);
        }
        let now = clock.now();
        if !self.is_open_at(now) {
            return Err(InviteError::Expired);
        }

        self.accepted_by.insert(trainee_id, now);
        self.push_event(InviteEvent {
            invite_id: self.invite_id,
            occurred_at: now,
            kind: InviteEventKind::InviteAccepted(InviteAccepted {
                group_id: self.group_id,
                trainee_id,
            }),
        });
        Ok(now)
    }
}

impl AggregateRoot for Invite {
    fn aggregate_id(&self) -> String {
        self.invite_id.to_string()
    }

    fn outbox(&self) -> &EventOutbox {
        &self.outbox
    }
}
