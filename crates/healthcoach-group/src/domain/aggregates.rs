//! Aggregate roots for the Group context.

use chrono::{DateTime, Utc};
use healthcoach_core::aggregate::{AggregateRoot, EventOutbox};
use healthcoach_core::clock::Clock;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::events::{GroupCreated, GroupEvent, GroupEventKind};

/// Largest page a listing may request.
pub const MAX_PAGE_SIZE: i64 = 100;

/// A `LIMIT`/`OFFSET` window over a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Maximum number of rows.
    pub limit: i64,
    /// Rows to skip.
    pub offset: i64,
}

impl Page {
    /// Creates a page, clamping `limit` to `1..=MAX_PAGE_SIZE` and `offset` to
    /// non-negative values.
    #[must_use]
    pub fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit: limit.clamp(1, MAX_PAGE_SIZE),
            offset: offset.max(0),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(20, 0)
    }
}

/// A trainee who accepted one of the group's invites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Member {
    /// The trainee.
    pub trainee_id: Uuid,
    /// The trainee's login email.
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
}

/// The aggregate root for a coach-owned group.
#[derive(Debug, Clone)]
pub struct Group {
    /// Aggregate identifier.
    pub group_id: Uuid,
    /// The owning coach.
    pub coach_id: Uuid,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
    outbox: EventOutbox,
}

impl Group {
    /// Creates a group and raises `group.created`.
    #[must_use]
    pub fn create(
        group_id: Uuid,
        coach_id: Uuid,
        name: String,
        description: String,
        clock: &dyn Clock,
    ) -> Self {
        let now = clock.now();
        let group = Self::restore(group_id, coach_id, name, description, now, now);
        group.push_event(GroupEvent {
            group_id,
            occurred_at: now,
            kind: GroupEventKind::GroupCreated(GroupCreated {
                coach_id,
                name: group.name.clone(),
            }),
        });
        group
    }

    /// Rebuilds a group from storage without raising events.
    #[must_use]
    pub fn restore(
        group_id: Uuid,
        coach_id: Uuid,
        name: String,
        description: String,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            group_id,
            coach_id,
            name,
            description,
            created_at,
            updated_at,
            outbox: EventOutbox::new(),
        }
    }

    /// Returns `true` if `user_id` owns the group.
    #[must_use]
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.coach_id == user_id
    }
}

impl AggregateRoot for Group {
    fn aggregate_id(&self) -> String {
        self.group_id.to_string()
    }

    fn outbox(&self) -> &EventOutbox {
        &self.outbox
    }
}
