//! Domain events for the Group context.

use std::any::Any;

use chrono::{DateTime, Utc};
use healthcoach_core::event::DomainEvent;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event type of [`GroupEventKind::GroupCreated`].
pub const GROUP_CREATED: &str = "group.created";

/// Emitted when a coach creates a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCreated {
    /// The owning coach.
    pub coach_id: Uuid,
    /// The group name.
    pub name: String,
}

/// Event payload variants for the Group context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupEventKind {
    /// A group has been created.
    GroupCreated(GroupCreated),
}

/// Domain event envelope for the Group context.
#[derive(Debug, Clone)]
pub struct GroupEvent {
    /// The group the event belongs to.
    pub group_id: Uuid,
    /// When the event was raised.
    pub occurred_at: DateTime<Utc>,
    /// Event-specific payload.
    pub kind: GroupEventKind,
}

impl DomainEvent for GroupEvent {
    fn event_type(&self) -> &'static str {
        match &self.kind {
            GroupEventKind::GroupCreated(_) => GROUP_CREATED,
        }
    }

    fn published_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    fn to_payload(&self) -> serde_json::Value {
        serde_json::json!({
            "group_id": self.group_id,
            "event": serde_json::to_value(&self.kind).unwrap_or_default(),
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
