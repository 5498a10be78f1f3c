//! Domain events for the Invite context.

use std::any::Any;

use chrono::{DateTime, Utc};
use healthcoach_core::event::DomainEvent;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event type of [`InviteEventKind::InviteCreated`].
pub const INVITE_CREATED: &str = "invite.created";
/// Event type of [`InviteEventKind::InviteAccepted`].
pub const INVITE_ACCEPTED: &str = "invite.accepted";

/// Emitted when a coach opens an invite for a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteCreated {
    /// The invited group.
    pub group_id: Uuid,
    /// End of the validity window.
    pub valid_until: DateTime<Utc>,
}

/// Emitted when a trainee joins a group through an invite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteAccepted {
    /// The joined group.
    pub group_id: Uuid,
    /// The trainee who joined.
    pub trainee_id: Uuid,
}

/// Event payload variants for the Invite context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InviteEventKind {
    /// An invite has been created.
    InviteCreated(InviteCreated),
    /// An invite has been accepted.
    InviteAccepted(InviteAccepted),
}

/// Domain event envelope for the Invite context.
#[derive(Debug, Clone)]
pub struct InviteEvent {
    /// The invite the event belongs to.
    pub invite_id: Uuid,
    /// When the event was raised.
    pub occurred_at: DateTime<Utc>,
    /// Event-specific payload.
    pub kind: InviteEventKind,
}

impl DomainEvent for InviteEvent {
    fn event_type(&self) -> &'static str {
        match &self.kind {
            InviteEventKind::InviteCreated(_) => INVITE_CREATED,
            InviteEventKind::InviteAccepted(_) => INVITE_ACCEPTED,
        }
    }

    fn published_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    fn to_payload(&self) -> serde_json::Value {
        serde_json::json!({
            "invite_id": self.invite_id,
            "event": serde_json::to_value(&self.kind).unwrap_or_default(),
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
