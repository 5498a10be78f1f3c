//! Domain events for the Profile context.

use std::any::Any;

use chrono::{DateTime, Utc};
use healthcoach_core::event::DomainEvent;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event type of [`ProfileEventKind::ProfileCreated`].
pub const PROFILE_CREATED: &str = "profile.created";

/// Emitted when a trainee or coach profile is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileCreated {
    /// `"trainee"` or `"coach"`.
    pub profile_type: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
}

/// Event payload variants for the Profile context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProfileEventKind {
    /// A profile has been created.
    ProfileCreated(ProfileCreated),
}

/// Domain event envelope for the Profile context.
#[derive(Debug, Clone)]
pub struct ProfileEvent {
    /// The profile owner.
    pub user_id: Uuid,
    /// When the event was raised.
    pub occurred_at: DateTime<Utc>,
    /// Event-specific payload.
    pub kind: ProfileEventKind,
}

impl DomainEvent for ProfileEvent {
    fn event_type(&self) -> &'static str {
        match &self.kind {
            ProfileEventKind::ProfileCreated(_) => PROFILE_CREATED,
        }
    }

    fn published_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    fn to_payload(&self) -> serde_json::Value {
        serde_json::json!({
            "user_id": self.user_id,
            "event": serde_json::to_value(&self.kind).unwrap_or_default(),
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
