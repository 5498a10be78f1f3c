//! Domain events for the Auth context.

use std::any::Any;

use chrono::{DateTime, Utc};
use healthcoach_core::event::DomainEvent;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::aggregates::Device;

/// Event type of [`UserEventKind::UserCreated`].
pub const USER_CREATED: &str = "user.created";
/// Event type of [`UserEventKind::UserLoggedIn`].
pub const USER_LOGIN: &str = "user.login";
/// Event type of [`UserEventKind::UserLoggedOut`].
pub const USER_LOGOUT: &str = "user.logout";

/// Emitted when a user registers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCreated {
    /// The registered email.
    pub email: String,
}

/// Emitted when a user opens a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserLoggedIn {
    /// The new session identifier.
    pub authorization_id: String,
    /// The device the session was opened from.
    pub device: Device,
}

/// Emitted when a user closes a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserLoggedOut {
    /// The closed session identifier.
    pub authorization_id: String,
}

/// Event payload variants for the Auth context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserEventKind {
    /// A user has registered.
    UserCreated(UserCreated),
    /// A session has been opened.
    UserLoggedIn(UserLoggedIn),
    /// A session has been closed.
    UserLoggedOut(UserLoggedOut),
}

/// Domain event envelope for the Auth context.
#[derive(Debug, Clone)]
pub struct UserEvent {
    /// The user the event belongs to.
    pub user_id: Uuid,
    /// When the event was raised.
    pub occurred_at: DateTime<Utc>,
    /// Event-specific payload.
    pub kind: UserEventKind,
}

impl DomainEvent for UserEvent {
    fn event_type(&self) -> &'static str {
        match &self.kind {
            UserEventKind::UserCreated(_) => USER_CREATED,
            UserEventKind::UserLoggedIn(_) => USER_LOGIN,
            UserEventKind::UserLoggedOut(_) => USER_LOGOUT,
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
