//! Commands for the Auth context.

use healthcoach_core::command::Command;
use uuid::Uuid;

use crate::domain::aggregates::Device;

/// Command to register a new user.
#[derive(Clone)]
pub struct CreateUser {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The identifier chosen for the user.
    pub user_id: Uuid,
    /// The user's email.
    pub email: String,
    /// The plaintext password.
    pub password: String,
}

/// Command to open a session with email and password.
#[derive(Clone)]
pub struct Login {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The user's email.
    pub email: String,
    /// The plaintext password.
    pub password: String,
    /// The device the request came from.
    pub device: Device,
}

/// Command to close a session.
#[derive(Debug, Clone)]
pub struct Logout {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The session owner.
    pub user_id: Uuid,
    /// The session to close.
    pub authorization_id: String,
}

/// Command to mint a new access token from a refresh token.
#[derive(Clone)]
pub struct Refresh {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The session secret handed out at login.
    pub refresh_token: String,
}

// Passwords and refresh tokens stay out of logs.

impl std::fmt::Debug for CreateUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateUser")
            .field("correlation_id", &self.correlation_id)
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for Login {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Login")
            .field("correlation_id", &self.correlation_id)
            .field("email", &self.email)
            .field("device", &self.device)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for Refresh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Refresh")
            .field("correlation_id", &self.correlation_id)
            .finish_non_exhaustive()
    }
}

impl Command for CreateUser {
    fn command_type(&self) -> &'static str {
        "auth.create_user"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

impl Command for Login {
    fn command_type(&self) -> &'static str {
        "auth.login"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

impl Command for Logout {
    fn command_type(&self) -> &'static str {
        "auth.logout"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

impl Command for Refresh {
    fn command_type(&self) -> &'static str {
        "auth.refresh"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
