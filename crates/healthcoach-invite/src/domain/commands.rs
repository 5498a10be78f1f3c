//! Commands for the Invite context.

use healthcoach_core::command::Command;
use uuid::Uuid;

/// Command to open an invite for a group.
#[derive(Debug, Clone)]
pub struct CreateInvite {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The invited group.
    pub group_id: Uuid,
}

/// Command to join a group with an invite secret.
#[derive(Debug, Clone)]
pub struct AcceptInvite {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The trainee joining.
    pub trainee_id: Uuid,
    /// The secret shared by the coach.
    pub secret: String,
}

impl Command for CreateInvite {
    fn command_type(&self) -> &'static str {
        "invite.create_invite"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

impl Command for AcceptInvite {
    fn command_type(&self) -> &'static str {
        "invite.accept_invite"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
