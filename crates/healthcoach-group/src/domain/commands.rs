//! Commands for the Group context.

use healthcoach_core::command::Command;
use uuid::Uuid;

/// Command to create a group owned by a coach.
#[derive(Debug, Clone)]
pub struct CreateGroup {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The identifier for the new group.
    pub group_id: Uuid,
    /// The owning coach.
    pub coach_id: Uuid,
    /// The group name.
    pub name: String,
    /// Free-form description.
    pub description: String,
}

impl Command for CreateGroup {
    fn command_type(&self) -> &'static str {
        "group.create_group"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
