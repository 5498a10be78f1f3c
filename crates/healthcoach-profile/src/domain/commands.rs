//! Commands for the Profile context.

use chrono::NaiveDate;
use healthcoach_core::command::Command;
use uuid::Uuid;

/// Command to create a trainee profile.
#[derive(Debug, Clone)]
pub struct CreateTrainee {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The profile owner.
    pub user_id: Uuid,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Date of birth.
    pub birth_date: Option<NaiveDate>,
}

/// Command to create a coach profile.
#[derive(Debug, Clone)]
pub struct CreateCoach {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The profile owner.
    pub user_id: Uuid,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Date of birth.
    pub birth_date: Option<NaiveDate>,
    /// Years of coaching experience.
    pub years_experience: i32,
    /// Free-form biography.
    pub bio: String,
}

impl Command for CreateTrainee {
    fn command_type(&self) -> &'static str {
        "profile.create_trainee"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

impl Command for CreateCoach {
    fn command_type(&self) -> &'static str {
        "profile.create_coach"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
