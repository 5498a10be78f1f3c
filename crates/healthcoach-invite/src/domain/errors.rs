//! Error type for the Invite context.

use healthcoach_core::error::StorageError;
use thiserror::Error;

/// Errors raised by invite operations.
#[derive(Debug, Error)]
pub enum InviteError {
    /// An invite with the same id already exists.
    #[error("invite already exists")]
    InviteExists,

    /// No invite matches the lookup.
    #[error("invite not found")]
    InviteNotFound,

    /// The invited group does not exist.
    #[error("group not found")]
    GroupNotFound,

    /// The accepting user has no trainee profile.
    #[error("trainee not found")]
    TraineeNotFound,

    /// The invite's validity window has passed.
    #[error("invite expired")]
    Expired,

    /// The trainee already accepted this invite.
    #[error("invite already accepted")]
    AlreadyAccepted,

    /// The presented secret does not match.
    #[error("invalid invite secret")]
    InvalidSecret,

    /// Storage failure.
    #[error(transparent)]
    Storage(#[from] StorageError),
}
