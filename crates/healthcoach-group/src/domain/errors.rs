//! Error type for the Group context.

use healthcoach_core::error::StorageError;
use healthcoach_profile::domain::errors::ProfileError;
use thiserror::Error;

/// Errors raised by group operations.
#[derive(Debug, Error)]
pub enum GroupError {
    /// A group with the same id already exists.
    #[error("group already exists")]
    GroupExists,

    /// No group matches the lookup.
    #[error("group not found")]
    GroupNotFound,

    /// Only users with a coach profile may own groups.
    #[error("user is not a coach")]
    NotACoach,

    /// Profile lookup failure.
    #[error(transparent)]
    Profile(#[from] ProfileError),

    /// Storage failure.
    #[error(transparent)]
    Storage(#[from] StorageError),
}
