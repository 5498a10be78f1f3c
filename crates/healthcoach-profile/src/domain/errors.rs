//! Error type for the Profile context.

use healthcoach_core::error::StorageError;
use thiserror::Error;

/// Errors raised by profile operations.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// The user already has a profile.
    #[error("profile already exists")]
    ProfileExists,

    /// No profile of the requested kind exists for the user.
    #[error("profile not found")]
    ProfileNotFound,

    /// Storage failure.
    #[error(transparent)]
    Storage(#[from] StorageError),
}
