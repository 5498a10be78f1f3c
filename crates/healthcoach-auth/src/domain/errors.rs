//! Error type for the Auth context.

use healthcoach_core::error::StorageError;
use thiserror::Error;

/// Errors raised by users, sessions and access tokens.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A user with the same id or email already exists.
    #[error("user already exists")]
    UserExists,

    /// No user matches the lookup.
    #[error("user not found")]
    UserNotFound,

    /// Email or password is wrong.
    #[error("email or password is invalid")]
    InvalidCredentials,

    /// The session is unknown or already closed.
    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),

    /// The session exists but expired or was logged out.
    #[error("authorization is not active")]
    InactiveSession,

    /// The access token failed signature or expiry checks.
    #[error("invalid access token")]
    InvalidAccessToken,

    /// The password could not be hashed.
    #[error("password hashing failed: {0}")]
    Hashing(String),

    /// The access token could not be signed.
    #[error("token signing failed: {0}")]
    Signing(String),

    /// Storage failure.
    #[error(transparent)]
    Storage(#[from] StorageError),
}
