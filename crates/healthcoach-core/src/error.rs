//! Storage error types shared by every adapter and bounded context.

use thiserror::Error;

/// Errors raised by the storage transaction primitive and repositories.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// The scope the operation ran under was cancelled.
    #[error("operation cancelled")]
    Cancelled,

    /// The transaction was already committed or rolled back.
    #[error("transaction already closed")]
    TransactionClosed,

    /// A uniqueness constraint was violated.
    #[error("constraint violated: {0}")]
    Conflict(String),

    /// A referenced row does not exist.
    #[error("foreign key violated: {0}")]
    ForeignKey(String),

    /// Any other backend failure.
    #[error("internal storage error: {0}")]
    Backend(String),
}

impl StorageError {
    /// Wraps an arbitrary backend error.
    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }
}
