//! Error type for the Metric context.

use healthcoach_core::error::StorageError;
use thiserror::Error;

/// Errors raised by metric operations.
#[derive(Debug, Error)]
pub enum MetricError {
    /// A metric with the same id already exists.
    #[error("metric already exists")]
    MetricExists,

    /// No metric matches the lookup.
    #[error("metric not found")]
    MetricNotFound,

    /// The measured trainee does not exist.
    #[error("trainee not found")]
    TraineeNotFound,

    /// Storage failure.
    #[error(transparent)]
    Storage(#[from] StorageError),
}
