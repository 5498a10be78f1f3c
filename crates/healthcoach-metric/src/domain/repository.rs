//! Repository contract for metrics.

use async_trait::async_trait;
use healthcoach_core::event::SharedEvent;
use uuid::Uuid;

use crate::domain::aggregates::Metric;
use crate::domain::errors::MetricError;

/// Transaction-scoped access to metrics.
#[async_trait]
pub trait MetricRepository: Send + Sync {
    /// Inserts a new metric.
    ///
    /// # Errors
    ///
    /// Returns `MetricError::MetricExists` on a duplicate id and
    /// `MetricError::TraineeNotFound` if the trainee does not exist.
    async fn add(&self, metric: &Metric) -> Result<(), MetricError>;

    /// Loads a metric by id.
    ///
    /// # Errors
    ///
    /// Returns `MetricError::MetricNotFound` if no metric matches.
    async fn get_by_id(&self, metric_id: Uuid) -> Result<Metric, MetricError>;

    /// Lists a trainee's metrics, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the query fails.
    async fn list_by_trainee(&self, trainee_id: Uuid) -> Result<Vec<Metric>, MetricError>;

    /// Drains the events of every metric this repository handed out.
    fn collect_events(&self) -> Vec<SharedEvent>;

    /// Releases the repository.
    async fn close(&self);
}
