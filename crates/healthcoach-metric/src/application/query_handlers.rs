//! Query handlers for the Metric context.

use healthcoach_core::scope::Scope;
use healthcoach_core::storage::Database;
use healthcoach_core::unit_of_work::AtomicError;
use uuid::Uuid;

use crate::application::context::MetricUnitOfWork;
use crate::domain::aggregates::Metric;
use crate::domain::errors::MetricError;

/// Loads a metric by id.
///
/// # Errors
///
/// Returns `MetricError::MetricNotFound` (as a business error) if no metric
/// matches.
pub async fn get_metric<D: Database>(
    metric_id: Uuid,
    scope: &Scope,
    uow: &MetricUnitOfWork<D>,
) -> Result<Metric, AtomicError<MetricError>> {
    uow.atomic(scope, |ctx| async move { ctx.metrics().get_by_id(metric_id).await })
        .await
}

/// Lists every metric of a trainee, oldest first.
///
/// # Errors
///
/// Returns a storage error if the listing fails.
pub async fn list_metrics_by_trainee<D: Database>(
    trainee_id: Uuid,
    scope: &Scope,
    uow: &MetricUnitOfWork<D>,
) -> Result<Vec<Metric>, AtomicError<MetricError>> {
    uow.atomic(scope, |ctx| async move { ctx.metrics().list_by_trainee(trainee_id).await })
        .await
}
