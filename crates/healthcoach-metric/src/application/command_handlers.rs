//! Command handlers for the Metric context.

use healthcoach_core::clock::Clock;
use healthcoach_core::command::Command;
use healthcoach_core::scope::Scope;
use healthcoach_core::storage::Database;
use healthcoach_core::unit_of_work::{AtomicContext, AtomicError};
use tracing::Instrument;

use crate::application::context::MetricUnitOfWork;
use crate::domain::aggregates::Metric;
use crate::domain::commands::RecordMetric;
use crate::domain::errors::MetricError;

/// Handles the `RecordMetric` command.
///
/// # Errors
///
/// Returns `MetricError::MetricExists` (as a business error) on a duplicate
/// id and `MetricError::TraineeNotFound` for an unknown trainee.
pub async fn handle_record_metric<D: Database>(
    command: &RecordMetric,
    scope: &Scope,
    uow: &MetricUnitOfWork<D>,
    clock: &dyn Clock,
) -> Result<Metric, AtomicError<MetricError>> {
    uow.atomic(scope, |ctx| async move {
        let metric = Metric::record(
            command.metric_id,
            command.trainee_id,
            command.heart_rate,
            command.weight,
            command.height,
            clock,
        );
        ctx.metrics().add(&metric).await?;
        ctx.commit().await?;
        Ok::<_, MetricError>(metric)
    })
    .instrument(command.span())
    .await
}
