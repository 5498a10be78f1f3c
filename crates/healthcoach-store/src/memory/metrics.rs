//! In-memory metric repository.

use async_trait::async_trait;
use healthcoach_core::event::SharedEvent;
use healthcoach_core::scope::Scope;
use healthcoach_core::tracking::SeenAggregates;
use healthcoach_metric::domain::aggregates::Metric;
use healthcoach_metric::domain::errors::MetricError;
use healthcoach_metric::domain::repository::MetricRepository;
use healthcoach_profile::domain::aggregates::Profile;
use uuid::Uuid;

use super::MemoryTransaction;

/// [`MetricRepository`] over a [`MemoryTransaction`].
#[derive(Debug)]
pub struct MemoryMetricRepository {
    tx: MemoryTransaction,
    scope: Scope,
    seen: SeenAggregates,
}

impl MemoryMetricRepository {
    /// Creates a repository bound to `tx`.
    #[must_use]
    pub fn new(scope: Scope, tx: MemoryTransaction) -> Self {
        Self {
            tx,
            scope,
            seen: SeenAggregates::new(),
        }
    }
}

fn detach(metric: &Metric) -> Metric {
    Metric::restore(
        metric.metric_id,
        metric.trainee_id,
        metric.heart_rate,
        metric.weight,
        metric.height,
        metric.created_at,
    )
}

#[async_trait]
impl MetricRepository for MemoryMetricRepository {
    async fn add(&self, metric: &Metric) -> Result<(), MetricError> {
        self.scope.ensure_active()?;
        self.tx.write(|t| {
            if t.metrics.contains_key(&metric.metric_id) {
                return Err(MetricError::MetricExists);
            }
            if !matches!(t.profiles.get(&metric.trainee_id), Some(Profile::Trainee(_))) {
                return Err(MetricError::TraineeNotFound);
            }
            t.metrics.insert(metric.metric_id, detach(metric));
            Ok(())
        })??;
        self.seen.track(metric);
        Ok(())
    }

    async fn get_by_id(&self, metric_id: Uuid) -> Result<Metric, MetricError> {
        self.scope.ensure_active()?;
        let metric = self
            .tx
            .read(|t| t.metrics.get(&metric_id).map(detach))?
            .ok_or(MetricError::MetricNotFound)?;
        self.seen.track(&metric);
        Ok(metric)
    }

    async fn list_by_trainee(&self, trainee_id: Uuid) -> Result<Vec<Metric>, MetricError> {
        self.scope.ensure_active()?;
        let mut metrics = self.tx.read(|t| {
            t.metrics
                .values()
                .filter(|m| m.trainee_id == trainee_id)
                .map(detach)
                .collect::<Vec<_>>()
        })?;
        metrics.sort_by_key(|m| m.created_at);
        for metric in &metrics {
            self.seen.track(metric);
        }
        Ok(metrics)
    }

    fn collect_events(&self) -> Vec<SharedEvent> {
        self.seen.collect_events()
    }

    async fn close(&self) {
        tracing::trace!(tracked = self.seen.len(), "metric repository closed");
    }
}
