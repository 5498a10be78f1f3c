//! `PostgreSQL` metric repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use healthcoach_core::error::StorageError;
use healthcoach_core::event::SharedEvent;
use healthcoach_core::scope::Scope;
use healthcoach_core::tracking::SeenAggregates;
use healthcoach_metric::domain::aggregates::Metric;
use healthcoach_metric::domain::errors::MetricError;
use healthcoach_metric::domain::repository::MetricRepository;
use uuid::Uuid;

use super::{PgTransaction, connection, run};

const INSERT_METRIC: &str = r"
INSERT INTO metrics (metric_id, trainee_id, heart_rate, weight, height, created_at)
VALUES ($1, $2, $3, $4, $5, $6)
";

const SELECT_BY_ID: &str = r"
SELECT metric_id, trainee_id, heart_rate, weight, height, created_at
FROM metrics
WHERE metric_id = $1
";

const SELECT_BY_TRAINEE: &str = r"
SELECT metric_id, trainee_id, heart_rate, weight, height, created_at
FROM metrics
WHERE trainee_id = $1
ORDER BY created_at, metric_id
";

#[derive(sqlx::FromRow)]
struct MetricRow {
    metric_id: Uuid,
    trainee_id: Uuid,
    heart_rate: i32,
    weight: i32,
    height: i32,
    created_at: DateTime<Utc>,
}

impl From<MetricRow> for Metric {
    fn from(row: MetricRow) -> Self {
        Metric::restore(
            row.metric_id,
            row.trainee_id,
            row.heart_rate,
            row.weight,
            row.height,
            row.created_at,
        )
    }
}

/// [`MetricRepository`] over a [`PgTransaction`].
#[derive(Debug)]
pub struct PgMetricRepository {
    tx: PgTransaction,
    scope: Scope,
    seen: SeenAggregates,
}

impl PgMetricRepository {
    /// Creates a repository bound to `tx`.
    #[must_use]
    pub fn new(scope: Scope, tx: PgTransaction) -> Self {
        Self {
            tx,
            scope,
            seen: SeenAggregates::new(),
        }
    }
}

#[async_trait]
impl MetricRepository for PgMetricRepository {
    async fn add(&self, metric: &Metric) -> Result<(), MetricError> {
        let mut guard = self.tx.lock().await;
        let conn = connection(&mut guard)?;

        run(
            &self.scope,
            sqlx::query(INSERT_METRIC)
                .bind(metric.metric_id)
                .bind(metric.trainee_id)
                .bind(metric.heart_rate)
                .bind(metric.weight)
                .bind(metric.height)
                .bind(metric.created_at)
                .execute(&mut *conn),
        )
        .await
        .map_err(|err| match err {
            StorageError::Conflict(_) => MetricError::MetricExists,
            StorageError::ForeignKey(_) => MetricError::TraineeNotFound,
            other => other.into(),
        })?;

        self.seen.track(metric);
        Ok(())
    }

    async fn get_by_id(&self, metric_id: Uuid) -> Result<Metric, MetricError> {
        let mut guard = self.tx.lock().await;
        let conn = connection(&mut guard)?;

        let metric: Metric = run(
            &self.scope,
            sqlx::query_as::<_, MetricRow>(SELECT_BY_ID)
                .bind(metric_id)
                .fetch_optional(&mut *conn),
        )
        .await?
        .ok_or(MetricError::MetricNotFound)?
        .into();

        self.seen.track(&metric);
        Ok(metric)
    }

    async fn list_by_trainee(&self, trainee_id: Uuid) -> Result<Vec<Metric>, MetricError> {
        let mut guard = self.tx.lock().await;
        let conn = connection(&mut guard)?;

        let rows = run(
            &self.scope,
            sqlx::query_as::<_, MetricRow>(SELECT_BY_TRAINEE)
                .bind(trainee_id)
                .fetch_all(&mut *conn),
        )
        .await?;

        let metrics: Vec<Metric> = rows.into_iter().map(Metric::from).collect();
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
