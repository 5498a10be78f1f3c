//! Aggregate root for the Metric context.

use chrono::{DateTime, Utc};
use healthcoach_core::aggregate::{AggregateRoot, EventOutbox};
use healthcoach_core::clock::Clock;
use uuid::Uuid;

use crate::domain::events::{MetricEvent, MetricEventKind, MetricRecorded};

/// A single body measurement taken by a trainee.
#[derive(Debug, Clone)]
pub struct Metric {
    /// Aggregate identifier.
    pub metric_id: Uuid,
    /// The measured trainee.
    pub trainee_id: Uuid,
    /// Beats per minute.
    pub heart_rate: i32,
    /// Body weight.
    pub weight: i32,
    /// Body height.
    pub height: i32,
    /// When the measurement was recorded.
    pub created_at: DateTime<Utc>,
    outbox: EventOutbox,
}

impl Metric {
    /// Records a measurement and raises `metric.recorded`.
    #[must_use]
    pub fn record(
        metric_id: Uuid,
        trainee_id: Uuid,
        heart_rate: i32,
        weight: i32,
        height: i32,
        clock: &dyn Clock,
    ) -> Self {
        let now = clock.now();
        let metric = Self::restore(metric_id, trainee_id, heart_rate, weight, height, now);
        metric.push_event(MetricEvent {
            metric_id,
            occurred_at: now,
            kind: MetricEventKind::MetricRecorded(MetricRecorded { trainee_id }),
        });
        metric
    }

    /// Rebuilds a metric from storage without raising events.
    #[must_use]
    pub fn restore(
        metric_id: Uuid,
        trainee_id: Uuid,
        heart_rate: i32,
        weight: i32,
        height: i32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            metric_id,
            trainee_id,
            heart_rate,
            weight,
            height,
            created_at,
            outbox: EventOutbox::new(),
        }
    }
}

impl AggregateRoot for Metric {
    fn aggregate_id(&self) -> String {
        self.metric_id.to_string()
    }

    fn outbox(&self) -> &EventOutbox {
        &self.outbox
    }
}
