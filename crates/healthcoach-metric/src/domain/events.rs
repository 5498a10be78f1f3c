//! Domain events for the Metric context.

use std::any::Any;

use chrono::{DateTime, Utc};
use healthcoach_core::event::DomainEvent;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event type of [`MetricEventKind::MetricRecorded`].
pub const METRIC_RECORDED: &str = "metric.recorded";

/// Emitted when a trainee records a measurement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricRecorded {
    /// The measured trainee.
    pub trainee_id: Uuid,
}

/// Event payload variants for the Metric context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricEventKind {
    /// A measurement has been recorded.
    MetricRecorded(MetricRecorded),
}

/// Domain event envelope for the Metric context.
#[derive(Debug, Clone)]
pub struct MetricEvent {
    /// The recorded metric.
    pub metric_id: Uuid,
    /// When the event was raised.
    pub occurred_at: DateTime<Utc>,
    /// Event-specific payload.
    pub kind: MetricEventKind,
}

impl DomainEvent for MetricEvent {
    fn event_type(&self) -> &'static str {
        match &self.kind {
            MetricEventKind::MetricRecorded(_) => METRIC_RECORDED,
        }
    }

    fn published_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    fn to_payload(&self) -> serde_json::Value {
        serde_json::json!({
            "metric_id": self.metric_id,
            "event": serde_json::to_value(&self.kind).unwrap_or_default(),
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
