//! Commands for the Metric context.

use healthcoach_core::command::Command;
use uuid::Uuid;

/// Command to record one measurement for a trainee.
#[derive(Debug, Clone)]
pub struct RecordMetric {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Caller-chosen metric id.
    pub metric_id: Uuid,
    /// The measured trainee.
    pub trainee_id: Uuid,
    /// Beats per minute.
    pub heart_rate: i32,
    /// Body weight.
    pub weight: i32,
    /// Body height.
    pub height: i32,
}

impl Command for RecordMetric {
    fn command_type(&self) -> &'static str {
        "metric.record_metric"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
