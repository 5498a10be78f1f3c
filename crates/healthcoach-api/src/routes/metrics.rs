//! Routes for the Metric bounded context.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Json, Router, routing::get, routing::post};
use chrono::{DateTime, Utc};
use healthcoach_core::scope::Scope;
use healthcoach_metric::application::{command_handlers, query_handlers};
use healthcoach_metric::domain::aggregates::Metric;
use healthcoach_metric::domain::commands;
use healthcoach_store::StorageBackend;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::state::AppState;

/// Request body for POST /.
#[derive(Debug, Deserialize)]
pub struct RecordMetricRequest {
    /// Identifier chosen by the client; generated when absent.
    #[serde(default)]
    pub metric_id: Option<Uuid>,
    /// Beats per minute.
    pub heart_rate: i32,
    /// Body weight.
    pub weight: i32,
    /// Body height.
    pub height: i32,
}

/// One measurement.
#[derive(Debug, Serialize)]
pub struct MetricResponse {
    /// Metric identifier.
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
}

impl From<Metric> for MetricResponse {
    fn from(metric: Metric) -> Self {
        Self {
            metric_id: metric.metric_id,
            trainee_id: metric.trainee_id,
            heart_rate: metric.heart_rate,
            weight: metric.weight,
            height: metric.height,
            created_at: metric.created_at,
        }
    }
}

/// Response body for GET /trainees/{trainee_id}/metrics.
#[derive(Debug, Serialize)]
pub struct MetricListResponse {
    /// Oldest measurement first.
    pub metrics: Vec<MetricResponse>,
}

/// POST /
#[instrument(skip(state, user, request), fields(trainee_id = %user.user_id))]
async fn record_metric<D: StorageBackend>(
    State(state): State<AppState<D>>,
    user: CurrentUser,
    Json(request): Json<RecordMetricRequest>,
) -> Result<(StatusCode, Json<MetricResponse>), ApiError> {
    if request.heart_rate <= 0 || request.weight <= 0 || request.height <= 0 {
        return Err(ApiError::Validation(
            "heart_rate, weight and height must be positive".into(),
        ));
    }

    let command = commands::RecordMetric {
        correlation_id: Uuid::new_v4(),
        metric_id: request.metric_id.unwrap_or_else(Uuid::now_v7),
        trainee_id: user.user_id,
        heart_rate: request.heart_rate,
        weight: request.weight,
        height: request.height,
    };

    info!(correlation_id = %command.correlation_id, "handling record_metric command");

    let metric = command_handlers::handle_record_metric(
        &command,
        &Scope::new(),
        &state.metrics,
        state.clock.as_ref(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(metric.into())))
}

/// GET /{metric_id}
#[instrument(skip(state, _user))]
async fn get_metric<D: StorageBackend>(
    State(state): State<AppState<D>>,
    _user: CurrentUser,
    Path(metric_id): Path<Uuid>,
) -> Result<Json<MetricResponse>, ApiError> {
    let metric = query_handlers::get_metric(metric_id, &Scope::new(), &state.metrics).await?;

    Ok(Json(metric.into()))
}

/// GET /{trainee_id}/metrics
#[instrument(skip(state, _user))]
async fn list_metrics<D: StorageBackend>(
    State(state): State<AppState<D>>,
    _user: CurrentUser,
    Path(trainee_id): Path<Uuid>,
) -> Result<Json<MetricListResponse>, ApiError> {
    let metrics =
        query_handlers::list_metrics_by_trainee(trainee_id, &Scope::new(), &state.metrics).await?;

    Ok(Json(MetricListResponse {
        metrics: metrics.into_iter().map(MetricResponse::from).collect(),
    }))
}

/// Returns the router for the metric context.
pub fn router<D: StorageBackend>() -> Router<AppState<D>> {
    Router::new()
        .route("/", post(record_metric::<D>))
        .route("/{metric_id}", get(get_metric::<D>))
}

/// Returns the per-trainee metric listings.
pub fn trainee_router<D: StorageBackend>() -> Router<AppState<D>> {
    Router::new().route("/{trainee_id}/metrics", get(list_metrics::<D>))
}
