//! Routes for the Invite bounded context.

use axum::extract::State;
use axum::{Json, Router, routing::post};
use chrono::{DateTime, Utc};
use healthcoach_core::scope::Scope;
use healthcoach_invite::application::command_handlers;
use healthcoach_invite::domain::commands;
use healthcoach_store::StorageBackend;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::state::AppState;

/// Request body for POST /accept.
#[derive(Deserialize)]
pub struct AcceptInviteRequest {
    /// Secret shared by the coach.
    pub secret: String,
}

/// Response body for POST /accept.
#[derive(Debug, Serialize)]
pub struct AcceptInviteResponse {
    /// The group the trainee joined.
    pub group_id: Uuid,
    /// When the acceptance was recorded.
    pub accepted_at: Option<DateTime<Utc>>,
}

/// POST /accept
#[instrument(skip(state, user, request), fields(trainee_id = %user.user_id))]
async fn accept_invite<D: StorageBackend>(
    State(state): State<AppState<D>>,
    user: CurrentUser,
    Json(request): Json<AcceptInviteRequest>,
) -> Result<Json<AcceptInviteResponse>, ApiError> {
    let command = commands::AcceptInvite {
        correlation_id: Uuid::new_v4(),
        trainee_id: user.user_id,
        secret: request.secret.trim().to_string(),
    };

    info!(correlation_id = %command.correlation_id, "handling accept_invite command");

    let invite = command_handlers::handle_accept_invite(
        &command,
        &Scope::new(),
        &state.invites,
        state.clock.as_ref(),
    )
    .await?;

    Ok(Json(AcceptInviteResponse {
        group_id: invite.group_id,
        accepted_at: invite.accepted_by.get(&user.user_id).copied(),
    }))
}

/// Returns the router for the invite context.
pub fn router<D: StorageBackend>() -> Router<AppState<D>> {
    Router::new().route("/accept", post(accept_invite::<D>))
}
