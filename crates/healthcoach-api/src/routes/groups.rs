//! Routes for the Group bounded context, including invite creation.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Json, Router, routing::get, routing::post};
use chrono::{DateTime, Utc};
use healthcoach_core::scope::Scope;
use healthcoach_group::application::{command_handlers, query_handlers};
use healthcoach_group::domain::aggregates::{Group, Member, Page};
use healthcoach_group::domain::commands;
use healthcoach_invite::application::command_handlers as invite_handlers;
use healthcoach_invite::domain::commands::CreateInvite;
use healthcoach_store::StorageBackend;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::state::AppState;

/// Request body for POST /.
#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    /// Identifier chosen by the client; generated when absent.
    #[serde(default)]
    pub group_id: Option<Uuid>,
    /// Display name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
}

/// `limit`/`offset` query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    /// Maximum number of rows.
    pub limit: Option<i64>,
    /// Rows to skip.
    pub offset: Option<i64>,
}

impl PageQuery {
    fn page(&self) -> Page {
        let default = Page::default();
        Page::new(
            self.limit.unwrap_or(default.limit),
            self.offset.unwrap_or(default.offset),
        )
    }
}

/// A group.
#[derive(Debug, Serialize)]
pub struct GroupResponse {
    /// Group identifier.
    pub group_id: Uuid,
    /// The owning coach.
    pub coach_id: Uuid,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl From<Group> for GroupResponse {
    fn from(group: Group) -> Self {
        Self {
            group_id: group.group_id,
            coach_id: group.coach_id,
            name: group.name,
            description: group.description,
            created_at: group.created_at,
        }
    }
}

/// Response body for GET /.
#[derive(Debug, Serialize)]
pub struct GroupListResponse {
    /// One page of groups.
    pub groups: Vec<GroupResponse>,
}

/// Response body for GET /{group_id}/members.
#[derive(Debug, Serialize)]
pub struct MembersResponse {
    /// One page of members, earliest joiner first.
    pub members: Vec<Member>,
}

/// Response body for POST /{group_id}/invites.
#[derive(Debug, Serialize)]
pub struct InviteResponse {
    /// Invite identifier.
    pub invite_id: Uuid,
    /// The group the invite joins.
    pub group_id: Uuid,
    /// Secret to share with trainees.
    pub secret: String,
    /// Last instant the invite can be accepted.
    pub valid_until: DateTime<Utc>,
}

/// POST /
#[instrument(skip(state, user, request), fields(coach_id = %user.user_id))]
async fn create_group<D: StorageBackend>(
    State(state): State<AppState<D>>,
    user: CurrentUser,
    Json(request): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<GroupResponse>), ApiError> {
    if request.name.trim().is_empty() {
        return Err(ApiError::Validation("name must not be empty".into()));
    }

    let command = commands::CreateGroup {
        correlation_id: Uuid::new_v4(),
        group_id: request.group_id.unwrap_or_else(Uuid::now_v7),
        coach_id: user.user_id,
        name: request.name,
        description: request.description,
    };

    info!(correlation_id = %command.correlation_id, "handling create_group command");

    let group = command_handlers::handle_create_group(
        &command,
        &Scope::new(),
        &state.groups,
        state.clock.as_ref(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(group.into())))
}

/// GET /
#[instrument(skip(state, user), fields(user_id = %user.user_id))]
async fn list_groups<D: StorageBackend>(
    State(state): State<AppState<D>>,
    user: CurrentUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<GroupListResponse>, ApiError> {
    let groups =
        query_handlers::get_user_groups(user.user_id, query.page(), &Scope::new(), &state.groups)
            .await?;

    Ok(Json(GroupListResponse {
        groups: groups.into_iter().map(GroupResponse::from).collect(),
    }))
}

/// GET /{group_id}
#[instrument(skip(state, _user))]
async fn get_group<D: StorageBackend>(
    State(state): State<AppState<D>>,
    _user: CurrentUser,
    Path(group_id): Path<Uuid>,
) -> Result<Json<GroupResponse>, ApiError> {
    let group = query_handlers::get_group(group_id, &Scope::new(), &state.groups).await?;

    Ok(Json(group.into()))
}

/// GET /{group_id}/members
#[instrument(skip(state, _user))]
async fn get_members<D: StorageBackend>(
    State(state): State<AppState<D>>,
    _user: CurrentUser,
    Path(group_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Result<Json<MembersResponse>, ApiError> {
    let members =
        query_handlers::get_members(group_id, query.page(), &Scope::new(), &state.groups).await?;

    Ok(Json(MembersResponse { members }))
}

/// POST /{group_id}/invites
#[instrument(skip(state, user), fields(coach_id = %user.user_id))]
async fn create_invite<D: StorageBackend>(
    State(state): State<AppState<D>>,
    user: CurrentUser,
    Path(group_id): Path<Uuid>,
) -> Result<(StatusCode, Json<InviteResponse>), ApiError> {
    let scope = Scope::new();

    let group = query_handlers::get_group(group_id, &scope, &state.groups).await?;
    if !group.is_owned_by(user.user_id) {
        warn!(%group_id, "invite requested by a user who does not own the group");
        return Err(ApiError::Forbidden("only the group's coach can invite"));
    }

    let command = CreateInvite {
        correlation_id: Uuid::new_v4(),
        group_id,
    };

    info!(correlation_id = %command.correlation_id, "handling create_invite command");

    let invite = invite_handlers::handle_create_invite(
        &command,
        &scope,
        &state.invites,
        state.tokens.as_ref(),
        state.clock.as_ref(),
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(InviteResponse {
            invite_id: invite.invite_id,
            group_id: invite.group_id,
            secret: invite.secret,
            valid_until: invite.valid_until,
        }),
    ))
}

/// Returns the router for the group context.
pub fn router<D: StorageBackend>() -> Router<AppState<D>> {
    Router::new()
        .route("/", post(create_group::<D>).get(list_groups::<D>))
        .route("/{group_id}", get(get_group::<D>))
        .route("/{group_id}/members", get(get_members::<D>))
        .route("/{group_id}/invites", post(create_invite::<D>))
}
