//! Routes for the Profile bounded context.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Json, Router, routing::get, routing::post};
use chrono::NaiveDate;
use healthcoach_core::scope::Scope;
use healthcoach_profile::application::{command_handlers, query_handlers};
use healthcoach_profile::domain::aggregates::Profile;
use healthcoach_profile::domain::commands;
use healthcoach_store::StorageBackend;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::state::AppState;

/// Request body for POST /trainee.
#[derive(Debug, Deserialize)]
pub struct CreateTraineeRequest {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Date of birth.
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
}

/// Request body for POST /coach.
#[derive(Debug, Deserialize)]
pub struct CreateCoachRequest {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Date of birth.
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    /// Years of coaching experience.
    #[serde(default)]
    pub years_experience: i32,
    /// Free-form biography.
    #[serde(default)]
    pub bio: String,
}

/// A trainee or coach profile.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    /// The profile owner.
    pub user_id: Uuid,
    /// `trainee` or `coach`.
    pub profile_type: &'static str,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Date of birth.
    pub birth_date: Option<NaiveDate>,
    /// Coaches only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub years_experience: Option<i32>,
    /// Coaches only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

impl From<Profile> for ProfileResponse {
    fn from(profile: Profile) -> Self {
        let profile_type = profile.profile_type();
        match profile {
            Profile::Trainee(trainee) => Self {
                user_id: trainee.user_id,
                profile_type,
                first_name: trainee.first_name,
                last_name: trainee.last_name,
                birth_date: trainee.birth_date,
                years_experience: None,
                bio: None,
            },
            Profile::Coach(coach) => Self {
                user_id: coach.user_id,
                profile_type,
                first_name: coach.first_name,
                last_name: coach.last_name,
                birth_date: coach.birth_date,
                years_experience: Some(coach.years_experience),
                bio: Some(coach.bio),
            },
        }
    }
}

fn validate_names(first_name: &str, last_name: &str) -> Result<(), ApiError> {
    if first_name.trim().is_empty() || last_name.trim().is_empty() {
        return Err(ApiError::Validation(
            "first_name and last_name must not be empty".into(),
        ));
    }
    Ok(())
}

/// POST /trainee
#[instrument(skip(state, user, request), fields(user_id = %user.user_id))]
async fn create_trainee<D: StorageBackend>(
    State(state): State<AppState<D>>,
    user: CurrentUser,
    Json(request): Json<CreateTraineeRequest>,
) -> Result<(StatusCode, Json<ProfileResponse>), ApiError> {
    validate_names(&request.first_name, &request.last_name)?;

    let command = commands::CreateTrainee {
        correlation_id: Uuid::new_v4(),
        user_id: user.user_id,
        first_name: request.first_name,
        last_name: request.last_name,
        birth_date: request.birth_date,
    };

    info!(correlation_id = %command.correlation_id, "handling create_trainee command");

    let profile = command_handlers::handle_create_trainee(
        &command,
        &Scope::new(),
        &state.profiles,
        state.clock.as_ref(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(profile.into())))
}

/// POST /coach
#[instrument(skip(state, user, request), fields(user_id = %user.user_id))]
async fn create_coach<D: StorageBackend>(
    State(state): State<AppState<D>>,
    user: CurrentUser,
    Json(request): Json<CreateCoachRequest>,
) -> Result<(StatusCode, Json<ProfileResponse>), ApiError> {
    validate_names(&request.first_name, &request.last_name)?;
    if request.years_experience < 0 {
        return Err(ApiError::Validation(
            "years_experience must not be negative".into(),
        ));
    }

    let command = commands::CreateCoach {
        correlation_id: Uuid::new_v4(),
        user_id: user.user_id,
        first_name: request.first_name,
        last_name: request.last_name,
        birth_date: request.birth_date,
        years_experience: request.years_experience,
        bio: request.bio,
    };

    info!(correlation_id = %command.correlation_id, "handling create_coach command");

    let profile = command_handlers::handle_create_coach(
        &command,
        &Scope::new(),
        &state.profiles,
        state.clock.as_ref(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(profile.into())))
}

/// GET /{user_id}
#[instrument(skip(state, _user))]
async fn get_profile<D: StorageBackend>(
    State(state): State<AppState<D>>,
    _user: CurrentUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let profile = query_handlers::get_profile(user_id, &Scope::new(), &state.profiles).await?;

    Ok(Json(profile.into()))
}

/// GET /me
#[instrument(skip(state, user), fields(user_id = %user.user_id))]
async fn get_own_profile<D: StorageBackend>(
    State(state): State<AppState<D>>,
    user: CurrentUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    let profile =
        query_handlers::get_profile(user.user_id, &Scope::new(), &state.profiles).await?;

    Ok(Json(profile.into()))
}

/// GET /trainees/{trainee_id}
#[instrument(skip(state, _user))]
async fn get_trainee<D: StorageBackend>(
    State(state): State<AppState<D>>,
    _user: CurrentUser,
    Path(trainee_id): Path<Uuid>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let trainee = query_handlers::get_trainee(trainee_id, &Scope::new(), &state.profiles).await?;

    Ok(Json(Profile::Trainee(trainee).into()))
}

/// GET /coaches/{coach_id}
#[instrument(skip(state, _user))]
async fn get_coach<D: StorageBackend>(
    State(state): State<AppState<D>>,
    _user: CurrentUser,
    Path(coach_id): Path<Uuid>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let coach = query_handlers::get_coach(coach_id, &Scope::new(), &state.profiles).await?;

    Ok(Json(Profile::Coach(coach).into()))
}

/// Returns the router for the profile context.
pub fn router<D: StorageBackend>() -> Router<AppState<D>> {
    Router::new()
        .route("/trainee", post(create_trainee::<D>))
        .route("/coach", post(create_coach::<D>))
        .route("/me", get(get_own_profile::<D>))
        .route("/{user_id}", get(get_profile::<D>))
}

/// Trainee lookups, nested under `/trainees`.
pub fn trainee_router<D: StorageBackend>() -> Router<AppState<D>> {
    Router::new().route("/{trainee_id}", get(get_trainee::<D>))
}

/// Coach lookups, nested under `/coaches`.
pub fn coach_router<D: StorageBackend>() -> Router<AppState<D>> {
    Router::new().route("/{coach_id}", get(get_coach::<D>))
}
