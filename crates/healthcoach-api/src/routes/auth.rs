//! Routes for the Auth bounded context.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Form, Json, Router, routing::post};
use healthcoach_auth::application::command_handlers::{self, Tokens};
use healthcoach_auth::domain::commands;
use healthcoach_core::scope::Scope;
use healthcoach_store::StorageBackend;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::extractors::{CurrentUser, DeviceInfo};
use crate::state::AppState;

/// Shortest accepted password.
pub const MIN_PASSWORD_LEN: usize = 8;
/// bcrypt ignores everything past 72 bytes.
pub const MAX_PASSWORD_LEN: usize = 72;

/// Request body for POST /sign-up.
#[derive(Deserialize)]
pub struct SignUpRequest {
    /// Identifier chosen by the client.
    pub user_id: Uuid,
    /// Login email.
    pub email: String,
    /// Plaintext password.
    pub password: String,
}

/// Response body for POST /sign-up.
#[derive(Debug, Serialize)]
pub struct SignUpResponse {
    /// The registered user.
    pub user_id: Uuid,
}

/// Form body for POST /login.
#[derive(Deserialize)]
pub struct LoginRequest {
    /// Login email.
    pub username: String,
    /// Plaintext password.
    pub password: String,
}

/// Request body for POST /refresh.
#[derive(Deserialize)]
pub struct RefreshRequest {
    /// Session secret handed out at login.
    pub refresh_token: String,
}

/// Token pair returned by login and refresh.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    /// Bearer token for authenticated routes.
    pub access_token: String,
    /// Secret used to mint new access tokens.
    pub refresh_token: String,
    /// Always `bearer`.
    pub token_type: &'static str,
}

impl From<Tokens> for TokenResponse {
    fn from(tokens: Tokens) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            token_type: "bearer",
        }
    }
}

fn validate_credentials(email: &str, password: &str) -> Result<(), ApiError> {
    let well_formed = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !well_formed {
        return Err(ApiError::Validation("email is not valid".into()));
    }
    if !(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&password.len()) {
        return Err(ApiError::Validation(format!(
            "password must be {MIN_PASSWORD_LEN} to {MAX_PASSWORD_LEN} bytes long"
        )));
    }
    Ok(())
}

/// POST /sign-up
#[instrument(skip(state, request), fields(user_id = %request.user_id))]
async fn sign_up<D: StorageBackend>(
    State(state): State<AppState<D>>,
    Json(request): Json<SignUpRequest>,
) -> Result<(StatusCode, Json<SignUpResponse>), ApiError> {
    validate_credentials(&request.email, &request.password)?;

    let command = commands::CreateUser {
        correlation_id: Uuid::new_v4(),
        user_id: request.user_id,
        email: request.email,
        password: request.password,
    };

    info!(correlation_id = %command.correlation_id, "handling create_user command");

    let user = command_handlers::handle_create_user(
        &command,
        &Scope::new(),
        &state.auth,
        &state.authorizer,
        state.clock.as_ref(),
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(SignUpResponse {
            user_id: user.user_id,
        }),
    ))
}

/// POST /login
#[instrument(skip(state, device, request))]
async fn login<D: StorageBackend>(
    State(state): State<AppState<D>>,
    DeviceInfo(device): DeviceInfo,
    Form(request): Form<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let command = commands::Login {
        correlation_id: Uuid::new_v4(),
        email: request.username,
        password: request.password,
        device,
    };

    info!(correlation_id = %command.correlation_id, "handling login command");

    let tokens =
        command_handlers::handle_login(&command, &Scope::new(), &state.auth, &state.authorizer)
            .await?;

    Ok(Json(tokens.into()))
}

/// POST /refresh
#[instrument(skip(state, request))]
async fn refresh<D: StorageBackend>(
    State(state): State<AppState<D>>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let command = commands::Refresh {
        correlation_id: Uuid::new_v4(),
        refresh_token: request.refresh_token,
    };

    info!(correlation_id = %command.correlation_id, "handling refresh command");

    let tokens =
        command_handlers::handle_refresh(&command, &Scope::new(), &state.auth, &state.authorizer)
            .await?;

    Ok(Json(tokens.into()))
}

/// POST /logout
#[instrument(skip(state, user), fields(user_id = %user.user_id))]
async fn logout<D: StorageBackend>(
    State(state): State<AppState<D>>,
    user: CurrentUser,
) -> Result<StatusCode, ApiError> {
    let command = commands::Logout {
        correlation_id: Uuid::new_v4(),
        user_id: user.user_id,
        authorization_id: user.authorization_id,
    };

    info!(correlation_id = %command.correlation_id, "handling logout command");

    command_handlers::handle_logout(&command, &Scope::new(), &state.auth, state.clock.as_ref())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Returns the router for the auth context.
pub fn router<D: StorageBackend>() -> Router<AppState<D>> {
    Router::new()
        .route("/sign-up", post(sign_up::<D>))
        .route("/login", post(login::<D>))
        .route("/refresh", post(refresh::<D>))
        .route("/logout", post(logout::<D>))
}
