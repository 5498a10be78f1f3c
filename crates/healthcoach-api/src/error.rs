//! Health Coach: API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use healthcoach_auth::domain::errors::AuthError;
use healthcoach_core::error::StorageError;
use healthcoach_core::message_bus::PublishError;
use healthcoach_core::unit_of_work::AtomicError;
use healthcoach_group::domain::errors::GroupError;
use healthcoach_invite::domain::errors::InviteError;
use healthcoach_metric::domain::errors::MetricError;
use healthcoach_profile::domain::errors::ProfileError;
use serde::Serialize;
use thiserror::Error;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// The configuration is missing, malformed or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database connection, pool or migration error.
    #[error("database error: {0}")]
    Database(#[from] StorageError),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-layer error that implements `IntoResponse`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Auth context failure.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Profile context failure.
    #[error(transparent)]
    Profile(#[from] ProfileError),

    /// Group context failure.
    #[error(transparent)]
    Group(#[from] GroupError),

    /// Invite context failure.
    #[error(transparent)]
    Invite(#[from] InviteError),

    /// Metric context failure.
    #[error(transparent)]
    Metric(#[from] MetricError),

    /// Transaction lifecycle failure.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Committed, but events were not handed to the bus.
    #[error(transparent)]
    Publish(#[from] PublishError),

    /// The request is well-formed but its values are not acceptable.
    #[error("{0}")]
    Validation(String),

    /// Missing or malformed bearer credentials.
    #[error("{0}")]
    Unauthenticated(&'static str),

    /// Authenticated, but not allowed to touch the resource.
    #[error("{0}")]
    Forbidden(&'static str),
}

impl<E> From<AtomicError<E>> for ApiError
where
    ApiError: From<E>,
{
    fn from(err: AtomicError<E>) -> Self {
        match err {
            AtomicError::Storage(err) => Self::Storage(err),
            AtomicError::Business(err) => err.into(),
            AtomicError::Publish(err) => Self::Publish(err),
        }
    }
}

const INTERNAL: (StatusCode, &str) = (StatusCode::INTERNAL_SERVER_ERROR, "internal_error");

fn auth_status(err: &AuthError) -> (StatusCode, &'static str) {
    match err {
        AuthError::UserExists => (StatusCode::CONFLICT, "user_exists"),
        AuthError::UserNotFound => (StatusCode::NOT_FOUND, "user_not_found"),
        AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "invalid_credentials"),
        AuthError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
        AuthError::InactiveSession => (StatusCode::UNAUTHORIZED, "inactive_session"),
        AuthError::InvalidAccessToken => (StatusCode::UNAUTHORIZED, "invalid_access_token"),
        AuthError::Hashing(_) | AuthError::Signing(_) | AuthError::Storage(_) => INTERNAL,
    }
}

fn profile_status(err: &ProfileError) -> (StatusCode, &'static str) {
    match err {
        ProfileError::ProfileExists => (StatusCode::CONFLICT, "profile_exists"),
        ProfileError::ProfileNotFound => (StatusCode::NOT_FOUND, "profile_not_found"),
        ProfileError::Storage(_) => INTERNAL,
    }
}

fn group_status(err: &GroupError) -> (StatusCode, &'static str) {
    match err {
        GroupError::GroupExists => (StatusCode::CONFLICT, "group_exists"),
        GroupError::GroupNotFound => (StatusCode::NOT_FOUND, "group_not_found"),
        GroupError::NotACoach => (StatusCode::FORBIDDEN, "not_a_coach"),
        GroupError::Profile(err) => profile_status(err),
        GroupError::Storage(_) => INTERNAL,
    }
}

fn invite_status(err: &InviteError) -> (StatusCode, &'static str) {
    match err {
        InviteError::InviteExists => (StatusCode::CONFLICT, "invite_exists"),
        InviteError::InviteNotFound => (StatusCode::NOT_FOUND, "invite_not_found"),
        InviteError::GroupNotFound => (StatusCode::NOT_FOUND, "group_not_found"),
        InviteError::TraineeNotFound => (StatusCode::FORBIDDEN, "not_a_trainee"),
        InviteError::Expired => (StatusCode::BAD_REQUEST, "invite_expired"),
        InviteError::AlreadyAccepted => (StatusCode::CONFLICT, "invite_already_accepted"),
        InviteError::InvalidSecret => (StatusCode::BAD_REQUEST, "invalid_invite_secret"),
        InviteError::Storage(_) => INTERNAL,
    }
}

fn metric_status(err: &MetricError) -> (StatusCode, &'static str) {
    match err {
        MetricError::MetricExists => (StatusCode::CONFLICT, "metric_exists"),
        MetricError::MetricNotFound => (StatusCode::NOT_FOUND, "metric_not_found"),
        MetricError::TraineeNotFound => (StatusCode::NOT_FOUND, "trainee_not_found"),
        MetricError::Storage(_) => INTERNAL,
    }
}

impl ApiError {
    /// Status code and machine-readable code for this error.
    #[must_use]
    pub fn status(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Auth(err) => auth_status(err),
            Self::Profile(err) => profile_status(err),
            Self::Group(err) => group_status(err),
            Self::Invite(err) => invite_status(err),
            Self::Metric(err) => metric_status(err),
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            Self::Unauthenticated(_) => (StatusCode::UNAUTHORIZED, "unauthenticated"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            Self::Storage(_) | Self::Publish(_) => INTERNAL,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status();

        // Internal details stay in the logs.
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        (
            status,
            Json(ErrorBody {
                error: error_code,
                message,
            }),
        )
            .into_response()
    }
}
