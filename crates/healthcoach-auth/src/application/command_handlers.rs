//! Command handlers for the Auth context.
//!
//! Each handler runs one business function inside the auth unit of work:
//! load or create the user, apply the command, persist, commit.

use healthcoach_core::clock::Clock;
use healthcoach_core::command::Command;
use healthcoach_core::scope::Scope;
use healthcoach_core::storage::Database;
use healthcoach_core::unit_of_work::{AtomicContext, AtomicError};
use tracing::Instrument;

use crate::application::authorizer::SessionAuthorizer;
use crate::application::context::AuthUnitOfWork;
use crate::domain::aggregates::User;
use crate::domain::commands::{CreateUser, Login, Logout, Refresh};
use crate::domain::errors::AuthError;

/// Token pair handed out at login and refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tokens {
    /// Short-lived signed access token.
    pub access_token: String,
    /// Session secret used to mint new access tokens.
    pub refresh_token: String,
}

/// Handles the `CreateUser` command: registers the user and stores it.
///
/// The password is hashed before the transaction opens.
///
/// # Errors
///
/// Returns `AuthError::UserExists` (as a business error) if the id or email
/// is taken, or `AuthError::Hashing` if the password cannot be hashed.
pub async fn handle_create_user<D: Database>(
    command: &CreateUser,
    scope: &Scope,
    uow: &AuthUnitOfWork<D>,
    authorizer: &SessionAuthorizer,
    clock: &dyn Clock,
) -> Result<User, AtomicError<AuthError>> {
    let password_hash = authorizer
        .hash_password(&command.password)
        .instrument(command.span())
        .await
        .map_err(AtomicError::Business)?;
    uow.atomic(scope, |ctx| async move {
        let user = User::register(command.user_id, command.email.clone(), password_hash, clock);
        ctx.users().add(&user).await?;
        ctx.commit().await?;
        Ok::<_, AuthError>(user)
    })
    .instrument(command.span())
    .await
}

/// Handles the `Login` command: verifies the password, opens a session and
/// returns a token pair bound to it.
///
/// An unknown email is reported as `InvalidCredentials`, the same as a wrong
/// password.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` (as a business error) on an
/// unknown email or a wrong password.
pub async fn handle_login<D: Database>(
    command: &Login,
    scope: &Scope,
    uow: &AuthUnitOfWork<D>,
    authorizer: &SessionAuthorizer,
) -> Result<Tokens, AtomicError<AuthError>> {
    uow.atomic(scope, |ctx| async move {
        let mut user = match ctx.users().get_by_email(&command.email).await {
            Err(AuthError::UserNotFound) => return Err(AuthError::InvalidCredentials),
            other => other?,
        };

        let authorization = user
            .authorize(authorizer, &command.password, command.device.clone())
            .await?;
        let access_token = authorizer.issue_access_token(&user, &authorization)?;

        ctx.users().persist(&user).await?;
        ctx.commit().await?;

        tracing::info!(user_id = %user.user_id, authorization_id = %authorization.id, "session opened");
        Ok::<_, AuthError>(Tokens {
            access_token,
            refresh_token: authorization.secret,
        })
    })
    .instrument(command.span())
    .await
}

/// Handles the `Logout` command: closes one session of the user.
///
/// # Errors
///
/// Returns `AuthError::Unauthorized` (as a business error) if the session is
/// unknown or already closed, `AuthError::UserNotFound` if the user is gone.
pub async fn handle_logout<D: Database>(
    command: &Logout,
    scope: &Scope,
    uow: &AuthUnitOfWork<D>,
    clock: &dyn Clock,
) -> Result<(), AtomicError<AuthError>> {
    uow.atomic(scope, |ctx| async move {
        let mut user = ctx.users().get_by_id(command.user_id).await?;
        user.logout(&command.authorization_id, clock)?;
        ctx.users().persist(&user).await?;
        ctx.commit().await?;
        Ok::<_, AuthError>(())
    })
    .instrument(command.span())
    .await
}

/// Handles the `Refresh` command: mints a new access token for an active
/// session. The session itself is not rotated and nothing is written.
///
/// # Errors
///
/// Returns `AuthError::Unauthorized` (as a business error) for an unknown
/// refresh token and `AuthError::InactiveSession` for an expired or
/// logged-out session.
pub async fn handle_refresh<D: Database>(
    command: &Refresh,
    scope: &Scope,
    uow: &AuthUnitOfWork<D>,
    authorizer: &SessionAuthorizer,
) -> Result<Tokens, AtomicError<AuthError>> {
    uow.atomic(scope, |ctx| async move {
        let user = match ctx
            .users()
            .get_by_authorization_secret(&command.refresh_token)
            .await
        {
            Err(AuthError::UserNotFound) => {
                return Err(AuthError::Unauthorized("unknown refresh token"));
            }
            other => other?,
        };

        let authorization = user
            .get_authorization_by_secret(&command.refresh_token)
            .ok_or(AuthError::Unauthorized("unknown refresh token"))?;
        if !authorization.is_active(authorizer.clock()) {
            return Err(AuthError::InactiveSession);
        }

        Ok::<_, AuthError>(Tokens {
            access_token: authorizer.issue_access_token(&user, authorization)?,
            refresh_token: authorization.secret.clone(),
        })
    })
    .instrument(command.span())
    .await
}
