//! Query handlers for the Auth context.

use healthcoach_core::scope::Scope;
use healthcoach_core::storage::Database;
use healthcoach_core::unit_of_work::AtomicError;
use uuid::Uuid;

use crate::application::authorizer::SessionAuthorizer;
use crate::application::context::AuthUnitOfWork;
use crate::application::tokens::AccessTokenData;
use crate::domain::aggregates::User;
use crate::domain::errors::AuthError;

/// Resolves a bearer access token to the identity it carries.
///
/// Stateless: the session is not looked up.
///
/// # Errors
///
/// Returns `AuthError::InvalidAccessToken` if the token is forged or expired.
pub fn authenticate(
    authorizer: &SessionAuthorizer,
    access_token: &str,
) -> Result<AccessTokenData, AuthError> {
    authorizer.validate_access_token(access_token)
}

/// Loads a user by id.
///
/// # Errors
///
/// Returns `AuthError::UserNotFound` (as a business error) if no user
/// matches.
pub async fn get_user<D: Database>(
    user_id: Uuid,
    scope: &Scope,
    uow: &AuthUnitOfWork<D>,
) -> Result<User, AtomicError<AuthError>> {
    uow.atomic(scope, |ctx| async move { ctx.users().get_by_id(user_id).await })
        .await
}
