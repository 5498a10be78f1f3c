//! Query handlers for the Profile context.

use healthcoach_core::scope::Scope;
use healthcoach_core::storage::Database;
use healthcoach_core::unit_of_work::AtomicError;
use uuid::Uuid;

use crate::application::context::ProfileUnitOfWork;
use crate::domain::aggregates::{Coach, Profile, Trainee};
use crate::domain::errors::ProfileError;

/// Loads the profile of `user_id`, whichever kind it is.
///
/// # Errors
///
/// Returns `ProfileError::ProfileNotFound` (as a business error) if the user
/// has no profile.
pub async fn get_profile<D: Database>(
    user_id: Uuid,
    scope: &Scope,
    uow: &ProfileUnitOfWork<D>,
) -> Result<Profile, AtomicError<ProfileError>> {
    uow.atomic(scope, |ctx| async move { ctx.profiles().get_by_id(user_id).await })
        .await
}

/// Loads the trainee profile of `user_id`.
///
/// # Errors
///
/// Returns `ProfileError::ProfileNotFound` (as a business error) if the user
/// has no profile or a coach profile.
pub async fn get_trainee<D: Database>(
    user_id: Uuid,
    scope: &Scope,
    uow: &ProfileUnitOfWork<D>,
) -> Result<Trainee, AtomicError<ProfileError>> {
    match get_profile(user_id, scope, uow).await? {
        Profile::Trainee(trainee) => Ok(trainee),
        Profile::Coach(_) => Err(AtomicError::Business(ProfileError::ProfileNotFound)),
    }
}

/// Loads the coach profile of `user_id`.
///
/// # Errors
///
/// Returns `ProfileError::ProfileNotFound` (as a business error) if the user
/// has no profile or a trainee profile.
pub async fn get_coach<D: Database>(
    user_id: Uuid,
    scope: &Scope,
    uow: &ProfileUnitOfWork<D>,
) -> Result<Coach, AtomicError<ProfileError>> {
    match get_profile(user_id, scope, uow).await? {
        Profile::Coach(coach) => Ok(coach),
        Profile::Trainee(_) => Err(AtomicError::Business(ProfileError::ProfileNotFound)),
    }
}
