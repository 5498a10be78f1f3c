//! Command handlers for the Profile context.

use healthcoach_core::clock::Clock;
use healthcoach_core::command::Command;
use healthcoach_core::scope::Scope;
use healthcoach_core::storage::Database;
use healthcoach_core::unit_of_work::{AtomicContext, AtomicError};
use tracing::Instrument;

use crate::application::context::ProfileUnitOfWork;
use crate::domain::aggregates::Profile;
use crate::domain::commands::{CreateCoach, CreateTrainee};
use crate::domain::errors::ProfileError;

/// Handles the `CreateTrainee` command.
///
/// # Errors
///
/// Returns `ProfileError::ProfileExists` (as a business error) if the user
/// already has a profile.
pub async fn handle_create_trainee<D: Database>(
    command: &CreateTrainee,
    scope: &Scope,
    uow: &ProfileUnitOfWork<D>,
    clock: &dyn Clock,
) -> Result<Profile, AtomicError<ProfileError>> {
    uow.atomic(scope, |ctx| async move {
        let profile = Profile::new_trainee(
            command.user_id,
            command.first_name.clone(),
            command.last_name.clone(),
            command.birth_date,
            clock,
        );
        ctx.profiles().add(&profile).await?;
        ctx.commit().await?;
        Ok::<_, ProfileError>(profile)
    })
    .instrument(command.span())
    .await
}

/// Handles the `CreateCoach` command.
///
/// # Errors
///
/// Returns `ProfileError::ProfileExists` (as a business error) if the user
/// already has a profile.
pub async fn handle_create_coach<D: Database>(
    command: &CreateCoach,
    scope: &Scope,
    uow: &ProfileUnitOfWork<D>,
    clock: &dyn Clock,
) -> Result<Profile, AtomicError<ProfileError>> {
    uow.atomic(scope, |ctx| async move {
        let profile = Profile::new_coach(
            command.user_id,
            command.first_name.clone(),
            command.last_name.clone(),
            command.birth_date,
            command.years_experience,
            command.bio.clone(),
            clock,
        );
        ctx.profiles().add(&profile).await?;
        ctx.commit().await?;
        Ok::<_, ProfileError>(profile)
    })
    .instrument(command.span())
    .await
}
