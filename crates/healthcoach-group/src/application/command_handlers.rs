//! Command handlers for the Group context.

use healthcoach_core::clock::Clock;
use healthcoach_core::command::Command;
use healthcoach_core::scope::Scope;
use healthcoach_core::storage::Database;
use healthcoach_core::unit_of_work::{AtomicContext, AtomicError};
use healthcoach_profile::domain::aggregates::Profile;
use healthcoach_profile::domain::errors::ProfileError;
use tracing::Instrument;

use crate::application::context::GroupUnitOfWork;
use crate::domain::aggregates::Group;
use crate::domain::commands::CreateGroup;
use crate::domain::errors::GroupError;

/// Handles the `CreateGroup` command. The owner must have a coach profile.
///
/// # Errors
///
/// Returns `GroupError::NotACoach` (as a business error) if the owner has no
/// coach profile, `GroupError::GroupExists` on a duplicate id.
pub async fn handle_create_group<D: Database>(
    command: &CreateGroup,
    scope: &Scope,
    uow: &GroupUnitOfWork<D>,
    clock: &dyn Clock,
) -> Result<Group, AtomicError<GroupError>> {
    uow.atomic(scope, |ctx| async move {
        match ctx.profiles().get_by_id(command.coach_id).await {
            Ok(Profile::Coach(_)) => {}
            Ok(Profile::Trainee(_)) | Err(ProfileError::ProfileNotFound) => {
                return Err(GroupError::NotACoach);
            }
            Err(other) => return Err(other.into()),
        }

        let group = Group::create(
            command.group_id,
            command.coach_id,
            command.name.clone(),
            command.description.clone(),
            clock,
        );
        ctx.groups().add(&group).await?;
        ctx.commit().await?;
        Ok::<_, GroupError>(group)
    })
    .instrument(command.span())
    .await
}
