//! Query handlers for the Group context.

use healthcoach_core::scope::Scope;
use healthcoach_core::storage::Database;
use healthcoach_core::unit_of_work::AtomicError;
use healthcoach_profile::domain::aggregates::Profile;
use uuid::Uuid;

use crate::application::context::GroupUnitOfWork;
use crate::domain::aggregates::{Group, Member, Page};
use crate::domain::errors::GroupError;

/// Loads a group by id.
///
/// # Errors
///
/// Returns `GroupError::GroupNotFound` (as a business error) if no group
/// matches.
pub async fn get_group<D: Database>(
    group_id: Uuid,
    scope: &Scope,
    uow: &GroupUnitOfWork<D>,
) -> Result<Group, AtomicError<GroupError>> {
    uow.atomic(scope, |ctx| async move { ctx.groups().get_by_id(group_id).await })
        .await
}

/// Lists one page of a group's members.
///
/// # Errors
///
/// Returns `GroupError::GroupNotFound` (as a business error) if the group
/// does not exist.
pub async fn get_members<D: Database>(
    group_id: Uuid,
    page: Page,
    scope: &Scope,
    uow: &GroupUnitOfWork<D>,
) -> Result<Vec<Member>, AtomicError<GroupError>> {
    uow.atomic(scope, |ctx| async move {
        ctx.groups().get_by_id(group_id).await?;
        ctx.groups().get_members(group_id, page).await
    })
    .await
}

/// Lists one page of the groups a user is involved in: owned groups for a
/// coach, joined groups for a trainee.
///
/// # Errors
///
/// Returns `GroupError::Profile` (as a business error) if the user has no
/// profile.
pub async fn get_user_groups<D: Database>(
    user_id: Uuid,
    page: Page,
    scope: &Scope,
    uow: &GroupUnitOfWork<D>,
) -> Result<Vec<Group>, AtomicError<GroupError>> {
    uow.atomic(scope, |ctx| async move {
        match ctx.profiles().get_by_id(user_id).await? {
            Profile::Coach(_) => ctx.groups().list_by_coach(user_id, page).await,
            Profile::Trainee(_) => ctx.groups().list_by_trainee(user_id, page).await,
        }
    })
    .await
}
