//! Command handlers for the Invite context.

use healthcoach_core::clock::Clock;
use healthcoach_core::command::Command;
use healthcoach_core::rng::TokenGenerator;
use healthcoach_core::scope::Scope;
use healthcoach_core::storage::Database;
use healthcoach_core::unit_of_work::{AtomicContext, AtomicError};
use healthcoach_profile::domain::aggregates::Profile;
use healthcoach_profile::domain::errors::ProfileError;
use tracing::Instrument;
use uuid::Uuid;

use crate::application::context::InviteUnitOfWork;
use crate::domain::aggregates::Invite;
use crate::domain::commands::{AcceptInvite, CreateInvite};
use crate::domain::errors::InviteError;

/// Handles the `CreateInvite` command: opens an invite with a random secret.
///
/// Ownership of the group is checked by the caller.
///
/// # Errors
///
/// Returns `InviteError::GroupNotFound` (as a business error) if the group
/// does not exist.
pub async fn handle_create_invite<D: Database>(
    command: &CreateInvite,
    scope: &Scope,
    uow: &InviteUnitOfWork<D>,
    generator: &dyn TokenGenerator,
    clock: &dyn Clock,
) -> Result<Invite, AtomicError<InviteError>> {
    uow.atomic(scope, |ctx| async move {
        let invite = Invite::open(Uuid::now_v7(), command.group_id, generator, clock);
        ctx.invites().add(&invite).await?;
        ctx.commit().await?;
        Ok::<_, InviteError>(invite)
    })
    .instrument(command.span())
    .await
}

/// Handles the `AcceptInvite` command: adds the trainee to the invited group.
///
/// # Errors
///
/// Returns, as business errors, `InviteError::TraineeNotFound` if the user
/// has no trainee profile, `InviteError::InvalidSecret` if no invite carries
/// the secret, and `AlreadyAccepted` or `Expired` from the invite itself.
pub async fn handle_accept_invite<D: Database>(
    command: &AcceptInvite,
    scope: &Scope,
    uow: &InviteUnitOfWork<D>,
    clock: &dyn Clock,
) -> Result<Invite, AtomicError<InviteError>> {
    uow.atomic(scope, |ctx| async move {
        match ctx.profiles().get_by_id(command.trainee_id).await {
            Ok(Profile::Trainee(_)) => {}
            Err(ProfileError::Storage(err)) => return Err(err.into()),
            Ok(Profile::Coach(_)) | Err(_) => return Err(InviteError::TraineeNotFound),
        }

        let mut invite = match ctx.invites().get_by_secret(&command.secret).await {
            Err(InviteError::InviteNotFound) => return Err(InviteError::InvalidSecret),
            other => other?,
        };
        invite.accept(command.trainee_id, &command.secret, clock)?;
        ctx.invites().persist(&invite).await?;
        ctx.commit().await?;

        tracing::info!(
            invite_id = %invite.invite_id,
            group_id = %invite.group_id,
            trainee_id = %command.trainee_id,
            "invite accepted"
        );
        Ok::<_, InviteError>(invite)
    })
    .instrument(command.span())
    .await
}
