//! `PostgreSQL` invite repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use healthcoach_core::error::StorageError;
use healthcoach_core::event::SharedEvent;
use healthcoach_core::scope::Scope;
use healthcoach_core::tracking::SeenAggregates;
use healthcoach_invite::domain::aggregates::Invite;
use healthcoach_invite::domain::errors::InviteError;
use healthcoach_invite::domain::repository::InviteRepository;
use sqlx::{PgConnection, Postgres};
use uuid::Uuid;

use super::{PgTransaction, connection, run};

const INSERT_INVITE: &str = r"
INSERT INTO invites (invite_id, group_id, secret, created_at, valid_until)
VALUES ($1, $2, $3, $4, $5)
";

const SELECT_BY_ID: &str = r"
SELECT invite_id, group_id, secret, created_at, valid_until
FROM invites
WHERE invite_id = $1
";

const SELECT_BY_SECRET: &str = r"
SELECT invite_id, group_id, secret, created_at, valid_until
FROM invites
WHERE secret = $1
ORDER BY created_at DESC
LIMIT 1
";

const SELECT_ACCEPTS: &str = r"
SELECT trainee_id, accepted_at
FROM invite_accepts
WHERE invite_id = $1
ORDER BY accepted_at, trainee_id
";

const INSERT_ACCEPT: &str = r"
INSERT INTO invite_accepts (invite_id, trainee_id, accepted_at)
VALUES ($1, $2, $3)
ON CONFLICT (invite_id, trainee_id) DO NOTHING
";

#[derive(sqlx::FromRow)]
struct InviteRow {
    invite_id: Uuid,
    group_id: Uuid,
    secret: String,
    created_at: DateTime<Utc>,
    valid_until: DateTime<Utc>,
}

/// [`InviteRepository`] over a [`PgTransaction`].
#[derive(Debug)]
pub struct PgInviteRepository {
    tx: PgTransaction,
    scope: Scope,
    seen: SeenAggregates,
}

impl PgInviteRepository {
    /// Creates a repository bound to `tx`.
    #[must_use]
    pub fn new(scope: Scope, tx: PgTransaction) -> Self {
        Self {
            tx,
            scope,
            seen: SeenAggregates::new(),
        }
    }

    async fn find<T>(&self, sql: &'static str, key: T) -> Result<Invite, InviteError>
    where
        T: sqlx::Encode<'static, Postgres> + sqlx::Type<Postgres> + Send + 'static,
    {
        let mut guard = self.tx.lock().await;
        let conn = connection(&mut guard)?;

        let row = run(
            &self.scope,
            sqlx::query_as::<_, InviteRow>(sql)
                .bind(key)
                .fetch_optional(&mut *conn),
        )
        .await?
        .ok_or(InviteError::InviteNotFound)?;

        let accepts: Vec<(Uuid, DateTime<Utc>)> = run(
            &self.scope,
            sqlx::query_as(SELECT_ACCEPTS)
                .bind(row.invite_id)
                .fetch_all(&mut *conn),
        )
        .await?;

        let invite = Invite::restore(
            row.invite_id,
            row.group_id,
            row.secret,
            row.created_at,
            row.valid_until,
            accepts.into_iter().collect(),
        );
        self.seen.track(&invite);
        Ok(invite)
    }

    async fn write_accepts(
        &self,
        conn: &mut PgConnection,
        invite_id: Uuid,
        accepts: Vec<(Uuid, DateTime<Utc>)>,
    ) -> Result<(), InviteError> {
        for (trainee_id, accepted_at) in accepts {
            run(
                &self.scope,
                sqlx::query(INSERT_ACCEPT)
                    .bind(invite_id)
                    .bind(trainee_id)
                    .bind(accepted_at)
                    .execute(&mut *conn),
            )
            .await
            .map_err(|err| match err {
                StorageError::ForeignKey(_) => InviteError::TraineeNotFound,
                other => other.into(),
            })?;
        }
        Ok(())
    }
}

#[async_trait]
impl InviteRepository for PgInviteRepository {
    async fn add(&self, invite: &Invite) -> Result<(), InviteError> {
        let mut guard = self.tx.lock().await;
        let conn = connection(&mut guard)?;

        run(
            &self.scope,
            sqlx::query(INSERT_INVITE)
                .bind(invite.invite_id)
                .bind(invite.group_id)
                .bind(&invite.secret)
                .bind(invite.created_at)
                .bind(invite.valid_until)
                .execute(&mut *conn),
        )
        .await
        .map_err(|err| match err {
            StorageError::Conflict(_) => InviteError::InviteExists,
            StorageError::ForeignKey(_) => InviteError::GroupNotFound,
            other => other.into(),
        })?;
        let accepts = invite.accepted_by.iter().map(|(id, at)| (*id, *at)).collect();
        self.write_accepts(conn, invite.invite_id, accepts).await?;

        self.seen.track(invite);
        Ok(())
    }

    async fn get_by_id(&self, invite_id: Uuid) -> Result<Invite, InviteError> {
        self.find(SELECT_BY_ID, invite_id).await
    }

    async fn get_by_secret(&self, secret: &str) -> Result<Invite, InviteError> {
        self.find(SELECT_BY_SECRET, secret.to_owned()).await
    }

    async fn persist(&self, invite: &Invite) -> Result<(), InviteError> {
        let mut guard = self.tx.lock().await;
        let conn = connection(&mut guard)?;

        let (exists,): (bool,) = run(
            &self.scope,
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM invites WHERE invite_id = $1)")
                .bind(invite.invite_id)
                .fetch_one(&mut *conn),
        )
        .await?;
        if !exists {
            return Err(InviteError::InviteNotFound);
        }

        let stored: Vec<(Uuid, DateTime<Utc>)> = run(
            &self.scope,
            sqlx::query_as(SELECT_ACCEPTS)
                .bind(invite.invite_id)
                .fetch_all(&mut *conn),
        )
        .await?;
        let fresh: Vec<(Uuid, DateTime<Utc>)> = invite
            .accepted_by
            .iter()
            .filter(|(trainee_id, _)| !stored.iter().any(|(known, _)| known == *trainee_id))
            .map(|(id, at)| (*id, *at))
            .collect();
        tracing::debug!(invite_id = %invite.invite_id, accepts = fresh.len(), "invite persisted");
        self.write_accepts(conn, invite.invite_id, fresh).await?;

        self.seen.track(invite);
        Ok(())
    }

    fn collect_events(&self) -> Vec<SharedEvent> {
        self.seen.collect_events()
    }

    async fn close(&self) {
        tracing::trace!(tracked = self.seen.len(), "invite repository closed");
    }
}
