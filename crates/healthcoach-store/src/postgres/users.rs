//! `PostgreSQL` user repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use healthcoach_auth::domain::aggregates::{Authorization, Device, User};
use healthcoach_auth::domain::errors::AuthError;
use healthcoach_auth::domain::repository::UserRepository;
use healthcoach_core::error::StorageError;
use healthcoach_core::event::SharedEvent;
use healthcoach_core::scope::Scope;
use healthcoach_core::tracking::SeenAggregates;
use sqlx::{PgConnection, Postgres};
use uuid::Uuid;

use super::{PgTransaction, connection, run};

const SELECT_BY_ID: &str = r"
SELECT user_id, email, password_hash, created_at, updated_at
FROM users
WHERE user_id = $1
";

const SELECT_BY_EMAIL: &str = r"
SELECT user_id, email, password_hash, created_at, updated_at
FROM users
WHERE email = $1
";

const SELECT_BY_AUTHORIZATION_SECRET: &str = r"
SELECT u.user_id, u.email, u.password_hash, u.created_at, u.updated_at
FROM users u
JOIN authorizations a ON a.user_id = u.user_id
WHERE a.secret = $1
";

const SELECT_AUTHORIZATIONS: &str = r"
SELECT a.authorization_id, a.secret, a.created_at, a.valid_until, a.logout_at,
       COALESCE(d.browser, '') AS browser,
       COALESCE(d.os, '') AS os,
       COALESCE(d.ip_address, '') AS ip_address,
       COALESCE(d.model, '') AS model
FROM authorizations a
LEFT JOIN devices d ON d.authorization_id = a.authorization_id
WHERE a.user_id = $1
ORDER BY a.created_at, a.authorization_id
";

const INSERT_USER: &str = r"
INSERT INTO users (user_id, email, password_hash, created_at, updated_at)
VALUES ($1, $2, $3, $4, $5)
";

const UPDATE_USER: &str = r"
UPDATE users
SET email = $2, password_hash = $3, updated_at = $4
WHERE user_id = $1
";

const INSERT_AUTHORIZATION: &str = r"
INSERT INTO authorizations (authorization_id, user_id, secret, created_at, valid_until, logout_at)
VALUES ($1, $2, $3, $4, $5, $6)
";

const UPDATE_AUTHORIZATION: &str = r"
UPDATE authorizations
SET valid_until = $2, logout_at = $3
WHERE authorization_id = $1
";

const INSERT_DEVICE: &str = r"
INSERT INTO devices (authorization_id, browser, os, ip_address, model)
VALUES ($1, $2, $3, $4, $5)
";

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct AuthorizationRow {
    authorization_id: String,
    secret: String,
    created_at: DateTime<Utc>,
    valid_until: DateTime<Utc>,
    logout_at: Option<DateTime<Utc>>,
    browser: String,
    os: String,
    ip_address: String,
    model: String,
}

impl From<AuthorizationRow> for Authorization {
    fn from(row: AuthorizationRow) -> Self {
        Self {
            id: row.authorization_id,
            secret: row.secret,
            created_at: row.created_at,
            valid_until: row.valid_until,
            logout_at: row.logout_at,
            device: Device {
                browser: row.browser,
                os: row.os,
                ip_address: row.ip_address,
                model: row.model,
            },
        }
    }
}

fn user_error(err: StorageError) -> AuthError {
    match err {
        StorageError::Conflict(_) => AuthError::UserExists,
        other => other.into(),
    }
}

/// Rows `persist` has to write for a user, relative to what is stored.
#[derive(Debug, Default)]
struct UserChanges<'a> {
    user_row: bool,
    inserted: Vec<&'a Authorization>,
    updated: Vec<&'a Authorization>,
}

impl<'a> UserChanges<'a> {
    fn between(stored: &User, user: &'a User) -> Self {
        let mut changes = Self {
            user_row: stored.email != user.email
                || stored.password_hash != user.password_hash
                || stored.updated_at != user.updated_at,
            ..Self::default()
        };
        for authorization in &user.authorizations {
            match stored.get_authorization(&authorization.id) {
                None => changes.inserted.push(authorization),
                Some(before)
                    if before.valid_until != authorization.valid_until
                        || before.logout_at != authorization.logout_at =>
                {
                    changes.updated.push(authorization);
                }
                Some(_) => {}
            }
        }
        changes
    }
}

/// [`UserRepository`] over a [`PgTransaction`].
#[derive(Debug)]
pub struct PgUserRepository {
    tx: PgTransaction,
    scope: Scope,
    seen: SeenAggregates,
}

impl PgUserRepository {
    /// Creates a repository bound to `tx`.
    #[must_use]
    pub fn new(scope: Scope, tx: PgTransaction) -> Self {
        Self {
            tx,
            scope,
            seen: SeenAggregates::new(),
        }
    }

    async fn find<T>(&self, sql: &'static str, key: T) -> Result<User, AuthError>
    where
        T: sqlx::Encode<'static, Postgres> + sqlx::Type<Postgres> + Send + 'static,
    {
        let mut guard = self.tx.lock().await;
        let conn = connection(&mut guard)?;

        let user = self.load(conn, sql, key).await?.ok_or(AuthError::UserNotFound)?;
        self.seen.track(&user);
        Ok(user)
    }

    async fn load<T>(
        &self,
        conn: &mut PgConnection,
        sql: &'static str,
        key: T,
    ) -> Result<Option<User>, AuthError>
    where
        T: sqlx::Encode<'static, Postgres> + sqlx::Type<Postgres> + Send + 'static,
    {
        let Some(row) = run(
            &self.scope,
            sqlx::query_as::<_, UserRow>(sql)
                .bind(key)
                .fetch_optional(&mut *conn),
        )
        .await?
        else {
            return Ok(None);
        };

        let authorizations = run(
            &self.scope,
            sqlx::query_as::<_, AuthorizationRow>(SELECT_AUTHORIZATIONS)
                .bind(row.user_id)
                .fetch_all(&mut *conn),
        )
        .await?;

        Ok(Some(User::restore(
            row.user_id,
            row.email,
            row.password_hash,
            row.created_at,
            row.updated_at,
            authorizations.into_iter().map(Authorization::from).collect(),
        )))
    }

    async fn insert_authorization(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
        authorization: &Authorization,
    ) -> Result<(), AuthError> {
        run(
            &self.scope,
            sqlx::query(INSERT_AUTHORIZATION)
                .bind(&authorization.id)
                .bind(user_id)
                .bind(&authorization.secret)
                .bind(authorization.created_at)
                .bind(authorization.valid_until)
                .bind(authorization.logout_at)
                .execute(&mut *conn),
        )
        .await
        .map_err(user_error)?;

        let device = &authorization.device;
        run(
            &self.scope,
            sqlx::query(INSERT_DEVICE)
                .bind(&authorization.id)
                .bind(&device.browser)
                .bind(&device.os)
                .bind(&device.ip_address)
                .bind(&device.model)
                .execute(&mut *conn),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn add(&self, user: &User) -> Result<(), AuthError> {
        let mut guard = self.tx.lock().await;
        let conn = connection(&mut guard)?;

        run(
            &self.scope,
            sqlx::query(INSERT_USER)
                .bind(user.user_id)
                .bind(&user.email)
                .bind(&user.password_hash)
                .bind(user.created_at)
                .bind(user.updated_at)
                .execute(&mut *conn),
        )
        .await
        .map_err(user_error)?;
        for authorization in &user.authorizations {
            self.insert_authorization(conn, user.user_id, authorization)
                .await?;
        }

        self.seen.track(user);
        Ok(())
    }

    async fn get_by_id(&self, user_id: Uuid) -> Result<User, AuthError> {
        self.find(SELECT_BY_ID, user_id).await
    }

    async fn get_by_email(&self, email: &str) -> Result<User, AuthError> {
        self.find(SELECT_BY_EMAIL, email.to_owned()).await
    }

    async fn get_by_authorization_secret(&self, secret: &str) -> Result<User, AuthError> {
        self.find(SELECT_BY_AUTHORIZATION_SECRET, secret.to_owned())
            .await
    }

    async fn persist(&self, user: &User) -> Result<(), AuthError> {
        let mut guard = self.tx.lock().await;
        let conn = connection(&mut guard)?;

        let stored = self
            .load(conn, SELECT_BY_ID, user.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        let changes = UserChanges::between(&stored, user);

        if changes.user_row {
            run(
                &self.scope,
                sqlx::query(UPDATE_USER)
                    .bind(user.user_id)
                    .bind(&user.email)
                    .bind(&user.password_hash)
                    .bind(user.updated_at)
                    .execute(&mut *conn),
            )
            .await
            .map_err(user_error)?;
        }
        for authorization in &changes.inserted {
            self.insert_authorization(conn, user.user_id, authorization)
                .await?;
        }
        for authorization in &changes.updated {
            run(
                &self.scope,
                sqlx::query(UPDATE_AUTHORIZATION)
                    .bind(&authorization.id)
                    .bind(authorization.valid_until)
                    .bind(authorization.logout_at)
                    .execute(&mut *conn),
            )
            .await?;
        }
        tracing::debug!(
            user_id = %user.user_id,
            user_row = changes.user_row,
            inserted = changes.inserted.len(),
            updated = changes.updated.len(),
            "user persisted"
        );

        self.seen.track(user);
        Ok(())
    }

    fn collect_events(&self) -> Vec<SharedEvent> {
        self.seen.collect_events()
    }

    async fn close(&self) {
        tracing::trace!(tracked = self.seen.len(), "user repository closed");
    }
}
