//! `PostgreSQL` profile repository.
//!
//! Trainees and coaches live in separate tables keyed by user id; a user has
//! at most one row across both.

use async_trait::async_trait;
use chrono::NaiveDate;
use healthcoach_core::error::StorageError;
use healthcoach_core::event::SharedEvent;
use healthcoach_core::scope::Scope;
use healthcoach_core::tracking::SeenAggregates;
use healthcoach_profile::domain::aggregates::{Coach, Profile, Trainee};
use healthcoach_profile::domain::errors::ProfileError;
use healthcoach_profile::domain::repository::ProfileRepository;
use uuid::Uuid;

use super::{PgTransaction, connection, run};

const PROFILE_EXISTS: &str = r"
SELECT EXISTS (SELECT 1 FROM trainees WHERE user_id = $1)
    OR EXISTS (SELECT 1 FROM coaches WHERE user_id = $1)
";

const INSERT_TRAINEE: &str = r"
INSERT INTO trainees (user_id, first_name, last_name, birth_date)
VALUES ($1, $2, $3, $4)
";

const INSERT_COACH: &str = r"
INSERT INTO coaches (user_id, first_name, last_name, birth_date, years_experience, bio)
VALUES ($1, $2, $3, $4, $5, $6)
";

const SELECT_TRAINEE: &str = r"
SELECT user_id, first_name, last_name, birth_date
FROM trainees
WHERE user_id = $1
";

const SELECT_COACH: &str = r"
SELECT user_id, first_name, last_name, birth_date, years_experience, bio
FROM coaches
WHERE user_id = $1
";

#[derive(sqlx::FromRow)]
struct TraineeRow {
    user_id: Uuid,
    first_name: String,
    last_name: String,
    birth_date: Option<NaiveDate>,
}

#[derive(sqlx::FromRow)]
struct CoachRow {
    user_id: Uuid,
    first_name: String,
    last_name: String,
    birth_date: Option<NaiveDate>,
    years_experience: i32,
    bio: String,
}

/// [`ProfileRepository`] over a [`PgTransaction`].
#[derive(Debug)]
pub struct PgProfileRepository {
    tx: PgTransaction,
    scope: Scope,
    seen: SeenAggregates,
}

impl PgProfileRepository {
    /// Creates a repository bound to `tx`.
    #[must_use]
    pub fn new(scope: Scope, tx: PgTransaction) -> Self {
        Self {
            tx,
            scope,
            seen: SeenAggregates::new(),
        }
    }
}

#[async_trait]
impl ProfileRepository for PgProfileRepository {
    async fn add(&self, profile: &Profile) -> Result<(), ProfileError> {
        let mut guard = self.tx.lock().await;
        let conn = connection(&mut guard)?;

        let (exists,): (bool,) = run(
            &self.scope,
            sqlx::query_as(PROFILE_EXISTS)
                .bind(profile.user_id())
                .fetch_one(&mut *conn),
        )
        .await?;
        if exists {
            return Err(ProfileError::ProfileExists);
        }

        let insert = match profile {
            Profile::Trainee(t) => sqlx::query(INSERT_TRAINEE)
                .bind(t.user_id)
                .bind(&t.first_name)
                .bind(&t.last_name)
                .bind(t.birth_date),
            Profile::Coach(c) => sqlx::query(INSERT_COACH)
                .bind(c.user_id)
                .bind(&c.first_name)
                .bind(&c.last_name)
                .bind(c.birth_date)
                .bind(c.years_experience)
                .bind(&c.bio),
        };
        run(&self.scope, insert.execute(&mut *conn))
            .await
            .map_err(|err| match err {
                StorageError::Conflict(_) => ProfileError::ProfileExists,
                other => other.into(),
            })?;

        self.seen.track(profile);
        Ok(())
    }

    async fn get_by_id(&self, user_id: Uuid) -> Result<Profile, ProfileError> {
        let mut guard = self.tx.lock().await;
        let conn = connection(&mut guard)?;

        let trainee = run(
            &self.scope,
            sqlx::query_as::<_, TraineeRow>(SELECT_TRAINEE)
                .bind(user_id)
                .fetch_optional(&mut *conn),
        )
        .await?;
        let profile = if let Some(row) = trainee {
            Profile::Trainee(Trainee::restore(
                row.user_id,
                row.first_name,
                row.last_name,
                row.birth_date,
            ))
        } else {
            let row = run(
                &self.scope,
                sqlx::query_as::<_, CoachRow>(SELECT_COACH)
                    .bind(user_id)
                    .fetch_optional(&mut *conn),
            )
            .await?
            .ok_or(ProfileError::ProfileNotFound)?;
            Profile::Coach(Coach::restore(
                row.user_id,
                row.first_name,
                row.last_name,
                row.birth_date,
                row.years_experience,
                row.bio,
            ))
        };

        self.seen.track(&profile);
        Ok(profile)
    }

    fn collect_events(&self) -> Vec<SharedEvent> {
        self.seen.collect_events()
    }

    async fn close(&self) {
        tracing::trace!(tracked = self.seen.len(), "profile repository closed");
    }
}
