//! `PostgreSQL` group repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use healthcoach_core::error::StorageError;
use healthcoach_core::event::SharedEvent;
use healthcoach_core::scope::Scope;
use healthcoach_core::tracking::SeenAggregates;
use healthcoach_group::domain::aggregates::{Group, Member, Page};
use healthcoach_group::domain::errors::GroupError;
use healthcoach_group::domain::repository::GroupRepository;
use uuid::Uuid;

use super::{PgTransaction, connection, run};

const INSERT_GROUP: &str = r"
INSERT INTO groups (group_id, coach_id, name, description, created_at, updated_at)
VALUES ($1, $2, $3, $4, $5, $6)
";

const SELECT_GROUP: &str = r"
SELECT group_id, coach_id, name, description, created_at, updated_at
FROM groups
WHERE group_id = $1
";

const SELECT_MEMBERS: &str = r"
SELECT t.user_id AS trainee_id, u.email, t.first_name, t.last_name
FROM invite_accepts a
JOIN invites i ON i.invite_id = a.invite_id
JOIN trainees t ON t.user_id = a.trainee_id
JOIN users u ON u.user_id = t.user_id
WHERE i.group_id = $1
GROUP BY t.user_id, u.email, t.first_name, t.last_name
ORDER BY MIN(a.accepted_at), t.user_id
LIMIT $2 OFFSET $3
";

const SELECT_BY_COACH: &str = r"
SELECT group_id, coach_id, name, description, created_at, updated_at
FROM groups
WHERE coach_id = $1
ORDER BY created_at, group_id
LIMIT $2 OFFSET $3
";

const SELECT_BY_TRAINEE: &str = r"
SELECT g.group_id, g.coach_id, g.name, g.description, g.created_at, g.updated_at
FROM groups g
WHERE EXISTS (
    SELECT 1
    FROM invites i
    JOIN invite_accepts a ON a.invite_id = i.invite_id
    WHERE i.group_id = g.group_id AND a.trainee_id = $1
)
ORDER BY g.created_at, g.group_id
LIMIT $2 OFFSET $3
";

#[derive(sqlx::FromRow)]
struct GroupRow {
    group_id: Uuid,
    coach_id: Uuid,
    name: String,
    description: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<GroupRow> for Group {
    fn from(row: GroupRow) -> Self {
        Group::restore(
            row.group_id,
            row.coach_id,
            row.name,
            row.description,
            row.created_at,
            row.updated_at,
        )
    }
}

#[derive(sqlx::FromRow)]
struct MemberRow {
    trainee_id: Uuid,
    email: String,
    first_name: String,
    last_name: String,
}

/// [`GroupRepository`] over a [`PgTransaction`].
#[derive(Debug)]
pub struct PgGroupRepository {
    tx: PgTransaction,
    scope: Scope,
    seen: SeenAggregates,
}

impl PgGroupRepository {
    /// Creates a repository bound to `tx`.
    #[must_use]
    pub fn new(scope: Scope, tx: PgTransaction) -> Self {
        Self {
            tx,
            scope,
            seen: SeenAggregates::new(),
        }
    }

    async fn list(&self, sql: &'static str, key: Uuid, page: Page) -> Result<Vec<Group>, GroupError> {
        let mut guard = self.tx.lock().await;
        let conn = connection(&mut guard)?;

        let rows = run(
            &self.scope,
            sqlx::query_as::<_, GroupRow>(sql)
                .bind(key)
                .bind(page.limit)
                .bind(page.offset)
                .fetch_all(&mut *conn),
        )
        .await?;

        let groups: Vec<Group> = rows.into_iter().map(Group::from).collect();
        for group in &groups {
            self.seen.track(group);
        }
        Ok(groups)
    }
}

#[async_trait]
impl GroupRepository for PgGroupRepository {
    async fn add(&self, group: &Group) -> Result<(), GroupError> {
        let mut guard = self.tx.lock().await;
        let conn = connection(&mut guard)?;

        run(
            &self.scope,
            sqlx::query(INSERT_GROUP)
                .bind(group.group_id)
                .bind(group.coach_id)
                .bind(&group.name)
                .bind(&group.description)
                .bind(group.created_at)
                .bind(group.updated_at)
                .execute(&mut *conn),
        )
        .await
        .map_err(|err| match err {
            StorageError::Conflict(_) => GroupError::GroupExists,
            other => other.into(),
        })?;

        self.seen.track(group);
        Ok(())
    }

    async fn get_by_id(&self, group_id: Uuid) -> Result<Group, GroupError> {
        let mut guard = self.tx.lock().await;
        let conn = connection(&mut guard)?;

        let group: Group = run(
            &self.scope,
            sqlx::query_as::<_, GroupRow>(SELECT_GROUP)
                .bind(group_id)
                .fetch_optional(&mut *conn),
        )
        .await?
        .ok_or(GroupError::GroupNotFound)?
        .into();

        self.seen.track(&group);
        Ok(group)
    }

    async fn get_members(&self, group_id: Uuid, page: Page) -> Result<Vec<Member>, GroupError> {
        let mut guard = self.tx.lock().await;
        let conn = connection(&mut guard)?;

        let rows = run(
            &self.scope,
            sqlx::query_as::<_, MemberRow>(SELECT_MEMBERS)
                .bind(group_id)
                .bind(page.limit)
                .bind(page.offset)
                .fetch_all(&mut *conn),
        )
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| Member {
                trainee_id: row.trainee_id,
                email: row.email,
                first_name: row.first_name,
                last_name: row.last_name,
            })
            .collect())
    }

    async fn list_by_coach(&self, coach_id: Uuid, page: Page) -> Result<Vec<Group>, GroupError> {
        self.list(SELECT_BY_COACH, coach_id, page).await
    }

    async fn list_by_trainee(
        &self,
        trainee_id: Uuid,
        page: Page,
    ) -> Result<Vec<Group>, GroupError> {
        self.list(SELECT_BY_TRAINEE, trainee_id, page).await
    }

    fn collect_events(&self) -> Vec<SharedEvent> {
        self.seen.collect_events()
    }

    async fn close(&self) {
        tracing::trace!(tracked = self.seen.len(), "group repository closed");
    }
}
