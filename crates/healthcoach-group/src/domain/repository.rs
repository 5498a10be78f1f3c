//! Repository contract for groups.

use async_trait::async_trait;
use healthcoach_core::event::SharedEvent;
use uuid::Uuid;

use crate::domain::aggregates::{Group, Member, Page};
use crate::domain::errors::GroupError;

/// Transaction-scoped access to groups and their members.
#[async_trait]
pub trait GroupRepository: Send + Sync {
    /// Inserts a new group.
    ///
    /// # Errors
    ///
    /// Returns `GroupError::GroupExists` on a duplicate id.
    async fn add(&self, group: &Group) -> Result<(), GroupError>;

    /// Loads a group by id.
    ///
    /// # Errors
    ///
    /// Returns `GroupError::GroupNotFound` if no group matches.
    async fn get_by_id(&self, group_id: Uuid) -> Result<Group, GroupError>;

    /// Lists the trainees that joined `group_id`, ordered by acceptance time.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the query fails.
    async fn get_members(&self, group_id: Uuid, page: Page) -> Result<Vec<Member>, GroupError>;

    /// Lists the groups owned by `coach_id`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the query fails.
    async fn list_by_coach(&self, coach_id: Uuid, page: Page) -> Result<Vec<Group>, GroupError>;

    /// Lists the groups `trainee_id` joined, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the query fails.
    async fn list_by_trainee(&self, trainee_id: Uuid, page: Page)
    -> Result<Vec<Group>, GroupError>;

    /// Drains the events of every group this repository handed out.
    fn collect_events(&self) -> Vec<SharedEvent>;

    /// Releases the repository.
    async fn close(&self);
}
