//! In-memory group repository.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use healthcoach_core::error::StorageError;
use healthcoach_core::event::SharedEvent;
use healthcoach_core::scope::Scope;
use healthcoach_core::tracking::SeenAggregates;
use healthcoach_group::domain::aggregates::{Group, Member, Page};
use healthcoach_group::domain::errors::GroupError;
use healthcoach_group::domain::repository::GroupRepository;
use healthcoach_profile::domain::aggregates::Profile;
use uuid::Uuid;

use super::{MemoryTransaction, Tables};

/// [`GroupRepository`] over a [`MemoryTransaction`].
#[derive(Debug)]
pub struct MemoryGroupRepository {
    tx: MemoryTransaction,
    scope: Scope,
    seen: SeenAggregates,
}

impl MemoryGroupRepository {
    /// Creates a repository bound to `tx`.
    #[must_use]
    pub fn new(scope: Scope, tx: MemoryTransaction) -> Self {
        Self {
            tx,
            scope,
            seen: SeenAggregates::new(),
        }
    }

    fn list(
        &self,
        page: Page,
        predicate: impl Fn(&Tables, &Group) -> bool,
    ) -> Result<Vec<Group>, GroupError> {
        self.scope.ensure_active()?;
        let mut groups = self.tx.read(|t| {
            t.groups
                .values()
                .filter(|g| predicate(t, g))
                .map(detach)
                .collect::<Vec<_>>()
        })?;
        groups.sort_by_key(|g| g.created_at);
        let groups: Vec<Group> = paginate(groups, page);
        for group in &groups {
            self.seen.track(group);
        }
        Ok(groups)
    }
}

fn detach(group: &Group) -> Group {
    Group::restore(
        group.group_id,
        group.coach_id,
        group.name.clone(),
        group.description.clone(),
        group.created_at,
        group.updated_at,
    )
}

fn paginate<T>(items: Vec<T>, page: Page) -> Vec<T> {
    let offset = usize::try_from(page.offset).unwrap_or(usize::MAX);
    let limit = usize::try_from(page.limit).unwrap_or(0);
    items.into_iter().skip(offset).take(limit).collect()
}

/// Earliest acceptance time of every trainee that joined `group_id`.
fn joined_at(tables: &Tables, group_id: Uuid) -> HashMap<Uuid, DateTime<Utc>> {
    let mut joined: HashMap<Uuid, DateTime<Utc>> = HashMap::new();
    for invite in tables.invites.values().filter(|i| i.group_id == group_id) {
        for (trainee_id, at) in &invite.accepted_by {
            joined
                .entry(*trainee_id)
                .and_modify(|first| *first = (*first).min(*at))
                .or_insert(*at);
        }
    }
    joined
}

#[async_trait]
impl GroupRepository for MemoryGroupRepository {
    async fn add(&self, group: &Group) -> Result<(), GroupError> {
        self.scope.ensure_active()?;
        self.tx.write(|t| {
            if t.groups.contains_key(&group.group_id) {
                return Err(GroupError::GroupExists);
            }
            if !matches!(t.profiles.get(&group.coach_id), Some(Profile::Coach(_))) {
                return Err(StorageError::ForeignKey(format!("group coach {}", group.coach_id)).into());
            }
            t.groups.insert(group.group_id, detach(group));
            Ok(())
        })??;
        self.seen.track(group);
        Ok(())
    }

    async fn get_by_id(&self, group_id: Uuid) -> Result<Group, GroupError> {
        self.scope.ensure_active()?;
        let group = self
            .tx
            .read(|t| t.groups.get(&group_id).map(detach))?
            .ok_or(GroupError::GroupNotFound)?;
        self.seen.track(&group);
        Ok(group)
    }

    async fn get_members(&self, group_id: Uuid, page: Page) -> Result<Vec<Member>, GroupError> {
        self.scope.ensure_active()?;
        let mut members = self.tx.read(|t| {
            joined_at(t, group_id)
                .into_iter()
                .filter_map(|(trainee_id, at)| {
                    let Some(Profile::Trainee(trainee)) = t.profiles.get(&trainee_id) else {
                        return None;
                    };
                    let user = t.users.get(&trainee_id)?;
                    Some((
                        at,
                        Member {
                            trainee_id,
                            email: user.email.clone(),
                            first_name: trainee.first_name.clone(),
                            last_name: trainee.last_name.clone(),
                        },
                    ))
                })
                .collect::<Vec<_>>()
        })?;
        members.sort_by_key(|(at, member)| (*at, member.trainee_id));
        Ok(paginate(members, page).into_iter().map(|(_, m)| m).collect())
    }

    async fn list_by_coach(&self, coach_id: Uuid, page: Page) -> Result<Vec<Group>, GroupError> {
        self.list(page, |_, g| g.coach_id == coach_id)
    }

    async fn list_by_trainee(
        &self,
        trainee_id: Uuid,
        page: Page,
    ) -> Result<Vec<Group>, GroupError> {
        self.list(page, |t, g| {
            t.invites
                .values()
                .any(|i| i.group_id == g.group_id && i.accepted_by.contains_key(&trainee_id))
        })
    }

    fn collect_events(&self) -> Vec<SharedEvent> {
        self.seen.collect_events()
    }

    async fn close(&self) {
        tracing::trace!(tracked = self.seen.len(), "group repository closed");
    }
}
