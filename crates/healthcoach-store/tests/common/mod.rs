//! Shared wiring for the storage integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use healthcoach_auth::application::authorizer::{BcryptHasher, SessionAuthorizer};
use healthcoach_auth::application::command_handlers::handle_create_user;
use healthcoach_auth::application::context::AuthUnitOfWork;
use healthcoach_auth::application::tokens::TokenIssuer;
use healthcoach_auth::domain::commands::CreateUser;
use healthcoach_core::scope::Scope;
use healthcoach_core::unit_of_work::{EventPublisher, UnitOfWork};
use healthcoach_group::application::command_handlers::handle_create_group;
use healthcoach_group::application::context::GroupUnitOfWork;
use healthcoach_group::domain::commands::CreateGroup;
use healthcoach_invite::application::context::InviteUnitOfWork;
use healthcoach_metric::application::context::MetricUnitOfWork;
use healthcoach_profile::application::command_handlers::{
    handle_create_coach, handle_create_trainee,
};
use healthcoach_profile::application::context::ProfileUnitOfWork;
use healthcoach_profile::domain::commands::{CreateCoach, CreateTrainee};
use healthcoach_store::{MemoryDatabase, StorageBackend};
use healthcoach_test_support::{ManualClock, OperationLog, RecordingPublisher, SequenceTokens};
use uuid::Uuid;

/// Password every seeded user is registered with.
pub const PASSWORD: &str = "pw12345678";

pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
}

/// Every unit of work wired to one in-memory store.
pub struct Harness {
    pub db: MemoryDatabase,
    pub log: OperationLog,
    pub publisher: Arc<RecordingPublisher>,
    pub clock: Arc<ManualClock>,
    pub tokens: Arc<SequenceTokens>,
    pub authorizer: SessionAuthorizer,
    pub scope: Scope,
    pub auth: AuthUnitOfWork<MemoryDatabase>,
    pub profiles: ProfileUnitOfWork<MemoryDatabase>,
    pub groups: GroupUnitOfWork<MemoryDatabase>,
    pub invites: InviteUnitOfWork<MemoryDatabase>,
    pub metrics: MetricUnitOfWork<MemoryDatabase>,
}

impl Harness {
    pub fn new() -> Self {
        let db = MemoryDatabase::new();
        let log = OperationLog::new();
        let publisher = Arc::new(RecordingPublisher::new(log.clone()));
        let clock = Arc::new(ManualClock::new(start()));
        let tokens = Arc::new(SequenceTokens::new());
        let authorizer = SessionAuthorizer::new(
            Arc::new(BcryptHasher::new(4)),
            TokenIssuer::new(b"storage-test-secret", Duration::minutes(15)),
            tokens.clone(),
            clock.clone(),
        );
        let sink: Arc<dyn EventPublisher> = publisher.clone();

        Self {
            auth: UnitOfWork::new(db.clone(), MemoryDatabase::auth_context, sink.clone()),
            profiles: UnitOfWork::new(db.clone(), MemoryDatabase::profile_context, sink.clone()),
            groups: UnitOfWork::new(db.clone(), MemoryDatabase::group_context, sink.clone()),
            invites: UnitOfWork::new(db.clone(), MemoryDatabase::invite_context, sink.clone()),
            metrics: UnitOfWork::new(db.clone(), MemoryDatabase::metric_context, sink),
            db,
            log,
            publisher,
            clock,
            tokens,
            authorizer,
            scope: Scope::new(),
        }
    }

    pub async fn create_user(&self, email: &str) -> Uuid {
        let command = CreateUser {
            correlation_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            email: email.to_owned(),
            password: PASSWORD.to_owned(),
        };
        handle_create_user(&command, &self.scope, &self.auth, &self.authorizer, self.clock.as_ref())
            .await
            .unwrap();
        command.user_id
    }

    pub async fn create_trainee(&self, email: &str) -> Uuid {
        let user_id = self.create_user(email).await;
        let command = CreateTrainee {
            correlation_id: Uuid::new_v4(),
            user_id,
            first_name: "Grace".to_owned(),
            last_name: "Hopper".to_owned(),
            birth_date: None,
        };
        handle_create_trainee(&command, &self.scope, &self.profiles, self.clock.as_ref())
            .await
            .unwrap();
        user_id
    }

    pub async fn create_coach(&self, email: &str) -> Uuid {
        let user_id = self.create_user(email).await;
        let command = CreateCoach {
            correlation_id: Uuid::new_v4(),
            user_id,
            first_name: "Ada".to_owned(),
            last_name: "Lovelace".to_owned(),
            birth_date: None,
            years_experience: 5,
            bio: "Endurance".to_owned(),
        };
        handle_create_coach(&command, &self.scope, &self.profiles, self.clock.as_ref())
            .await
            .unwrap();
        user_id
    }

    pub async fn create_group(&self, coach_id: Uuid) -> Uuid {
        let command = CreateGroup {
            correlation_id: Uuid::new_v4(),
            group_id: Uuid::new_v4(),
            coach_id,
            name: "Morning runners".to_owned(),
            description: "5k before work".to_owned(),
        };
        handle_create_group(&command, &self.scope, &self.groups, self.clock.as_ref())
            .await
            .unwrap();
        command.group_id
    }
}
