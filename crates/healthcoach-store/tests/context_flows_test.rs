//! Profile, group, invite and metric flows over the in-memory backend.

mod common;

use chrono::Duration;
use healthcoach_core::unit_of_work::AtomicError;
use healthcoach_group::application::command_handlers::handle_create_group;
use healthcoach_group::application::query_handlers::{get_members, get_user_groups};
use healthcoach_group::domain::aggregates::Page;
use healthcoach_group::domain::commands::CreateGroup;
use healthcoach_group::domain::errors::GroupError;
use healthcoach_invite::application::command_handlers::{
    handle_accept_invite, handle_create_invite,
};
use healthcoach_invite::domain::commands::{AcceptInvite, CreateInvite};
use healthcoach_invite::domain::errors::InviteError;
use healthcoach_invite::domain::events::{INVITE_ACCEPTED, INVITE_CREATED};
use healthcoach_metric::application::command_handlers::handle_record_metric;
use healthcoach_metric::application::query_handlers::{get_metric, list_metrics_by_trainee};
use healthcoach_metric::domain::commands::RecordMetric;
use healthcoach_metric::domain::errors::MetricError;
use healthcoach_profile::application::command_handlers::handle_create_trainee;
use healthcoach_profile::application::query_handlers::{get_coach, get_trainee};
use healthcoach_profile::domain::commands::CreateTrainee;
use healthcoach_profile::domain::errors::ProfileError;
use uuid::Uuid;

use common::Harness;

fn accept(trainee_id: Uuid, secret: &str) -> AcceptInvite {
    AcceptInvite {
        correlation_id: Uuid::new_v4(),
        trainee_id,
        secret: secret.to_owned(),
    }
}

fn create_invite(group_id: Uuid) -> CreateInvite {
    CreateInvite {
        correlation_id: Uuid::new_v4(),
        group_id,
    }
}

fn record(metric_id: Uuid, trainee_id: Uuid, heart_rate: i32) -> RecordMetric {
    RecordMetric {
        correlation_id: Uuid::new_v4(),
        metric_id,
        trainee_id,
        heart_rate,
        weight: 70,
        height: 178,
    }
}

// --- profiles ---

#[tokio::test]
async fn test_profile_subtype_queries() {
    // Arrange
    let h = Harness::new();
    let trainee_id = h.create_trainee("t@example.com").await;
    let coach_id = h.create_coach("c@example.com").await;

    // Act
    let trainee = get_trainee(trainee_id, &h.scope, &h.profiles).await;
    let coach = get_coach(coach_id, &h.scope, &h.profiles).await;
    let mismatch = get_coach(trainee_id, &h.scope, &h.profiles).await;

    // Assert
    assert_eq!(trainee.unwrap().first_name, "Grace");
    assert_eq!(coach.unwrap().years_experience, 5);
    assert!(matches!(mismatch, Err(AtomicError::Business(ProfileError::ProfileNotFound))));
}

#[tokio::test]
async fn test_second_profile_for_same_user_is_rejected() {
    let h = Harness::new();
    let user_id = h.create_coach("c@example.com").await;

    let result = handle_create_trainee(
        &CreateTrainee {
            correlation_id: Uuid::new_v4(),
            user_id,
            first_name: "Ada".to_owned(),
            last_name: "Lovelace".to_owned(),
            birth_date: None,
        },
        &h.scope,
        &h.profiles,
        h.clock.as_ref(),
    )
    .await;

    assert!(matches!(result, Err(AtomicError::Business(ProfileError::ProfileExists))));
}

// --- groups ---

#[tokio::test]
async fn test_trainee_cannot_create_group() {
    let h = Harness::new();
    let trainee_id = h.create_trainee("t@example.com").await;

    let result = handle_create_group(
        &CreateGroup {
            correlation_id: Uuid::new_v4(),
            group_id: Uuid::new_v4(),
            coach_id: trainee_id,
            name: "Nope".to_owned(),
            description: String::new(),
        },
        &h.scope,
        &h.groups,
        h.clock.as_ref(),
    )
    .await;

    assert!(matches!(result, Err(AtomicError::Business(GroupError::NotACoach))));
    assert!(h.db.snapshot().await.groups.is_empty());
}

#[tokio::test]
async fn test_coach_groups_are_listed_oldest_first() {
    // Arrange
    let h = Harness::new();
    let coach_id = h.create_coach("c@example.com").await;
    let first = h.create_group(coach_id).await;
    h.clock.advance(Duration::minutes(1));
    let second = h.create_group(coach_id).await;

    // Act
    let all = get_user_groups(coach_id, Page::default(), &h.scope, &h.groups)
        .await
        .unwrap();
    let paged = get_user_groups(coach_id, Page::new(1, 1), &h.scope, &h.groups)
        .await
        .unwrap();

    // Assert
    let ids: Vec<Uuid> = all.iter().map(|g| g.group_id).collect();
    assert_eq!(ids, vec![first, second]);
    assert_eq!(paged.len(), 1);
    assert_eq!(paged[0].group_id, second);
}

#[tokio::test]
async fn test_members_of_unknown_group_is_not_found() {
    let h = Harness::new();

    let result = get_members(Uuid::new_v4(), Page::default(), &h.scope, &h.groups).await;

    assert!(matches!(result, Err(AtomicError::Business(GroupError::GroupNotFound))));
}

// --- invites ---

#[tokio::test]
async fn test_accepted_invite_adds_member_and_group() {
    // Arrange
    let h = Harness::new();
    let coach_id = h.create_coach("c@example.com").await;
    let group_id = h.create_group(coach_id).await;
    let trainee_id = h.create_trainee("t@example.com").await;
    let invite = handle_create_invite(
        &create_invite(group_id),
        &h.scope,
        &h.invites,
        h.tokens.as_ref(),
        h.clock.as_ref(),
    )
    .await
    .unwrap();

    // Act
    let accepted = handle_accept_invite(&accept(trainee_id, &invite.secret), &h.scope, &h.invites, h.clock.as_ref())
        .await
        .unwrap();

    // Assert
    assert!(accepted.accepted_by.contains_key(&trainee_id));
    let members = get_members(group_id, Page::default(), &h.scope, &h.groups)
        .await
        .unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].trainee_id, trainee_id);
    assert_eq!(members[0].email, "t@example.com");
    let groups = get_user_groups(trainee_id, Page::default(), &h.scope, &h.groups)
        .await
        .unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].group_id, group_id);
    let types = h.publisher.published_types();
    assert!(types.ends_with(&[INVITE_CREATED, INVITE_ACCEPTED]));
}

#[tokio::test]
async fn test_accepting_twice_is_rejected() {
    let h = Harness::new();
    let coach_id = h.create_coach("c@example.com").await;
    let group_id = h.create_group(coach_id).await;
    let trainee_id = h.create_trainee("t@example.com").await;
    let invite = handle_create_invite(&create_invite(group_id), &h.scope, &h.invites, h.tokens.as_ref(), h.clock.as_ref())
        .await
        .unwrap();
    handle_accept_invite(&accept(trainee_id, &invite.secret), &h.scope, &h.invites, h.clock.as_ref())
        .await
        .unwrap();

    let result = handle_accept_invite(&accept(trainee_id, &invite.secret), &h.scope, &h.invites, h.clock.as_ref()).await;

    assert!(matches!(result, Err(AtomicError::Business(InviteError::AlreadyAccepted))));
}

#[tokio::test]
async fn test_expired_invite_is_rejected() {
    // Arrange
    let h = Harness::new();
    let coach_id = h.create_coach("c@example.com").await;
    let group_id = h.create_group(coach_id).await;
    let trainee_id = h.create_trainee("t@example.com").await;
    let invite = handle_create_invite(&create_invite(group_id), &h.scope, &h.invites, h.tokens.as_ref(), h.clock.as_ref())
        .await
        .unwrap();
    h.clock.advance(Duration::minutes(11));

    // Act
    let result = handle_accept_invite(&accept(trainee_id, &invite.secret), &h.scope, &h.invites, h.clock.as_ref()).await;

    // Assert
    assert!(matches!(result, Err(AtomicError::Business(InviteError::Expired))));
    let members = get_members(group_id, Page::default(), &h.scope, &h.groups)
        .await
        .unwrap();
    assert!(members.is_empty());
}

#[tokio::test]
async fn test_unknown_secret_is_invalid() {
    let h = Harness::new();
    let trainee_id = h.create_trainee("t@example.com").await;

    let result = handle_accept_invite(&accept(trainee_id, "000000"), &h.scope, &h.invites, h.clock.as_ref()).await;

    assert!(matches!(result, Err(AtomicError::Business(InviteError::InvalidSecret))));
}

#[tokio::test]
async fn test_coach_cannot_accept_invite() {
    let h = Harness::new();
    let coach_id = h.create_coach("c@example.com").await;
    let group_id = h.create_group(coach_id).await;
    let invite = handle_create_invite(&create_invite(group_id), &h.scope, &h.invites, h.tokens.as_ref(), h.clock.as_ref())
        .await
        .unwrap();

    let result = handle_accept_invite(&accept(coach_id, &invite.secret), &h.scope, &h.invites, h.clock.as_ref()).await;

    assert!(matches!(result, Err(AtomicError::Business(InviteError::TraineeNotFound))));
}

#[tokio::test]
async fn test_invite_for_unknown_group_is_rejected() {
    let h = Harness::new();

    let result = handle_create_invite(&create_invite(Uuid::new_v4()), &h.scope, &h.invites, h.tokens.as_ref(), h.clock.as_ref()).await;

    assert!(matches!(result, Err(AtomicError::Business(InviteError::GroupNotFound))));
    assert!(h.db.snapshot().await.invites.is_empty());
}

// --- metrics ---

#[tokio::test]
async fn test_recorded_metrics_are_listed_in_order() {
    // Arrange
    let h = Harness::new();
    let trainee_id = h.create_trainee("t@example.com").await;
    let first = Uuid::new_v4();
    let second = Uuid::new_v4();

    // Act
    handle_record_metric(&record(first, trainee_id, 61), &h.scope, &h.metrics, h.clock.as_ref())
        .await
        .unwrap();
    h.clock.advance(Duration::days(1));
    handle_record_metric(&record(second, trainee_id, 58), &h.scope, &h.metrics, h.clock.as_ref())
        .await
        .unwrap();

    // Assert
    let listed = list_metrics_by_trainee(trainee_id, &h.scope, &h.metrics)
        .await
        .unwrap();
    let ids: Vec<Uuid> = listed.iter().map(|m| m.metric_id).collect();
    assert_eq!(ids, vec![first, second]);
    let fetched = get_metric(second, &h.scope, &h.metrics).await.unwrap();
    assert_eq!(fetched.heart_rate, 58);
}

#[tokio::test]
async fn test_duplicate_metric_is_rejected() {
    let h = Harness::new();
    let trainee_id = h.create_trainee("t@example.com").await;
    let metric_id = Uuid::new_v4();
    handle_record_metric(&record(metric_id, trainee_id, 61), &h.scope, &h.metrics, h.clock.as_ref())
        .await
        .unwrap();

    let result = handle_record_metric(&record(metric_id, trainee_id, 62), &h.scope, &h.metrics, h.clock.as_ref()).await;

    assert!(matches!(result, Err(AtomicError::Business(MetricError::MetricExists))));
}

#[tokio::test]
async fn test_metric_for_unknown_trainee_is_rejected() {
    let h = Harness::new();

    let result = handle_record_metric(&record(Uuid::new_v4(), Uuid::new_v4(), 61), &h.scope, &h.metrics, h.clock.as_ref()).await;

    assert!(matches!(result, Err(AtomicError::Business(MetricError::TraineeNotFound))));
}

#[tokio::test]
async fn test_unknown_metric_is_not_found() {
    let h = Harness::new();

    let result = get_metric(Uuid::new_v4(), &h.scope, &h.metrics).await;

    assert!(matches!(result, Err(AtomicError::Business(MetricError::MetricNotFound))));
}
