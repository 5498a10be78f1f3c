//! Integration tests for profiles, groups, invites and metrics.

mod common;

use axum::http::StatusCode;
use chrono::Duration;
use uuid::Uuid;

#[tokio::test]
async fn test_profile_is_readable_by_id() {
    // Arrange
    let app = common::build_test_app();
    let coach = common::coach(&app, "ada@example.com").await;
    let trainee = common::trainee(&app, "grace@example.com").await;

    // Act
    let (coach_status, coach_json) = common::get_json(
        &app,
        &format!("/api/v1/profiles/{}", coach.user_id),
        Some(&trainee.access_token),
    )
    .await;
    let (trainee_status, trainee_json) = common::get_json(
        &app,
        &format!("/api/v1/profiles/{}", trainee.user_id),
        Some(&coach.access_token),
    )
    .await;

    // Assert
    assert_eq!(coach_status, StatusCode::OK);
    assert_eq!(coach_json["profile_type"], "coach");
    assert_eq!(coach_json["years_experience"], 5);
    assert_eq!(trainee_status, StatusCode::OK);
    assert_eq!(trainee_json["profile_type"], "trainee");
    assert_eq!(trainee_json["birth_date"], "1990-12-09");
    assert!(trainee_json.get("bio").is_none());
}

#[tokio::test]
async fn test_second_profile_returns_409() {
    let app = common::build_test_app();
    let coach = common::coach(&app, "ada@example.com").await;

    let (status, json) = common::post_json(
        &app,
        "/api/v1/profiles/trainee",
        Some(&coach.access_token),
        &serde_json::json!({ "first_name": "Ada", "last_name": "Lovelace" }),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"], "profile_exists");
}

#[tokio::test]
async fn test_unknown_profile_returns_404() {
    let app = common::build_test_app();
    let session = common::sign_up_and_login(&app, "ada@example.com").await;

    let (status, json) = common::get_json(
        &app,
        &format!("/api/v1/profiles/{}", Uuid::new_v4()),
        Some(&session.access_token),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "profile_not_found");
}

#[tokio::test]
async fn test_profiles_me_returns_own_profile() {
    // Arrange
    let app = common::build_test_app();
    let trainee = common::trainee(&app, "grace@example.com").await;

    // Act
    let (status, json) =
        common::get_json(&app, "/api/v1/profiles/me", Some(&trainee.access_token)).await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["user_id"], trainee.user_id.to_string());
    assert_eq!(json["profile_type"], "trainee");
}

#[tokio::test]
async fn test_profiles_me_without_profile_returns_404() {
    let app = common::build_test_app();
    let session = common::sign_up_and_login(&app, "ada@example.com").await;

    let (status, json) =
        common::get_json(&app, "/api/v1/profiles/me", Some(&session.access_token)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "profile_not_found");
}

#[tokio::test]
async fn test_trainee_route_only_returns_trainees() {
    // Arrange
    let app = common::build_test_app();
    let coach = common::coach(&app, "ada@example.com").await;
    let trainee = common::trainee(&app, "grace@example.com").await;

    // Act
    let (trainee_status, trainee_json) = common::get_json(
        &app,
        &format!("/api/v1/trainees/{}", trainee.user_id),
        Some(&coach.access_token),
    )
    .await;
    let (coach_status, coach_json) = common::get_json(
        &app,
        &format!("/api/v1/trainees/{}", coach.user_id),
        Some(&coach.access_token),
    )
    .await;

    // Assert
    assert_eq!(trainee_status, StatusCode::OK);
    assert_eq!(trainee_json["profile_type"], "trainee");
    assert_eq!(trainee_json["user_id"], trainee.user_id.to_string());
    assert_eq!(coach_status, StatusCode::NOT_FOUND);
    assert_eq!(coach_json["error"], "profile_not_found");
}

#[tokio::test]
async fn test_coach_route_only_returns_coaches() {
    // Arrange
    let app = common::build_test_app();
    let coach = common::coach(&app, "ada@example.com").await;
    let trainee = common::trainee(&app, "grace@example.com").await;

    // Act
    let (coach_status, coach_json) = common::get_json(
        &app,
        &format!("/api/v1/coaches/{}", coach.user_id),
        Some(&trainee.access_token),
    )
    .await;
    let (trainee_status, trainee_json) = common::get_json(
        &app,
        &format!("/api/v1/coaches/{}", trainee.user_id),
        Some(&trainee.access_token),
    )
    .await;

    // Assert
    assert_eq!(coach_status, StatusCode::OK);
    assert_eq!(coach_json["profile_type"], "coach");
    assert_eq!(coach_json["years_experience"], 5);
    assert_eq!(trainee_status, StatusCode::NOT_FOUND);
    assert_eq!(trainee_json["error"], "profile_not_found");
}

#[tokio::test]
async fn test_trainee_cannot_create_group() {
    let app = common::build_test_app();
    let trainee = common::trainee(&app, "grace@example.com").await;

    let (status, json) = common::post_json(
        &app,
        "/api/v1/groups",
        Some(&trainee.access_token),
        &serde_json::json!({ "name": "Morning runners" }),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["error"], "not_a_coach");
}

#[tokio::test]
async fn test_invite_flow_adds_trainee_to_group() {
    // Arrange
    let app = common::build_test_app();
    let coach = common::coach(&app, "ada@example.com").await;
    let trainee = common::trainee(&app, "grace@example.com").await;

    let (status, group) = common::post_json(
        &app,
        "/api/v1/groups",
        Some(&coach.access_token),
        &serde_json::json!({ "name": "Morning runners", "description": "5k before work" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let group_id = group["group_id"].as_str().unwrap().to_string();
    assert_eq!(group["coach_id"], coach.user_id.to_string());

    let (status, invite) = common::post_empty(
        &app,
        &format!("/api/v1/groups/{group_id}/invites"),
        Some(&coach.access_token),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let secret = invite["secret"].as_str().unwrap().to_string();

    // Act
    let (status, accepted) = common::post_json(
        &app,
        "/api/v1/invites/accept",
        Some(&trainee.access_token),
        &serde_json::json!({ "secret": secret }),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert_eq!(accepted["group_id"], group_id.as_str());
    assert!(accepted["accepted_at"].is_string());

    let (status, members) = common::get_json(
        &app,
        &format!("/api/v1/groups/{group_id}/members"),
        Some(&coach.access_token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let members = members["members"].as_array().unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0]["trainee_id"], trainee.user_id.to_string());
    assert_eq!(members[0]["email"], "grace@example.com");

    let (status, joined) =
        common::get_json(&app, "/api/v1/groups", Some(&trainee.access_token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(joined["groups"][0]["group_id"], group_id.as_str());

    let types = app.publisher.published_types();
    assert!(types.contains(&"group.created"));
    assert!(types.contains(&"invite.created"));
    assert_eq!(types.last(), Some(&"invite.accepted"));
}

#[tokio::test]
async fn test_only_owner_can_invite() {
    // Arrange
    let app = common::build_test_app();
    let owner = common::coach(&app, "ada@example.com").await;
    let other = common::coach(&app, "bob@example.com").await;
    let (_, group) = common::post_json(
        &app,
        "/api/v1/groups",
        Some(&owner.access_token),
        &serde_json::json!({ "name": "Morning runners" }),
    )
    .await;
    let group_id = group["group_id"].as_str().unwrap();

    // Act
    let (status, json) = common::post_empty(
        &app,
        &format!("/api/v1/groups/{group_id}/invites"),
        Some(&other.access_token),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["error"], "forbidden");
    assert!(!app.publisher.published_types().contains(&"invite.created"));
}

#[tokio::test]
async fn test_expired_invite_is_rejected() {
    // Arrange
    let app = common::build_test_app();
    let coach = common::coach(&app, "ada@example.com").await;
    let trainee = common::trainee(&app, "grace@example.com").await;
    let (_, group) = common::post_json(
        &app,
        "/api/v1/groups",
        Some(&coach.access_token),
        &serde_json::json!({ "name": "Morning runners" }),
    )
    .await;
    let (_, invite) = common::post_empty(
        &app,
        &format!("/api/v1/groups/{}/invites", group["group_id"].as_str().unwrap()),
        Some(&coach.access_token),
    )
    .await;
    app.clock.advance(Duration::minutes(11));

    // Act
    let (status, json) = common::post_json(
        &app,
        "/api/v1/invites/accept",
        Some(&trainee.access_token),
        &serde_json::json!({ "secret": invite["secret"] }),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invite_expired");
}

#[tokio::test]
async fn test_unknown_group_returns_404() {
    let app = common::build_test_app();
    let coach = common::coach(&app, "ada@example.com").await;

    let (status, json) = common::get_json(
        &app,
        &format!("/api/v1/groups/{}", Uuid::new_v4()),
        Some(&coach.access_token),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "group_not_found");
}

#[tokio::test]
async fn test_metrics_are_recorded_and_listed_in_order() {
    // Arrange
    let app = common::build_test_app();
    let trainee = common::trainee(&app, "grace@example.com").await;

    // Act
    let (status, first) = common::post_json(
        &app,
        "/api/v1/metrics",
        Some(&trainee.access_token),
        &serde_json::json!({ "heart_rate": 62, "weight": 58, "height": 165 }),
    )
    .await;
    app.clock.advance(Duration::minutes(5));
    let (_, second) = common::post_json(
        &app,
        "/api/v1/metrics",
        Some(&trainee.access_token),
        &serde_json::json!({ "heart_rate": 60, "weight": 57, "height": 165 }),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["trainee_id"], trainee.user_id.to_string());

    let (status, fetched) = common::get_json(
        &app,
        &format!("/api/v1/metrics/{}", first["metric_id"].as_str().unwrap()),
        Some(&trainee.access_token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["heart_rate"], 62);

    let (status, listed) = common::get_json(
        &app,
        &format!("/api/v1/trainees/{}/metrics", trainee.user_id),
        Some(&trainee.access_token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let metrics = listed["metrics"].as_array().unwrap();
    assert_eq!(metrics.len(), 2);
    assert_eq!(metrics[0]["metric_id"], first["metric_id"]);
    assert_eq!(metrics[1]["metric_id"], second["metric_id"]);
}

#[tokio::test]
async fn test_metric_values_must_be_positive() {
    let app = common::build_test_app();
    let trainee = common::trainee(&app, "grace@example.com").await;

    let (status, json) = common::post_json(
        &app,
        "/api/v1/metrics",
        Some(&trainee.access_token),
        &serde_json::json!({ "heart_rate": 0, "weight": 58, "height": 165 }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "validation_error");
}

#[tokio::test]
async fn test_metric_for_user_without_trainee_profile_returns_404() {
    let app = common::build_test_app();
    let coach = common::coach(&app, "ada@example.com").await;

    let (status, json) = common::post_json(
        &app,
        "/api/v1/metrics",
        Some(&coach.access_token),
        &serde_json::json!({ "heart_rate": 62, "weight": 58, "height": 165 }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "trainee_not_found");
}
