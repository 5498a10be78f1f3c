//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Request, StatusCode};
use chrono::{Duration, TimeZone, Utc};
use healthcoach_api::routes;
use healthcoach_api::state::AppState;
use healthcoach_auth::application::authorizer::{BcryptHasher, SessionAuthorizer};
use healthcoach_auth::application::tokens::TokenIssuer;
use healthcoach_core::unit_of_work::EventPublisher;
use healthcoach_store::MemoryDatabase;
use healthcoach_test_support::{ManualClock, OperationLog, RecordingPublisher, SequenceTokens};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

/// Password every test user signs up with.
pub const PASSWORD: &str = "pw12345678";

/// Access token lifetime used by the test app.
pub const ACCESS_TOKEN_TTL_MINUTES: i64 = 30;

/// The app wired to an in-memory store, a manual clock and a recording
/// publisher.
pub struct TestApp {
    pub router: Router,
    pub db: MemoryDatabase,
    pub clock: Arc<ManualClock>,
    pub publisher: Arc<RecordingPublisher>,
}

/// Build the full app router. Uses the same route structure as `main.rs`.
pub fn build_test_app() -> TestApp {
    let db = MemoryDatabase::new();
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
    ));
    let tokens = Arc::new(SequenceTokens::new());
    let publisher = Arc::new(RecordingPublisher::new(OperationLog::new()));

    let authorizer = SessionAuthorizer::new(
        Arc::new(BcryptHasher::new(4)),
        TokenIssuer::new(b"api-test-secret", Duration::minutes(ACCESS_TOKEN_TTL_MINUTES)),
        tokens.clone(),
        clock.clone(),
    );
    let sink: Arc<dyn EventPublisher> = publisher.clone();
    let state = AppState::new(db.clone(), sink, authorizer, clock.clone(), tokens);

    TestApp {
        router: routes::app(state),
        db,
        clock,
        publisher,
    }
}

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap()
    };

    (status, json)
}

fn with_token(builder: axum::http::request::Builder, token: Option<&str>) -> axum::http::request::Builder {
    match token {
        Some(token) => builder.header(AUTHORIZATION, format!("Bearer {token}")),
        None => builder,
    }
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: &TestApp,
    uri: &str,
    token: Option<&str>,
    body: &Value,
) -> (StatusCode, Value) {
    let request = with_token(Request::builder().method("POST").uri(uri), token)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    send(app, request).await
}

/// Send a POST request without a body and return the response.
pub async fn post_empty(app: &TestApp, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    let request = with_token(Request::builder().method("POST").uri(uri), token)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: &TestApp, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    let request = with_token(Request::builder().method("GET").uri(uri), token)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

/// POST /api/v1/auth/login with form credentials.
pub async fn login(app: &TestApp, email: &str, password: &str) -> (StatusCode, Value) {
    let form = format!(
        "username={}&password={password}",
        email.replace('@', "%40")
    );
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/login")
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header("user-agent", "Mozilla/5.0 (X11; Linux x86_64) Firefox/128.0")
        .body(Body::from(form))
        .unwrap();

    send(app, request).await
}

/// A signed-up, logged-in user.
pub struct Session {
    pub user_id: Uuid,
    pub access_token: String,
    pub refresh_token: String,
}

/// Signs up `email` and logs in.
pub async fn sign_up_and_login(app: &TestApp, email: &str) -> Session {
    let user_id = Uuid::new_v4();
    let (status, _) = post_json(
        app,
        "/api/v1/auth/sign-up",
        None,
        &serde_json::json!({ "user_id": user_id, "email": email, "password": PASSWORD }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, json) = login(app, email, PASSWORD).await;
    assert_eq!(status, StatusCode::OK);

    Session {
        user_id,
        access_token: json["access_token"].as_str().unwrap().to_string(),
        refresh_token: json["refresh_token"].as_str().unwrap().to_string(),
    }
}

/// Signs up a user with a coach profile.
pub async fn coach(app: &TestApp, email: &str) -> Session {
    let session = sign_up_and_login(app, email).await;
    let (status, _) = post_json(
        app,
        "/api/v1/profiles/coach",
        Some(&session.access_token),
        &serde_json::json!({
            "first_name": "Ada",
            "last_name": "Lovelace",
            "years_experience": 5,
            "bio": "Strength and conditioning",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    session
}

/// Signs up a user with a trainee profile.
pub async fn trainee(app: &TestApp, email: &str) -> Session {
    let session = sign_up_and_login(app, email).await;
    let (status, _) = post_json(
        app,
        "/api/v1/profiles/trainee",
        Some(&session.access_token),
        &serde_json::json!({
            "first_name": "Grace",
            "last_name": "Hopper",
            "birth_date": "1990-12-09",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    session
}
