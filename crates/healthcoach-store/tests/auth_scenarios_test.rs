//! Session lifecycle and rollback behaviour over the in-memory backend.

mod common;

use chrono::Duration;
use healthcoach_auth::application::command_handlers::{
    handle_create_user, handle_login, handle_logout, handle_refresh,
};
use healthcoach_auth::application::query_handlers::{authenticate, get_user};
use healthcoach_auth::domain::aggregates::{Device, User};
use healthcoach_auth::domain::commands::{CreateUser, Login, Logout, Refresh};
use healthcoach_auth::domain::errors::AuthError;
use healthcoach_auth::domain::events::{USER_CREATED, USER_LOGIN, USER_LOGOUT};
use healthcoach_core::error::StorageError;
use healthcoach_core::scope::Scope;
use healthcoach_core::storage::{Database, Transaction};
use healthcoach_core::unit_of_work::{AtomicContext, AtomicError, UnitOfWork};
use healthcoach_store::{MemoryDatabase, StorageBackend};
use uuid::Uuid;

use common::{Harness, PASSWORD};

fn login(email: &str, password: &str) -> Login {
    Login {
        correlation_id: Uuid::new_v4(),
        email: email.to_owned(),
        password: password.to_owned(),
        device: Device {
            browser: "Firefox".to_owned(),
            os: "Linux".to_owned(),
            ip_address: "10.0.0.7".to_owned(),
            model: "desktop".to_owned(),
        },
    }
}

#[tokio::test]
async fn test_login_opens_active_session_and_publishes_login() {
    // Arrange
    let h = Harness::new();
    let user_id = h.create_user("u1@example.com").await;

    // Act
    let tokens = handle_login(&login("u1@example.com", PASSWORD), &h.scope, &h.auth, &h.authorizer)
        .await
        .unwrap();

    // Assert
    let identity = authenticate(&h.authorizer, &tokens.access_token).unwrap();
    assert_eq!(identity.user_id, user_id);
    let user = get_user(user_id, &h.scope, &h.auth).await.unwrap();
    assert_eq!(user.authorizations.len(), 1);
    let session = &user.authorizations[0];
    assert_eq!(session.id, identity.authorization_id);
    assert_eq!(session.secret, tokens.refresh_token);
    assert!(session.is_active(h.clock.as_ref()));
    assert_eq!(session.device.browser, "Firefox");
    assert_eq!(h.publisher.published_types(), vec![USER_CREATED, USER_LOGIN]);
}

#[tokio::test]
async fn test_login_with_wrong_password_appends_no_session() {
    // Arrange
    let h = Harness::new();
    let user_id = h.create_user("u1@example.com").await;

    // Act
    let result = handle_login(&login("u1@example.com", "wrong-password"), &h.scope, &h.auth, &h.authorizer).await;

    // Assert
    assert!(matches!(result, Err(AtomicError::Business(AuthError::InvalidCredentials))));
    let user = get_user(user_id, &h.scope, &h.auth).await.unwrap();
    assert!(user.authorizations.is_empty());
    assert_eq!(h.publisher.published_types(), vec![USER_CREATED]);
}

#[tokio::test]
async fn test_login_with_unknown_email_is_invalid_credentials() {
    let h = Harness::new();

    let result = handle_login(&login("nobody@example.com", PASSWORD), &h.scope, &h.auth, &h.authorizer).await;

    assert!(matches!(result, Err(AtomicError::Business(AuthError::InvalidCredentials))));
}

#[tokio::test]
async fn test_second_logout_of_same_session_is_unauthorized() {
    // Arrange
    let h = Harness::new();
    let user_id = h.create_user("u1@example.com").await;
    let tokens = handle_login(&login("u1@example.com", PASSWORD), &h.scope, &h.auth, &h.authorizer)
        .await
        .unwrap();
    let identity = authenticate(&h.authorizer, &tokens.access_token).unwrap();
    let logout = Logout {
        correlation_id: Uuid::new_v4(),
        user_id,
        authorization_id: identity.authorization_id,
    };

    // Act
    let first = handle_logout(&logout, &h.scope, &h.auth, h.clock.as_ref()).await;
    let second = handle_logout(&logout, &h.scope, &h.auth, h.clock.as_ref()).await;

    // Assert
    assert!(first.is_ok());
    assert!(matches!(second, Err(AtomicError::Business(AuthError::Unauthorized(_)))));
    assert_eq!(
        h.publisher.published_types(),
        vec![USER_CREATED, USER_LOGIN, USER_LOGOUT]
    );
}

#[tokio::test]
async fn test_refresh_after_logout_reports_inactive_session() {
    // Arrange
    let h = Harness::new();
    let user_id = h.create_user("u1@example.com").await;
    let tokens = handle_login(&login("u1@example.com", PASSWORD), &h.scope, &h.auth, &h.authorizer)
        .await
        .unwrap();
    let refresh = Refresh {
        correlation_id: Uuid::new_v4(),
        refresh_token: tokens.refresh_token.clone(),
    };
    let refreshed = handle_refresh(&refresh, &h.scope, &h.auth, &h.authorizer)
        .await
        .unwrap();
    let identity = authenticate(&h.authorizer, &tokens.access_token).unwrap();
    handle_logout(
        &Logout {
            correlation_id: Uuid::new_v4(),
            user_id,
            authorization_id: identity.authorization_id,
        },
        &h.scope,
        &h.auth,
        h.clock.as_ref(),
    )
    .await
    .unwrap();

    // Act
    let result = handle_refresh(&refresh, &h.scope, &h.auth, &h.authorizer).await;

    // Assert
    assert_eq!(refreshed.refresh_token, tokens.refresh_token);
    assert!(matches!(result, Err(AtomicError::Business(AuthError::InactiveSession))));
}

#[tokio::test]
async fn test_refresh_after_session_expiry_reports_inactive_session() {
    let h = Harness::new();
    h.create_user("u1@example.com").await;
    let tokens = handle_login(&login("u1@example.com", PASSWORD), &h.scope, &h.auth, &h.authorizer)
        .await
        .unwrap();
    h.clock.advance(Duration::hours(25));

    let result = handle_refresh(
        &Refresh {
            correlation_id: Uuid::new_v4(),
            refresh_token: tokens.refresh_token,
        },
        &h.scope,
        &h.auth,
        &h.authorizer,
    )
    .await;

    assert!(matches!(result, Err(AtomicError::Business(AuthError::InactiveSession))));
}

#[tokio::test]
async fn test_business_error_discards_added_user() {
    // Arrange
    let h = Harness::new();
    let user = User::restore(
        Uuid::new_v4(),
        "ghost@example.com".to_owned(),
        "hash".to_owned(),
        common::start(),
        common::start(),
        Vec::new(),
    );
    let user_id = user.user_id;

    // Act
    let result = h
        .auth
        .atomic(&h.scope, |ctx| async move {
            ctx.users().add(&user).await?;
            Err::<(), _>(AuthError::Unauthorized("changed my mind"))
        })
        .await;

    // Assert
    assert!(matches!(result, Err(AtomicError::Business(AuthError::Unauthorized(_)))));
    assert!(!h.db.snapshot().await.users.contains_key(&user_id));
    assert!(matches!(
        get_user(user_id, &h.scope, &h.auth).await,
        Err(AtomicError::Business(AuthError::UserNotFound))
    ));
    assert!(h.publisher.published().is_empty());
}

#[tokio::test]
async fn test_duplicate_email_is_rejected() {
    let h = Harness::new();
    h.create_user("u1@example.com").await;

    let result = handle_create_user(
        &CreateUser {
            correlation_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            email: "u1@example.com".to_owned(),
            password: PASSWORD.to_owned(),
        },
        &h.scope,
        &h.auth,
        &h.authorizer,
        h.clock.as_ref(),
    )
    .await;

    assert!(matches!(result, Err(AtomicError::Business(AuthError::UserExists))));
    assert_eq!(h.db.snapshot().await.users.len(), 1);
}

#[tokio::test]
async fn test_cancelled_scope_fails_repository_calls() {
    // Arrange
    let h = Harness::new();
    let user_id = h.create_user("u1@example.com").await;
    let scope = Scope::new();
    scope.cancel();

    // Act
    let result = get_user(user_id, &scope, &h.auth).await;

    // Assert
    assert!(matches!(
        result,
        Err(AtomicError::Business(AuthError::Storage(StorageError::Cancelled)))
    ));
}

#[tokio::test]
async fn test_nested_unit_of_work_shares_outer_transaction() {
    // Arrange
    let h = Harness::new();
    let outer_tx = h.db.begin().await.unwrap();
    let nested = UnitOfWork::new(
        outer_tx.clone(),
        MemoryDatabase::auth_context,
        h.publisher.clone(),
    );
    let user = User::restore(
        Uuid::new_v4(),
        "nested@example.com".to_owned(),
        "hash".to_owned(),
        common::start(),
        common::start(),
        Vec::new(),
    );
    let user_id = user.user_id;

    // Act
    nested
        .atomic(&h.scope, |ctx| async move {
            ctx.users().add(&user).await?;
            ctx.commit().await?;
            Ok::<_, AuthError>(())
        })
        .await
        .unwrap();

    // Assert
    assert!(!outer_tx.is_active());
    assert!(h.db.snapshot().await.users.contains_key(&user_id));
}

#[tokio::test]
async fn test_create_user_stores_bcrypt_hash_of_password() {
    // Arrange
    let h = Harness::new();

    // Act
    let user_id = h.create_user("u1@example.com").await;

    // Assert
    let user = get_user(user_id, &h.scope, &h.auth).await.unwrap();
    assert!(user.password_hash.starts_with("$2"));
    assert_ne!(user.password_hash, PASSWORD);
    assert_eq!(h.publisher.published_types(), vec![USER_CREATED]);
    let tokens = handle_login(&login("u1@example.com", PASSWORD), &h.scope, &h.auth, &h.authorizer).await;
    assert!(tokens.is_ok());
}
