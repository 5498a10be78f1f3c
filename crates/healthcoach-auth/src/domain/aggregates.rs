//! Aggregate roots for the Auth context.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use healthcoach_core::aggregate::{AggregateRoot, EventOutbox};
use healthcoach_core::clock::Clock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::AuthError;
use crate::domain::events::{UserCreated, UserEvent, UserEventKind, UserLoggedIn, UserLoggedOut};

/// Snapshot of the client a session was opened from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Browser name.
    pub browser: String,
    /// Operating system.
    pub os: String,
    /// Client IP address.
    pub ip_address: String,
    /// Device model.
    pub model: String,
}

/// One login session of a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorization {
    /// Session identifier, carried in access tokens.
    pub id: String,
    /// Refresh-token bearer value.
    pub secret: String,
    /// When the session was opened.
    pub created_at: DateTime<Utc>,
    /// Hard expiry.
    pub valid_until: DateTime<Utc>,
    /// When the session was logged out, if it was.
    pub logout_at: Option<DateTime<Utc>>,
    /// Where the session was opened from.
    pub device: Device,
}

impl Authorization {
    /// A session is active until it expires or is logged out.
    #[must_use]
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        now < self.valid_until && self.logout_at.is_none()
    }

    /// [`is_active_at`](Self::is_active_at) evaluated against `clock`.
    #[must_use]
    pub fn is_active(&self, clock: &dyn Clock) -> bool {
        self.is_active_at(clock.now())
    }
}

/// Session minting policy.
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Verifies `password` against `user` and mints a new session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the password does not match.
    async fn authorize(
        &self,
        user: &User,
        password: &str,
        device: Device,
    ) -> Result<Authorization, AuthError>;
}

/// The aggregate root for a user account and its sessions.
#[derive(Debug, Clone)]
pub struct User {
    /// Aggregate identifier.
    pub user_id: Uuid,
    /// Unique login email.
    pub email: String,
    /// Stored password hash.
    pub password_hash: String,
    /// Registration time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
    /// Sessions in the order they were opened.
    pub authorizations: Vec<Authorization>,
    outbox: EventOutbox,
}

impl User {
    /// Registers a new user with an already hashed password and raises
    /// `user.created`.
    #[must_use]
    pub fn register(
        user_id: Uuid,
        email: impl Into<String>,
        password_hash: String,
        clock: &dyn Clock,
    ) -> Self {
        let now = clock.now();
        let user = Self {
            user_id,
            email: email.into(),
            password_hash,
            created_at: now,
            updated_at: now,
            authorizations: Vec::new(),
            outbox: EventOutbox::new(),
        };
        user.raise(
            now,
            UserEventKind::UserCreated(UserCreated {
                email: user.email.clone(),
            }),
        );
        user
    }

    /// Rebuilds a user from storage without raising events.
    #[must_use]
    pub fn restore(
        user_id: Uuid,
        email: String,
        password_hash: String,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        authorizations: Vec<Authorization>,
    ) -> Self {
        Self {
            user_id,
            email,
            password_hash,
            created_at,
            updated_at,
            authorizations,
            outbox: EventOutbox::new(),
        }
    }

    /// Verifies the password, appends a new session and raises `user.login`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` on a wrong password; no
    /// session is appended in that case.
    pub async fn authorize(
        &mut self,
        authorizer: &dyn Authorizer,
        password: &str,
        device: Device,
    ) -> Result<Authorization, AuthError> {
        let authorization = authorizer.authorize(self, password, device).await?;
        self.updated_at = authorization.created_at;
        self.authorizations.push(authorization.clone());
        self.raise(
            authorization.created_at,
            UserEventKind::UserLoggedIn(UserLoggedIn {
                authorization_id: authorization.id.clone(),
                device: authorization.device.clone(),
            }),
        );
        Ok(authorization)
    }

    /// Closes the session `authorization_id` and raises `user.logout`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Unauthorized` if the session does not exist or was
    /// already logged out.
    pub fn logout(&mut self, authorization_id: &str, clock: &dyn Clock) -> Result<(), AuthError> {
        let now = clock.now();
        let authorization = self
            .authorizations
            .iter_mut()
            .find(|a| a.id == authorization_id)
            .ok_or(AuthError::Unauthorized("provided identifier not found"))?;

        if authorization.logout_at.is_some() {
            return Err(AuthError::Unauthorized("authorization already closed"));
        }
        authorization.logout_at = Some(now);
        self.updated_at = now;

        self.raise(
            now,
            UserEventKind::UserLoggedOut(UserLoggedOut {
                authorization_id: authorization_id.to_owned(),
            }),
        );
        Ok(())
    }

    /// Looks a session up by identifier.
    #[must_use]
    pub fn get_authorization(&self, authorization_id: &str) -> Option<&Authorization> {
        self.authorizations.iter().find(|a| a.id == authorization_id)
    }

    /// Looks a session up by refresh secret.
    #[must_use]
    pub fn get_authorization_by_secret(&self, secret: &str) -> Option<&Authorization> {
        self.authorizations.iter().find(|a| a.secret == secret)
    }

    fn raise(&self, occurred_at: DateTime<Utc>, kind: UserEventKind) {
        self.push_event(UserEvent {
            user_id: self.user_id,
            occurred_at,
            kind,
        });
    }
}

impl AggregateRoot for User {
    fn aggregate_id(&self) -> String {
        self.user_id.to_string()
    }

    fn outbox(&self) -> &EventOutbox {
        &self.outbox
    }
}
