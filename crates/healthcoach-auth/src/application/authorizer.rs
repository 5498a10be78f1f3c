//! Session authorizer: bcrypt passwords, random session tokens, JWT access
//! tokens.
//!
//! Hashing and verification run on the blocking thread pool.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use healthcoach_core::clock::Clock;
use healthcoach_core::rng::TokenGenerator;

use crate::application::tokens::{AccessTokenData, TokenIssuer};
use crate::domain::aggregates::{Authorization, Authorizer, Device, User};
use crate::domain::errors::AuthError;

/// Default lifetime in hours of a session (and of its refresh token).
pub const DEFAULT_AUTHORIZATION_TTL_HOURS: i64 = 24;

/// Length in bytes of session identifiers and refresh secrets.
const SESSION_TOKEN_BYTES: usize = 16;

/// One-way password hashing with a built-in comparator.
pub trait PasswordHasher: Send + Sync {
    /// Hashes `password`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Hashing` if hashing fails.
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// Compares `password` against `hash`. Malformed hashes never match.
    fn verify(&self, password: &str, hash: &str) -> bool;
}

/// bcrypt with a configurable cost.
#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    /// Creates a hasher with the given work factor.
    #[must_use]
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        bcrypt::hash(password, self.cost).map_err(|e| AuthError::Hashing(e.to_string()))
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        bcrypt::verify(password, hash).unwrap_or(false)
    }
}

/// Production [`Authorizer`] that also mints and validates access tokens.
#[derive(Clone)]
pub struct SessionAuthorizer {
    hasher: Arc<dyn PasswordHasher>,
    tokens: TokenIssuer,
    generator: Arc<dyn TokenGenerator>,
    clock: Arc<dyn Clock>,
    authorization_ttl: Duration,
}

impl std::fmt::Debug for SessionAuthorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionAuthorizer")
            .field("tokens", &self.tokens)
            .field("authorization_ttl", &self.authorization_ttl)
            .finish_non_exhaustive()
    }
}

impl SessionAuthorizer {
    /// Creates an authorizer.
    pub fn new(
        hasher: Arc<dyn PasswordHasher>,
        tokens: TokenIssuer,
        generator: Arc<dyn TokenGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            hasher,
            tokens,
            generator,
            clock,
            authorization_ttl: Duration::hours(DEFAULT_AUTHORIZATION_TTL_HOURS),
        }
    }

    /// Overrides the session lifetime.
    #[must_use]
    pub fn with_authorization_ttl(mut self, ttl: Duration) -> Self {
        self.authorization_ttl = ttl;
        self
    }

    /// Hashes `password` for storage.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Hashing` if hashing fails or the blocking task
    /// does not finish.
    pub async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let hasher = Arc::clone(&self.hasher);
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?
    }

    async fn verify_password(&self, password: &str, hash: &str) -> bool {
        let hasher = Arc::clone(&self.hasher);
        let (password, hash) = (password.to_owned(), hash.to_owned());
        match tokio::task::spawn_blocking(move || hasher.verify(&password, &hash)).await {
            Ok(matches) => matches,
            Err(e) => {
                tracing::error!(error = %e, "password verification task failed");
                false
            }
        }
    }

    /// The clock sessions and tokens are stamped with.
    #[must_use]
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Mints an access token for `authorization`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Signing` if the token cannot be signed.
    pub fn issue_access_token(
        &self,
        user: &User,
        authorization: &Authorization,
    ) -> Result<String, AuthError> {
        self.tokens
            .issue(user.user_id, &authorization.id, self.clock.now())
    }

    /// Validates an access token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidAccessToken` if the token is not valid now.
    pub fn validate_access_token(&self, token: &str) -> Result<AccessTokenData, AuthError> {
        self.tokens.validate(token, self.clock.now())
    }
}

#[async_trait]
impl Authorizer for SessionAuthorizer {
    async fn authorize(
        &self,
        user: &User,
        password: &str,
        device: Device,
    ) -> Result<Authorization, AuthError> {
        if !self.verify_password(password, &user.password_hash).await {
            return Err(AuthError::InvalidCredentials);
        }

        let now = self.clock.now();
        Ok(Authorization {
            id: self.generator.hex_token(SESSION_TOKEN_BYTES),
            secret: self.generator.hex_token(SESSION_TOKEN_BYTES),
            created_at: now,
            valid_until: now + self.authorization_ttl,
            logout_at: None,
            device,
        })
    }
}
