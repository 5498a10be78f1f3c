//! Signed access tokens.
//!
//! Access tokens are HS256 JWTs bound to one session. Validation is
//! stateless: signature and expiry only, so a logged-out session's token
//! stays usable until it expires.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::AuthError;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: Uuid,
    sid: String,
    iat: i64,
    exp: i64,
}

/// Identity carried by a valid access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessTokenData {
    /// The token owner.
    pub user_id: Uuid,
    /// The session the token was minted for.
    pub authorization_id: String,
}

/// Mints and validates access tokens with a shared secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    /// Creates an issuer signing with `secret`; tokens live for `ttl`.
    #[must_use]
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    /// Mints a token for `user_id` bound to `authorization_id`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Signing` if encoding fails.
    pub fn issue(
        &self,
        user_id: Uuid,
        authorization_id: &str,
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let claims = Claims {
            sub: user_id,
            sid: authorization_id.to_owned(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    /// Checks the signature and expiry of `token` as of `now`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidAccessToken` if the token is malformed,
    /// forged or expired.
    pub fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<AccessTokenData, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the injected clock below.
        validation.validate_exp = false;

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|_| AuthError::InvalidAccessToken)?
            .claims;

        if claims.exp <= now.timestamp() {
            return Err(AuthError::InvalidAccessToken);
        }

        Ok(AccessTokenData {
            user_id: claims.sub,
            authorization_id: claims.sid,
        })
    }
}
