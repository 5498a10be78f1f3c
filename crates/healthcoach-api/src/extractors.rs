//! Request extractors shared by the route modules.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::header::{AUTHORIZATION, USER_AGENT};
use axum::http::request::Parts;
use healthcoach_auth::application::query_handlers::authenticate;
use healthcoach_auth::domain::aggregates::Device;
use healthcoach_store::StorageBackend;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// The caller identified by a valid bearer access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    /// The token owner.
    pub user_id: Uuid,
    /// The session the token belongs to.
    pub authorization_id: String,
}

impl<D: StorageBackend> FromRequestParts<AppState<D>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<D>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(ApiError::Unauthenticated("missing Authorization header"))?
            .to_str()
            .map_err(|_| ApiError::Unauthenticated("invalid Authorization header"))?;

        let token = header
            .strip_prefix("Bearer ")
            .filter(|token| !token.is_empty())
            .ok_or(ApiError::Unauthenticated("invalid Authorization header"))?;

        let data = authenticate(&state.authorizer, token)?;
        Ok(Self {
            user_id: data.user_id,
            authorization_id: data.authorization_id,
        })
    }
}

/// The client device a request came from, as far as headers tell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo(pub Device);

impl<S: Send + Sync> FromRequestParts<S> for DeviceInfo {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_agent = parts
            .headers
            .get(USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();

        let forwarded = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|value| !value.is_empty());

        let ip_address = match forwarded {
            Some(ip) => ip.to_string(),
            None => parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
                .unwrap_or_default(),
        };

        let agent = UserAgent::parse(user_agent);
        Ok(Self(Device {
            browser: agent.browser,
            os: agent.os,
            ip_address,
            model: agent.model,
        }))
    }
}

/// Placeholder woothee reports for a field it cannot identify.
const UNKNOWN: &str = "UNKNOWN";

/// Browser, OS and device model named by a User-Agent header. Fields woothee
/// cannot identify are empty.
#[derive(Debug, Default, PartialEq, Eq)]
struct UserAgent {
    browser: String,
    os: String,
    model: String,
}

impl UserAgent {
    fn parse(user_agent: &str) -> Self {
        let Some(result) = woothee::parser::Parser::new().parse(user_agent) else {
            return Self::default();
        };
        let known = |value: &str| {
            if value == UNKNOWN {
                String::new()
            } else {
                value.to_string()
            }
        };

        let os = known(result.os);
        let model = match (&*result.category, os.as_str()) {
            (_, "iPhone" | "iPad" | "iPod") => os.clone(),
            ("smartphone" | "mobilephone", "") => "phone".to_string(),
            ("smartphone" | "mobilephone", os) => format!("{os} phone"),
            ("pc", _) => "desktop".to_string(),
            _ => String::new(),
        };

        Self {
            browser: known(result.name),
            os,
            model,
        }
    }
}
