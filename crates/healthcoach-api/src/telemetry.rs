//! Tracing subscriber setup and the domain event log.

use healthcoach_auth::domain::events::{USER_CREATED, USER_LOGIN, USER_LOGOUT};
use healthcoach_core::event::SharedEvent;
use healthcoach_core::message_bus::HandlerRegistry;
use healthcoach_group::domain::events::GROUP_CREATED;
use healthcoach_invite::domain::events::{INVITE_ACCEPTED, INVITE_CREATED};
use healthcoach_metric::domain::events::METRIC_RECORDED;
use healthcoach_profile::domain::events::PROFILE_CREATED;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Environment;

/// Installs the global subscriber. `RUST_LOG` wins over the per-environment
/// default level.
pub fn init(env: Environment) {
    let default_level = match env {
        Environment::Dev => "debug",
        Environment::Prod => "info",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    match env {
        Environment::Prod => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init(),
        Environment::Dev => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
    }
}

/// Builds a handler registry that logs every domain event after commit.
#[must_use]
pub fn event_log_registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    for event_type in EVENT_TYPES {
        registry.register_fn(event_type, |event: SharedEvent| async move {
            info!(
                event_type = event.event_type(),
                published_at = %event.published_at(),
                payload = %event.to_payload(),
                "domain event"
            );
            Ok(())
        });
    }
    registry
}

const EVENT_TYPES: [&str; 8] = [
    USER_CREATED,
    USER_LOGIN,
    USER_LOGOUT,
    PROFILE_CREATED,
    GROUP_CREATED,
    INVITE_CREATED,
    INVITE_ACCEPTED,
    METRIC_RECORDED,
];
