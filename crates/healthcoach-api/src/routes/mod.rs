//! Route modules organized by bounded context.

use axum::Router;
use healthcoach_store::StorageBackend;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub mod auth;
pub mod groups;
pub mod health;
pub mod invites;
pub mod metrics;
pub mod profiles;

/// Builds the full application router over `state`.
pub fn app<D: StorageBackend>(state: AppState<D>) -> Router {
    // TODO: read allowed CORS origins from the server config instead of permissive().
    Router::new()
        .merge(health::router::<D>())
        .nest("/api/v1/auth", auth::router::<D>())
        .nest("/api/v1/profiles", profiles::router::<D>())
        .nest("/api/v1/groups", groups::router::<D>())
        .nest("/api/v1/invites", invites::router::<D>())
        .nest("/api/v1/metrics", metrics::router::<D>())
        .nest(
            "/api/v1/trainees",
            profiles::trainee_router::<D>().merge(metrics::trainee_router::<D>()),
        )
        .nest("/api/v1/coaches", profiles::coach_router::<D>())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
