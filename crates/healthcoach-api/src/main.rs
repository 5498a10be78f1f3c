//! Health Coach API server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use healthcoach_api::config::{AppConfig, StorageKind};
use healthcoach_api::error::AppError;
use healthcoach_api::routes;
use healthcoach_api::state::AppState;
use healthcoach_api::telemetry;
use healthcoach_auth::application::authorizer::{BcryptHasher, SessionAuthorizer};
use healthcoach_auth::application::tokens::TokenIssuer;
use healthcoach_core::clock::{Clock, SystemClock};
use healthcoach_core::message_bus::MessageBus;
use healthcoach_core::rng::{OsTokenGenerator, TokenGenerator};
use healthcoach_core::unit_of_work::EventPublisher;
use healthcoach_store::{MemoryDatabase, PgDatabase, StorageBackend};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(config.app.env);

    tracing::info!(env = ?config.app.env, backend = ?config.storage.backend, "Starting Health Coach API server");

    let bus = Arc::new(MessageBus::start(
        telemetry::event_log_registry(),
        config.bus.to_bus_config(),
    ));

    let result = match config.storage.backend {
        StorageKind::Postgres => {
            let dsn = config.storage.dsn.as_deref().unwrap_or_default();
            let db = PgDatabase::connect(dsn, config.storage.max_connections).await?;
            db.migrate().await?;
            serve(&config, db, bus.clone()).await
        }
        StorageKind::Memory => {
            tracing::warn!("using the in-memory store; state is lost on shutdown");
            serve(&config, MemoryDatabase::new(), bus.clone()).await
        }
    };

    if let Err(err) = bus.close().await {
        tracing::warn!(error = %err, "events still queued at shutdown were dropped");
    }
    result
}

async fn serve<D: StorageBackend>(
    config: &AppConfig,
    db: D,
    bus: Arc<MessageBus>,
) -> Result<(), AppError> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let tokens: Arc<dyn TokenGenerator> = Arc::new(OsTokenGenerator);
    let authorizer = SessionAuthorizer::new(
        Arc::new(BcryptHasher::default()),
        TokenIssuer::new(config.jwt.secret.as_bytes(), config.access_token_ttl()),
        Arc::clone(&tokens),
        Arc::clone(&clock),
    )
    .with_authorization_ttl(config.refresh_token_ttl());

    let publisher: Arc<dyn EventPublisher> = bus;
    let app = routes::app(AppState::new(db, publisher, authorizer, clock, tokens));

    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
