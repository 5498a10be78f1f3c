//! Server configuration.
//!
//! Settings come from a YAML file (`CONFIG_PATH`, default
//! `config/config.yaml`). A handful of environment variables override the
//! file so deployments can inject secrets without editing it.

use std::path::Path;
use std::time::Duration;

use healthcoach_core::message_bus::BusConfig;
use serde::Deserialize;

use crate::error::AppError;

/// Path used when `CONFIG_PATH` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";

/// Deployment flavour; selects log format and verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Human-readable debug logs.
    #[default]
    Dev,
    /// JSON logs at `info`.
    Prod,
}

/// Which storage adapter backs the units of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// PostgreSQL via sqlx.
    #[default]
    Postgres,
    /// Process-local tables; state is lost on restart.
    Memory,
}

/// `app` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppSection {
    /// Deployment flavour.
    pub env: Environment,
}

/// `server` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// `storage` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Adapter to use.
    pub backend: StorageKind,
    /// PostgreSQL connection string.
    pub dsn: Option<String>,
    /// Pool size.
    pub max_connections: u32,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            backend: StorageKind::default(),
            dsn: None,
            max_connections: 10,
        }
    }
}

/// `jwt` section.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct JwtSection {
    /// HS256 signing secret.
    pub secret: String,
    /// Access token lifetime.
    pub access_token_ttl_secs: u64,
    /// Session (refresh token) lifetime.
    pub refresh_token_ttl_secs: u64,
}

impl Default for JwtSection {
    fn default() -> Self {
        Self {
            secret: String::new(),
            access_token_ttl_secs: 2 * 60 * 60,
            refresh_token_ttl_secs: 24 * 60 * 60,
        }
    }
}

impl std::fmt::Debug for JwtSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSection")
            .field("access_token_ttl_secs", &self.access_token_ttl_secs)
            .field("refresh_token_ttl_secs", &self.refresh_token_ttl_secs)
            .finish_non_exhaustive()
    }
}

/// `bus` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BusSection {
    /// Worker tasks running event handlers.
    pub workers: usize,
    /// Jobs that may wait for a worker.
    pub queue_capacity: usize,
    /// How long shutdown waits for queued jobs.
    pub drain_timeout_secs: u64,
}

impl Default for BusSection {
    fn default() -> Self {
        let defaults = BusConfig::default();
        Self {
            workers: defaults.workers,
            queue_capacity: defaults.queue_capacity,
            drain_timeout_secs: defaults.drain_timeout.as_secs(),
        }
    }
}

impl BusSection {
    /// Converts the section into the bus's own configuration.
    #[must_use]
    pub fn to_bus_config(&self) -> BusConfig {
        BusConfig {
            workers: self.workers,
            queue_capacity: self.queue_capacity,
            drain_timeout: Duration::from_secs(self.drain_timeout_secs),
        }
    }
}

/// Complete server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// `app` section.
    pub app: AppSection,
    /// `server` section.
    pub server: ServerSection,
    /// `storage` section.
    pub storage: StorageSection,
    /// `jwt` section.
    pub jwt: JwtSection,
    /// `bus` section.
    pub bus: BusSection,
}

impl AppConfig {
    /// Loads the file named by `CONFIG_PATH` (or the default path), applies
    /// environment overrides and validates the result. A missing file at the
    /// default path is not an error; defaults are used instead.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or parsed, or
    /// if the result is invalid.
    pub fn load() -> Result<Self, AppError> {
        let explicit = std::env::var("CONFIG_PATH").ok();
        let path = explicit.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);

        let mut config = if explicit.is_some() || Path::new(path).exists() {
            let raw = std::fs::read_to_string(path)
                .map_err(|e| AppError::Config(format!("cannot read {path}: {e}")))?;
            Self::from_yaml(&raw)?
        } else {
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a YAML document.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the document is malformed.
    pub fn from_yaml(raw: &str) -> Result<Self, AppError> {
        serde_yaml::from_str(raw).map_err(|e| AppError::Config(format!("invalid config: {e}")))
    }

    /// Applies `APP_ENV`, `HOST`, `PORT`, `DATABASE_URL` and `JWT_SECRET`
    /// as returned by `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `APP_ENV` or `PORT` is malformed.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(env) = lookup("APP_ENV") {
            self.app.env = match env.as_str() {
                "dev" => Environment::Dev,
                "prod" => Environment::Prod,
                other => {
                    return Err(AppError::Config(format!(
                        "APP_ENV must be dev or prod, got {other}"
                    )));
                }
            };
        }
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .parse()
                .map_err(|e| AppError::Config(format!("PORT must be a valid u16: {e}")))?;
        }
        if let Some(dsn) = lookup("DATABASE_URL") {
            self.storage.dsn = Some(dsn);
        }
        if let Some(secret) = lookup("JWT_SECRET") {
            self.jwt.secret = secret;
        }
        Ok(())
    }

    /// Checks settings that have no usable default.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the JWT secret is empty or PostgreSQL is
    /// selected without a DSN.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.jwt.secret.is_empty() {
            return Err(AppError::Config("jwt.secret (or JWT_SECRET) must be set".into()));
        }
        if self.storage.backend == StorageKind::Postgres
            && self.storage.dsn.as_deref().is_none_or(str::is_empty)
        {
            return Err(AppError::Config(
                "storage.dsn (or DATABASE_URL) must be set for the postgres backend".into(),
            ));
        }
        Ok(())
    }

    /// `host:port` to bind.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Access token lifetime.
    #[must_use]
    pub fn access_token_ttl(&self) -> chrono::Duration {
        ttl(self.jwt.access_token_ttl_secs)
    }

    /// Session lifetime.
    #[must_use]
    pub fn refresh_token_ttl(&self) -> chrono::Duration {
        ttl(self.jwt.refresh_token_ttl_secs)
    }
}

fn ttl(secs: u64) -> chrono::Duration {
    chrono::Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX / 1_000))
}
