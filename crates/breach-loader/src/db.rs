//! Connection pool bootstrap

use crate::error::{ConfigError, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// Environment variable holding the destination connection string
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: Option<u64>,
}

impl DbConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            // One run uses one connection at a time
            max_connections: 4,
            min_connections: 1,
            connect_timeout_secs: 30,
            idle_timeout_secs: Some(600),
        }
    }

    /// Read `DATABASE_URL` (required) and the optional `DB_*` pool settings
    pub fn from_env() -> std::result::Result<Self, ConfigError> {
        let url = std::env::var(DATABASE_URL_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::MissingEnv(DATABASE_URL_ENV))?;

        let mut config = Self::new(url);

        if let Some(max) = env_parse("DB_MAX_CONNECTIONS") {
            config.max_connections = max;
        }
        if let Some(min) = env_parse("DB_MIN_CONNECTIONS") {
            config.min_connections = min;
        }
        if let Some(timeout) = env_parse("DB_CONNECT_TIMEOUT") {
            config.connect_timeout_secs = timeout;
        }
        if let Some(idle) = env_parse("DB_IDLE_TIMEOUT") {
            config.idle_timeout_secs = Some(idle);
        }

        Ok(config)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

pub async fn create_pool(config: &DbConfig) -> Result<PgPool> {
    let mut options = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections.min(config.max_connections))
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs));

    if let Some(idle_timeout) = config.idle_timeout_secs {
        options = options.idle_timeout(Duration::from_secs(idle_timeout));
    }

    let pool = options.connect(&config.url).await?;

    tracing::debug!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Database connection pool created"
    );

    Ok(pool)
}

/// Server version string, doubling as a connectivity check
pub async fn server_version(pool: &PgPool) -> Result<String> {
    let version: String = sqlx::query_scalar("SELECT version()")
        .fetch_one(pool)
        .await?;
    Ok(version)
}
