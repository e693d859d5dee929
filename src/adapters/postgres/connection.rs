//! PostgreSQL connection pool management.

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::time::Duration;
use thiserror::Error;

use crate::domain::models::DatabaseConfig;

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Failed to create pool: {0}")]
    PoolCreationFailed(#[source] sqlx::Error),
    #[error("Invalid table name: {0}")]
    InvalidIdentifier(String),
    #[error("Connection failed: {0}")]
    ConnectionFailed(#[source] sqlx::Error),
}

#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 0,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

impl From<&DatabaseConfig> for PoolConfig {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            max_connections: config.max_connections,
            acquire_timeout: Duration::from_secs(config.acquire_timeout_secs),
            ..Self::default()
        }
    }
}

pub fn connect_options(config: &DatabaseConfig) -> PgConnectOptions {
    let options = PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .database(&config.name)
        .username(&config.user)
        .application_name("larder");
    match config.password.as_deref() {
        Some(password) => options.password(password),
        None => options,
    }
}

fn pool_options(config: &PoolConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout)
}

/// Connect eagerly; fails when the server is unreachable.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, ConnectionError> {
    pool_options(&PoolConfig::from(config))
        .connect_with(connect_options(config))
        .await
        .map_err(ConnectionError::PoolCreationFailed)
}

/// Pool that connects on first use, so request handling can start (and
/// degrade) while the database is down.
pub fn create_lazy_pool(config: &DatabaseConfig) -> PgPool {
    pool_options(&PoolConfig::from(config)).connect_lazy_with(connect_options(config))
}

/// Server version string, as a connectivity probe.
pub async fn verify_connection(pool: &PgPool) -> Result<String, ConnectionError> {
    sqlx::query_scalar::<_, String>("SELECT version()")
        .fetch_one(pool)
        .await
        .map_err(ConnectionError::ConnectionFailed)
}

/// Accept lowercase SQL identifiers, optionally schema-qualified.
pub fn validate_identifier(name: &str) -> Result<(), ConnectionError> {
    let valid_part = |part: &str| {
        let mut chars = part.chars();
        chars
            .next()
            .is_some_and(|c| c.is_ascii_lowercase() || c == '_')
            && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    };
    let parts: Vec<&str> = name.split('.').collect();
    if parts.len() <= 2 && parts.iter().all(|p| valid_part(p)) {
        Ok(())
    } else {
        Err(ConnectionError::InvalidIdentifier(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("recipes").is_ok());
        assert!(validate_identifier("recipes_embeddings").is_ok());
        assert!(validate_identifier("public.recipes").is_ok());
        assert!(validate_identifier("_v2").is_ok());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("2recipes").is_err());
        assert!(validate_identifier("Recipes").is_err());
        assert!(validate_identifier("recipes; DROP TABLE recipes").is_err());
        assert!(validate_identifier("a.b.c").is_err());
    }

    #[test]
    fn test_pool_config_from_database_section() {
        let section = DatabaseConfig {
            max_connections: 3,
            acquire_timeout_secs: 9,
            ..DatabaseConfig::default()
        };
        let pool = PoolConfig::from(&section);
        assert_eq!(pool.max_connections, 3);
        assert_eq!(pool.acquire_timeout, Duration::from_secs(9));
    }

    #[tokio::test]
    async fn test_lazy_pool_does_not_connect() {
        let config = DatabaseConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            ..DatabaseConfig::default()
        };
        let pool = create_lazy_pool(&config);
        assert_eq!(pool.size(), 0);
    }
}
