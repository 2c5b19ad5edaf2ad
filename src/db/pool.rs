//! Connection pool management.
//!
//! This module wraps a sqlx `PgPool` configured from the resolved
//! [`ConnectionSettings`]. The pool is created once at startup and closed on
//! shutdown; secrets never appear in logs.

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use tracing::info;

use crate::config::{
    ConnectionSettings, DEFAULT_ACQUIRE_TIMEOUT_SECS, DEFAULT_IDLE_TIMEOUT_SECS,
    DEFAULT_MAX_CONNECTIONS, DEFAULT_MIN_CONNECTIONS,
};
use crate::error::PgResult;

/// A pooled connection to the configured PostgreSQL database.
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
    database: String,
}

impl Database {
    /// Connect eagerly, verifying the server is reachable.
    pub async fn connect(
        settings: &ConnectionSettings,
        acquire_timeout: Duration,
    ) -> PgResult<Self> {
        let pool = Self::pool_options(acquire_timeout)
            .connect_with(Self::connect_options(settings))
            .await?;
        info!(
            host = %settings.host,
            port = settings.port,
            database = %settings.database,
            "Connected to PostgreSQL"
        );
        Ok(Self {
            pool,
            database: settings.database.clone(),
        })
    }

    /// Build the pool without any I/O; connections open on first use.
    /// Used by tests that never touch a server.
    pub fn connect_lazy(settings: &ConnectionSettings) -> Self {
        let pool = Self::pool_options(Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS))
            .connect_lazy_with(Self::connect_options(settings));
        Self {
            pool,
            database: settings.database.clone(),
        }
    }

    fn pool_options(acquire_timeout: Duration) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(DEFAULT_MAX_CONNECTIONS)
            .min_connections(DEFAULT_MIN_CONNECTIONS)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS))
            .test_before_acquire(true)
    }

    fn connect_options(settings: &ConnectionSettings) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .username(&settings.user)
            .password(&settings.password)
            .database(&settings.database)
            .application_name("pg-mcp-server")
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Name of the configured database.
    pub fn database_name(&self) -> &str {
        &self.database
    }

    /// Fetch the server version string.
    pub async fn server_version(&self) -> PgResult<String> {
        let version: String = sqlx::query_scalar("SELECT version()")
            .fetch_one(&self.pool)
            .await?;
        Ok(version)
    }

    /// Close the connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
        info!(database = %self.database, "Connection pool closed");
    }
}
