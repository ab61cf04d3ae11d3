//! Database connection pool management
//!
//! This module provides connection pooling for SQLite using SQLx's built-in
//! pooling capabilities with additional configuration and health checking.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::ConnectOptions;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};

/// Default minimum number of connections in the pool
pub const DEFAULT_MIN_CONNECTIONS: u32 = 1;

/// Default maximum number of connections in the pool
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Default connection timeout in seconds
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default idle timeout in seconds (10 minutes)
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;

/// Configuration for database connection pool
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Database URL (e.g., sqlite://registry.db or sqlite::memory:)
    pub database_url: String,

    /// Minimum number of connections to maintain in the pool
    pub min_connections: u32,

    /// Maximum number of connections allowed in the pool
    pub max_connections: u32,

    /// Timeout for establishing a new connection
    pub connect_timeout: Duration,

    /// Idle timeout - connections idle for this duration will be closed
    pub idle_timeout: Duration,

    /// Whether to enable SQL statement logging
    pub enable_logging: bool,

    /// Whether to run migrations on startup
    pub run_migrations: bool,
}

impl PoolConfig {
    /// Create a new pool configuration with sensible defaults
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            min_connections: DEFAULT_MIN_CONNECTIONS,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            idle_timeout: Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS),
            enable_logging: false,
            run_migrations: true,
        }
    }

    /// Set minimum connections
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Set maximum connections
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Set connection timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set idle timeout
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Enable or disable SQL logging
    pub fn enable_logging(mut self, enabled: bool) -> Self {
        self.enable_logging = enabled;
        self
    }

    /// Enable or disable automatic migrations
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Whether the URL points at a private in-memory database
    pub fn is_in_memory(&self) -> bool {
        self.database_url.contains(":memory:") || self.database_url.contains("mode=memory")
    }

    /// Validate the configuration
    pub fn validate(&self) -> DbResult<()> {
        if self.database_url.is_empty() {
            return Err(DbError::Configuration(
                "Database URL cannot be empty".to_string(),
            ));
        }

        if !self.database_url.starts_with("sqlite:") {
            return Err(DbError::Configuration(format!(
                "Unsupported database URL scheme: {}",
                mask_database_url(&self.database_url)
            )));
        }

        if self.min_connections > self.max_connections {
            return Err(DbError::Configuration(format!(
                "min_connections ({}) cannot be greater than max_connections ({})",
                self.min_connections, self.max_connections
            )));
        }

        if self.max_connections == 0 {
            return Err(DbError::Configuration(
                "max_connections must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new("sqlite://entrypoint-registry.db")
    }
}

/// Create a SQLite connection pool from configuration
pub async fn create_pool(config: &PoolConfig) -> DbResult<SqlitePool> {
    config.validate()?;

    info!(
        "Creating database connection pool: min={}, max={}, database={}",
        config.min_connections,
        config.max_connections,
        mask_database_url(&config.database_url)
    );

    let mut connect_opts = SqliteConnectOptions::from_str(&config.database_url)
        .map_err(|e| DbError::Configuration(format!("Invalid database URL: {}", e)))?
        .create_if_missing(true)
        .foreign_keys(true);

    if !config.is_in_memory() {
        connect_opts = connect_opts.journal_mode(SqliteJournalMode::Wal);
    }

    if config.enable_logging {
        connect_opts = connect_opts.log_statements(tracing::log::LevelFilter::Debug);
    } else {
        connect_opts = connect_opts.log_statements(tracing::log::LevelFilter::Off);
    }

    // Every connection to `:memory:` opens its own database, so keep exactly one alive
    let (min, max, idle, lifetime) = if config.is_in_memory() {
        (1, 1, None, None)
    } else {
        (
            config.min_connections,
            config.max_connections,
            Some(config.idle_timeout),
            Some(Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS * 3)),
        )
    };

    let pool = SqlitePoolOptions::new()
        .min_connections(min)
        .max_connections(max)
        .acquire_timeout(config.connect_timeout)
        .idle_timeout(idle)
        .max_lifetime(lifetime)
        .connect_with(connect_opts)
        .await
        .map_err(|e| DbError::Connection(format!("Failed to create pool: {}", e)))?;

    info!("Database connection pool created successfully");

    if config.run_migrations {
        run_migrations(&pool).await?;
    }

    verify_pool_health(&pool).await?;

    Ok(pool)
}

/// Run database migrations
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!("Running database migrations");

    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| DbError::Migration(format!("Migration failed: {}", e)))?;

    info!("Database migrations completed successfully");
    Ok(())
}

/// Verify that the connection pool is healthy
pub async fn verify_pool_health(pool: &SqlitePool) -> DbResult<()> {
    debug!("Verifying database pool health");

    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(|e| DbError::Connection(format!("Health check failed: {}", e)))?;

    debug!("Database pool health check passed");
    Ok(())
}

/// Get pool statistics
pub fn get_pool_stats(pool: &SqlitePool) -> PoolStats {
    PoolStats {
        total_connections: pool.size(),
        idle_connections: pool.num_idle() as u32,
    }
}

/// Pool statistics
#[derive(Debug, Clone)]
pub struct PoolStats {
    /// Total number of connections in the pool
    pub total_connections: u32,
    /// Number of idle connections
    pub idle_connections: u32,
}

impl PoolStats {
    /// Get number of active (in-use) connections
    pub fn active_connections(&self) -> u32 {
        self.total_connections.saturating_sub(self.idle_connections)
    }
}

/// Gracefully close the connection pool
pub async fn close_pool(pool: SqlitePool) {
    info!("Closing database connection pool");
    pool.close().await;
    info!("Database connection pool closed");
}

/// Mask credentials in a database URL for logging
pub fn mask_database_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***@{}", &url[..scheme_end], &url[at + 1..])
        }
        _ => url.to_string(),
    }
}
