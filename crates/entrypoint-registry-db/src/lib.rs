//! Storage layer for the Entry Point Registry
//!
//! This crate provides persistence for the registry, including:
//! - Repository trait abstractions for entry points and subscriptions
//! - In-memory implementations for tests and ephemeral deployments
//! - SQLite implementations with SQLx
//! - An audit store receiving the events emitted by the service layer
//! - Connection pool management and migrations
//!
//! # Example
//!
//! ```rust,no_run
//! use entrypoint_registry_db::{create_pool, PoolConfig, SqliteEntryPointRepository};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PoolConfig::new("sqlite://entrypoint-registry.db")
//!     .max_connections(5);
//! let pool = create_pool(&config).await?;
//!
//! let repo = SqliteEntryPointRepository::new(pool);
//! # Ok(())
//! # }
//! ```

// Re-export core domain types for convenience
pub use entrypoint_registry_core;

// Public modules
pub mod audit_store;
pub mod error;
pub mod memory;
pub mod pool;
pub mod repository;
pub mod sqlite;

// Re-exports for convenience
pub use audit_store::{AuditQuery, AuditQueryResults, AuditStore, SqliteAuditStore};
pub use error::{DbError, DbResult};
pub use memory::{InMemoryAuditStore, InMemoryEntryPointRepository, InMemorySubscriptionRepository};
pub use pool::{
    close_pool, create_pool, get_pool_stats, mask_database_url, run_migrations,
    verify_pool_health, PoolConfig, PoolStats,
};
pub use repository::{EntryPointRecord, EntryPointRepository, SubscriptionRepository};
pub use sqlite::{SqliteEntryPointRepository, SqliteSubscriptionRepository};

// Re-export sqlx types that users may need
pub use sqlx::sqlite::SqlitePool;

/// Storage layer version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default database URL environment variable name
pub const DEFAULT_DATABASE_URL_ENV: &str = "DATABASE_URL";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_default_env_var() {
        assert_eq!(DEFAULT_DATABASE_URL_ENV, "DATABASE_URL");
    }
}
