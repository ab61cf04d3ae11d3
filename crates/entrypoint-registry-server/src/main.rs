//! Entry Point Registry Server
//!
//! Main entry point for the Entry Point Registry HTTP server.
//! This binary sets up storage, services, and the HTTP server with graceful shutdown.

mod config;
mod telemetry;

use anyhow::{Context, Result};
use clap::Parser;
use entrypoint_registry_api::build_api_server_with_config;
use entrypoint_registry_db::{
    close_pool, create_pool, mask_database_url, PoolConfig, SqliteAuditStore,
    SqliteEntryPointRepository, SqlitePool, SqliteSubscriptionRepository,
};
use entrypoint_registry_service::ServiceRegistry;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{info, warn};

use config::ServerConfig;
use telemetry::TelemetryConfig;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration directory
    #[arg(short, long, env = "CONFIG_DIR", default_value = "config")]
    config_dir: String,

    /// Environment (development, production, etc.)
    #[arg(short, long, env = "ENVIRONMENT", default_value = "development")]
    environment: String,

    /// Server host
    #[arg(long, env = "SERVER_HOST")]
    host: Option<String>,

    /// Server port
    #[arg(short, long, env = "SERVER_PORT")]
    port: Option<u16>,

    /// Database URL, or `memory` for the in-memory stores
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Log level
    #[arg(long, env = "RUST_LOG")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut config = ServerConfig::load_or_default(&args.config_dir, &args.environment);

    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(database_url) = args.database_url {
        config.database.url = database_url;
    }
    if let Some(log_level) = args.log_level {
        config.logging.level = log_level;
    }

    telemetry::init_with_config(TelemetryConfig::from(&config.logging))
        .context("Failed to initialize telemetry")?;

    info!("Starting Entry Point Registry Server");
    info!("Environment: {}", args.environment);
    info!("Server: {}", config.bind_address());
    info!("Database: {}", mask_database_url(&config.database.url));

    let (services, pool) = if config.database.is_in_memory() {
        warn!("Using in-memory storage, data is lost on shutdown");
        (ServiceRegistry::in_memory(), None)
    } else {
        let pool = setup_database(&config).await?;
        let services = ServiceRegistry::new(
            Arc::new(SqliteEntryPointRepository::new(pool.clone())),
            Arc::new(SqliteSubscriptionRepository::new(pool.clone())),
            Arc::new(SqliteAuditStore::new(pool.clone())),
        );
        (services, Some(pool))
    };

    let app = build_api_server_with_config(services, config.middleware());

    let http_addr: SocketAddr = config
        .bind_address()
        .parse()
        .context("Invalid HTTP bind address")?;

    let http_listener = tokio::net::TcpListener::bind(http_addr)
        .await
        .context("Failed to bind HTTP server")?;

    info!("HTTP Server listening on http://{}", http_addr);

    let served = if config.server.graceful_shutdown {
        axum::serve(http_listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
    } else {
        axum::serve(http_listener, app).await
    };

    if let Some(pool) = pool {
        close_pool(pool).await;
    }
    served.context("HTTP Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Setup database connection pool
async fn setup_database(config: &ServerConfig) -> Result<SqlitePool> {
    info!("Connecting to database");

    let pool_config = PoolConfig::new(&config.database.url)
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .connect_timeout(Duration::from_secs(config.database.connect_timeout_seconds))
        .idle_timeout(Duration::from_secs(config.database.idle_timeout_seconds))
        .run_migrations(config.database.run_migrations)
        .enable_logging(config.logging.level != "error");

    let pool = create_pool(&pool_config)
        .await
        .context("Failed to create database connection pool")?;

    info!("Database connection established");
    Ok(pool)
}

/// Graceful shutdown signal handler
///
/// Resolves on SIGTERM or SIGINT (Ctrl+C). If a handler cannot be installed
/// the corresponding branch never resolves.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
