//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests including
//! test setup, fixtures, and helper functions.

use entrypoint_registry_api::build_api_server;
use entrypoint_registry_db::{
    create_pool, AuditStore, EntryPointRepository, InMemoryAuditStore,
    InMemoryEntryPointRepository, InMemorySubscriptionRepository, PoolConfig, SqliteAuditStore,
    SqliteEntryPointRepository, SqliteSubscriptionRepository,
};
use entrypoint_registry_service::ServiceRegistry;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::net::TcpListener;

#[allow(dead_code)]
pub mod fixtures;

/// Test application state
#[allow(dead_code)]
pub struct TestApp {
    pub address: String,
    pub services: ServiceRegistry,
    pub audit_store: Arc<dyn AuditStore>,
}

#[allow(dead_code)]
impl TestApp {
    /// Start a server backed by the in-memory stores
    pub async fn new() -> Self {
        let audit_store: Arc<dyn AuditStore> = Arc::new(InMemoryAuditStore::new());
        let services = ServiceRegistry::new(
            Arc::new(InMemoryEntryPointRepository::new()),
            Arc::new(InMemorySubscriptionRepository::new()),
            audit_store.clone(),
        );

        Self::spawn(services, audit_store).await
    }

    /// Start a server backed by an in-memory SQLite database
    pub async fn with_sqlite() -> Self {
        let pool = create_pool(&PoolConfig::new("sqlite::memory:"))
            .await
            .expect("Failed to create database pool");

        let audit_store: Arc<dyn AuditStore> = Arc::new(SqliteAuditStore::new(pool.clone()));
        let services = ServiceRegistry::new(
            Arc::new(SqliteEntryPointRepository::new(pool.clone())),
            Arc::new(SqliteSubscriptionRepository::new(pool)),
            audit_store.clone(),
        );

        Self::spawn(services, audit_store).await
    }

    /// Start a server over a caller-provided entry point repository
    pub async fn with_repository(repository: Arc<dyn EntryPointRepository>) -> Self {
        let audit_store: Arc<dyn AuditStore> = Arc::new(InMemoryAuditStore::new());
        let services = ServiceRegistry::new(
            repository,
            Arc::new(InMemorySubscriptionRepository::new()),
            audit_store.clone(),
        );

        Self::spawn(services, audit_store).await
    }

    async fn spawn(services: ServiceRegistry, audit_store: Arc<dyn AuditStore>) -> Self {
        let app = build_api_server(services.clone());

        // Start server on random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let address = listener.local_addr().expect("Failed to get local address");

        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Failed to start test server");
        });

        Self {
            address: format!("http://{}", address),
            services,
            audit_store,
        }
    }

    /// Get base URL
    pub fn url(&self) -> &str {
        &self.address
    }

    /// URL of the configuration collection
    pub fn entry_points_url(&self) -> String {
        format!("{}/v1/configuration/entrypoints", self.address)
    }

    /// URL of one configured entry point
    pub fn entry_point_url(&self, id: &str) -> String {
        format!("{}/{}", self.entry_points_url(), id)
    }

    /// URL of the portal collection
    pub fn portal_url(&self) -> String {
        format!("{}/v1/portal/entrypoints", self.address)
    }

    /// Create HTTP client
    pub fn client(&self) -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(5))
            .build()
            .expect("Failed to build client")
    }

    /// Create an entry point and return its id
    pub async fn create_entry_point(&self, value: &str, tags: &[&str]) -> String {
        let response = self
            .client()
            .post(self.entry_points_url())
            .json(&fixtures::new_entry_point(value, tags))
            .send()
            .await
            .expect("Failed to send request");
        assert_status(&response, reqwest::StatusCode::CREATED);

        let body: serde_json::Value = parse_json(response).await;
        body["data"]["id"]
            .as_str()
            .expect("Created entry point has no id")
            .to_string()
    }

    /// Number of audit events recorded so far
    pub async fn audit_count(&self) -> i64 {
        self.audit_store
            .count_events()
            .await
            .expect("Failed to count audit events")
    }
}

/// Parse JSON response
#[allow(dead_code)]
pub async fn parse_json<T: DeserializeOwned>(response: reqwest::Response) -> T {
    response
        .json::<T>()
        .await
        .expect("Failed to parse JSON response")
}

/// Assert response status
#[allow(dead_code)]
pub fn assert_status(response: &reqwest::Response, expected: reqwest::StatusCode) {
    assert_eq!(
        response.status(),
        expected,
        "Expected status {}, got {}",
        expected,
        response.status()
    );
}

/// Assert response is successful (2xx)
#[allow(dead_code)]
pub fn assert_success(response: &reqwest::Response) {
    assert!(
        response.status().is_success(),
        "Expected success status, got {}",
        response.status()
    );
}

/// Assert response is client error (4xx)
#[allow(dead_code)]
pub fn assert_client_error(response: &reqwest::Response) {
    assert!(
        response.status().is_client_error(),
        "Expected client error status, got {}",
        response.status()
    );
}
