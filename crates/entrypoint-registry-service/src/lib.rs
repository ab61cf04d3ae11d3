//! Service layer for the Entry Point Registry
//!
//! This crate sits between the API and storage layers. It implements the
//! registry rules, wraps storage failures, and emits audit events.
//!
//! # Architecture
//!
//! - **EntryPointService**: entry point CRUD with tag-set uniqueness
//! - **SubscriptionService**: subscription lifecycle
//! - **AuditService**: audit event recording and search
//!
//! # Example
//!
//! ```rust,no_run
//! use entrypoint_registry_service::{NewEntryPoint, ServiceRegistry};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let services = ServiceRegistry::in_memory();
//!
//! let created = services
//!     .entry_points()
//!     .create(NewEntryPoint::new(
//!         "https://api.mycompany.com",
//!         vec!["private".to_string(), "product".to_string()],
//!     ))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod audit;
pub mod dto;
pub mod entry_point;
pub mod error;
pub mod subscription;

// Re-export main types for convenience
pub use dto::*;
pub use error::{ServiceError, ServiceResult, TechnicalContext};

// Re-export service traits and implementations
pub use audit::{AuditService, DefaultAuditService};
pub use entry_point::{DefaultEntryPointService, EntryPointService};
pub use subscription::{DefaultSubscriptionService, SubscriptionService};

use entrypoint_registry_db::{
    AuditStore, EntryPointRepository, InMemoryAuditStore, InMemoryEntryPointRepository,
    InMemorySubscriptionRepository, SubscriptionRepository,
};
use std::sync::Arc;
use tracing::Span;

/// Service registry that holds all service instances
///
/// This provides a convenient way to manage all services together
/// and ensures consistent dependency injection.
#[derive(Clone)]
pub struct ServiceRegistry {
    /// Entry point service
    pub entry_points: Arc<dyn EntryPointService>,
    /// Subscription service
    pub subscriptions: Arc<dyn SubscriptionService>,
    /// Audit service
    pub audit: Arc<dyn AuditService>,
}

impl ServiceRegistry {
    /// Create a new service registry with default implementations
    pub fn new(
        entry_point_repository: Arc<dyn EntryPointRepository>,
        subscription_repository: Arc<dyn SubscriptionRepository>,
        audit_store: Arc<dyn AuditStore>,
    ) -> Self {
        let audit: Arc<dyn AuditService> = Arc::new(DefaultAuditService::new(audit_store));

        Self {
            entry_points: Arc::new(DefaultEntryPointService::new(
                entry_point_repository,
                audit.clone(),
            )),
            subscriptions: Arc::new(DefaultSubscriptionService::new(
                subscription_repository,
                audit.clone(),
            )),
            audit,
        }
    }

    /// Create a service registry backed by in-memory stores
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryEntryPointRepository::new()),
            Arc::new(InMemorySubscriptionRepository::new()),
            Arc::new(InMemoryAuditStore::new()),
        )
    }

    /// Create a service registry with custom implementations
    pub fn with_services(
        entry_points: Arc<dyn EntryPointService>,
        subscriptions: Arc<dyn SubscriptionService>,
        audit: Arc<dyn AuditService>,
    ) -> Self {
        Self {
            entry_points,
            subscriptions,
            audit,
        }
    }

    /// Get the entry point service
    pub fn entry_points(&self) -> &Arc<dyn EntryPointService> {
        &self.entry_points
    }

    /// Get the subscription service
    pub fn subscriptions(&self) -> &Arc<dyn SubscriptionService> {
        &self.subscriptions
    }

    /// Get the audit service
    pub fn audit(&self) -> &Arc<dyn AuditService> {
        &self.audit
    }
}

/// Builder for ServiceRegistry with custom configuration
#[derive(Default)]
pub struct ServiceRegistryBuilder {
    entry_point_repository: Option<Arc<dyn EntryPointRepository>>,
    subscription_repository: Option<Arc<dyn SubscriptionRepository>>,
    audit_store: Option<Arc<dyn AuditStore>>,
    span: Option<Span>,
}

impl ServiceRegistryBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the entry point repository
    pub fn entry_point_repository(mut self, repository: Arc<dyn EntryPointRepository>) -> Self {
        self.entry_point_repository = Some(repository);
        self
    }

    /// Set the subscription repository
    pub fn subscription_repository(mut self, repository: Arc<dyn SubscriptionRepository>) -> Self {
        self.subscription_repository = Some(repository);
        self
    }

    /// Set the audit store
    pub fn audit_store(mut self, audit_store: Arc<dyn AuditStore>) -> Self {
        self.audit_store = Some(audit_store);
        self
    }

    /// Parent span for every service operation
    pub fn span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Build the service registry
    ///
    /// # Errors
    ///
    /// Returns an error if a repository or the audit store is missing.
    pub fn build(self) -> Result<ServiceRegistry, String> {
        let entry_point_repository = self
            .entry_point_repository
            .ok_or("Entry point repository is required")?;
        let subscription_repository = self
            .subscription_repository
            .ok_or("Subscription repository is required")?;
        let audit_store = self.audit_store.ok_or("Audit store is required")?;

        let audit: Arc<dyn AuditService> = Arc::new(DefaultAuditService::new(audit_store));

        let mut entry_points = DefaultEntryPointService::new(entry_point_repository, audit.clone());
        let mut subscriptions =
            DefaultSubscriptionService::new(subscription_repository, audit.clone());

        if let Some(span) = self.span {
            entry_points = entry_points.with_span(span.clone());
            subscriptions = subscriptions.with_span(span);
        }

        Ok(ServiceRegistry {
            entry_points: Arc::new(entry_points),
            subscriptions: Arc::new(subscriptions),
            audit,
        })
    }
}
