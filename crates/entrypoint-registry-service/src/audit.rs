//! Audit service
//!
//! Records one audit event per successful mutation and answers audit queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use entrypoint_registry_core::{AuditEvent, AuditEventKind, AuditProperty};
use entrypoint_registry_db::{AuditQuery, AuditQueryResults, AuditStore};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::error::{ServiceResult, TechnicalContext};

/// Trait for audit operations
#[async_trait]
pub trait AuditService: Send + Sync {
    /// Record a portal-level audit event
    ///
    /// `old_value` is absent for creations, `new_value` for deletions.
    async fn create_portal_audit_log(
        &self,
        properties: BTreeMap<AuditProperty, String>,
        event: AuditEventKind,
        created_at: DateTime<Utc>,
        old_value: Option<JsonValue>,
        new_value: Option<JsonValue>,
    ) -> ServiceResult<AuditEvent>;

    /// Search recorded events
    async fn search(&self, query: &AuditQuery) -> ServiceResult<AuditQueryResults>;
}

/// Default implementation of AuditService
pub struct DefaultAuditService {
    store: Arc<dyn AuditStore>,
}

impl DefaultAuditService {
    /// Create a new audit service
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AuditService for DefaultAuditService {
    #[instrument(skip(self, properties, old_value, new_value))]
    async fn create_portal_audit_log(
        &self,
        properties: BTreeMap<AuditProperty, String>,
        event: AuditEventKind,
        created_at: DateTime<Utc>,
        old_value: Option<JsonValue>,
        new_value: Option<JsonValue>,
    ) -> ServiceResult<AuditEvent> {
        let audit_event = properties
            .into_iter()
            .fold(AuditEvent::builder(event), |builder, (property, value)| {
                builder.property(property, value)
            })
            .created_at(created_at)
            .old_value(old_value)
            .new_value(new_value)
            .build();

        let stored = self
            .store
            .append(audit_event)
            .await
            .technical_context(|| format!("An error occurs while trying to create audit log {}", event))?;

        debug!("Audit event recorded: {}", stored);
        Ok(stored)
    }

    #[instrument(skip(self, query))]
    async fn search(&self, query: &AuditQuery) -> ServiceResult<AuditQueryResults> {
        self.store
            .query(query)
            .await
            .technical_context(|| "An error occurs while trying to search audit logs".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entrypoint_registry_db::InMemoryAuditStore;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_portal_audit_log() {
        let store = InMemoryAuditStore::new();
        let service = DefaultAuditService::new(Arc::new(store.clone()));
        let now = Utc::now();

        let event = service
            .create_portal_audit_log(
                BTreeMap::from([(AuditProperty::EntryPoint, "123".to_string())]),
                AuditEventKind::EntryPointDeleted,
                now,
                Some(json!({"id": "123"})),
                None,
            )
            .await
            .unwrap();

        assert_eq!(event.subject_id(), Some("123"));
        assert_eq!(event.created_at, now);
        assert!(event.new_value.is_none());

        let events = store.events().await;
        assert_eq!(events, vec![event]);
    }

    #[tokio::test]
    async fn test_search() {
        let service = DefaultAuditService::new(Arc::new(InMemoryAuditStore::new()));
        for id in ["1", "2"] {
            service
                .create_portal_audit_log(
                    BTreeMap::from([(AuditProperty::EntryPoint, id.to_string())]),
                    AuditEventKind::EntryPointCreated,
                    Utc::now(),
                    None,
                    Some(json!({"id": id})),
                )
                .await
                .unwrap();
        }

        let results = service
            .search(&AuditQuery::new().property(AuditProperty::EntryPoint, "2"))
            .await
            .unwrap();
        assert_eq!(results.total, 1);
    }
}
