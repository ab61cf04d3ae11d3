//! In-memory storage implementations
//!
//! Used by the server when no database is configured, and throughout the
//! test suites. Contents are lost when the process exits.

use async_trait::async_trait;
use entrypoint_registry_core::{AuditEvent, EntryPointId, Subscription, SubscriptionId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::audit_store::{AuditQuery, AuditQueryResults, AuditStore};
use crate::error::{DbError, DbResult};
use crate::repository::{EntryPointRecord, EntryPointRepository, SubscriptionRepository};

/// Entry point repository backed by a map
#[derive(Debug, Clone, Default)]
pub struct InMemoryEntryPointRepository {
    records: Arc<RwLock<HashMap<EntryPointId, EntryPointRecord>>>,
}

impl InMemoryEntryPointRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository pre-populated with records
    pub fn with_records(records: impl IntoIterator<Item = EntryPointRecord>) -> Self {
        let records = records
            .into_iter()
            .map(|record| (record.id.clone(), record))
            .collect();
        Self {
            records: Arc::new(RwLock::new(records)),
        }
    }

    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl EntryPointRepository for InMemoryEntryPointRepository {
    async fn find_by_id(&self, id: &EntryPointId) -> DbResult<Option<EntryPointRecord>> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn find_all(&self) -> DbResult<Vec<EntryPointRecord>> {
        let mut records: Vec<EntryPointRecord> =
            self.records.read().await.values().cloned().collect();
        records.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        Ok(records)
    }

    #[instrument(skip(self, record), fields(id = %record.id))]
    async fn create(&self, record: EntryPointRecord) -> DbResult<EntryPointRecord> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.id) {
            return Err(DbError::AlreadyExists(format!("entry point {}", record.id)));
        }
        records.insert(record.id.clone(), record.clone());
        debug!("Entry point stored");
        Ok(record)
    }

    #[instrument(skip(self, record), fields(id = %record.id))]
    async fn update(&self, record: EntryPointRecord) -> DbResult<EntryPointRecord> {
        let mut records = self.records.write().await;
        match records.get_mut(&record.id) {
            Some(existing) => {
                *existing = record.clone();
                debug!("Entry point replaced");
                Ok(record)
            }
            None => Err(DbError::NotFound(format!("entry point {}", record.id))),
        }
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &EntryPointId) -> DbResult<()> {
        match self.records.write().await.remove(id) {
            Some(_) => Ok(()),
            None => Err(DbError::NotFound(format!("entry point {}", id))),
        }
    }

    async fn health_check(&self) -> DbResult<()> {
        Ok(())
    }
}

/// Subscription repository backed by a map
#[derive(Debug, Clone, Default)]
pub struct InMemorySubscriptionRepository {
    subscriptions: Arc<RwLock<HashMap<SubscriptionId, Subscription>>>,
}

impl InMemorySubscriptionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn filter<F>(&self, predicate: F) -> Vec<Subscription>
    where
        F: Fn(&Subscription) -> bool,
    {
        let mut found: Vec<Subscription> = self
            .subscriptions
            .read()
            .await
            .values()
            .filter(|s| predicate(s))
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.as_str().cmp(b.id.as_str()))
        });
        found
    }
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionRepository {
    async fn find_by_id(&self, id: &SubscriptionId) -> DbResult<Option<Subscription>> {
        Ok(self.subscriptions.read().await.get(id).cloned())
    }

    async fn find_by_api(&self, api: &str) -> DbResult<Vec<Subscription>> {
        Ok(self.filter(|s| s.api == api).await)
    }

    async fn find_by_plan(&self, plan: &str) -> DbResult<Vec<Subscription>> {
        Ok(self.filter(|s| s.plan == plan).await)
    }

    async fn find_by_application_and_plan(
        &self,
        application: &str,
        plan: &str,
    ) -> DbResult<Vec<Subscription>> {
        Ok(self
            .filter(|s| s.application == application && s.plan == plan)
            .await)
    }

    async fn create(&self, subscription: Subscription) -> DbResult<Subscription> {
        let mut subscriptions = self.subscriptions.write().await;
        if subscriptions.contains_key(&subscription.id) {
            return Err(DbError::AlreadyExists(format!(
                "subscription {}",
                subscription.id
            )));
        }
        subscriptions.insert(subscription.id.clone(), subscription.clone());
        Ok(subscription)
    }

    async fn update(&self, subscription: Subscription) -> DbResult<Subscription> {
        let mut subscriptions = self.subscriptions.write().await;
        match subscriptions.get_mut(&subscription.id) {
            Some(existing) => {
                *existing = subscription.clone();
                Ok(subscription)
            }
            None => Err(DbError::NotFound(format!(
                "subscription {}",
                subscription.id
            ))),
        }
    }

    async fn delete(&self, id: &SubscriptionId) -> DbResult<()> {
        match self.subscriptions.write().await.remove(id) {
            Some(_) => Ok(()),
            None => Err(DbError::NotFound(format!("subscription {}", id))),
        }
    }
}

/// Audit store keeping events in append order
#[derive(Debug, Clone, Default)]
pub struct InMemoryAuditStore {
    events: Arc<RwLock<Vec<AuditEvent>>>,
}

impl InMemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every recorded event, oldest first
    pub async fn events(&self) -> Vec<AuditEvent> {
        self.events.read().await.clone()
    }
}

#[async_trait]
impl AuditStore for InMemoryAuditStore {
    async fn append(&self, event: AuditEvent) -> DbResult<AuditEvent> {
        self.events.write().await.push(event.clone());
        Ok(event)
    }

    async fn query(&self, query: &AuditQuery) -> DbResult<AuditQueryResults> {
        let events = self.events.read().await;
        let matching: Vec<&AuditEvent> = events.iter().rev().filter(|e| query.matches(e)).collect();

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(query.offset.max(0) as usize)
            .take(query.limit.max(0) as usize)
            .cloned()
            .collect();

        Ok(AuditQueryResults {
            events: page,
            total,
            offset: query.offset,
            limit: query.limit,
        })
    }

    async fn count_events(&self) -> DbResult<i64> {
        Ok(self.events.read().await.len() as i64)
    }
}
