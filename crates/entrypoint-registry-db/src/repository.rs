//! Repository trait abstractions for entry point and subscription persistence
//!
//! This module defines the storage-facing record shape and the repository
//! traits, allowing for different implementations (SQLite, in-memory, etc.).

use async_trait::async_trait;
use entrypoint_registry_core::{
    join_tags, split_tags, EntryPoint, EntryPointId, Subscription, SubscriptionId,
};
use serde::{Deserialize, Serialize};

use crate::error::DbResult;

/// Stored form of an entry point
///
/// Tags are kept as a single `;`-joined string; use [`EntryPointRecord::into_entry_point`]
/// to get the decomposed sequence back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPointRecord {
    /// Unique identifier
    pub id: EntryPointId,

    /// Address of the entry point
    pub value: String,

    /// Joined tag string
    pub tags: String,
}

impl EntryPointRecord {
    /// Create a record from its parts, joining the tags
    pub fn new(id: EntryPointId, value: impl Into<String>, tags: &[String]) -> Self {
        Self {
            id,
            value: value.into(),
            tags: join_tags(tags),
        }
    }

    /// Decompose the stored tag string
    pub fn tag_list(&self) -> Vec<String> {
        split_tags(&self.tags)
    }

    /// Convert into the public entity shape
    pub fn into_entry_point(self) -> EntryPoint {
        let tags = split_tags(&self.tags);
        EntryPoint::new(self.id, self.value, tags)
    }
}

impl From<&EntryPoint> for EntryPointRecord {
    fn from(entry_point: &EntryPoint) -> Self {
        Self::new(
            entry_point.id.clone(),
            entry_point.value.clone(),
            &entry_point.tags,
        )
    }
}

/// Repository trait for entry point persistence operations
///
/// Implementations must be thread-safe (Send + Sync) for use in async contexts.
/// None of the operations below is transactional with respect to the others.
#[async_trait]
pub trait EntryPointRepository: Send + Sync {
    /// Find an entry point by its identifier
    ///
    /// # Returns
    /// * `Ok(Some(record))` - The record if found
    /// * `Ok(None)` - If no record with that identifier exists
    async fn find_by_id(&self, id: &EntryPointId) -> DbResult<Option<EntryPointRecord>>;

    /// Return every stored entry point, in no particular order
    async fn find_all(&self) -> DbResult<Vec<EntryPointRecord>>;

    /// Persist a new record
    ///
    /// # Returns
    /// * `Ok(record)` - The stored record
    /// * `Err(DbError::AlreadyExists)` - If the identifier is taken
    async fn create(&self, record: EntryPointRecord) -> DbResult<EntryPointRecord>;

    /// Replace an existing record
    ///
    /// # Returns
    /// * `Ok(record)` - The stored record
    /// * `Err(DbError::NotFound)` - If the identifier is unknown
    async fn update(&self, record: EntryPointRecord) -> DbResult<EntryPointRecord>;

    /// Delete a record by identifier
    ///
    /// # Returns
    /// * `Err(DbError::NotFound)` - If the identifier is unknown
    async fn delete(&self, id: &EntryPointId) -> DbResult<()>;

    /// Health check - verify repository is operational
    async fn health_check(&self) -> DbResult<()>;
}

/// Repository trait for subscription persistence operations
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Find a subscription by its identifier
    async fn find_by_id(&self, id: &SubscriptionId) -> DbResult<Option<Subscription>>;

    /// All subscriptions to plans of the given API
    async fn find_by_api(&self, api: &str) -> DbResult<Vec<Subscription>>;

    /// All subscriptions to the given plan
    async fn find_by_plan(&self, plan: &str) -> DbResult<Vec<Subscription>>;

    /// All subscriptions of an application to a plan
    async fn find_by_application_and_plan(
        &self,
        application: &str,
        plan: &str,
    ) -> DbResult<Vec<Subscription>>;

    /// Persist a new subscription
    async fn create(&self, subscription: Subscription) -> DbResult<Subscription>;

    /// Replace an existing subscription
    async fn update(&self, subscription: Subscription) -> DbResult<Subscription>;

    /// Delete a subscription by identifier
    async fn delete(&self, id: &SubscriptionId) -> DbResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_joins_tags() {
        let record = EntryPointRecord::new(
            EntryPointId::from("123"),
            "https://api.mycompany.com",
            &["private".to_string(), "product".to_string()],
        );
        assert_eq!(record.tags, "private;product");
        assert_eq!(record.tag_list(), vec!["private", "product"]);
    }

    #[test]
    fn test_record_to_entry_point() {
        let record = EntryPointRecord {
            id: EntryPointId::from("123"),
            value: "https://api.mycompany.com".to_string(),
            tags: "private;product".to_string(),
        };

        let entry_point = record.into_entry_point();
        assert_eq!(entry_point.id.as_str(), "123");
        assert_eq!(entry_point.tags, vec!["private", "product"]);
    }

    #[test]
    fn test_entry_point_to_record() {
        let entry_point = EntryPoint::new(
            EntryPointId::from("1"),
            "https://x",
            vec!["public".to_string()],
        );
        let record = EntryPointRecord::from(&entry_point);
        assert_eq!(record.tags, "public");
        assert_eq!(record.clone().into_entry_point(), entry_point);
    }
}
