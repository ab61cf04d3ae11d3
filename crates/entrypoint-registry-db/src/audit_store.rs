//! Audit store for audit event persistence and querying
//!
//! The registry only produces audit events; this module is where they end
//! up. Stores are append-only from the registry's point of view.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use entrypoint_registry_core::{AuditEvent, AuditEventKind, AuditProperty};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

use crate::error::{DbError, DbResult};

/// Query parameters for searching audit events
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    /// Filter by subject property and value (e.g. `ENTRY_POINT = 123`)
    pub property: Option<(AuditProperty, String)>,

    /// Filter by event kinds
    pub events: Vec<AuditEventKind>,

    /// Filter events after this timestamp
    pub after: Option<DateTime<Utc>>,

    /// Filter events before this timestamp
    pub before: Option<DateTime<Utc>>,

    /// Maximum number of events to return
    pub limit: i64,

    /// Number of events to skip
    pub offset: i64,
}

impl AuditQuery {
    /// Create a new audit query with defaults
    pub fn new() -> Self {
        Self {
            limit: 100,
            offset: 0,
            ..Default::default()
        }
    }

    /// Filter by subject property
    pub fn property(mut self, property: AuditProperty, value: impl Into<String>) -> Self {
        self.property = Some((property, value.into()));
        self
    }

    /// Filter by event kind
    pub fn event(mut self, event: AuditEventKind) -> Self {
        self.events.push(event);
        self
    }

    /// Filter events after timestamp
    pub fn after(mut self, timestamp: DateTime<Utc>) -> Self {
        self.after = Some(timestamp);
        self
    }

    /// Filter events before timestamp
    pub fn before(mut self, timestamp: DateTime<Utc>) -> Self {
        self.before = Some(timestamp);
        self
    }

    /// Set pagination limit
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    /// Set pagination offset
    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }

    /// Whether an event passes every filter of this query (pagination aside)
    pub fn matches(&self, event: &AuditEvent) -> bool {
        if let Some((property, ref value)) = self.property {
            if event.property(property) != Some(value.as_str()) {
                return false;
            }
        }

        if !self.events.is_empty() && !self.events.contains(&event.event) {
            return false;
        }

        if let Some(after) = self.after {
            if event.created_at <= after {
                return false;
            }
        }

        if let Some(before) = self.before {
            if event.created_at >= before {
                return false;
            }
        }

        true
    }
}

/// Results from an audit query
#[derive(Debug, Clone)]
pub struct AuditQueryResults {
    /// Events matching the query, newest first
    pub events: Vec<AuditEvent>,

    /// Total number of matching events (without pagination)
    pub total: i64,

    /// Current offset
    pub offset: i64,

    /// Current limit
    pub limit: i64,
}

impl AuditQueryResults {
    /// Check if there are more events available
    pub fn has_more(&self) -> bool {
        (self.offset + self.events.len() as i64) < self.total
    }

    /// Get the number of events in this page
    pub fn count(&self) -> usize {
        self.events.len()
    }
}

/// Audit store trait for persisting and querying audit events
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Append a new event to the store
    async fn append(&self, event: AuditEvent) -> DbResult<AuditEvent>;

    /// Query events with filters, newest first
    async fn query(&self, query: &AuditQuery) -> DbResult<AuditQueryResults>;

    /// Count total events in the store
    async fn count_events(&self) -> DbResult<i64>;
}

/// SQLite implementation of AuditStore
#[derive(Debug, Clone)]
pub struct SqliteAuditStore {
    pool: SqlitePool,
}

impl SqliteAuditStore {
    /// Create a new SQLite audit store
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl AuditStore for SqliteAuditStore {
    #[instrument(skip(self, event), fields(event = %event.event))]
    async fn append(&self, event: AuditEvent) -> DbResult<AuditEvent> {
        debug!("Appending audit event");

        sqlx::query(
            r#"
            INSERT INTO audit_events (
                id, event, properties, created_at, old_value, new_value, username
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&event.id)
        .bind(event.event_name())
        .bind(serde_json::to_string(&event.properties)?)
        .bind(event.created_at)
        .bind(event.old_value.as_ref().map(serde_json::to_string).transpose()?)
        .bind(event.new_value.as_ref().map(serde_json::to_string).transpose()?)
        .bind(&event.user)
        .execute(&self.pool)
        .await?;

        debug!("Audit event appended successfully");
        Ok(event)
    }

    #[instrument(skip(self, query))]
    async fn query(&self, query: &AuditQuery) -> DbResult<AuditQueryResults> {
        debug!("Querying audit events");

        let mut conditions = Vec::new();

        if let Some((property, _)) = query.property {
            conditions.push(format!(
                "json_extract(properties, '$.{}') = ?",
                property.as_str()
            ));
        }

        if !query.events.is_empty() {
            let placeholders = vec!["?"; query.events.len()].join(", ");
            conditions.push(format!("event IN ({})", placeholders));
        }

        if query.after.is_some() {
            conditions.push("created_at > ?".to_string());
        }

        if query.before.is_some() {
            conditions.push("created_at < ?".to_string());
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let select_sql = format!(
            "SELECT id, event, properties, created_at, old_value, new_value, username \
             FROM audit_events{} ORDER BY created_at DESC, rowid DESC LIMIT ? OFFSET ?",
            where_clause
        );
        let count_sql = format!("SELECT COUNT(*) AS count FROM audit_events{}", where_clause);

        let mut select = sqlx::query(&select_sql);
        let mut count = sqlx::query(&count_sql);

        if let Some((_, ref value)) = query.property {
            select = select.bind(value);
            count = count.bind(value);
        }

        for event in &query.events {
            select = select.bind(event.event_name());
            count = count.bind(event.event_name());
        }

        if let Some(after) = query.after {
            select = select.bind(after);
            count = count.bind(after);
        }

        if let Some(before) = query.before {
            select = select.bind(before);
            count = count.bind(before);
        }

        let rows = select
            .bind(query.limit)
            .bind(query.offset)
            .fetch_all(&self.pool)
            .await?;

        let events = rows
            .iter()
            .map(row_to_event)
            .collect::<DbResult<Vec<_>>>()?;

        let total: i64 = count.fetch_one(&self.pool).await?.try_get("count")?;

        Ok(AuditQueryResults {
            events,
            total,
            offset: query.offset,
            limit: query.limit,
        })
    }

    #[instrument(skip(self))]
    async fn count_events(&self) -> DbResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM audit_events")
            .fetch_one(&self.pool)
            .await?;

        Ok(row.try_get("count")?)
    }
}

fn row_to_event(row: &SqliteRow) -> DbResult<AuditEvent> {
    let event: String = row.try_get("event")?;
    let properties: String = row.try_get("properties")?;
    let old_value: Option<String> = row.try_get("old_value")?;
    let new_value: Option<String> = row.try_get("new_value")?;

    Ok(AuditEvent {
        id: row.try_get("id")?,
        properties: serde_json::from_str::<BTreeMap<String, String>>(&properties)?,
        event: event.parse().map_err(DbError::Domain)?,
        created_at: row.try_get("created_at")?,
        old_value: old_value.as_deref().map(serde_json::from_str).transpose()?,
        new_value: new_value.as_deref().map(serde_json::from_str).transpose()?,
        user: row.try_get("username")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn event(kind: AuditEventKind, id: &str) -> AuditEvent {
        AuditEvent::builder(kind)
            .property(AuditProperty::EntryPoint, id)
            .build()
    }

    #[test]
    fn test_audit_query_builder() {
        let query = AuditQuery::new()
            .property(AuditProperty::EntryPoint, "123")
            .event(AuditEventKind::EntryPointCreated)
            .limit(10)
            .offset(5);

        assert_eq!(
            query.property,
            Some((AuditProperty::EntryPoint, "123".to_string()))
        );
        assert_eq!(query.events.len(), 1);
        assert_eq!(query.limit, 10);
        assert_eq!(query.offset, 5);
    }

    #[test]
    fn test_audit_query_matches() {
        let created = event(AuditEventKind::EntryPointCreated, "123");

        assert!(AuditQuery::new().matches(&created));
        assert!(AuditQuery::new()
            .property(AuditProperty::EntryPoint, "123")
            .matches(&created));
        assert!(!AuditQuery::new()
            .property(AuditProperty::EntryPoint, "456")
            .matches(&created));
        assert!(!AuditQuery::new()
            .event(AuditEventKind::EntryPointDeleted)
            .matches(&created));
        assert!(!AuditQuery::new()
            .after(created.created_at + Duration::seconds(1))
            .matches(&created));
        assert!(AuditQuery::new()
            .before(created.created_at + Duration::seconds(1))
            .matches(&created));
    }

    #[test]
    fn test_results_has_more() {
        let results = AuditQueryResults {
            events: vec![event(AuditEventKind::EntryPointCreated, "1")],
            total: 3,
            offset: 0,
            limit: 1,
        };
        assert!(results.has_more());
        assert_eq!(results.count(), 1);
    }
}
