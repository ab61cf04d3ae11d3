//! SQLite implementations of the repository traits

use async_trait::async_trait;
use entrypoint_registry_core::{EntryPointId, Subscription, SubscriptionId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::{debug, instrument};

use crate::error::{DbError, DbResult};
use crate::repository::{EntryPointRecord, EntryPointRepository, SubscriptionRepository};

/// SQLite implementation of EntryPointRepository
#[derive(Debug, Clone)]
pub struct SqliteEntryPointRepository {
    pool: SqlitePool,
}

impl SqliteEntryPointRepository {
    /// Create a new SQLite entry point repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl EntryPointRepository for SqliteEntryPointRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &EntryPointId) -> DbResult<Option<EntryPointRecord>> {
        let row = sqlx::query("SELECT id, value, tags FROM entry_points WHERE id = ?1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| row_to_entry_point(&r)).transpose()
    }

    #[instrument(skip(self))]
    async fn find_all(&self) -> DbResult<Vec<EntryPointRecord>> {
        let rows = sqlx::query("SELECT id, value, tags FROM entry_points ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_entry_point).collect()
    }

    #[instrument(skip(self, record), fields(id = %record.id))]
    async fn create(&self, record: EntryPointRecord) -> DbResult<EntryPointRecord> {
        debug!("Inserting entry point");

        sqlx::query("INSERT INTO entry_points (id, value, tags) VALUES (?1, ?2, ?3)")
            .bind(record.id.as_str())
            .bind(&record.value)
            .bind(&record.tags)
            .execute(&self.pool)
            .await?;

        Ok(record)
    }

    #[instrument(skip(self, record), fields(id = %record.id))]
    async fn update(&self, record: EntryPointRecord) -> DbResult<EntryPointRecord> {
        debug!("Updating entry point");

        let result = sqlx::query("UPDATE entry_points SET value = ?2, tags = ?3 WHERE id = ?1")
            .bind(record.id.as_str())
            .bind(&record.value)
            .bind(&record.tags)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("entry point {}", record.id)));
        }

        Ok(record)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &EntryPointId) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM entry_points WHERE id = ?1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("entry point {}", id)));
        }

        Ok(())
    }

    async fn health_check(&self) -> DbResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn row_to_entry_point(row: &SqliteRow) -> DbResult<EntryPointRecord> {
    Ok(EntryPointRecord {
        id: EntryPointId::from(row.try_get::<String, _>("id")?),
        value: row.try_get("value")?,
        tags: row.try_get("tags")?,
    })
}

/// SQLite implementation of SubscriptionRepository
#[derive(Debug, Clone)]
pub struct SqliteSubscriptionRepository {
    pool: SqlitePool,
}

impl SqliteSubscriptionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn find_where(&self, clause: &str, binds: &[&str]) -> DbResult<Vec<Subscription>> {
        let sql = format!(
            "SELECT * FROM subscriptions WHERE {} ORDER BY created_at ASC, id ASC",
            clause
        );
        let mut query = sqlx::query(&sql);
        for value in binds {
            query = query.bind(*value);
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(row_to_subscription).collect()
    }
}

#[async_trait]
impl SubscriptionRepository for SqliteSubscriptionRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &SubscriptionId) -> DbResult<Option<Subscription>> {
        let row = sqlx::query("SELECT * FROM subscriptions WHERE id = ?1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| row_to_subscription(&r)).transpose()
    }

    async fn find_by_api(&self, api: &str) -> DbResult<Vec<Subscription>> {
        self.find_where("api = ?1", &[api]).await
    }

    async fn find_by_plan(&self, plan: &str) -> DbResult<Vec<Subscription>> {
        self.find_where("plan = ?1", &[plan]).await
    }

    async fn find_by_application_and_plan(
        &self,
        application: &str,
        plan: &str,
    ) -> DbResult<Vec<Subscription>> {
        self.find_where("application = ?1 AND plan = ?2", &[application, plan])
            .await
    }

    #[instrument(skip(self, subscription), fields(id = %subscription.id))]
    async fn create(&self, subscription: Subscription) -> DbResult<Subscription> {
        sqlx::query(
            r#"
            INSERT INTO subscriptions (
                id, api, plan, application, status,
                request, reason, processed_by,
                created_at, updated_at, processed_at, paused_at, closed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(subscription.id.as_str())
        .bind(&subscription.api)
        .bind(&subscription.plan)
        .bind(&subscription.application)
        .bind(subscription.status.to_string())
        .bind(&subscription.request)
        .bind(&subscription.reason)
        .bind(&subscription.processed_by)
        .bind(subscription.created_at)
        .bind(subscription.updated_at)
        .bind(subscription.processed_at)
        .bind(subscription.paused_at)
        .bind(subscription.closed_at)
        .execute(&self.pool)
        .await?;

        Ok(subscription)
    }

    #[instrument(skip(self, subscription), fields(id = %subscription.id))]
    async fn update(&self, subscription: Subscription) -> DbResult<Subscription> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions SET
                status = ?2, request = ?3, reason = ?4, processed_by = ?5,
                updated_at = ?6, processed_at = ?7, paused_at = ?8, closed_at = ?9
            WHERE id = ?1
            "#,
        )
        .bind(subscription.id.as_str())
        .bind(subscription.status.to_string())
        .bind(&subscription.request)
        .bind(&subscription.reason)
        .bind(&subscription.processed_by)
        .bind(subscription.updated_at)
        .bind(subscription.processed_at)
        .bind(subscription.paused_at)
        .bind(subscription.closed_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!(
                "subscription {}",
                subscription.id
            )));
        }

        Ok(subscription)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &SubscriptionId) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM subscriptions WHERE id = ?1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("subscription {}", id)));
        }

        Ok(())
    }
}

fn row_to_subscription(row: &SqliteRow) -> DbResult<Subscription> {
    let status: String = row.try_get("status")?;

    Ok(Subscription {
        id: SubscriptionId::from(row.try_get::<String, _>("id")?),
        api: row.try_get("api")?,
        plan: row.try_get("plan")?,
        application: row.try_get("application")?,
        status: status.parse().map_err(DbError::Domain)?,
        request: row.try_get("request")?,
        reason: row.try_get("reason")?,
        processed_by: row.try_get("processed_by")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        processed_at: row.try_get("processed_at")?,
        paused_at: row.try_get("paused_at")?,
        closed_at: row.try_get("closed_at")?,
    })
}
