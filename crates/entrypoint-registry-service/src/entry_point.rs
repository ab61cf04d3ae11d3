//! Entry point service
//!
//! Owns the one real rule of the registry: no two entry points may carry the
//! same tag set. Tag sets are compared ignoring order and repetition. The rule
//! is checked against a snapshot of the store taken just before the write, so
//! two concurrent requests with the same tags can both pass the check; the
//! stores offer no transaction spanning the read and the write.

use async_trait::async_trait;
use chrono::Utc;
use entrypoint_registry_core::{
    dedup_tags, same_tag_set, AuditEventKind, AuditProperty, EntryPoint, EntryPointId,
    PortalEntryPoint,
};
use entrypoint_registry_db::{DbResult, EntryPointRecord, EntryPointRepository};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument, Span};

use crate::audit::AuditService;
use crate::dto::{NewEntryPoint, UpdateEntryPoint};
use crate::error::{ServiceError, ServiceResult, TechnicalContext};

/// Trait for entry point operations
#[async_trait]
pub trait EntryPointService: Send + Sync {
    /// Find an entry point by identifier
    async fn find_by_id(&self, id: &EntryPointId) -> ServiceResult<EntryPoint>;

    /// All entry points, ordered case-insensitively by value
    async fn find_all(&self) -> ServiceResult<Vec<EntryPoint>>;

    /// All entry points without their identifiers, for the public portal
    async fn find_all_for_portal(&self) -> ServiceResult<Vec<PortalEntryPoint>>;

    /// Create a new entry point with a fresh identifier
    async fn create(&self, new_entry_point: NewEntryPoint) -> ServiceResult<EntryPoint>;

    /// Replace the value and tags of an existing entry point
    async fn update(&self, update_entry_point: UpdateEntryPoint) -> ServiceResult<EntryPoint>;

    /// Delete an entry point
    async fn delete(&self, id: &EntryPointId) -> ServiceResult<()>;

    /// Verify the underlying store is reachable
    async fn health_check(&self) -> ServiceResult<()>;
}

/// Default implementation of EntryPointService
pub struct DefaultEntryPointService {
    repository: Arc<dyn EntryPointRepository>,
    audit: Arc<dyn AuditService>,
    span: Span,
}

impl DefaultEntryPointService {
    /// Create a new entry point service
    pub fn new(repository: Arc<dyn EntryPointRepository>, audit: Arc<dyn AuditService>) -> Self {
        Self {
            repository,
            audit,
            span: info_span!("entry_points"),
        }
    }

    /// Use `span` as the parent of every operation span
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Whether a stored entry point other than `id_to_ignore` carries the same tag set
    async fn tags_already_used(
        &self,
        tags: &[String],
        id_to_ignore: Option<&EntryPointId>,
    ) -> DbResult<bool> {
        let records = self.repository.find_all().await?;

        Ok(records
            .iter()
            .filter(|record| Some(&record.id) != id_to_ignore)
            .any(|record| same_tag_set(&record.tag_list(), tags)))
    }

    async fn find_record(&self, id: &EntryPointId) -> ServiceResult<EntryPointRecord> {
        self.repository
            .find_by_id(id)
            .await
            .technical_context(|| {
                format!("An error occurs while trying to find an entry point using its ID {}", id)
            })?
            .ok_or_else(|| ServiceError::EntryPointNotFound(id.to_string()))
    }

    async fn audit(
        &self,
        id: &EntryPointId,
        event: AuditEventKind,
        old_value: Option<&EntryPointRecord>,
        new_value: Option<&EntryPointRecord>,
    ) -> ServiceResult<()> {
        let properties = BTreeMap::from([(AuditProperty::EntryPoint, id.to_string())]);

        self.audit
            .create_portal_audit_log(
                properties,
                event,
                Utc::now(),
                old_value.map(serde_json::to_value).transpose()?,
                new_value.map(serde_json::to_value).transpose()?,
            )
            .await?;

        Ok(())
    }

    async fn create_entry_point(&self, new_entry_point: NewEntryPoint) -> ServiceResult<EntryPoint> {
        let NewEntryPoint { value, tags } = new_entry_point;
        let tags = dedup_tags(tags);
        let context = || format!("An error occurs while trying to create entry point {}", value);

        if self
            .tags_already_used(&tags, None)
            .await
            .technical_context(context)?
        {
            warn!("Rejected entry point with an already used tag set");
            return Err(ServiceError::EntryPointTagsAlreadyExists);
        }

        let record = EntryPointRecord::new(EntryPointId::generate(), value.clone(), &tags);
        let created = self
            .repository
            .create(record)
            .await
            .technical_context(context)?;

        self.audit(&created.id, AuditEventKind::EntryPointCreated, None, Some(&created))
            .await?;

        info!(id = %created.id, "Entry point created");
        Ok(created.into_entry_point())
    }

    async fn update_entry_point(
        &self,
        update_entry_point: UpdateEntryPoint,
    ) -> ServiceResult<EntryPoint> {
        let UpdateEntryPoint { id, value, tags } = update_entry_point;
        let tags = dedup_tags(tags);

        let existing = self.find_record(&id).await?;

        let context = || format!("An error occurs while trying to update entry point {}", value);

        if self
            .tags_already_used(&tags, Some(&id))
            .await
            .technical_context(context)?
        {
            warn!("Rejected entry point update with an already used tag set");
            return Err(ServiceError::EntryPointTagsAlreadyExists);
        }

        let record = EntryPointRecord::new(id.clone(), value.clone(), &tags);
        let updated = self.repository.update(record).await.map_err(|e| {
            if e.is_not_found() {
                ServiceError::EntryPointNotFound(id.to_string())
            } else {
                ServiceError::technical(context(), e)
            }
        })?;

        self.audit(
            &updated.id,
            AuditEventKind::EntryPointUpdated,
            Some(&existing),
            Some(&updated),
        )
        .await?;

        info!("Entry point updated");
        Ok(updated.into_entry_point())
    }

    async fn delete_entry_point(&self, id: &EntryPointId) -> ServiceResult<()> {
        let existing = self.find_record(id).await?;

        self.repository.delete(id).await.map_err(|e| {
            if e.is_not_found() {
                ServiceError::EntryPointNotFound(id.to_string())
            } else {
                ServiceError::technical(
                    format!("An error occurs while trying to delete entry point {}", id),
                    e,
                )
            }
        })?;

        self.audit(id, AuditEventKind::EntryPointDeleted, Some(&existing), None)
            .await?;

        info!("Entry point deleted");
        Ok(())
    }

    async fn list_entry_points(&self) -> ServiceResult<Vec<EntryPoint>> {
        let records = self
            .repository
            .find_all()
            .await
            .technical_context(|| "An error occurs while trying to find all entry points".to_string())?;

        let mut entry_points: Vec<EntryPoint> = records
            .into_iter()
            .map(EntryPointRecord::into_entry_point)
            .collect();
        entry_points.sort_by_cached_key(|entry_point| entry_point.value.to_lowercase());

        debug!(count = entry_points.len(), "Listed entry points");
        Ok(entry_points)
    }
}

#[async_trait]
impl EntryPointService for DefaultEntryPointService {
    async fn find_by_id(&self, id: &EntryPointId) -> ServiceResult<EntryPoint> {
        let span = info_span!(parent: &self.span, "find_entry_point", id = %id);
        async {
            debug!("Find entry point by ID");
            self.find_record(id)
                .await
                .map(EntryPointRecord::into_entry_point)
        }
        .instrument(span)
        .await
    }

    async fn find_all(&self) -> ServiceResult<Vec<EntryPoint>> {
        let span = info_span!(parent: &self.span, "find_all_entry_points");
        self.list_entry_points().instrument(span).await
    }

    async fn find_all_for_portal(&self) -> ServiceResult<Vec<PortalEntryPoint>> {
        let span = info_span!(parent: &self.span, "find_portal_entry_points");
        self.list_entry_points()
            .instrument(span)
            .await
            .map(|entry_points| {
                entry_points
                    .into_iter()
                    .map(EntryPoint::into_portal)
                    .collect()
            })
    }

    async fn create(&self, new_entry_point: NewEntryPoint) -> ServiceResult<EntryPoint> {
        let span = info_span!(parent: &self.span, "create_entry_point", value = %new_entry_point.value);
        self.create_entry_point(new_entry_point)
            .instrument(span)
            .await
    }

    async fn update(&self, update_entry_point: UpdateEntryPoint) -> ServiceResult<EntryPoint> {
        let span = info_span!(
            parent: &self.span,
            "update_entry_point",
            id = %update_entry_point.id,
            value = %update_entry_point.value
        );
        self.update_entry_point(update_entry_point)
            .instrument(span)
            .await
    }

    async fn delete(&self, id: &EntryPointId) -> ServiceResult<()> {
        let span = info_span!(parent: &self.span, "delete_entry_point", id = %id);
        self.delete_entry_point(id).instrument(span).await
    }

    async fn health_check(&self) -> ServiceResult<()> {
        self.repository
            .health_check()
            .await
            .technical_context(|| "Entry point store is not available".to_string())
    }
}
