//! Subscription service
//!
//! Drives subscriptions through their lifecycle and audits every change.

use async_trait::async_trait;
use chrono::Utc;
use entrypoint_registry_core::{
    AuditEventKind, AuditProperty, RegistryError, Subscription, SubscriptionId,
};
use entrypoint_registry_db::SubscriptionRepository;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, info_span, Instrument, Span};

use crate::audit::AuditService;
use crate::dto::{NewSubscription, ProcessSubscription};
use crate::error::{ServiceError, ServiceResult, TechnicalContext};

/// Trait for subscription operations
#[async_trait]
pub trait SubscriptionService: Send + Sync {
    /// Find a subscription by identifier
    async fn find_by_id(&self, id: &SubscriptionId) -> ServiceResult<Subscription>;

    /// All subscriptions to plans of an API
    async fn find_by_api(&self, api: &str) -> ServiceResult<Vec<Subscription>>;

    /// All subscriptions to a plan
    async fn find_by_plan(&self, plan: &str) -> ServiceResult<Vec<Subscription>>;

    /// All subscriptions of an application to a plan
    async fn find_by_application_and_plan(
        &self,
        application: &str,
        plan: &str,
    ) -> ServiceResult<Vec<Subscription>>;

    /// Create a pending subscription
    async fn create(&self, new_subscription: NewSubscription) -> ServiceResult<Subscription>;

    /// Accept or reject a pending subscription on behalf of `validator`
    async fn process(
        &self,
        process_subscription: ProcessSubscription,
        validator: &str,
    ) -> ServiceResult<Subscription>;

    /// Pause an accepted subscription
    async fn pause(&self, id: &SubscriptionId) -> ServiceResult<Subscription>;

    /// Resume a paused subscription
    async fn resume(&self, id: &SubscriptionId) -> ServiceResult<Subscription>;

    /// Close a subscription
    async fn close(&self, id: &SubscriptionId) -> ServiceResult<Subscription>;

    /// Delete a subscription
    async fn delete(&self, id: &SubscriptionId) -> ServiceResult<()>;
}

/// Default implementation of SubscriptionService
pub struct DefaultSubscriptionService {
    repository: Arc<dyn SubscriptionRepository>,
    audit: Arc<dyn AuditService>,
    span: Span,
}

impl DefaultSubscriptionService {
    /// Create a new subscription service
    pub fn new(
        repository: Arc<dyn SubscriptionRepository>,
        audit: Arc<dyn AuditService>,
    ) -> Self {
        Self {
            repository,
            audit,
            span: info_span!("subscriptions"),
        }
    }

    /// Use `span` as the parent of every operation span
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    async fn load(&self, id: &SubscriptionId) -> ServiceResult<Subscription> {
        self.repository
            .find_by_id(id)
            .await
            .technical_context(|| {
                format!("An error occurs while trying to find a subscription using its ID {}", id)
            })?
            .ok_or_else(|| ServiceError::SubscriptionNotFound(id.to_string()))
    }

    async fn audit(
        &self,
        subscription: &Subscription,
        event: AuditEventKind,
        old_value: Option<&Subscription>,
        new_value: Option<&Subscription>,
    ) -> ServiceResult<()> {
        let properties = BTreeMap::from([
            (AuditProperty::Subscription, subscription.id.to_string()),
            (AuditProperty::Api, subscription.api.clone()),
            (AuditProperty::Application, subscription.application.clone()),
            (AuditProperty::Plan, subscription.plan.clone()),
        ]);

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

    /// Apply a status change, persist it, and audit it
    async fn transition<F>(
        &self,
        id: &SubscriptionId,
        event: AuditEventKind,
        change: F,
    ) -> ServiceResult<Subscription>
    where
        F: FnOnce(&mut Subscription) -> entrypoint_registry_core::Result<()> + Send,
    {
        let previous = self.load(id).await?;

        let mut subscription = previous.clone();
        change(&mut subscription).map_err(|e| match e {
            RegistryError::InvalidStatusTransition { from, to } => {
                ServiceError::InvalidSubscriptionStatus {
                    id: id.to_string(),
                    from,
                    to,
                }
            }
            other => ServiceError::Internal(other.to_string()),
        })?;

        let updated = self
            .repository
            .update(subscription)
            .await
            .technical_context(|| {
                format!("An error occurs while trying to update subscription {}", id)
            })?;

        self.audit(&updated, event, Some(&previous), Some(&updated))
            .await?;

        info!(status = %updated.status, "Subscription status changed");
        Ok(updated)
    }
}

#[async_trait]
impl SubscriptionService for DefaultSubscriptionService {
    async fn find_by_id(&self, id: &SubscriptionId) -> ServiceResult<Subscription> {
        let span = info_span!(parent: &self.span, "find_subscription", id = %id);
        self.load(id).instrument(span).await
    }

    async fn find_by_api(&self, api: &str) -> ServiceResult<Vec<Subscription>> {
        let span = info_span!(parent: &self.span, "find_subscriptions_by_api", api);
        self.repository
            .find_by_api(api)
            .instrument(span)
            .await
            .technical_context(|| {
                format!("An error occurs while trying to find subscriptions by api {}", api)
            })
    }

    async fn find_by_plan(&self, plan: &str) -> ServiceResult<Vec<Subscription>> {
        let span = info_span!(parent: &self.span, "find_subscriptions_by_plan", plan);
        self.repository
            .find_by_plan(plan)
            .instrument(span)
            .await
            .technical_context(|| {
                format!("An error occurs while trying to find subscriptions by plan {}", plan)
            })
    }

    async fn find_by_application_and_plan(
        &self,
        application: &str,
        plan: &str,
    ) -> ServiceResult<Vec<Subscription>> {
        let span = info_span!(
            parent: &self.span,
            "find_subscriptions_by_application_and_plan",
            application,
            plan
        );
        let subscriptions = self
            .repository
            .find_by_application_and_plan(application, plan)
            .instrument(span)
            .await
            .technical_context(|| {
                format!(
                    "An error occurs while trying to find subscriptions by application {} and plan {}",
                    application, plan
                )
            })?;

        debug!(count = subscriptions.len(), "Found subscriptions");
        Ok(subscriptions)
    }

    async fn create(&self, new_subscription: NewSubscription) -> ServiceResult<Subscription> {
        let span = info_span!(
            parent: &self.span,
            "create_subscription",
            application = %new_subscription.application,
            plan = %new_subscription.plan
        );

        async {
            let NewSubscription {
                api,
                plan,
                application,
                request,
            } = new_subscription;

            let subscription = Subscription::new(api, plan.clone(), application.clone(), request);
            let created = self
                .repository
                .create(subscription)
                .await
                .technical_context(|| {
                    format!(
                        "An error occurs while trying to subscribe to the plan {} for application {}",
                        plan, application
                    )
                })?;

            self.audit(&created, AuditEventKind::SubscriptionCreated, None, Some(&created))
                .await?;

            info!(id = %created.id, "Subscription created");
            Ok::<_, ServiceError>(created)
        }
        .instrument(span)
        .await
    }

    async fn process(
        &self,
        process_subscription: ProcessSubscription,
        validator: &str,
    ) -> ServiceResult<Subscription> {
        let span = info_span!(
            parent: &self.span,
            "process_subscription",
            id = %process_subscription.id,
            accepted = process_subscription.accepted
        );
        let ProcessSubscription {
            id,
            accepted,
            reason,
        } = process_subscription;
        let validator = validator.to_string();

        self.transition(&id, AuditEventKind::SubscriptionUpdated, move |subscription| {
            subscription.process(accepted, reason, validator, Utc::now())
        })
        .instrument(span)
        .await
    }

    async fn pause(&self, id: &SubscriptionId) -> ServiceResult<Subscription> {
        let span = info_span!(parent: &self.span, "pause_subscription", id = %id);
        self.transition(id, AuditEventKind::SubscriptionPaused, |subscription| {
            subscription.pause(Utc::now())
        })
        .instrument(span)
        .await
    }

    async fn resume(&self, id: &SubscriptionId) -> ServiceResult<Subscription> {
        let span = info_span!(parent: &self.span, "resume_subscription", id = %id);
        self.transition(id, AuditEventKind::SubscriptionResumed, |subscription| {
            subscription.resume(Utc::now())
        })
        .instrument(span)
        .await
    }

    async fn close(&self, id: &SubscriptionId) -> ServiceResult<Subscription> {
        let span = info_span!(parent: &self.span, "close_subscription", id = %id);
        self.transition(id, AuditEventKind::SubscriptionClosed, |subscription| {
            subscription.close(Utc::now())
        })
        .instrument(span)
        .await
    }

    async fn delete(&self, id: &SubscriptionId) -> ServiceResult<()> {
        let span = info_span!(parent: &self.span, "delete_subscription", id = %id);

        async {
            let existing = self.load(id).await?;

            self.repository.delete(id).await.technical_context(|| {
                format!("An error occurs while trying to delete subscription {}", id)
            })?;

            self.audit(&existing, AuditEventKind::SubscriptionDeleted, Some(&existing), None)
                .await?;

            info!("Subscription deleted");
            Ok::<_, ServiceError>(())
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::DefaultAuditService;
    use entrypoint_registry_core::SubscriptionStatus;
    use entrypoint_registry_db::{InMemoryAuditStore, InMemorySubscriptionRepository};

    struct Fixture {
        audit_store: InMemoryAuditStore,
        service: DefaultSubscriptionService,
    }

    fn fixture() -> Fixture {
        let audit_store = InMemoryAuditStore::new();
        let audit = Arc::new(DefaultAuditService::new(Arc::new(audit_store.clone())));
        let service = DefaultSubscriptionService::new(
            Arc::new(InMemorySubscriptionRepository::new()),
            audit,
        );
        Fixture {
            audit_store,
            service,
        }
    }

    fn new_subscription() -> NewSubscription {
        NewSubscription {
            api: "api-1".to_string(),
            plan: "plan-1".to_string(),
            application: "app-1".to_string(),
            request: Some("please".to_string()),
        }
    }

    async fn kinds(store: &InMemoryAuditStore) -> Vec<AuditEventKind> {
        store.events().await.into_iter().map(|e| e.event).collect()
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let f = fixture();

        let created = f.service.create(new_subscription()).await.unwrap();
        assert_eq!(created.status, SubscriptionStatus::Pending);

        let found = f.service.find_by_id(&created.id).await.unwrap();
        assert_eq!(found, created);

        assert_eq!(f.service.find_by_api("api-1").await.unwrap().len(), 1);
        assert_eq!(f.service.find_by_plan("plan-1").await.unwrap().len(), 1);
        assert_eq!(
            f.service
                .find_by_application_and_plan("app-1", "plan-2")
                .await
                .unwrap()
                .len(),
            0
        );

        let events = f.audit_store.events().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, AuditEventKind::SubscriptionCreated);
        assert_eq!(events[0].property(AuditProperty::Application), Some("app-1"));
    }

    #[tokio::test]
    async fn test_full_lifecycle() {
        let f = fixture();
        let created = f.service.create(new_subscription()).await.unwrap();

        let accepted = f
            .service
            .process(
                ProcessSubscription {
                    id: created.id.clone(),
                    accepted: true,
                    reason: None,
                },
                "publisher",
            )
            .await
            .unwrap();
        assert_eq!(accepted.status, SubscriptionStatus::Accepted);
        assert_eq!(accepted.processed_by.as_deref(), Some("publisher"));

        let paused = f.service.pause(&created.id).await.unwrap();
        assert_eq!(paused.status, SubscriptionStatus::Paused);

        let resumed = f.service.resume(&created.id).await.unwrap();
        assert_eq!(resumed.status, SubscriptionStatus::Accepted);

        let closed = f.service.close(&created.id).await.unwrap();
        assert_eq!(closed.status, SubscriptionStatus::Closed);

        f.service.delete(&created.id).await.unwrap();
        assert!(f.service.find_by_id(&created.id).await.unwrap_err().is_not_found());

        assert_eq!(
            kinds(&f.audit_store).await,
            vec![
                AuditEventKind::SubscriptionCreated,
                AuditEventKind::SubscriptionUpdated,
                AuditEventKind::SubscriptionPaused,
                AuditEventKind::SubscriptionResumed,
                AuditEventKind::SubscriptionClosed,
                AuditEventKind::SubscriptionDeleted,
            ]
        );
    }

    #[tokio::test]
    async fn test_invalid_transition_is_rejected_without_audit() {
        let f = fixture();
        let created = f.service.create(new_subscription()).await.unwrap();

        let err = f.service.resume(&created.id).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::InvalidSubscriptionStatus {
                from: SubscriptionStatus::Pending,
                to: SubscriptionStatus::Accepted,
                ..
            }
        ));

        let unchanged = f.service.find_by_id(&created.id).await.unwrap();
        assert_eq!(unchanged.status, SubscriptionStatus::Pending);
        assert_eq!(
            kinds(&f.audit_store).await,
            vec![AuditEventKind::SubscriptionCreated]
        );
    }

    #[tokio::test]
    async fn test_paused_subscription_cannot_be_processed_again() {
        let f = fixture();
        let created = f.service.create(new_subscription()).await.unwrap();
        let accept = ProcessSubscription {
            id: created.id.clone(),
            accepted: true,
            reason: None,
        };
        f.service.process(accept.clone(), "publisher").await.unwrap();
        f.service.pause(&created.id).await.unwrap();

        let err = f.service.process(accept, "other").await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::InvalidSubscriptionStatus {
                from: SubscriptionStatus::Paused,
                to: SubscriptionStatus::Accepted,
                ..
            }
        ));

        let unchanged = f.service.find_by_id(&created.id).await.unwrap();
        assert_eq!(unchanged.status, SubscriptionStatus::Paused);
        assert_eq!(unchanged.processed_by.as_deref(), Some("publisher"));
        assert_eq!(
            kinds(&f.audit_store).await,
            vec![
                AuditEventKind::SubscriptionCreated,
                AuditEventKind::SubscriptionUpdated,
                AuditEventKind::SubscriptionPaused,
            ]
        );
    }

    #[tokio::test]
    async fn test_unknown_subscription() {
        let f = fixture();
        let unknown = SubscriptionId::from("unknown");

        assert!(f.service.pause(&unknown).await.unwrap_err().is_not_found());
        assert!(f.service.delete(&unknown).await.unwrap_err().is_not_found());
        assert!(f.audit_store.events().await.is_empty());
    }
}
