//! Audit events emitted on every state-changing operation
//!
//! An audit event records which subject changed, what happened, when, and
//! the stored state before and after the change. Producing events is the
//! concern of the service layer; storing them belongs to the db layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::RegistryError;

/// Subject properties an audit event can be keyed by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditProperty {
    EntryPoint,
    Subscription,
    Api,
    Application,
    Plan,
}

impl AuditProperty {
    /// Wire name of the property
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditProperty::EntryPoint => "ENTRY_POINT",
            AuditProperty::Subscription => "SUBSCRIPTION",
            AuditProperty::Api => "API",
            AuditProperty::Application => "APPLICATION",
            AuditProperty::Plan => "PLAN",
        }
    }
}

impl fmt::Display for AuditProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kinds of audited operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEventKind {
    EntryPointCreated,
    EntryPointUpdated,
    EntryPointDeleted,
    SubscriptionCreated,
    SubscriptionUpdated,
    SubscriptionPaused,
    SubscriptionResumed,
    SubscriptionClosed,
    SubscriptionDeleted,
}

impl AuditEventKind {
    /// Wire name of the event kind
    pub fn event_name(&self) -> &'static str {
        match self {
            AuditEventKind::EntryPointCreated => "ENTRY_POINT_CREATED",
            AuditEventKind::EntryPointUpdated => "ENTRY_POINT_UPDATED",
            AuditEventKind::EntryPointDeleted => "ENTRY_POINT_DELETED",
            AuditEventKind::SubscriptionCreated => "SUBSCRIPTION_CREATED",
            AuditEventKind::SubscriptionUpdated => "SUBSCRIPTION_UPDATED",
            AuditEventKind::SubscriptionPaused => "SUBSCRIPTION_PAUSED",
            AuditEventKind::SubscriptionResumed => "SUBSCRIPTION_RESUMED",
            AuditEventKind::SubscriptionClosed => "SUBSCRIPTION_CLOSED",
            AuditEventKind::SubscriptionDeleted => "SUBSCRIPTION_DELETED",
        }
    }

    /// The subject type this kind of event is about
    pub fn subject(&self) -> AuditProperty {
        match self {
            AuditEventKind::EntryPointCreated
            | AuditEventKind::EntryPointUpdated
            | AuditEventKind::EntryPointDeleted => AuditProperty::EntryPoint,
            _ => AuditProperty::Subscription,
        }
    }
}

impl fmt::Display for AuditEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_name())
    }
}

impl FromStr for AuditEventKind {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ENTRY_POINT_CREATED" => Ok(AuditEventKind::EntryPointCreated),
            "ENTRY_POINT_UPDATED" => Ok(AuditEventKind::EntryPointUpdated),
            "ENTRY_POINT_DELETED" => Ok(AuditEventKind::EntryPointDeleted),
            "SUBSCRIPTION_CREATED" => Ok(AuditEventKind::SubscriptionCreated),
            "SUBSCRIPTION_UPDATED" => Ok(AuditEventKind::SubscriptionUpdated),
            "SUBSCRIPTION_PAUSED" => Ok(AuditEventKind::SubscriptionPaused),
            "SUBSCRIPTION_RESUMED" => Ok(AuditEventKind::SubscriptionResumed),
            "SUBSCRIPTION_CLOSED" => Ok(AuditEventKind::SubscriptionClosed),
            "SUBSCRIPTION_DELETED" => Ok(AuditEventKind::SubscriptionDeleted),
            other => Err(RegistryError::InvalidAuditEvent(other.to_string())),
        }
    }
}

/// An immutable record of one state-changing operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event identifier
    pub id: String,

    /// Subject properties, keyed by [`AuditProperty::as_str`]
    pub properties: BTreeMap<String, String>,

    /// What happened
    pub event: AuditEventKind,

    /// When it happened
    pub created_at: DateTime<Utc>,

    /// Stored state before the operation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<JsonValue>,

    /// Stored state after the operation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<JsonValue>,

    /// User or service that triggered the operation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl AuditEvent {
    /// Create an event with the current timestamp and no properties
    pub fn new(event: AuditEventKind) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            properties: BTreeMap::new(),
            event,
            created_at: Utc::now(),
            old_value: None,
            new_value: None,
            user: None,
        }
    }

    /// Create a builder for constructing events
    pub fn builder(event: AuditEventKind) -> AuditEventBuilder {
        AuditEventBuilder::new(event)
    }

    /// Get the event name
    pub fn event_name(&self) -> &'static str {
        self.event.event_name()
    }

    /// Look up a subject property
    pub fn property(&self, property: AuditProperty) -> Option<&str> {
        self.properties.get(property.as_str()).map(String::as_str)
    }

    /// Identifier of the subject this event is about, if recorded
    pub fn subject_id(&self) -> Option<&str> {
        self.property(self.event.subject())
    }
}

impl fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AuditEvent({} at {}",
            self.event_name(),
            self.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        )?;

        if let Some(subject) = self.subject_id() {
            write!(f, ", {}={}", self.event.subject(), subject)?;
        }

        if let Some(ref user) = self.user {
            write!(f, ", user={}", user)?;
        }

        write!(f, ")")
    }
}

/// Builder for constructing AuditEvent instances
pub struct AuditEventBuilder {
    event: AuditEvent,
}

impl AuditEventBuilder {
    /// Create a new builder
    pub fn new(event: AuditEventKind) -> Self {
        Self {
            event: AuditEvent::new(event),
        }
    }

    /// Add a subject property
    pub fn property(mut self, property: AuditProperty, value: impl Into<String>) -> Self {
        self.event
            .properties
            .insert(property.as_str().to_string(), value.into());
        self
    }

    /// Add several subject properties
    pub fn properties(mut self, properties: BTreeMap<String, String>) -> Self {
        self.event.properties.extend(properties);
        self
    }

    /// Set the timestamp
    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.event.created_at = created_at;
        self
    }

    /// Set the previous state
    pub fn old_value(mut self, value: Option<JsonValue>) -> Self {
        self.event.old_value = value;
        self
    }

    /// Set the new state
    pub fn new_value(mut self, value: Option<JsonValue>) -> Self {
        self.event.new_value = value;
        self
    }

    /// Set the triggering user
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.event.user = Some(user.into());
        self
    }

    /// Build the event
    pub fn build(self) -> AuditEvent {
        self.event
    }
}
