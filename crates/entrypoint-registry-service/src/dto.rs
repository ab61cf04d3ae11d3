//! Data Transfer Objects (DTOs) for service layer
//!
//! This module defines request types used at service boundaries,
//! separating internal domain models from external interfaces.

use entrypoint_registry_core::{EntryPointId, SubscriptionId, Tags};
use serde::{Deserialize, Serialize};

// ============================================================================
// Entry point DTOs
// ============================================================================

/// Request to create an entry point
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEntryPoint {
    /// Address of the entry point
    pub value: String,

    /// Tags classifying the entry point
    #[serde(default)]
    pub tags: Tags,
}

impl NewEntryPoint {
    pub fn new(value: impl Into<String>, tags: Tags) -> Self {
        Self {
            value: value.into(),
            tags,
        }
    }
}

/// Request to replace an existing entry point
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateEntryPoint {
    /// Identifier of the entry point to replace
    pub id: EntryPointId,

    /// New address
    pub value: String,

    /// New tags
    #[serde(default)]
    pub tags: Tags,
}

impl UpdateEntryPoint {
    pub fn new(id: impl Into<EntryPointId>, value: impl Into<String>, tags: Tags) -> Self {
        Self {
            id: id.into(),
            value: value.into(),
            tags,
        }
    }
}

// ============================================================================
// Subscription DTOs
// ============================================================================

/// Request to subscribe an application to a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSubscription {
    pub api: String,
    pub plan: String,
    pub application: String,

    /// Optional message for the API publisher
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<String>,
}

/// Decision on a pending subscription
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessSubscription {
    pub id: SubscriptionId,

    /// Accept when true, reject otherwise
    pub accepted: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
