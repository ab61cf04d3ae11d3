//! Error types for the Entry Point Registry domain

use thiserror::Error;

use crate::subscription::SubscriptionStatus;

/// Result type alias for domain operations
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Main error type for domain-level rules
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A subscription cannot move between these two statuses
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidStatusTransition {
        from: SubscriptionStatus,
        to: SubscriptionStatus,
    },

    /// Unknown subscription status literal
    #[error("Invalid subscription status: {0}")]
    InvalidStatus(String),

    /// Unknown audit event kind or property literal
    #[error("Invalid audit event: {0}")]
    InvalidAuditEvent(String),

    /// Serialization/Deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for RegistryError {
    fn from(err: serde_json::Error) -> Self {
        RegistryError::SerializationError(err.to_string())
    }
}
