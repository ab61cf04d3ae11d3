//! Service-layer error types
//!
//! This module defines error types specific to the service layer. Storage
//! failures are never interpreted here: they are wrapped as [`ServiceError::Technical`]
//! together with a message naming the operation and its subject.

use entrypoint_registry_core::SubscriptionStatus;
use entrypoint_registry_db::{DbError, DbResult};
use thiserror::Error;

/// Result type alias for service operations
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Service-layer error types
#[derive(Error, Debug)]
pub enum ServiceError {
    /// No entry point with that identifier
    #[error("Entry point [{0}] can not be found.")]
    EntryPointNotFound(String),

    /// Another entry point already carries the same tag set
    #[error("An entry point already exists with the same tags")]
    EntryPointTagsAlreadyExists,

    /// No subscription with that identifier
    #[error("Subscription [{0}] can not be found.")]
    SubscriptionNotFound(String),

    /// The subscription is not in a status allowing the requested change
    #[error("Subscription [{id}] can not move from {from} to {to}")]
    InvalidSubscriptionStatus {
        id: String,
        from: SubscriptionStatus,
        to: SubscriptionStatus,
    },

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Storage or audit failure
    #[error("{context}")]
    Technical {
        context: String,
        #[source]
        source: DbError,
    },

    /// Internal service error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Wrap a storage error with the operation it interrupted
    pub fn technical(context: impl Into<String>, source: DbError) -> Self {
        ServiceError::Technical {
            context: context.into(),
            source,
        }
    }

    /// Check if this error reports a missing entity
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ServiceError::EntryPointNotFound(_) | ServiceError::SubscriptionNotFound(_)
        )
    }

    /// Check if this error reports a conflict with existing state
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            ServiceError::EntryPointTagsAlreadyExists
                | ServiceError::InvalidSubscriptionStatus { .. }
        )
    }

    /// Check if this error is a technical failure
    pub fn is_technical(&self) -> bool {
        matches!(self, ServiceError::Technical { .. })
    }
}

/// Attach an operation context to storage results
pub trait TechnicalContext<T> {
    /// Convert a storage failure into [`ServiceError::Technical`]
    fn technical_context<F>(self, context: F) -> ServiceResult<T>
    where
        F: FnOnce() -> String;
}

impl<T> TechnicalContext<T> for DbResult<T> {
    fn technical_context<F>(self, context: F) -> ServiceResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|source| ServiceError::technical(context(), source))
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::Internal(format!("Serialization error: {}", err))
    }
}
