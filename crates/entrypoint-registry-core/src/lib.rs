//! Core domain models and types for the Entry Point Registry
//!
//! This crate contains the data structures that describe entry points
//! (public base URLs classified by tags), subscriptions of applications to
//! API plans, and the audit events emitted whenever either of them changes.

pub mod entry_point;
pub mod error;
pub mod event;
pub mod subscription;
pub mod tags;
pub mod types;

// Re-exports for convenience
pub use entry_point::{EntryPoint, PortalEntryPoint};
pub use error::{RegistryError, Result};
pub use event::{AuditEvent, AuditEventBuilder, AuditEventKind, AuditProperty};
pub use subscription::{Subscription, SubscriptionStatus};
pub use tags::{dedup_tags, join_tags, same_tag_set, split_tags, TAG_SEPARATOR};
pub use types::{EntryPointId, SubscriptionId, Tags};
