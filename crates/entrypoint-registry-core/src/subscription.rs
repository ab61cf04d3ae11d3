//! Subscriptions of applications to API plans
//!
//! A subscription starts `PENDING`, is processed into `ACCEPTED` or
//! `REJECTED`, may be paused and resumed while accepted, and ends `CLOSED`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{RegistryError, Result};
use crate::types::SubscriptionId;

/// Statuses a subscription can still be closed from
const OPEN_STATUSES: &[SubscriptionStatus] = &[
    SubscriptionStatus::Pending,
    SubscriptionStatus::Accepted,
    SubscriptionStatus::Paused,
];

/// Subscription status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    /// Waiting for an API publisher to process it
    Pending,
    /// Accepted and usable
    Accepted,
    /// Refused by the API publisher
    Rejected,
    /// Temporarily suspended
    Paused,
    /// Terminated
    Closed,
}

impl SubscriptionStatus {
    /// Whether no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, SubscriptionStatus::Rejected | SubscriptionStatus::Closed)
    }
}

impl Default for SubscriptionStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Accepted => write!(f, "ACCEPTED"),
            Self::Rejected => write!(f, "REJECTED"),
            Self::Paused => write!(f, "PAUSED"),
            Self::Closed => write!(f, "CLOSED"),
        }
    }
}

impl FromStr for SubscriptionStatus {
    type Err = RegistryError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "ACCEPTED" => Ok(Self::Accepted),
            "REJECTED" => Ok(Self::Rejected),
            "PAUSED" => Ok(Self::Paused),
            "CLOSED" => Ok(Self::Closed),
            _ => Err(RegistryError::InvalidStatus(s.to_string())),
        }
    }
}

/// A subscription of an application to an API plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub api: String,
    pub plan: String,
    pub application: String,
    pub status: SubscriptionStatus,

    /// Message left by the subscriber
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<String>,

    /// Message left by the publisher when processing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Who accepted or rejected the subscription
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_by: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paused_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
}

impl Subscription {
    /// Create a new pending subscription
    pub fn new(
        api: impl Into<String>,
        plan: impl Into<String>,
        application: impl Into<String>,
        request: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: SubscriptionId::generate(),
            api: api.into(),
            plan: plan.into(),
            application: application.into(),
            status: SubscriptionStatus::Pending,
            request,
            reason: None,
            processed_by: None,
            created_at: now,
            updated_at: now,
            processed_at: None,
            paused_at: None,
            closed_at: None,
        }
    }

    /// Accept or reject a pending subscription
    pub fn process(
        &mut self,
        accepted: bool,
        reason: Option<String>,
        validator: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let to = if accepted {
            SubscriptionStatus::Accepted
        } else {
            SubscriptionStatus::Rejected
        };
        self.transition(&[SubscriptionStatus::Pending], to, at)?;
        self.reason = reason;
        self.processed_by = Some(validator.into());
        self.processed_at = Some(at);
        Ok(())
    }

    /// Pause an accepted subscription
    pub fn pause(&mut self, at: DateTime<Utc>) -> Result<()> {
        self.transition(&[SubscriptionStatus::Accepted], SubscriptionStatus::Paused, at)?;
        self.paused_at = Some(at);
        Ok(())
    }

    /// Resume a paused subscription
    pub fn resume(&mut self, at: DateTime<Utc>) -> Result<()> {
        self.transition(&[SubscriptionStatus::Paused], SubscriptionStatus::Accepted, at)?;
        self.paused_at = None;
        Ok(())
    }

    /// Close a subscription that is not yet terminated
    pub fn close(&mut self, at: DateTime<Utc>) -> Result<()> {
        self.transition(OPEN_STATUSES, SubscriptionStatus::Closed, at)?;
        self.closed_at = Some(at);
        Ok(())
    }

    /// Move to `to`, provided the current status is one of `from`
    fn transition(
        &mut self,
        from: &[SubscriptionStatus],
        to: SubscriptionStatus,
        at: DateTime<Utc>,
    ) -> Result<()> {
        if !from.contains(&self.status) {
            return Err(RegistryError::InvalidStatusTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        self.updated_at = at;
        Ok(())
    }
}
