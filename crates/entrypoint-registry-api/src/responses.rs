//! Response envelopes
//!
//! Every successful body is an [`ApiResponse`]: the payload under `data`,
//! plus a `meta` block for collections. Health checks use their own
//! [`HealthResponse`] shape so that load balancers can read it directly.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use entrypoint_registry_service::ServiceResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Success body
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

/// Collection metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMeta {
    /// Number of items under `data`
    pub count: usize,
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data, meta: None }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Status of the service or of one of its stores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Outcome of one store check
#[derive(Debug, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: HealthStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ComponentHealth {
    /// Turn a store ping into a check, keeping the failure text
    pub fn from_check(label: &str, outcome: ServiceResult<()>) -> Self {
        match outcome {
            Ok(()) => Self {
                status: HealthStatus::Healthy,
                message: None,
            },
            Err(e) => Self {
                status: HealthStatus::Unhealthy,
                message: Some(format!("{} error: {}", label, e)),
            },
        }
    }
}

/// Body of `GET /health`
///
/// The overall status is unhealthy as soon as one check is, and the
/// response is then sent with `503 Service Unavailable`.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub checks: BTreeMap<String, ComponentHealth>,
}

impl HealthResponse {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Healthy,
            version: version.into(),
            checks: BTreeMap::new(),
        }
    }

    /// Record a check and fold it into the overall status
    pub fn with_check(mut self, name: impl Into<String>, health: ComponentHealth) -> Self {
        if health.status == HealthStatus::Unhealthy {
            self.status = HealthStatus::Unhealthy;
        }
        self.checks.insert(name.into(), health);
        self
    }
}

impl IntoResponse for HealthResponse {
    fn into_response(self) -> Response {
        let code = match self.status {
            HealthStatus::Healthy => StatusCode::OK,
            HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        };
        (code, Json(self)).into_response()
    }
}

/// `200 OK` with `data`
pub fn ok<T>(data: T) -> ApiResponse<T> {
    ApiResponse::new(data)
}

/// `200 OK` with a collection and its size
pub fn listed<T>(items: Vec<T>) -> ApiResponse<Vec<T>> {
    let meta = ResponseMeta {
        count: items.len(),
        timestamp: Utc::now(),
    };
    ApiResponse {
        data: items,
        meta: Some(meta),
    }
}

/// `201 Created` with `data`
pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<ApiResponse<T>>) {
    (StatusCode::CREATED, Json(ApiResponse::new(data)))
}

pub fn no_content() -> StatusCode {
    StatusCode::NO_CONTENT
}
