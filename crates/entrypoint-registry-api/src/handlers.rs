//! API request handlers
//!
//! This module implements HTTP request handlers for all API endpoints.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use entrypoint_registry_core::{EntryPoint, EntryPointId, PortalEntryPoint};
use entrypoint_registry_service::{NewEntryPoint, ServiceRegistry, UpdateEntryPoint};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::{
    error::{ApiError, ApiResult},
    responses::{created, listed, no_content, ok, ApiResponse, ComponentHealth, HealthResponse},
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Service registry
    pub services: Arc<ServiceRegistry>,
}

impl AppState {
    /// Create new application state
    pub fn new(services: ServiceRegistry) -> Self {
        Self {
            services: Arc::new(services),
        }
    }
}

// ============================================================================
// Configuration Handlers
// ============================================================================

/// List every entry point, ordered by value
#[instrument(skip(state))]
pub async fn list_entry_points(
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<EntryPoint>>>> {
    let entry_points = state
        .services
        .entry_points()
        .find_all()
        .await
        .map_err(ApiError::from)?;

    Ok(Json(listed(entry_points)))
}

/// Get entry point by ID
#[instrument(skip(state))]
pub async fn get_entry_point(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<EntryPoint>>> {
    debug!("Getting entry point: {}", id);

    let entry_point = state
        .services
        .entry_points()
        .find_by_id(&EntryPointId::from(id))
        .await
        .map_err(ApiError::from)?;

    Ok(Json(ok(entry_point)))
}

/// Create a new entry point
#[instrument(skip(state, payload))]
pub async fn create_entry_point(
    State(state): State<AppState>,
    payload: Result<Json<NewEntryPoint>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ApiResponse<EntryPoint>>)> {
    let Json(request) = payload?;
    info!("Creating entry point: {}", request.value);

    let entry_point = state
        .services
        .entry_points()
        .create(request)
        .await
        .map_err(ApiError::from)?;

    Ok(created(entry_point))
}

/// Replace an existing entry point, identified by the id in the body
#[instrument(skip(state, payload))]
pub async fn update_entry_point(
    State(state): State<AppState>,
    payload: Result<Json<UpdateEntryPoint>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<EntryPoint>>> {
    let Json(request) = payload?;
    info!("Updating entry point: {}", request.id);

    let entry_point = state
        .services
        .entry_points()
        .update(request)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(ok(entry_point)))
}

/// Delete an entry point
#[instrument(skip(state))]
pub async fn delete_entry_point(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    info!("Deleting entry point: {}", id);

    state
        .services
        .entry_points()
        .delete(&EntryPointId::from(id))
        .await
        .map_err(ApiError::from)?;

    Ok(no_content())
}

// ============================================================================
// Portal Handlers
// ============================================================================

/// List entry points as published on the portal, without identifiers
#[instrument(skip(state))]
pub async fn list_portal_entry_points(
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<PortalEntryPoint>>>> {
    let entry_points = state
        .services
        .entry_points()
        .find_all_for_portal()
        .await
        .map_err(ApiError::from)?;

    Ok(Json(listed(entry_points)))
}

// ============================================================================
// Health & Version Handlers
// ============================================================================

/// Health check endpoint
#[instrument(skip(state))]
pub async fn health_check(State(state): State<AppState>) -> HealthResponse {
    debug!("Health check requested");

    let database = state.services.entry_points().health_check().await;

    HealthResponse::new(env!("CARGO_PKG_VERSION"))
        .with_check("database", ComponentHealth::from_check("Database", database))
}

/// Get API version information
#[instrument]
pub async fn version_info() -> Json<ApiResponse<VersionInfo>> {
    let info = VersionInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        api_version: "v1".to_string(),
        build_timestamp: option_env!("BUILD_TIMESTAMP")
            .unwrap_or("unknown")
            .to_string(),
    };

    Json(ok(info))
}

/// Version information
#[derive(Debug, Serialize, Deserialize)]
pub struct VersionInfo {
    /// Semantic version
    pub version: String,

    /// API version
    pub api_version: String,

    /// Build timestamp
    pub build_timestamp: String,
}
