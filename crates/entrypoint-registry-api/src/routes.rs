//! API route definitions
//!
//! This module defines all API routes and builds the router.

use axum::{routing::get, Router};

use crate::handlers::{
    create_entry_point, delete_entry_point, get_entry_point, health_check,
    list_entry_points, list_portal_entry_points, update_entry_point, version_info, AppState,
};

/// Build the API router with all routes
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/version", get(version_info))
        .nest("/v1", build_v1_routes())
        .with_state(state)
}

/// Build v1 API routes
fn build_v1_routes() -> Router<AppState> {
    Router::new()
        // Entry point management
        .route(
            "/configuration/entrypoints",
            get(list_entry_points)
                .post(create_entry_point)
                .put(update_entry_point),
        )
        .route(
            "/configuration/entrypoints/:id",
            get(get_entry_point).delete(delete_entry_point),
        )
        // Public portal
        .route("/portal/entrypoints", get(list_portal_entry_points))
}
