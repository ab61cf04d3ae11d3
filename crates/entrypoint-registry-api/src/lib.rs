//! Entry Point Registry API Layer
//!
//! This crate provides the REST API layer for the Entry Point Registry using
//! Axum.
//!
//! # Architecture
//!
//! - **Handlers**: configuration, portal, health and version endpoints
//! - **Routes**: route definitions and router configuration
//! - **Middleware**: Tower layers for request IDs, tracing, CORS, compression
//! - **Error Handling**: conversion of service errors to HTTP responses
//! - **Responses**: standard response wrappers and types
//!
//! # Example
//!
//! ```rust,no_run
//! use entrypoint_registry_api::build_api_server;
//! use entrypoint_registry_service::ServiceRegistry;
//!
//! # async fn example() -> std::io::Result<()> {
//! let app = build_api_server(ServiceRegistry::in_memory());
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod responses;
pub mod routes;

// Re-export main types for convenience
pub use error::{ApiError, ApiResult, ErrorResponse};
pub use handlers::{AppState, VersionInfo};
pub use middleware::{CorsConfig, MiddlewareConfig, UuidRequestIdGenerator};
pub use responses::{
    created, listed, no_content, ok, ApiResponse, ComponentHealth, HealthResponse, HealthStatus,
    ResponseMeta,
};
pub use routes::build_router;

use axum::Router;
use entrypoint_registry_service::ServiceRegistry;
use tower_http::{
    compression::CompressionLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};

/// Build a complete API server with middleware
///
/// Uses the default [`MiddlewareConfig`].
pub fn build_api_server(services: ServiceRegistry) -> Router {
    build_api_server_with_config(services, MiddlewareConfig::default())
}

/// Build API server with custom middleware configuration
///
/// # Example
///
/// ```rust,no_run
/// use entrypoint_registry_api::{build_api_server_with_config, MiddlewareConfig};
/// use entrypoint_registry_service::ServiceRegistry;
/// use std::time::Duration;
///
/// let middleware_config = MiddlewareConfig {
///     compression: false,
///     timeout: Some(Duration::from_secs(60)),
///     ..MiddlewareConfig::default()
/// };
///
/// let app = build_api_server_with_config(ServiceRegistry::in_memory(), middleware_config);
/// ```
pub fn build_api_server_with_config(
    services: ServiceRegistry,
    middleware_config: MiddlewareConfig,
) -> Router {
    let mut router = build_router(AppState::new(services));

    if let Some(timeout) = middleware_config.timeout {
        router = router.layer(TimeoutLayer::new(timeout));
    }

    router = router.layer(middleware_config.cors.into_layer());

    if middleware_config.compression {
        router = router.layer(CompressionLayer::new());
    }

    if middleware_config.tracing {
        router = router.layer(middleware::trace_layer());
    }

    // Outermost so the id is visible to the trace span and echoed back
    router
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(UuidRequestIdGenerator))
}
