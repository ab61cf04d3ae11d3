//! Tower layers around the registry router

use axum::http::{header, HeaderName, HeaderValue, Method, Request};
use std::time::Duration;
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    cors::{AllowHeaders, AllowOrigin, CorsLayer},
    request_id::{MakeRequestId, RequestId},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
    LatencyUnit,
};
use tracing::Level;
use uuid::Uuid;

/// Methods used by the configuration and portal routes, plus preflight
const CORS_METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::OPTIONS,
];

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Assigns a random UUID to requests arriving without `x-request-id`
#[derive(Clone, Copy, Default)]
pub struct UuidRequestIdGenerator;

impl MakeRequestId for UuidRequestIdGenerator {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

pub type HttpTraceLayer = TraceLayer<SharedClassifier<ServerErrorsAsFailures>>;

/// One INFO span per request, closed with status and latency in milliseconds
pub fn trace_layer() -> HttpTraceLayer {
    let make_span = DefaultMakeSpan::new().level(Level::INFO).include_headers(true);
    let on_response = DefaultOnResponse::new()
        .level(Level::INFO)
        .latency_unit(LatencyUnit::Millis)
        .include_headers(true);

    TraceLayer::new_for_http()
        .make_span_with(make_span)
        .on_response(on_response)
}

/// Cross-origin rules for browser clients of the portal
#[derive(Debug, Clone)]
pub struct CorsConfig {
    /// Origins allowed to call the API; empty allows every origin
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
    /// How long browsers may cache a preflight answer
    pub max_age_seconds: Option<u64>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            allow_credentials: false,
            max_age_seconds: Some(3600),
        }
    }
}

impl CorsConfig {
    // tower-http refuses `*` together with credentials, so the request's own
    // origin and headers are echoed back instead.
    fn origin(&self) -> AllowOrigin {
        if !self.allowed_origins.is_empty() {
            let origins = self
                .allowed_origins
                .iter()
                .filter_map(|origin| HeaderValue::from_str(origin).ok());
            return AllowOrigin::list(origins);
        }
        if self.allow_credentials {
            AllowOrigin::mirror_request()
        } else {
            AllowOrigin::any()
        }
    }

    fn headers(&self) -> AllowHeaders {
        if self.allow_credentials {
            AllowHeaders::mirror_request()
        } else {
            AllowHeaders::any()
        }
    }

    pub fn into_layer(self) -> CorsLayer {
        let layer = CorsLayer::new()
            .allow_methods(CORS_METHODS)
            .allow_origin(self.origin())
            .allow_headers(self.headers())
            .allow_credentials(self.allow_credentials)
            .expose_headers([header::CONTENT_TYPE, HeaderName::from_static(REQUEST_ID_HEADER)]);

        match self.max_age_seconds {
            Some(seconds) => layer.max_age(Duration::from_secs(seconds)),
            None => layer,
        }
    }
}

/// Which optional layers [`crate::build_api_server_with_config`] installs
#[derive(Debug, Clone)]
pub struct MiddlewareConfig {
    pub cors: CorsConfig,
    pub compression: bool,
    pub tracing: bool,
    /// Requests still running after this are answered with `408`
    pub timeout: Option<Duration>,
}

impl Default for MiddlewareConfig {
    fn default() -> Self {
        Self {
            cors: CorsConfig::default(),
            compression: true,
            tracing: true,
            timeout: Some(Duration::from_secs(30)),
        }
    }
}
