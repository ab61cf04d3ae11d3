//! API error handling
//!
//! This module converts service errors into HTTP responses with appropriate
//! status codes and error codes.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use entrypoint_registry_service::ServiceError;
use serde::{Deserialize, Serialize};
use std::error::Error as _;
use std::fmt;
use tracing::error;

/// Error code for a missing entry point
pub const ENTRY_POINT_NOT_FOUND: &str = "ENTRY_POINT_NOT_FOUND";

/// Error code for a tag set already used by another entry point
pub const ENTRY_POINT_TAGS_ALREADY_EXISTS: &str = "ENTRY_POINT_TAGS_ALREADY_EXISTS";

/// Error code for storage or audit failures
pub const TECHNICAL_ERROR: &str = "TECHNICAL_ERROR";

/// API error type that can be converted to HTTP responses
#[derive(Debug)]
pub struct ApiError {
    status_code: StatusCode,
    message: String,
    error_code: Option<String>,
}

impl ApiError {
    /// Create a new API error
    pub fn new(status_code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status_code,
            message: message.into(),
            error_code: None,
        }
    }

    /// Create an API error with an error code
    pub fn with_code(
        status_code: StatusCode,
        message: impl Into<String>,
        error_code: impl Into<String>,
    ) -> Self {
        Self {
            status_code,
            message: message.into(),
            error_code: Some(error_code.into()),
        }
    }

    /// Create a bad request error (400)
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Create a not found error (404)
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Create an internal server error (500)
    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// HTTP status of this error
    pub fn status_code(&self) -> StatusCode {
        self.status_code
    }

    /// Machine-readable error code, if any
    pub fn error_code(&self) -> Option<&str> {
        self.error_code.as_deref()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

/// Error response JSON structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// HTTP status code
    pub status: u16,

    /// Error message
    pub error: String,

    /// Optional error code for programmatic handling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Timestamp of the error
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_response = ErrorResponse {
            status: self.status_code.as_u16(),
            error: self.message,
            code: self.error_code,
            timestamp: chrono::Utc::now(),
        };

        (self.status_code, Json(error_response)).into_response()
    }
}

/// Convert ServiceError to ApiError
impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::EntryPointNotFound(_) => ApiError::with_code(
                StatusCode::NOT_FOUND,
                err.to_string(),
                ENTRY_POINT_NOT_FOUND,
            ),
            ServiceError::EntryPointTagsAlreadyExists => ApiError::with_code(
                StatusCode::CONFLICT,
                err.to_string(),
                ENTRY_POINT_TAGS_ALREADY_EXISTS,
            ),
            ServiceError::SubscriptionNotFound(_) => ApiError::with_code(
                StatusCode::NOT_FOUND,
                err.to_string(),
                "SUBSCRIPTION_NOT_FOUND",
            ),
            ServiceError::InvalidSubscriptionStatus { .. } => ApiError::with_code(
                StatusCode::CONFLICT,
                err.to_string(),
                "SUBSCRIPTION_STATUS_CONFLICT",
            ),
            ServiceError::InvalidInput(msg) => {
                ApiError::with_code(StatusCode::BAD_REQUEST, msg, "INVALID_INPUT")
            }
            ServiceError::Technical { .. } => {
                let cause = err.source().map(|s| s.to_string()).unwrap_or_default();
                error!(cause = %cause, "{}", err);
                ApiError::with_code(StatusCode::INTERNAL_SERVER_ERROR, err.to_string(), TECHNICAL_ERROR)
            }
            ServiceError::Internal(msg) => {
                error!("{}", msg);
                ApiError::with_code(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Internal error: {}", msg),
                    "INTERNAL_ERROR",
                )
            }
        }
    }
}

/// Convert body extraction failures to ApiError
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::with_code(rejection.status(), rejection.body_text(), "INVALID_REQUEST_BODY")
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use entrypoint_registry_db::DbError;

    #[test]
    fn test_api_error_creation() {
        let err = ApiError::bad_request("Invalid request");
        assert_eq!(err.status_code, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Invalid request");
    }

    #[test]
    fn test_service_error_conversion() {
        let api_err: ApiError = ServiceError::EntryPointNotFound("123".to_string()).into();
        assert_eq!(api_err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(api_err.error_code(), Some(ENTRY_POINT_NOT_FOUND));

        let api_err: ApiError = ServiceError::EntryPointTagsAlreadyExists.into();
        assert_eq!(api_err.status_code(), StatusCode::CONFLICT);
        assert_eq!(api_err.error_code(), Some(ENTRY_POINT_TAGS_ALREADY_EXISTS));

        let api_err: ApiError = ServiceError::technical(
            "An error occurs while trying to create entry point https://a",
            DbError::Connection("refused".to_string()),
        )
        .into();
        assert_eq!(api_err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api_err.error_code(), Some(TECHNICAL_ERROR));
        assert!(!api_err.message.contains("refused"));
    }

    #[test]
    fn test_error_response_serialization() {
        let response = ErrorResponse {
            status: 404,
            error: "Not found".to_string(),
            code: Some(ENTRY_POINT_NOT_FOUND.to_string()),
            timestamp: chrono::Utc::now(),
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":404"));
        assert!(json.contains("\"code\":\"ENTRY_POINT_NOT_FOUND\""));
    }
}
