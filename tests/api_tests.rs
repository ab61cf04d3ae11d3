//! API Integration Tests
//!
//! Tests for HTTP REST API endpoints including health checks, versioning,
//! entry point configuration and the portal view.

mod common;

use async_trait::async_trait;
use common::{assert_client_error, assert_status, assert_success, fixtures, parse_json, TestApp};
use entrypoint_registry_core::{AuditEventKind, EntryPoint, EntryPointId, PortalEntryPoint};
use entrypoint_registry_db::{AuditQuery, DbError, DbResult, EntryPointRecord, EntryPointRepository};
use reqwest::StatusCode;
use serde_json::Value;
use std::sync::Arc;

#[tokio::test]
async fn test_health_endpoint() {
    let app = TestApp::new().await;
    let client = app.client();

    let response = client
        .get(format!("{}/health", app.url()))
        .send()
        .await
        .expect("Failed to send request");

    assert_success(&response);

    let body: Value = parse_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());
    assert_eq!(body["checks"]["database"]["status"], "healthy");
}

#[tokio::test]
async fn test_version_endpoint() {
    let app = TestApp::new().await;

    let response = app
        .client()
        .get(format!("{}/version", app.url()))
        .send()
        .await
        .expect("Failed to send request");

    assert_success(&response);

    let body: Value = parse_json(response).await;
    assert!(body["data"]["version"].is_string());
    assert_eq!(body["data"]["api_version"], "v1");
}

#[tokio::test]
async fn test_not_found_endpoint() {
    let app = TestApp::new().await;

    let response = app
        .client()
        .get(format!("{}/nonexistent", app.url()))
        .send()
        .await
        .expect("Failed to send request");

    assert_status(&response, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_duplicate_tag_set_scenario() {
    let app = TestApp::new().await;
    let client = app.client();
    let existing = app
        .create_entry_point(fixtures::MY_COMPANY_API, &["private", "product"])
        .await;

    // Same set in another order
    let response = client
        .post(app.entry_points_url())
        .json(&fixtures::new_entry_point(
            fixtures::MY_COMPANY_API,
            &["product", "private"],
        ))
        .send()
        .await
        .expect("Failed to send request");
    assert_status(&response, StatusCode::CONFLICT);
    let body: Value = parse_json(response).await;
    assert_eq!(body["code"], "ENTRY_POINT_TAGS_ALREADY_EXISTS");

    let response = client
        .post(app.entry_points_url())
        .json(&fixtures::new_entry_point(
            fixtures::MY_COMPANY_API,
            &["public", "product"],
        ))
        .send()
        .await
        .expect("Failed to send request");
    assert_status(&response, StatusCode::CREATED);
    let created = fixtures::entry_point(parse_json(response).await);
    assert_ne!(created.id.as_str(), existing);
    assert_eq!(created.tags, vec!["public".to_string(), "product".to_string()]);

    assert_eq!(app.audit_count().await, 2);
}

#[tokio::test]
async fn test_get_entry_point() {
    let app = TestApp::new().await;
    let id = app.create_entry_point("https://a.example", &["a"]).await;

    let response = app
        .client()
        .get(app.entry_point_url(&id))
        .send()
        .await
        .expect("Failed to send request");

    assert_success(&response);
    let entry_point = fixtures::entry_point(parse_json(response).await);
    assert_eq!(
        entry_point,
        EntryPoint::new(
            EntryPointId::from(id),
            "https://a.example",
            vec!["a".to_string()]
        )
    );
}

#[tokio::test]
async fn test_get_unknown_entry_point() {
    let app = TestApp::new().await;

    let response = app
        .client()
        .get(app.entry_point_url("unknown"))
        .send()
        .await
        .expect("Failed to send request");

    assert_status(&response, StatusCode::NOT_FOUND);
    let body: Value = parse_json(response).await;
    assert_eq!(body["code"], "ENTRY_POINT_NOT_FOUND");
    assert_eq!(body["error"], "Entry point [unknown] can not be found.");
}

#[tokio::test]
async fn test_list_is_sorted_case_insensitively() {
    let app = TestApp::new().await;
    app.create_entry_point("https://b.example", &["b"]).await;
    app.create_entry_point("https://A.example", &["a"]).await;

    let response = app
        .client()
        .get(app.entry_points_url())
        .send()
        .await
        .expect("Failed to send request");

    assert_success(&response);
    let entry_points: Vec<EntryPoint> = fixtures::data(parse_json(response).await);
    let values: Vec<&str> = entry_points.iter().map(|e| e.value.as_str()).collect();
    assert_eq!(values, vec!["https://A.example", "https://b.example"]);
}

#[tokio::test]
async fn test_update_keeping_own_tags() {
    let app = TestApp::new().await;
    let client = app.client();
    let id = app.create_entry_point("https://a.example", &["x", "y"]).await;

    let response = client
        .put(app.entry_points_url())
        .json(&fixtures::update_entry_point(&id, "https://b.example", &["y", "x"]))
        .send()
        .await
        .expect("Failed to send request");

    assert_success(&response);
    let updated = fixtures::entry_point(parse_json(response).await);
    assert_eq!(updated.id.as_str(), id);
    assert_eq!(updated.value, "https://b.example");

    let events = app
        .audit_store
        .query(&AuditQuery::new().event(AuditEventKind::EntryPointUpdated))
        .await
        .expect("Failed to query audit events");
    assert_eq!(events.count(), 1);
    assert!(events.events[0].old_value.is_some());
    assert!(events.events[0].new_value.is_some());
}

#[tokio::test]
async fn test_update_to_tags_of_another_entry_point() {
    let app = TestApp::new().await;
    app.create_entry_point("https://a.example", &["a"]).await;
    let id = app.create_entry_point("https://b.example", &["b"]).await;

    let response = app
        .client()
        .put(app.entry_points_url())
        .json(&fixtures::update_entry_point(&id, "https://b.example", &["a"]))
        .send()
        .await
        .expect("Failed to send request");

    assert_status(&response, StatusCode::CONFLICT);
    assert_eq!(app.audit_count().await, 2);
}

#[tokio::test]
async fn test_update_unknown_entry_point() {
    let app = TestApp::new().await;

    let response = app
        .client()
        .put(app.entry_points_url())
        .json(&fixtures::update_entry_point("unknown", "https://a.example", &[]))
        .send()
        .await
        .expect("Failed to send request");

    assert_status(&response, StatusCode::NOT_FOUND);
    assert_eq!(app.audit_count().await, 0);
}

#[tokio::test]
async fn test_delete_entry_point() {
    let app = TestApp::new().await;
    let client = app.client();
    let id = app.create_entry_point("https://a.example", &["a"]).await;

    let response = client
        .delete(app.entry_point_url(&id))
        .send()
        .await
        .expect("Failed to send request");
    assert_status(&response, StatusCode::NO_CONTENT);

    let response = client
        .get(app.entry_point_url(&id))
        .send()
        .await
        .expect("Failed to send request");
    assert_status(&response, StatusCode::NOT_FOUND);

    let response = client
        .delete(app.entry_point_url(&id))
        .send()
        .await
        .expect("Failed to send request");
    assert_status(&response, StatusCode::NOT_FOUND);

    // Freed tag set can be reused
    app.create_entry_point("https://b.example", &["a"]).await;
}

#[tokio::test]
async fn test_portal_view() {
    let app = TestApp::new().await;
    app.create_entry_point("https://b.example", &["b"]).await;
    app.create_entry_point("https://A.example", &[]).await;

    let response = app
        .client()
        .get(app.portal_url())
        .send()
        .await
        .expect("Failed to send request");

    assert_success(&response);
    let body: Value = parse_json(response).await;
    assert!(body["data"]
        .as_array()
        .expect("Portal data is not an array")
        .iter()
        .all(|entry_point| entry_point.get("id").is_none()));

    let portal: Vec<PortalEntryPoint> = fixtures::data(body);
    assert_eq!(
        portal,
        vec![
            PortalEntryPoint {
                value: "https://A.example".to_string(),
                tags: vec![],
            },
            PortalEntryPoint {
                value: "https://b.example".to_string(),
                tags: vec!["b".to_string()],
            },
        ]
    );
}

#[tokio::test]
async fn test_sqlite_backend_round_trip() {
    let app = TestApp::with_sqlite().await;
    let client = app.client();
    let id = app
        .create_entry_point(fixtures::MY_COMPANY_API, &["private", "product"])
        .await;

    let response = client
        .post(app.entry_points_url())
        .json(&fixtures::new_entry_point("https://b.example", &["product", "private"]))
        .send()
        .await
        .expect("Failed to send request");
    assert_status(&response, StatusCode::CONFLICT);

    let response = client
        .delete(app.entry_point_url(&id))
        .send()
        .await
        .expect("Failed to send request");
    assert_status(&response, StatusCode::NO_CONTENT);

    let response = client
        .get(app.entry_points_url())
        .send()
        .await
        .expect("Failed to send request");
    let entry_points: Vec<EntryPoint> = fixtures::data(parse_json(response).await);
    assert!(entry_points.is_empty());
    assert_eq!(app.audit_count().await, 2);
}

/// Repository whose every call fails
struct UnavailableRepository;

#[async_trait]
impl EntryPointRepository for UnavailableRepository {
    async fn find_by_id(&self, _id: &EntryPointId) -> DbResult<Option<EntryPointRecord>> {
        Err(DbError::Connection("database is down".to_string()))
    }

    async fn find_all(&self) -> DbResult<Vec<EntryPointRecord>> {
        Err(DbError::Connection("database is down".to_string()))
    }

    async fn create(&self, _record: EntryPointRecord) -> DbResult<EntryPointRecord> {
        Err(DbError::Connection("database is down".to_string()))
    }

    async fn update(&self, _record: EntryPointRecord) -> DbResult<EntryPointRecord> {
        Err(DbError::Connection("database is down".to_string()))
    }

    async fn delete(&self, _id: &EntryPointId) -> DbResult<()> {
        Err(DbError::Connection("database is down".to_string()))
    }

    async fn health_check(&self) -> DbResult<()> {
        Err(DbError::Connection("database is down".to_string()))
    }
}

#[tokio::test]
async fn test_storage_failure_is_technical_error() {
    let app = TestApp::with_repository(Arc::new(UnavailableRepository)).await;
    let client = app.client();

    let response = client
        .get(app.entry_point_url("123"))
        .send()
        .await
        .expect("Failed to send request");
    assert_status(&response, StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = parse_json(response).await;
    assert_eq!(body["code"], "TECHNICAL_ERROR");

    let response = client
        .get(format!("{}/health", app.url()))
        .send()
        .await
        .expect("Failed to send request");
    assert_status(&response, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_malformed_json_request() {
    let app = TestApp::new().await;

    let response = app
        .client()
        .post(app.entry_points_url())
        .header("Content-Type", "application/json")
        .body("{invalid json}")
        .send()
        .await
        .expect("Failed to send request");

    assert_status(&response, StatusCode::BAD_REQUEST);
    assert_eq!(app.audit_count().await, 0);
}

#[tokio::test]
async fn test_content_type_validation() {
    let app = TestApp::new().await;

    let response = app
        .client()
        .post(app.entry_points_url())
        .header("Content-Type", "text/plain")
        .body("not json")
        .send()
        .await
        .expect("Failed to send request");

    assert_client_error(&response);
}

#[tokio::test]
async fn test_cors_headers() {
    let app = TestApp::new().await;

    let response = app
        .client()
        .request(reqwest::Method::OPTIONS, format!("{}/health", app.url()))
        .header("Origin", "http://example.com")
        .header("Access-Control-Request-Method", "GET")
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.headers().contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn test_request_id_header() {
    let app = TestApp::new().await;

    let response = app
        .client()
        .get(format!("{}/health", app.url()))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.headers().contains_key("x-request-id"));
}
