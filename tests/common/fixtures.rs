//! Test fixtures
//!
//! This module provides test data fixtures for integration tests.

use entrypoint_registry_core::EntryPoint;
use serde_json::{json, Value};

/// Address used by the reference entry point
pub const MY_COMPANY_API: &str = "https://api.mycompany.com";

/// Request body creating an entry point
pub fn new_entry_point(value: &str, tags: &[&str]) -> Value {
    json!({ "value": value, "tags": tags })
}

/// Request body replacing an entry point
pub fn update_entry_point(id: &str, value: &str, tags: &[&str]) -> Value {
    json!({ "id": id, "value": value, "tags": tags })
}

/// Decode the `data` member of a success envelope
pub fn data<T: serde::de::DeserializeOwned>(body: Value) -> T {
    serde_json::from_value(body["data"].clone()).expect("Unexpected response shape")
}

/// Decode a single configured entry point from a success envelope
pub fn entry_point(body: Value) -> EntryPoint {
    data(body)
}
