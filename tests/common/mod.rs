//! Shared helpers for the HTTP and storage integration tests.

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use incident_tracker::{
    api::{build_router, AppState},
    config::AppConfig,
    models::{Incident, IncidentSource, IncidentStatus},
    state::InMemoryStore,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// Router over a fresh in-memory store; the store handle stays with the test
pub fn test_app() -> (Router, InMemoryStore) {
    let store = InMemoryStore::new();
    let app = build_router(AppState::new(
        Arc::new(store.clone()),
        AppConfig::default(),
    ));
    (app, store)
}

/// Seed an incident straight into the store
pub fn seed_incident(
    store: &InMemoryStore,
    description: &str,
    status: IncidentStatus,
    age_minutes: i64,
) -> Incident {
    let mut incident = Incident::new(description.to_string(), IncidentSource::Operator);
    incident.status = status;
    incident.created_at = Utc::now() - Duration::minutes(age_minutes);
    store.insert(incident.clone());
    incident
}

/// Send one request and return the status plus the decoded JSON body
/// (`Value::Null` for an empty or non-JSON body)
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let request = match body {
        Some(body) => Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

/// Send a raw body with a JSON content type
pub async fn send_raw(app: &Router, method: Method, uri: &str, body: &str) -> StatusCode {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    app.clone().oneshot(request).await.unwrap().status()
}

/// Fetch `path` and return the body as text
pub async fn get_text(app: &Router, path: &str) -> (StatusCode, String, Option<String>) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap(), content_type)
}

/// Error code from an `{"error": {...}}` body
pub fn error_code(body: &Value) -> &str {
    body["error"]["code"].as_str().unwrap_or_default()
}
