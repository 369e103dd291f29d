//! Shared helpers for the HTTP integration tests.

// Each test binary uses a different subset of these helpers.
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use blogapi_api::http::{create_router, AppState};
use blogapi_server::MethodRegistry;
use blogapi_storage::MemoryBlogStore;

/// Upper bound on response bodies read by the helpers.
pub const MAX_BODY: usize = 1024 * 1024;

/// A router over a fresh in-memory store.
pub fn test_app() -> Router {
    create_router(AppState::new(MemoryBlogStore::new_shared()))
}

/// A router over `storage`, so tests can inspect the store directly.
pub fn test_app_with_storage(storage: &Arc<MemoryBlogStore>) -> Router {
    create_router(AppState::new(Arc::clone(storage)))
}

/// A router whose method endpoints dispatch to `registry`.
pub fn test_app_with_methods(registry: MethodRegistry) -> Router {
    create_router(AppState::with_methods(
        MemoryBlogStore::new_shared(),
        registry,
    ))
}

/// Sends one request and returns the status and decoded JSON body
/// (`Value::Null` for an empty body).
pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header(CONTENT_TYPE, "application/json");
            Body::from(serde_json::to_vec(&value).unwrap())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), MAX_BODY)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            panic!("response is not JSON: {}", String::from_utf8_lossy(&bytes))
        })
    };
    (status, json)
}

pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None).await
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn put_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::PUT, uri, Some(body)).await
}

pub async fn delete_json(app: &Router, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    send(app, Method::DELETE, uri, body).await
}

pub fn blogpost_body(title: &str) -> Value {
    json!({
        "title": title,
        "content": format!("{title} body"),
        "authorName": "Ada",
        "timestamp": "2024-01-01",
        "image": "cover.png"
    })
}

pub fn blogpost_body_with_comments(title: &str, comment_ids: &[i64]) -> Value {
    let mut body = blogpost_body(title);
    body["hasComments"] = json!(comment_ids);
    body
}

pub fn comment_body(content: &str, blogpost: Option<i64>) -> Value {
    let mut body = json!({
        "content": content,
        "authorName": "Grace",
        "timestamp": "2024-01-02"
    });
    if let Some(id) = blogpost {
        body["blogpost"] = json!(id);
    }
    body
}

/// Creates a blog post and returns its id.
pub async fn create_blogpost(app: &Router, title: &str) -> i64 {
    let (status, json) = post_json(app, "/blogpost/", blogpost_body(title)).await;
    assert_eq!(status, StatusCode::OK, "create blogpost failed: {json}");
    json["blogpost"]["id"].as_i64().unwrap()
}

/// Creates a comment under `blogpost_id` and returns its id.
pub async fn create_comment(app: &Router, content: &str, blogpost_id: i64) -> i64 {
    let (status, json) = post_json(app, "/comment/", comment_body(content, Some(blogpost_id))).await;
    assert_eq!(status, StatusCode::OK, "create comment failed: {json}");
    json["id"].as_i64().unwrap()
}

/// Asserts the uniform error envelope and returns its message.
pub fn assert_envelope(json: &Value, error: &str) -> String {
    assert_eq!(json["error"], error, "unexpected envelope: {json}");
    assert!(json.get("detail").is_some(), "envelope has no detail: {json}");
    json["message"].as_str().unwrap_or_default().to_string()
}
