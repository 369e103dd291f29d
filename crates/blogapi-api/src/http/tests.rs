//! Router tests.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use tower::ServiceExt; // for oneshot

use blogapi_server::MethodRegistry;
use blogapi_storage::{BlogPostFields, BlogStore, MemoryBlogStore, NaiveDate, StoreTransaction};

use super::routes::{create_router, create_router_with_options, RouterOptions};
use super::state::AppState;

fn test_app() -> (Arc<MemoryBlogStore>, Router) {
    let storage = MemoryBlogStore::new_shared();
    let app = create_router(AppState::new(Arc::clone(&storage)));
    (storage, app)
}

async fn get(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

async fn seed_blogpost(storage: &MemoryBlogStore, title: &str) -> i64 {
    let mut tx = storage.begin().await.unwrap();
    let record = tx
        .insert_blogpost(&BlogPostFields {
            title: title.to_string(),
            content: "c".to_string(),
            author_name: "a".to_string(),
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            image: "i".to_string(),
        })
        .await
        .unwrap();
    tx.commit().await.unwrap();
    record.id
}

#[tokio::test]
async fn test_static_segments_win_over_id() {
    let (storage, app) = test_app();
    seed_blogpost(&storage, "seeded").await;

    let (status, json) = get(app.clone(), "/blogpost/count/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 1);

    let (status, json) = get(app.clone(), "/blogpost/search/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(json.is_array());

    let (status, json) = get(app, "/blogpost/1/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["blogpost"]["title"], "seeded");
}

#[tokio::test]
async fn test_paths_require_trailing_slash() {
    let (storage, app) = test_app();
    seed_blogpost(&storage, "seeded").await;

    let (status, json) = get(app, "/blogpost/1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Not Found");
}

#[tokio::test]
async fn test_state_handlers_share_one_store() {
    let storage = MemoryBlogStore::new_shared();
    let state = AppState::with_methods(Arc::clone(&storage), MethodRegistry::new());
    let cloned = state.clone();

    assert!(Arc::ptr_eq(&state.storage, &cloned.storage));
    assert!(cloned.methods.registry().is_empty());

    seed_blogpost(&storage, "shared").await;
    assert_eq!(cloned.blogposts.count().await.unwrap().count, 1);
}

#[tokio::test]
async fn test_wrong_method_is_rejected() {
    let (_, app) = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri("/blogpost/1/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_options_without_timeout_or_cors() {
    let options = RouterOptions {
        request_timeout: None,
        cors: false,
        ..Default::default()
    };
    let metrics = Arc::clone(&options.request_metrics);
    let app = create_router_with_options(AppState::new(MemoryBlogStore::new_shared()), options);

    let (status, _) = get(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(metrics.request_count(), 1);
    assert_eq!(Duration::from_secs(30), super::DEFAULT_REQUEST_TIMEOUT);
}
