//! Comment endpoint tests.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::*;

#[tokio::test]
async fn test_create_returns_flat_record() {
    let app = test_app();
    let post_id = create_blogpost(&app, "parent").await;

    let (status, created) = post_json(&app, "/comment/", comment_body("hi", Some(post_id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        created,
        json!({
            "id": 1,
            "content": "hi",
            "authorName": "Grace",
            "timestamp": "2024-01-02",
            "blogpost_id": post_id
        })
    );
}

#[tokio::test]
async fn test_create_requires_parent_id() {
    let app = test_app();
    let (status, json) = post_json(&app, "/comment/", comment_body("lonely", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(assert_envelope(&json, "Bad Request"), "BlogPost ID is required");
}

#[tokio::test]
async fn test_create_requires_existing_parent() {
    let app = test_app();
    let (status, json) = post_json(&app, "/comment/", comment_body("lost", Some(12))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(assert_envelope(&json, "Bad Request"), "BlogPost not found");

    let (_, count) = get_json(&app, "/comment/count/").await;
    assert_eq!(count["count"], 0);
}

#[tokio::test]
async fn test_get_wraps_record() {
    let app = test_app();
    let post_id = create_blogpost(&app, "p").await;
    let id = create_comment(&app, "c", post_id).await;

    let (status, json) = get_json(&app, &format!("/comment/{id}/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["comment"]["id"], id);
    assert_eq!(json["comment"]["content"], "c");

    let (status, json) = get_json(&app, "/comment/99/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(assert_envelope(&json, "Not Found"), "Comment not found");
}

#[tokio::test]
async fn test_detailed_list_embeds_parent_or_null() {
    let app = test_app();
    let post_id = create_blogpost(&app, "parent").await;
    create_comment(&app, "kept", post_id).await;
    let doomed = create_blogpost(&app, "doomed").await;
    create_comment(&app, "orphaned", doomed).await;
    delete_json(&app, &format!("/blogpost/{doomed}/"), None).await;

    let (status, plain) = get_json(&app, "/comment/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(plain[0].get("blogpost").is_none());

    let (_, detailed) = get_json(&app, "/comment/?detailed=true").await;
    let detailed = detailed.as_array().unwrap();
    assert_eq!(detailed.len(), 2);
    assert_eq!(detailed[0]["content"], "kept");
    assert_eq!(detailed[0]["blogpost"]["id"], post_id);
    assert_eq!(detailed[0]["blogpost"]["title"], "parent");
    assert_eq!(detailed[1]["content"], "orphaned");
    assert_eq!(detailed[1]["blogpost"], json!(null));
}

#[tokio::test]
async fn test_paginated_ignores_detailed() {
    let app = test_app();
    let post_id = create_blogpost(&app, "p").await;
    for content in ["a", "b", "c"] {
        create_comment(&app, content, post_id).await;
    }

    let (status, page) = get_json(&app, "/comment/paginated/?skip=1&limit=5&detailed=true").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 3);
    let data = page["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["content"], "b");
    assert!(data[0].get("blogpost").is_none());
    assert_eq!(data[0]["blogpost_id"], post_id);
}

#[tokio::test]
async fn test_search_returns_everything() {
    let app = test_app();
    let post_id = create_blogpost(&app, "p").await;
    create_comment(&app, "a", post_id).await;
    create_comment(&app, "b", post_id).await;

    let (status, found) = get_json(&app, "/comment/search/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_update_moves_comment_to_new_parent() {
    let app = test_app();
    let from = create_blogpost(&app, "from").await;
    let to = create_blogpost(&app, "to").await;
    let id = create_comment(&app, "moving", from).await;

    let (status, updated) = put_json(
        &app,
        &format!("/comment/{id}/"),
        comment_body("moved", Some(to)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["content"], "moved");
    assert_eq!(updated["blogpost_id"], to);

    let (_, old_parent) = get_json(&app, &format!("/blogpost/{from}/")).await;
    assert_eq!(old_parent["hasComments_ids"], json!([]));
    let (_, new_parent) = get_json(&app, &format!("/blogpost/{to}/")).await;
    assert_eq!(new_parent["hasComments_ids"], json!([id]));
}

#[tokio::test]
async fn test_update_without_parent_keeps_it() {
    let app = test_app();
    let post_id = create_blogpost(&app, "p").await;
    let id = create_comment(&app, "before", post_id).await;

    let (status, updated) =
        put_json(&app, &format!("/comment/{id}/"), comment_body("after", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["content"], "after");
    assert_eq!(updated["blogpost_id"], post_id);
}

#[tokio::test]
async fn test_update_to_missing_parent_changes_nothing() {
    let app = test_app();
    let post_id = create_blogpost(&app, "p").await;
    let id = create_comment(&app, "before", post_id).await;

    let (status, json) = put_json(
        &app,
        &format!("/comment/{id}/"),
        comment_body("after", Some(404)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(assert_envelope(&json, "Bad Request"), "BlogPost not found");

    let (_, fetched) = get_json(&app, &format!("/comment/{id}/")).await;
    assert_eq!(fetched["comment"]["content"], "before");
}

#[tokio::test]
async fn test_update_missing_is_not_found() {
    let app = test_app();
    let post_id = create_blogpost(&app, "p").await;
    let (status, _) = put_json(&app, "/comment/8/", comment_body("x", Some(post_id))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_returns_last_representation() {
    let app = test_app();
    let post_id = create_blogpost(&app, "p").await;
    let id = create_comment(&app, "bye", post_id).await;

    let (status, deleted) = delete_json(&app, &format!("/comment/{id}/"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["content"], "bye");
    assert_eq!(deleted["blogpost_id"], post_id);

    let (status, _) = delete_json(&app, &format!("/comment/{id}/"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, parent) = get_json(&app, &format!("/blogpost/{post_id}/")).await;
    assert_eq!(parent["hasComments_ids"], json!([]));
}
