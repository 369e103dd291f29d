//! Bulk create (all-or-nothing) and bulk delete (always commits).

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::*;

#[tokio::test]
async fn test_bulk_create_blogposts() {
    let app = test_app();

    let (status, json) = post_json(
        &app,
        "/blogpost/bulk/",
        json!([blogpost_body("one"), blogpost_body("two")]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["created_count"], 2);
    assert_eq!(json["created_ids"], json!([1, 2]));
    assert_eq!(json["message"], "Successfully created 2 BlogPost entities");
}

#[tokio::test]
async fn test_bulk_create_with_bad_row_persists_nothing() {
    let app = test_app();

    let (status, json) = post_json(
        &app,
        "/blogpost/bulk/",
        json!([
            blogpost_body("fine"),
            blogpost_body_with_comments("bad", &[77]),
            blogpost_body("also fine")
        ]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(assert_envelope(&json, "Bad Request"), "Bulk creation failed");
    let errors = json["detail"]["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["index"], 1);
    assert_eq!(errors[0]["error"], "Comment with id 77 not found");

    let (_, count) = get_json(&app, "/blogpost/count/").await;
    assert_eq!(count["count"], 0);
}

#[tokio::test]
async fn test_bulk_create_reports_every_bad_row() {
    let app = test_app();
    let post_id = create_blogpost(&app, "parent").await;

    let (status, json) = post_json(
        &app,
        "/comment/bulk/",
        json!([
            comment_body("no parent", None),
            comment_body("ok", Some(post_id)),
            comment_body("missing parent", Some(999)),
            comment_body(&"x".repeat(101), Some(post_id))
        ]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let indexes: Vec<i64> = json["detail"]["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["index"].as_i64().unwrap())
        .collect();
    assert_eq!(indexes, vec![0, 2, 3]);
    assert_eq!(json["detail"]["errors"][0]["error"], "BlogPost ID is required");
    assert_eq!(json["detail"]["errors"][1]["error"], "BlogPost not found");

    let (_, count) = get_json(&app, "/comment/count/").await;
    assert_eq!(count["count"], 0);
}

#[tokio::test]
async fn test_bulk_create_comments() {
    let app = test_app();
    let post_id = create_blogpost(&app, "parent").await;

    let (status, json) = post_json(
        &app,
        "/comment/bulk/",
        json!([
            comment_body("a", Some(post_id)),
            comment_body("b", Some(post_id))
        ]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["created_count"], 2);
    assert_eq!(json["message"], "Successfully created 2 Comment entities");

    let (_, parent) = get_json(&app, &format!("/blogpost/{post_id}/")).await;
    assert_eq!(parent["hasComments_ids"], json!([1, 2]));
}

#[tokio::test]
async fn test_bulk_create_empty_list() {
    let app = test_app();
    let (status, json) = post_json(&app, "/comment/bulk/", json!([])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["created_count"], 0);
    assert_eq!(json["created_ids"], json!([]));
}

#[tokio::test]
async fn test_bulk_delete_mixed_ids_commits_existing() {
    let app = test_app();
    let a = create_blogpost(&app, "a").await;
    let b = create_blogpost(&app, "b").await;
    let c = create_blogpost(&app, "c").await;

    let (status, json) = delete_json(&app, "/blogpost/bulk/", Some(json!([a, 50, c, 51]))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["deleted_count"], 2);
    assert_eq!(json["not_found"], json!([50, 51]));
    assert_eq!(json["message"], "Successfully deleted 2 BlogPost entities");

    let (_, remaining) = get_json(&app, "/blogpost/").await;
    let remaining = remaining.as_array().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0]["id"], b);
}

#[tokio::test]
async fn test_bulk_delete_blogposts_orphans_comments() {
    let app = test_app();
    let post_id = create_blogpost(&app, "p").await;
    let cid = create_comment(&app, "c", post_id).await;

    delete_json(&app, "/blogpost/bulk/", Some(json!([post_id]))).await;

    let (_, comment) = get_json(&app, &format!("/comment/{cid}/")).await;
    assert_eq!(comment["comment"]["blogpost_id"], json!(null));
}

#[tokio::test]
async fn test_bulk_delete_comments() {
    let app = test_app();
    let post_id = create_blogpost(&app, "p").await;
    let c1 = create_comment(&app, "one", post_id).await;
    let c2 = create_comment(&app, "two", post_id).await;

    let (status, json) = delete_json(&app, "/comment/bulk/", Some(json!([c2, 10]))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["deleted_count"], 1);
    assert_eq!(json["not_found"], json!([10]));

    let (_, parent) = get_json(&app, &format!("/blogpost/{post_id}/")).await;
    assert_eq!(parent["hasComments_ids"], json!([c1]));
}

#[tokio::test]
async fn test_bulk_delete_requires_id_list() {
    let app = test_app();
    let (status, json) = delete_json(&app, "/comment/bulk/", Some(json!({"ids": [1]}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_envelope(&json, "Bad Request");
}
