//! BlogPost endpoint tests, including comment ownership.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::*;

#[tokio::test]
async fn test_create_then_get_returns_same_fields() {
    let app = test_app();

    let (status, created) = post_json(&app, "/blogpost/", blogpost_body("Hello")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["blogpost"]["id"], 1);
    assert_eq!(created["hasComments_ids"], json!([]));

    let (status, fetched) = get_json(&app, "/blogpost/1/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["blogpost"], created["blogpost"]);
    assert_eq!(fetched["blogpost"]["title"], "Hello");
    assert_eq!(fetched["blogpost"]["authorName"], "Ada");
    assert_eq!(fetched["blogpost"]["timestamp"], "2024-01-01");
    assert_eq!(fetched["blogpost"]["image"], "cover.png");
}

#[tokio::test]
async fn test_comment_shows_up_in_parent_ids() {
    let app = test_app();
    let post_id = create_blogpost(&app, "A").await;
    let comment_id = create_comment(&app, "hi", post_id).await;
    assert_eq!(comment_id, 1);

    let (_, fetched) = get_json(&app, "/blogpost/1/").await;
    assert_eq!(fetched["hasComments_ids"], json!([1]));
}

#[tokio::test]
async fn test_create_with_comments_repoints_them() {
    let app = test_app();
    let first = create_blogpost(&app, "first").await;
    let c1 = create_comment(&app, "one", first).await;
    let c2 = create_comment(&app, "two", first).await;

    let (status, created) = post_json(
        &app,
        "/blogpost/",
        blogpost_body_with_comments("second", &[c1, c2]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let second = created["blogpost"]["id"].as_i64().unwrap();
    assert_eq!(created["hasComments_ids"], json!([c1, c2]));

    for id in [c1, c2] {
        let (_, comment) = get_json(&app, &format!("/comment/{id}/")).await;
        assert_eq!(comment["comment"]["blogpost_id"], second);
    }
    let (_, old) = get_json(&app, &format!("/blogpost/{first}/")).await;
    assert_eq!(old["hasComments_ids"], json!([]));
}

#[tokio::test]
async fn test_create_with_missing_comment_persists_nothing() {
    let app = test_app();

    let (status, json) = post_json(
        &app,
        "/blogpost/",
        blogpost_body_with_comments("orphan", &[42]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(assert_envelope(&json, "Bad Request"), "Comment with id 42 not found");

    let (_, count) = get_json(&app, "/blogpost/count/").await;
    assert_eq!(count["count"], 0);
}

#[tokio::test]
async fn test_get_missing_is_not_found() {
    let app = test_app();
    let (status, json) = get_json(&app, "/blogpost/7/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(assert_envelope(&json, "Not Found"), "BlogPost not found");
    assert_eq!(json["detail"], "HTTP 404 error occurred");
}

#[tokio::test]
async fn test_list_plain_and_detailed() {
    let app = test_app();
    let a = create_blogpost(&app, "a").await;
    let b = create_blogpost(&app, "b").await;
    create_comment(&app, "on a", a).await;

    let (status, plain) = get_json(&app, "/blogpost/").await;
    assert_eq!(status, StatusCode::OK);
    let plain = plain.as_array().unwrap();
    assert_eq!(plain.len(), 2);
    assert_eq!(plain[0]["id"], a);
    assert_eq!(plain[1]["id"], b);
    assert!(plain[0].get("hasComments").is_none());

    let (_, detailed) = get_json(&app, "/blogpost/?detailed=true").await;
    let detailed = detailed.as_array().unwrap();
    assert_eq!(detailed[0]["title"], "a");
    assert_eq!(detailed[0]["hasComments"][0]["content"], "on a");
    assert_eq!(detailed[0]["hasComments"][0]["blogpost_id"], a);
    assert_eq!(detailed[1]["hasComments"], json!([]));
}

#[tokio::test]
async fn test_detailed_flag_spellings() {
    let app = test_app();
    let a = create_blogpost(&app, "a").await;
    create_comment(&app, "on a", a).await;

    for on in ["1", "yes", "On", "t"] {
        let (status, listing) = get_json(&app, &format!("/blogpost/?detailed={on}")).await;
        assert_eq!(status, StatusCode::OK, "detailed={on}");
        assert_eq!(listing[0]["hasComments"][0]["content"], "on a", "detailed={on}");
    }

    for off in ["0", "no", "OFF", "false"] {
        let (status, listing) = get_json(&app, &format!("/blogpost/?detailed={off}")).await;
        assert_eq!(status, StatusCode::OK, "detailed={off}");
        assert!(listing[0].get("hasComments").is_none(), "detailed={off}");
    }

    let (_, page) = get_json(&app, "/blogpost/paginated/?detailed=1").await;
    assert_eq!(page["data"][0]["hasComments_ids"], json!([1]));

    let (status, _) = get_json(&app, "/comment/?detailed=yes").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_count_and_search() {
    let app = test_app();
    for title in ["x", "y", "z"] {
        create_blogpost(&app, title).await;
    }

    let (_, count) = get_json(&app, "/blogpost/count/").await;
    assert_eq!(count, json!({"count": 3}));

    let (status, found) = get_json(&app, "/blogpost/search/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_paginated_window_and_detail_ids() {
    let app = test_app();
    let mut ids = Vec::new();
    for title in ["p1", "p2", "p3", "p4"] {
        ids.push(create_blogpost(&app, title).await);
    }
    create_comment(&app, "c", ids[2]).await;

    let (status, page) = get_json(&app, "/blogpost/paginated/?skip=1&limit=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 4);
    assert_eq!(page["skip"], 1);
    assert_eq!(page["limit"], 2);
    let data = page["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["id"], ids[1]);
    assert_eq!(data[1]["id"], ids[2]);

    let (_, page) = get_json(&app, "/blogpost/paginated/?skip=2&limit=1&detailed=true").await;
    let item = &page["data"][0];
    assert_eq!(item["blogpost"]["id"], ids[2]);
    assert_eq!(item["hasComments_ids"], json!([1]));
}

#[tokio::test]
async fn test_paginated_defaults() {
    let app = test_app();
    create_blogpost(&app, "only").await;

    let (_, page) = get_json(&app, "/blogpost/paginated/").await;
    assert_eq!(page["skip"], 0);
    assert_eq!(page["limit"], 100);
    assert_eq!(page["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_paginated_rejects_negative_window() {
    let app = test_app();
    let (status, json) = get_json(&app, "/blogpost/paginated/?skip=-1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(assert_envelope(&json, "Bad Request").contains("skip"));
}

#[tokio::test]
async fn test_update_overwrites_and_is_idempotent() {
    let app = test_app();
    let id = create_blogpost(&app, "before").await;

    let mut body = blogpost_body("after");
    body["content"] = json!("rewritten");
    body["timestamp"] = json!("2025-02-03");

    let (status, first) = put_json(&app, &format!("/blogpost/{id}/"), body.clone()).await;
    assert_eq!(status, StatusCode::OK);
    let (status, second) = put_json(&app, &format!("/blogpost/{id}/"), body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first, second);

    let (_, fetched) = get_json(&app, &format!("/blogpost/{id}/")).await;
    assert_eq!(fetched["blogpost"]["title"], "after");
    assert_eq!(fetched["blogpost"]["content"], "rewritten");
    assert_eq!(fetched["blogpost"]["timestamp"], "2025-02-03");
}

#[tokio::test]
async fn test_update_without_comment_list_keeps_relationships() {
    let app = test_app();
    let id = create_blogpost(&app, "keep").await;
    create_comment(&app, "stays", id).await;

    let (_, updated) = put_json(&app, &format!("/blogpost/{id}/"), blogpost_body("kept")).await;
    assert_eq!(updated["hasComments_ids"], json!([1]));
}

#[tokio::test]
async fn test_update_with_empty_list_orphans_all_comments() {
    let app = test_app();
    let id = create_blogpost(&app, "owner").await;
    let c1 = create_comment(&app, "one", id).await;
    let c2 = create_comment(&app, "two", id).await;

    let (status, updated) = put_json(
        &app,
        &format!("/blogpost/{id}/"),
        blogpost_body_with_comments("owner", &[]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["hasComments_ids"], json!([]));

    for cid in [c1, c2] {
        let (_, comment) = get_json(&app, &format!("/comment/{cid}/")).await;
        assert_eq!(comment["comment"]["blogpost_id"], json!(null));
    }
}

#[tokio::test]
async fn test_update_replaces_comment_set() {
    let app = test_app();
    let id = create_blogpost(&app, "owner").await;
    let other = create_blogpost(&app, "other").await;
    let c1 = create_comment(&app, "one", id).await;
    let c2 = create_comment(&app, "two", other).await;

    let (_, updated) = put_json(
        &app,
        &format!("/blogpost/{id}/"),
        blogpost_body_with_comments("owner", &[c2]),
    )
    .await;
    assert_eq!(updated["hasComments_ids"], json!([c2]));

    let (_, released) = get_json(&app, &format!("/comment/{c1}/")).await;
    assert_eq!(released["comment"]["blogpost_id"], json!(null));
    let (_, other_post) = get_json(&app, &format!("/blogpost/{other}/")).await;
    assert_eq!(other_post["hasComments_ids"], json!([]));
}

#[tokio::test]
async fn test_update_with_missing_comment_rolls_back() {
    let app = test_app();
    let id = create_blogpost(&app, "original").await;
    let c1 = create_comment(&app, "one", id).await;

    let (status, json) = put_json(
        &app,
        &format!("/blogpost/{id}/"),
        blogpost_body_with_comments("changed", &[99]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(assert_envelope(&json, "Bad Request"), "Comment with id 99 not found");

    let (_, fetched) = get_json(&app, &format!("/blogpost/{id}/")).await;
    assert_eq!(fetched["blogpost"]["title"], "original");
    assert_eq!(fetched["hasComments_ids"], json!([c1]));
}

#[tokio::test]
async fn test_update_missing_is_not_found() {
    let app = test_app();
    let (status, json) = put_json(&app, "/blogpost/5/", blogpost_body("x")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_envelope(&json, "Not Found");
}

#[tokio::test]
async fn test_delete_returns_record_and_orphans_comments() {
    let app = test_app();
    let id = create_blogpost(&app, "doomed").await;
    let cid = create_comment(&app, "survivor", id).await;

    let (status, deleted) = delete_json(&app, &format!("/blogpost/{id}/"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["id"], id);
    assert_eq!(deleted["title"], "doomed");

    let (status, _) = get_json(&app, &format!("/blogpost/{id}/")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, comment) = get_json(&app, &format!("/comment/{cid}/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(comment["comment"]["blogpost_id"], json!(null));
}

#[tokio::test]
async fn test_delete_missing_is_not_found() {
    let app = test_app();
    let (status, json) = delete_json(&app, "/blogpost/3/", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(assert_envelope(&json, "Not Found"), "BlogPost not found");
}

#[tokio::test]
async fn test_title_longer_than_limit_is_rejected() {
    let app = test_app();
    let (status, json) = post_json(&app, "/blogpost/", blogpost_body(&"t".repeat(101))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(assert_envelope(&json, "Bad Request").contains("title"));

    let mut body = blogpost_body(&"t".repeat(100));
    body["content"] = json!("short");
    let (status, _) = post_json(&app, "/blogpost/", body).await;
    assert_eq!(status, StatusCode::OK);
}
