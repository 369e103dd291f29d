//! BlogPost endpoints.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{de, Deserialize, Deserializer};

use blogapi_server::handlers::{
    BlogPost, BlogPostListing, BlogPostPageItem, BlogPostPayload, BlogPostWithCommentIds,
    BulkCreateOutcome, BulkDeleteOutcome, CountResponse, EntityKind, MethodInvocation, Page,
    DEFAULT_PAGE_LIMIT,
};
use blogapi_storage::BlogStore;

use super::extract::{ApiPath, ApiQuery, JsonBadRequest};
use super::state::AppState;
use crate::errors::ApiResult;

/// `?detailed=` switch of the list endpoints.
#[derive(Debug, Default, Deserialize)]
pub(super) struct ListQuery {
    #[serde(default, deserialize_with = "query_flag")]
    pub detailed: bool,
}

/// Window parameters of the paginated endpoints.
#[derive(Debug, Default, Deserialize)]
pub(super) struct PageQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    #[serde(default, deserialize_with = "query_flag")]
    pub detailed: bool,
}

/// Accepts `1`/`0`, `true`/`false`, `t`/`f`, `yes`/`no`, `y`/`n` and
/// `on`/`off`, case-insensitively.
fn query_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let raw = String::deserialize(deserializer)?;
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Ok(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Ok(false),
        _ => Err(de::Error::invalid_value(
            de::Unexpected::Str(&raw),
            &"a boolean flag",
        )),
    }
}

impl PageQuery {
    pub(super) fn skip(&self) -> i64 {
        self.skip.unwrap_or(0)
    }

    pub(super) fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_LIMIT)
    }
}

pub(super) async fn list<S: BlogStore>(
    State(state): State<Arc<AppState<S>>>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<Json<BlogPostListing>> {
    Ok(Json(state.blogposts.list(query.detailed).await?))
}

pub(super) async fn count<S: BlogStore>(
    State(state): State<Arc<AppState<S>>>,
) -> ApiResult<Json<CountResponse>> {
    Ok(Json(state.blogposts.count().await?))
}

pub(super) async fn paginated<S: BlogStore>(
    State(state): State<Arc<AppState<S>>>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult<Json<Page<BlogPostPageItem>>> {
    let page = state
        .blogposts
        .paginated(query.skip(), query.limit(), query.detailed)
        .await?;
    Ok(Json(page))
}

pub(super) async fn search<S: BlogStore>(
    State(state): State<Arc<AppState<S>>>,
) -> ApiResult<Json<Vec<BlogPost>>> {
    Ok(Json(state.blogposts.search().await?))
}

pub(super) async fn get<S: BlogStore>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<BlogPostWithCommentIds>> {
    Ok(Json(state.blogposts.get(id).await?))
}

pub(super) async fn create<S: BlogStore>(
    State(state): State<Arc<AppState<S>>>,
    JsonBadRequest(payload): JsonBadRequest<BlogPostPayload>,
) -> ApiResult<Json<BlogPostWithCommentIds>> {
    Ok(Json(state.blogposts.create(payload).await?))
}

pub(super) async fn bulk_create<S: BlogStore>(
    State(state): State<Arc<AppState<S>>>,
    JsonBadRequest(payloads): JsonBadRequest<Vec<BlogPostPayload>>,
) -> ApiResult<Json<BulkCreateOutcome>> {
    Ok(Json(state.blogposts.bulk_create(payloads).await?))
}

pub(super) async fn bulk_delete<S: BlogStore>(
    State(state): State<Arc<AppState<S>>>,
    JsonBadRequest(ids): JsonBadRequest<Vec<i64>>,
) -> ApiResult<Json<BulkDeleteOutcome>> {
    Ok(Json(state.blogposts.bulk_delete(ids).await?))
}

pub(super) async fn update<S: BlogStore>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(id): ApiPath<i64>,
    JsonBadRequest(payload): JsonBadRequest<BlogPostPayload>,
) -> ApiResult<Json<BlogPostWithCommentIds>> {
    Ok(Json(state.blogposts.update(id, payload).await?))
}

pub(super) async fn delete<S: BlogStore>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<BlogPost>> {
    Ok(Json(state.blogposts.delete(id).await?))
}

/// `POST /blogpost/methods/{method}/`
pub(super) async fn invoke_method<S: BlogStore>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(method): ApiPath<String>,
) -> ApiResult<Json<MethodInvocation>> {
    Ok(Json(
        state.methods.invoke(EntityKind::BlogPost, &method).await?,
    ))
}
