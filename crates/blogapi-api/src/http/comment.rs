//! Comment endpoints.

use std::sync::Arc;

use axum::{extract::State, Json};

use blogapi_server::handlers::{
    BulkCreateOutcome, BulkDeleteOutcome, Comment, CommentEnvelope, CommentListing,
    CommentPayload, CountResponse, EntityKind, MethodInvocation, Page,
};
use blogapi_storage::BlogStore;

use super::blogpost::{ListQuery, PageQuery};
use super::extract::{ApiPath, ApiQuery, JsonBadRequest};
use super::state::AppState;
use crate::errors::ApiResult;

pub(super) async fn list<S: BlogStore>(
    State(state): State<Arc<AppState<S>>>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<Json<CommentListing>> {
    Ok(Json(state.comments.list(query.detailed).await?))
}

pub(super) async fn count<S: BlogStore>(
    State(state): State<Arc<AppState<S>>>,
) -> ApiResult<Json<CountResponse>> {
    Ok(Json(state.comments.count().await?))
}

/// `detailed` is accepted and ignored; comment pages are always bare.
pub(super) async fn paginated<S: BlogStore>(
    State(state): State<Arc<AppState<S>>>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult<Json<Page<Comment>>> {
    let page = state
        .comments
        .paginated(query.skip(), query.limit())
        .await?;
    Ok(Json(page))
}

pub(super) async fn search<S: BlogStore>(
    State(state): State<Arc<AppState<S>>>,
) -> ApiResult<Json<Vec<Comment>>> {
    Ok(Json(state.comments.search().await?))
}

pub(super) async fn get<S: BlogStore>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<CommentEnvelope>> {
    Ok(Json(state.comments.get(id).await?))
}

pub(super) async fn create<S: BlogStore>(
    State(state): State<Arc<AppState<S>>>,
    JsonBadRequest(payload): JsonBadRequest<CommentPayload>,
) -> ApiResult<Json<Comment>> {
    Ok(Json(state.comments.create(payload).await?))
}

pub(super) async fn bulk_create<S: BlogStore>(
    State(state): State<Arc<AppState<S>>>,
    JsonBadRequest(payloads): JsonBadRequest<Vec<CommentPayload>>,
) -> ApiResult<Json<BulkCreateOutcome>> {
    Ok(Json(state.comments.bulk_create(payloads).await?))
}

pub(super) async fn bulk_delete<S: BlogStore>(
    State(state): State<Arc<AppState<S>>>,
    JsonBadRequest(ids): JsonBadRequest<Vec<i64>>,
) -> ApiResult<Json<BulkDeleteOutcome>> {
    Ok(Json(state.comments.bulk_delete(ids).await?))
}

pub(super) async fn update<S: BlogStore>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(id): ApiPath<i64>,
    JsonBadRequest(payload): JsonBadRequest<CommentPayload>,
) -> ApiResult<Json<Comment>> {
    Ok(Json(state.comments.update(id, payload).await?))
}

pub(super) async fn delete<S: BlogStore>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Comment>> {
    Ok(Json(state.comments.delete(id).await?))
}

/// `POST /comment/methods/{method}/`
pub(super) async fn invoke_method<S: BlogStore>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(method): ApiPath<String>,
) -> ApiResult<Json<MethodInvocation>> {
    Ok(Json(state.methods.invoke(EntityKind::Comment, &method).await?))
}
