//! Extractors that reject with the JSON error envelope.
//!
//! Axum's own extractors answer malformed input with plain-text 400/422
//! responses. These wrappers keep the status semantics but always produce an
//! [`ApiError`] body, and report decoding failures as 400.

use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts, Path, Query, Request,
    },
    http::{request::Parts, StatusCode},
    Json,
};
use serde::de::DeserializeOwned;

use crate::errors::ApiError;

/// JSON body extractor that returns 400 Bad Request instead of 422 for
/// deserialization errors.
///
/// Preserves 413 Payload Too Large for body limit errors.
pub struct JsonBadRequest<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBadRequest<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBadRequest(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    // BytesRejection wraps body limit errors
    if matches!(rejection, JsonRejection::BytesRejection(_))
        && rejection.status() == StatusCode::PAYLOAD_TOO_LARGE
    {
        return ApiError::payload_too_large(rejection.body_text());
    }
    ApiError::invalid_input(rejection.body_text())
}

/// Path extractor reporting unparseable segments as 400.
pub struct ApiPath<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<T>::from_request_parts(parts, state)
            .await
            .map(|Path(value)| ApiPath(value))
            .map_err(|rejection: PathRejection| ApiError::invalid_input(rejection.body_text()))
    }
}

/// Query string extractor reporting bad parameters as 400.
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| ApiQuery(value))
            .map_err(|rejection: QueryRejection| ApiError::invalid_input(rejection.body_text()))
    }
}
