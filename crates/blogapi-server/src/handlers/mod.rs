//! Entity handlers.
//!
//! Each public handler operation follows the same shape: open one unit of
//! work with [`BlogStore::begin`], run the operation body against the
//! [`StoreTransaction`], then [`finish`] it, committing on success and
//! rolling back on any error.

mod blogpost;
mod comment;
mod error;
mod methods;
mod types;

use blogapi_storage::{BlogStore, StoreTransaction};
use tracing::error;

pub use blogpost::BlogPostHandler;
pub use comment::CommentHandler;
pub use error::{HandlerError, HandlerResult};
pub use methods::{
    EntityKind, EntityMethod, MethodError, MethodHandler, MethodInvocation, MethodOutcome,
    MethodRegistry, MethodValue,
};
pub use types::{
    page_window, BlogPost, BlogPostListing, BlogPostPageItem, BlogPostPayload,
    BlogPostWithCommentIds, BlogPostWithComments, BulkCreateOutcome, BulkDeleteOutcome,
    BulkRowError, Comment, CommentEnvelope, CommentListing, CommentPayload, CommentWithParent,
    CountResponse, Page, Statistics, DEFAULT_PAGE_LIMIT, MAX_TEXT_LENGTH,
};

/// Commits `tx` if `result` is Ok, rolls it back otherwise.
///
/// A failed rollback is logged and the original error is returned; the
/// driver discards the transaction when the connection is released.
pub(crate) async fn finish<T>(
    tx: Box<dyn StoreTransaction>,
    result: HandlerResult<T>,
) -> HandlerResult<T> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                error!(error = %rollback_err, "Failed to roll back transaction");
            }
            Err(err)
        }
    }
}

/// Counts both entity tables in one unit of work.
pub async fn statistics<S: BlogStore>(store: &S) -> HandlerResult<Statistics> {
    let mut tx = store.begin().await?;
    let result = count_entities(tx.as_mut()).await;
    finish(tx, result).await
}

async fn count_entities(tx: &mut dyn StoreTransaction) -> HandlerResult<Statistics> {
    let comment_count = tx.count_comments().await?;
    let blogpost_count = tx.count_blogposts().await?;
    Ok(Statistics {
        comment_count,
        blogpost_count,
        total_entities: comment_count + blogpost_count,
    })
}
