//! Comment handler: CRUD, bulk operations and parent validation.

use std::collections::HashMap;
use std::sync::Arc;

use blogapi_storage::{BlogStore, CommentRecord, PageWindow, StoreTransaction};
use tracing::{debug, info, instrument};

use super::error::{HandlerError, HandlerResult};
use super::finish;
use super::types::{
    page_window, BlogPost, BulkCreateOutcome, BulkDeleteOutcome, BulkRowError, Comment,
    CommentEnvelope, CommentListing, CommentPayload, CommentWithParent, CountResponse, Page,
};

const ENTITY: &str = "Comment";

/// Handler for Comment operations.
pub struct CommentHandler<S: BlogStore> {
    store: Arc<S>,
}

impl<S: BlogStore> Clone for CommentHandler<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: BlogStore> CommentHandler<S> {
    /// Creates a new Comment handler.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Lists every comment; `detailed` embeds the parent post (or null).
    pub async fn list(&self, detailed: bool) -> HandlerResult<CommentListing> {
        let mut tx = self.store.begin().await?;
        let result = list_comments(tx.as_mut(), detailed).await;
        finish(tx, result).await
    }

    pub async fn count(&self) -> HandlerResult<CountResponse> {
        let mut tx = self.store.begin().await?;
        let result = tx
            .count_comments()
            .await
            .map(|count| CountResponse { count })
            .map_err(HandlerError::from);
        finish(tx, result).await
    }

    /// Returns one window of comments. Items are always bare records: the
    /// many-to-one side has no id list to attach.
    pub async fn paginated(&self, skip: i64, limit: i64) -> HandlerResult<Page<Comment>> {
        let window = page_window(skip, limit)?;
        let mut tx = self.store.begin().await?;
        let result = page_comments(tx.as_mut(), window).await;
        finish(tx, result).await
    }

    /// Search placeholder: accepts no filters and returns every comment.
    pub async fn search(&self) -> HandlerResult<Vec<Comment>> {
        let mut tx = self.store.begin().await?;
        let result = tx
            .list_comments(None)
            .await
            .map(|rows| rows.into_iter().map(Comment::from).collect())
            .map_err(HandlerError::from);
        finish(tx, result).await
    }

    pub async fn get(&self, id: i64) -> HandlerResult<CommentEnvelope> {
        let mut tx = self.store.begin().await?;
        let result = match tx.get_comment(id).await {
            Ok(Some(record)) => Ok(CommentEnvelope {
                comment: record.into(),
            }),
            Ok(None) => Err(not_found(id)),
            Err(err) => Err(err.into()),
        };
        finish(tx, result).await
    }

    /// Creates a comment under an existing blog post.
    #[instrument(skip(self, payload))]
    pub async fn create(&self, payload: CommentPayload) -> HandlerResult<Comment> {
        payload.validate()?;
        let mut tx = self.store.begin().await?;
        let result = insert_comment(tx.as_mut(), &payload).await;
        let created = finish(tx, result).await?;
        info!(id = created.id, blogpost_id = ?created.blogpost_id, "Created comment");
        Ok(Comment::from(created))
    }

    /// Creates every row in one unit of work, or none of them.
    #[instrument(skip(self, payloads), fields(rows = payloads.len()))]
    pub async fn bulk_create(
        &self,
        payloads: Vec<CommentPayload>,
    ) -> HandlerResult<BulkCreateOutcome> {
        let mut tx = self.store.begin().await?;
        let result = bulk_create_comments(tx.as_mut(), &payloads).await;
        finish(tx, result).await
    }

    /// Deletes every listed id that exists and reports the others.
    #[instrument(skip(self, ids), fields(ids = ids.len()))]
    pub async fn bulk_delete(&self, ids: Vec<i64>) -> HandlerResult<BulkDeleteOutcome> {
        let mut tx = self.store.begin().await?;
        let result = bulk_delete_comments(tx.as_mut(), &ids).await;
        finish(tx, result).await
    }

    /// Overwrites a comment. An omitted `blogpost` keeps the current parent.
    #[instrument(skip(self, payload))]
    pub async fn update(&self, id: i64, payload: CommentPayload) -> HandlerResult<Comment> {
        payload.validate()?;
        let mut tx = self.store.begin().await?;
        let result = update_comment(tx.as_mut(), id, &payload).await;
        finish(tx, result).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> HandlerResult<Comment> {
        let mut tx = self.store.begin().await?;
        let result = match delete_comment(tx.as_mut(), id).await {
            Ok(Some(record)) => Ok(Comment::from(record)),
            Ok(None) => Err(not_found(id)),
            Err(err) => Err(err),
        };
        finish(tx, result).await
    }
}

fn not_found(id: i64) -> HandlerError {
    debug!(id, "Comment not found");
    HandlerError::NotFound { entity: ENTITY, id }
}

async fn list_comments(
    tx: &mut dyn StoreTransaction,
    detailed: bool,
) -> HandlerResult<CommentListing> {
    let rows = tx.list_comments(None).await?;
    if !detailed {
        return Ok(CommentListing::Plain(
            rows.into_iter().map(Comment::from).collect(),
        ));
    }

    // Many comments usually share a parent.
    let mut parents: HashMap<i64, Option<BlogPost>> = HashMap::new();
    let mut comments = Vec::with_capacity(rows.len());
    for record in rows {
        let blogpost = match record.blogpost_id {
            Some(parent_id) => {
                if !parents.contains_key(&parent_id) {
                    let parent = tx.get_blogpost(parent_id).await?.map(BlogPost::from);
                    parents.insert(parent_id, parent);
                }
                parents.get(&parent_id).cloned().flatten()
            }
            None => None,
        };
        comments.push(CommentWithParent {
            comment: Comment::from(record),
            blogpost,
        });
    }
    Ok(CommentListing::Detailed(comments))
}

async fn page_comments(
    tx: &mut dyn StoreTransaction,
    window: PageWindow,
) -> HandlerResult<Page<Comment>> {
    let total = tx.count_comments().await?;
    let rows = tx.list_comments(Some(window)).await?;
    Ok(Page {
        total,
        skip: window.skip,
        limit: window.limit,
        data: rows.into_iter().map(Comment::from).collect(),
    })
}

async fn require_parent(tx: &mut dyn StoreTransaction, blogpost_id: i64) -> HandlerResult<()> {
    if tx.get_blogpost(blogpost_id).await?.is_none() {
        debug!(blogpost_id, "Referenced blog post does not exist");
        return Err(HandlerError::Validation {
            message: "BlogPost not found".to_string(),
        });
    }
    Ok(())
}

async fn insert_comment(
    tx: &mut dyn StoreTransaction,
    payload: &CommentPayload,
) -> HandlerResult<CommentRecord> {
    let Some(blogpost_id) = payload.blogpost else {
        return Err(HandlerError::Validation {
            message: "BlogPost ID is required".to_string(),
        });
    };
    require_parent(tx, blogpost_id).await?;
    Ok(tx.insert_comment(&payload.fields(Some(blogpost_id))).await?)
}

async fn bulk_create_comments(
    tx: &mut dyn StoreTransaction,
    payloads: &[CommentPayload],
) -> HandlerResult<BulkCreateOutcome> {
    let mut created_ids = Vec::with_capacity(payloads.len());
    let mut errors = Vec::new();

    for (index, payload) in payloads.iter().enumerate() {
        let staged = match payload.validate() {
            Ok(()) => insert_comment(tx, payload).await,
            Err(err) => Err(err),
        };
        match staged {
            Ok(record) => created_ids.push(record.id),
            Err(HandlerError::Validation { message }) => {
                errors.push(BulkRowError {
                    index,
                    error: message,
                });
            }
            Err(err @ HandlerError::Conflict { .. }) => {
                errors.push(BulkRowError {
                    index,
                    error: err.to_string(),
                });
                break;
            }
            Err(err) => return Err(err),
        }
    }

    if !errors.is_empty() {
        debug!(failed = errors.len(), "Bulk comment creation rejected");
        return Err(HandlerError::BulkCreate { errors });
    }
    Ok(BulkCreateOutcome::new(ENTITY, created_ids))
}

async fn update_comment(
    tx: &mut dyn StoreTransaction,
    id: i64,
    payload: &CommentPayload,
) -> HandlerResult<Comment> {
    let existing = tx.get_comment(id).await?.ok_or_else(|| not_found(id))?;

    let blogpost_id = match payload.blogpost {
        Some(parent_id) => {
            require_parent(tx, parent_id).await?;
            Some(parent_id)
        }
        None => existing.blogpost_id,
    };

    let fields = payload.fields(blogpost_id);
    tx.update_comment(id, &fields).await?;
    Ok(Comment::from(fields.into_record(id)))
}

async fn delete_comment(
    tx: &mut dyn StoreTransaction,
    id: i64,
) -> HandlerResult<Option<CommentRecord>> {
    let Some(record) = tx.get_comment(id).await? else {
        return Ok(None);
    };
    tx.delete_comment(id).await?;
    Ok(Some(record))
}

async fn bulk_delete_comments(
    tx: &mut dyn StoreTransaction,
    ids: &[i64],
) -> HandlerResult<BulkDeleteOutcome> {
    let mut deleted_count = 0;
    let mut missing = Vec::new();
    for &id in ids {
        match delete_comment(tx, id).await? {
            Some(_) => deleted_count += 1,
            None => missing.push(id),
        }
    }
    Ok(BulkDeleteOutcome::new(ENTITY, deleted_count, missing))
}
