//! BlogPost handler: CRUD, bulk operations and comment ownership.

use std::sync::Arc;

use blogapi_storage::{BlogPostRecord, BlogStore, PageWindow, StoreTransaction};
use tracing::{debug, info, instrument};

use super::error::{HandlerError, HandlerResult};
use super::finish;
use super::types::{
    page_window, BlogPost, BlogPostListing, BlogPostPageItem, BlogPostPayload,
    BlogPostWithCommentIds, BlogPostWithComments, BulkCreateOutcome, BulkDeleteOutcome,
    BulkRowError, CountResponse, Page,
};

const ENTITY: &str = "BlogPost";

/// Handler for BlogPost operations.
///
/// Besides plain CRUD, it owns the one-to-many relationship: create and
/// update repoint the listed comments at the post, update and delete clear
/// the foreign key of comments the post no longer owns.
pub struct BlogPostHandler<S: BlogStore> {
    store: Arc<S>,
}

impl<S: BlogStore> Clone for BlogPostHandler<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: BlogStore> BlogPostHandler<S> {
    /// Creates a new BlogPost handler.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Lists every blog post; `detailed` embeds each post's comments.
    pub async fn list(&self, detailed: bool) -> HandlerResult<BlogPostListing> {
        let mut tx = self.store.begin().await?;
        let result = list_blogposts(tx.as_mut(), detailed).await;
        finish(tx, result).await
    }

    /// Counts blog posts.
    pub async fn count(&self) -> HandlerResult<CountResponse> {
        let mut tx = self.store.begin().await?;
        let result = tx
            .count_blogposts()
            .await
            .map(|count| CountResponse { count })
            .map_err(HandlerError::from);
        finish(tx, result).await
    }

    /// Returns one window of blog posts; `detailed` attaches comment ids only.
    pub async fn paginated(
        &self,
        skip: i64,
        limit: i64,
        detailed: bool,
    ) -> HandlerResult<Page<BlogPostPageItem>> {
        let window = page_window(skip, limit)?;
        let mut tx = self.store.begin().await?;
        let result = page_blogposts(tx.as_mut(), window, detailed).await;
        finish(tx, result).await
    }

    /// Search placeholder: accepts no filters and returns every blog post.
    pub async fn search(&self) -> HandlerResult<Vec<BlogPost>> {
        let mut tx = self.store.begin().await?;
        let result = tx
            .list_blogposts(None)
            .await
            .map(|rows| rows.into_iter().map(BlogPost::from).collect())
            .map_err(HandlerError::from);
        finish(tx, result).await
    }

    /// Gets one blog post with the ids of its comments.
    pub async fn get(&self, id: i64) -> HandlerResult<BlogPostWithCommentIds> {
        let mut tx = self.store.begin().await?;
        let result = get_blogpost(tx.as_mut(), id).await;
        finish(tx, result).await
    }

    /// Creates a blog post and takes ownership of the listed comments.
    #[instrument(skip(self, payload))]
    pub async fn create(&self, payload: BlogPostPayload) -> HandlerResult<BlogPostWithCommentIds> {
        payload.validate()?;
        let mut tx = self.store.begin().await?;
        let result = create_blogpost(tx.as_mut(), &payload).await;
        let created = finish(tx, result).await?;
        info!(id = created.blogpost.id, "Created blog post");
        Ok(created)
    }

    /// Creates every row in one unit of work, or none of them.
    ///
    /// All rows are checked before giving up so the error lists every bad
    /// row, except after a storage constraint failure, which poisons the
    /// transaction on SQL backends and stops the loop.
    #[instrument(skip(self, payloads), fields(rows = payloads.len()))]
    pub async fn bulk_create(
        &self,
        payloads: Vec<BlogPostPayload>,
    ) -> HandlerResult<BulkCreateOutcome> {
        let mut tx = self.store.begin().await?;
        let result = bulk_create_blogposts(tx.as_mut(), &payloads).await;
        finish(tx, result).await
    }

    /// Deletes every listed id that exists and reports the others.
    ///
    /// Unlike bulk create this always commits what it deleted.
    #[instrument(skip(self, ids), fields(ids = ids.len()))]
    pub async fn bulk_delete(&self, ids: Vec<i64>) -> HandlerResult<BulkDeleteOutcome> {
        let mut tx = self.store.begin().await?;
        let result = bulk_delete_blogposts(tx.as_mut(), &ids).await;
        finish(tx, result).await
    }

    /// Overwrites a blog post; a present `hasComments` replaces its comment set.
    #[instrument(skip(self, payload))]
    pub async fn update(
        &self,
        id: i64,
        payload: BlogPostPayload,
    ) -> HandlerResult<BlogPostWithCommentIds> {
        payload.validate()?;
        let mut tx = self.store.begin().await?;
        let result = update_blogpost(tx.as_mut(), id, &payload).await;
        finish(tx, result).await
    }

    /// Deletes a blog post, orphaning its comments.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> HandlerResult<BlogPost> {
        let mut tx = self.store.begin().await?;
        let result = match delete_blogpost(tx.as_mut(), id).await {
            Ok(Some(record)) => Ok(BlogPost::from(record)),
            Ok(None) => Err(not_found(id)),
            Err(err) => Err(err),
        };
        finish(tx, result).await
    }
}

fn not_found(id: i64) -> HandlerError {
    debug!(id, "BlogPost not found");
    HandlerError::NotFound { entity: ENTITY, id }
}

async fn with_comment_ids(
    tx: &mut dyn StoreTransaction,
    record: BlogPostRecord,
) -> HandlerResult<BlogPostWithCommentIds> {
    let comment_ids = tx.comment_ids_of_blogpost(record.id).await?;
    Ok(BlogPostWithCommentIds {
        blogpost: BlogPost::from(record),
        comment_ids,
    })
}

async fn list_blogposts(
    tx: &mut dyn StoreTransaction,
    detailed: bool,
) -> HandlerResult<BlogPostListing> {
    let rows = tx.list_blogposts(None).await?;
    if !detailed {
        return Ok(BlogPostListing::Plain(
            rows.into_iter().map(BlogPost::from).collect(),
        ));
    }

    let mut posts = Vec::with_capacity(rows.len());
    for record in rows {
        let comments = tx.comments_of_blogpost(record.id).await?;
        posts.push(BlogPostWithComments {
            blogpost: BlogPost::from(record),
            comments: comments.into_iter().map(Into::into).collect(),
        });
    }
    Ok(BlogPostListing::Detailed(posts))
}

async fn page_blogposts(
    tx: &mut dyn StoreTransaction,
    window: PageWindow,
    detailed: bool,
) -> HandlerResult<Page<BlogPostPageItem>> {
    let total = tx.count_blogposts().await?;
    let rows = tx.list_blogposts(Some(window)).await?;

    let mut data = Vec::with_capacity(rows.len());
    for record in rows {
        let item = if detailed {
            BlogPostPageItem::Detailed(with_comment_ids(tx, record).await?)
        } else {
            BlogPostPageItem::Plain(BlogPost::from(record))
        };
        data.push(item);
    }

    Ok(Page {
        total,
        skip: window.skip,
        limit: window.limit,
        data,
    })
}

async fn get_blogpost(
    tx: &mut dyn StoreTransaction,
    id: i64,
) -> HandlerResult<BlogPostWithCommentIds> {
    let record = tx.get_blogpost(id).await?.ok_or_else(|| not_found(id))?;
    with_comment_ids(tx, record).await
}

/// Checks that every listed comment exists, then repoints them all at
/// `blogpost_id` in one bulk update.
async fn adopt_comments(
    tx: &mut dyn StoreTransaction,
    blogpost_id: i64,
    comment_ids: &[i64],
) -> HandlerResult<()> {
    if comment_ids.is_empty() {
        return Ok(());
    }
    for &comment_id in comment_ids {
        if tx.get_comment(comment_id).await?.is_none() {
            debug!(comment_id, "Referenced comment does not exist");
            return Err(HandlerError::Validation {
                message: format!("Comment with id {comment_id} not found"),
            });
        }
    }
    tx.assign_comments(comment_ids, Some(blogpost_id)).await?;
    Ok(())
}

async fn insert_blogpost(
    tx: &mut dyn StoreTransaction,
    payload: &BlogPostPayload,
) -> HandlerResult<BlogPostRecord> {
    let record = tx.insert_blogpost(&payload.fields()).await?;
    if let Some(comment_ids) = &payload.has_comments {
        adopt_comments(tx, record.id, comment_ids).await?;
    }
    Ok(record)
}

async fn create_blogpost(
    tx: &mut dyn StoreTransaction,
    payload: &BlogPostPayload,
) -> HandlerResult<BlogPostWithCommentIds> {
    let record = insert_blogpost(tx, payload).await?;
    with_comment_ids(tx, record).await
}

async fn bulk_create_blogposts(
    tx: &mut dyn StoreTransaction,
    payloads: &[BlogPostPayload],
) -> HandlerResult<BulkCreateOutcome> {
    let mut created_ids = Vec::with_capacity(payloads.len());
    let mut errors = Vec::new();

    for (index, payload) in payloads.iter().enumerate() {
        let staged = match payload.validate() {
            Ok(()) => insert_blogpost(tx, payload).await,
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
        debug!(failed = errors.len(), "Bulk blog post creation rejected");
        return Err(HandlerError::BulkCreate { errors });
    }
    Ok(BulkCreateOutcome::new(ENTITY, created_ids))
}

async fn delete_blogpost(
    tx: &mut dyn StoreTransaction,
    id: i64,
) -> HandlerResult<Option<BlogPostRecord>> {
    let Some(record) = tx.get_blogpost(id).await? else {
        return Ok(None);
    };
    let orphaned = tx.detach_comments(id).await?;
    tx.delete_blogpost(id).await?;
    debug!(id, orphaned, "Deleted blog post");
    Ok(Some(record))
}

async fn bulk_delete_blogposts(
    tx: &mut dyn StoreTransaction,
    ids: &[i64],
) -> HandlerResult<BulkDeleteOutcome> {
    let mut deleted_count = 0;
    let mut missing = Vec::new();
    for &id in ids {
        match delete_blogpost(tx, id).await? {
            Some(_) => deleted_count += 1,
            None => missing.push(id),
        }
    }
    Ok(BulkDeleteOutcome::new(ENTITY, deleted_count, missing))
}

async fn update_blogpost(
    tx: &mut dyn StoreTransaction,
    id: i64,
    payload: &BlogPostPayload,
) -> HandlerResult<BlogPostWithCommentIds> {
    if !tx.update_blogpost(id, &payload.fields()).await? {
        return Err(not_found(id));
    }

    if let Some(comment_ids) = &payload.has_comments {
        let released = tx.detach_comments(id).await?;
        debug!(id, released, "Released previous comments");
        adopt_comments(tx, id, comment_ids).await?;
    }

    let record = payload.fields().into_record(id);
    with_comment_ids(tx, record).await
}
