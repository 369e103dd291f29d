//! BlogStore and StoreTransaction trait definitions.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::StorageResult;

/// A stored blog post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlogPostRecord {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author_name: String,
    pub timestamp: NaiveDate,
    pub image: String,
}

/// Scalar fields of a blog post, as written on insert and full update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlogPostFields {
    pub title: String,
    pub content: String,
    pub author_name: String,
    pub timestamp: NaiveDate,
    pub image: String,
}

impl BlogPostFields {
    /// Builds the record stored under `id`.
    pub fn into_record(self, id: i64) -> BlogPostRecord {
        BlogPostRecord {
            id,
            title: self.title,
            content: self.content,
            author_name: self.author_name,
            timestamp: self.timestamp,
            image: self.image,
        }
    }
}

/// A stored comment.
///
/// `blogpost_id` is `None` once the comment has been detached from its post
/// (post update with a new comment list, or post deletion).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRecord {
    pub id: i64,
    pub content: String,
    pub author_name: String,
    pub timestamp: NaiveDate,
    pub blogpost_id: Option<i64>,
}

/// Fields of a comment, as written on insert and full update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentFields {
    pub content: String,
    pub author_name: String,
    pub timestamp: NaiveDate,
    pub blogpost_id: Option<i64>,
}

impl CommentFields {
    /// Builds the record stored under `id`.
    pub fn into_record(self, id: i64) -> CommentRecord {
        CommentRecord {
            id,
            content: self.content,
            author_name: self.author_name,
            timestamp: self.timestamp,
            blogpost_id: self.blogpost_id,
        }
    }
}

/// Offset/limit window over records ordered by id ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub skip: u64,
    pub limit: u64,
}

impl PageWindow {
    pub fn new(skip: u64, limit: u64) -> Self {
        Self { skip, limit }
    }
}

/// Abstract storage interface for blog data.
///
/// Implementations must be thread-safe (Send + Sync). All reads and writes go
/// through a [`StoreTransaction`] obtained from [`BlogStore::begin`].
#[async_trait]
pub trait BlogStore: Send + Sync + 'static {
    /// Opens a new unit of work.
    ///
    /// The returned transaction must be finished with `commit` or `rollback`.
    /// Dropping it without committing discards every change made through it.
    async fn begin(&self) -> StorageResult<Box<dyn StoreTransaction>>;

    /// Verifies the backend can serve queries.
    async fn health_check(&self) -> StorageResult<()>;

    /// Short backend name used in logs ("memory", "postgres", "mysql").
    fn backend_name(&self) -> &'static str;
}

/// Queries executed inside one unit of work.
///
/// Every list operation returns rows ordered by id ascending.
#[async_trait]
pub trait StoreTransaction: Send {
    // BlogPost operations

    /// Gets a blog post by id.
    async fn get_blogpost(&mut self, id: i64) -> StorageResult<Option<BlogPostRecord>>;

    /// Lists blog posts, optionally restricted to a window.
    async fn list_blogposts(
        &mut self,
        window: Option<PageWindow>,
    ) -> StorageResult<Vec<BlogPostRecord>>;

    /// Counts all blog posts.
    async fn count_blogposts(&mut self) -> StorageResult<u64>;

    /// Inserts a blog post and returns it with its assigned id.
    async fn insert_blogpost(&mut self, fields: &BlogPostFields) -> StorageResult<BlogPostRecord>;

    /// Overwrites every scalar field. Returns false if the id does not exist.
    async fn update_blogpost(&mut self, id: i64, fields: &BlogPostFields) -> StorageResult<bool>;

    /// Deletes a blog post. Returns false if the id does not exist.
    async fn delete_blogpost(&mut self, id: i64) -> StorageResult<bool>;

    // Comment operations

    /// Gets a comment by id.
    async fn get_comment(&mut self, id: i64) -> StorageResult<Option<CommentRecord>>;

    /// Lists comments, optionally restricted to a window.
    async fn list_comments(&mut self, window: Option<PageWindow>)
        -> StorageResult<Vec<CommentRecord>>;

    /// Counts all comments.
    async fn count_comments(&mut self) -> StorageResult<u64>;

    /// Inserts a comment and returns it with its assigned id.
    async fn insert_comment(&mut self, fields: &CommentFields) -> StorageResult<CommentRecord>;

    /// Overwrites every field. Returns false if the id does not exist.
    async fn update_comment(&mut self, id: i64, fields: &CommentFields) -> StorageResult<bool>;

    /// Deletes a comment. Returns false if the id does not exist.
    async fn delete_comment(&mut self, id: i64) -> StorageResult<bool>;

    // Relationship operations

    /// Lists the comments whose foreign key points at `blogpost_id`.
    async fn comments_of_blogpost(&mut self, blogpost_id: i64)
        -> StorageResult<Vec<CommentRecord>>;

    /// Lists the ids of the comments whose foreign key points at `blogpost_id`.
    async fn comment_ids_of_blogpost(&mut self, blogpost_id: i64) -> StorageResult<Vec<i64>>;

    /// Sets the foreign key of every comment in `comment_ids` to `blogpost_id`
    /// in one bulk update. Returns the number of rows changed.
    async fn assign_comments(
        &mut self,
        comment_ids: &[i64],
        blogpost_id: Option<i64>,
    ) -> StorageResult<u64>;

    /// Sets the foreign key of every comment of `blogpost_id` to null.
    /// Returns the number of rows changed.
    async fn detach_comments(&mut self, blogpost_id: i64) -> StorageResult<u64>;

    // Transaction control

    /// Makes every change of this unit of work durable.
    async fn commit(self: Box<Self>) -> StorageResult<()>;

    /// Discards every change of this unit of work.
    async fn rollback(self: Box<Self>) -> StorageResult<()>;
}
