//! Payloads, views and result types for the entity handlers.
//!
//! Field names on the wire follow the public JSON contract (`authorName`,
//! `hasComments`, `hasComments_ids`), so the serde attributes here are the
//! single place that contract is written down.

use blogapi_storage::{
    BlogPostFields, BlogPostRecord, CommentFields, CommentRecord, NaiveDate, PageWindow,
};
use serde::{Deserialize, Serialize};

use super::error::{HandlerError, HandlerResult};

/// Maximum length of every string field, in characters.
pub const MAX_TEXT_LENGTH: usize = 100;

/// Page size used when the client does not send `limit`.
pub const DEFAULT_PAGE_LIMIT: i64 = 100;

fn check_length(field: &str, value: &str) -> HandlerResult<()> {
    let len = value.chars().count();
    if len > MAX_TEXT_LENGTH {
        return Err(HandlerError::Validation {
            message: format!(
                "{field} must be at most {MAX_TEXT_LENGTH} characters (got {len})"
            ),
        });
    }
    Ok(())
}

/// Validates a client-supplied window and converts it to a storage window.
pub fn page_window(skip: i64, limit: i64) -> HandlerResult<PageWindow> {
    if skip < 0 {
        return Err(HandlerError::Validation {
            message: format!("skip must be non-negative, got {skip}"),
        });
    }
    if limit < 0 {
        return Err(HandlerError::Validation {
            message: format!("limit must be non-negative, got {limit}"),
        });
    }
    Ok(PageWindow::new(skip.unsigned_abs(), limit.unsigned_abs()))
}

// ============================================================
// Request payloads
// ============================================================

/// Create/update payload for a blog post.
///
/// `has_comments` distinguishes "absent" (`None`, relationships untouched on
/// update) from "present but empty" (`Some(vec![])`, every comment orphaned).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BlogPostPayload {
    pub title: String,
    pub content: String,
    #[serde(rename = "authorName")]
    pub author_name: String,
    pub timestamp: NaiveDate,
    pub image: String,
    #[serde(rename = "hasComments", default)]
    pub has_comments: Option<Vec<i64>>,
}

impl BlogPostPayload {
    pub fn validate(&self) -> HandlerResult<()> {
        check_length("title", &self.title)?;
        check_length("content", &self.content)?;
        check_length("authorName", &self.author_name)?;
        check_length("image", &self.image)
    }

    pub fn fields(&self) -> BlogPostFields {
        BlogPostFields {
            title: self.title.clone(),
            content: self.content.clone(),
            author_name: self.author_name.clone(),
            timestamp: self.timestamp,
            image: self.image.clone(),
        }
    }
}

/// Create/update payload for a comment. `blogpost` is the parent post id.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CommentPayload {
    pub content: String,
    #[serde(rename = "authorName")]
    pub author_name: String,
    pub timestamp: NaiveDate,
    #[serde(default)]
    pub blogpost: Option<i64>,
}

impl CommentPayload {
    pub fn validate(&self) -> HandlerResult<()> {
        check_length("content", &self.content)?;
        check_length("authorName", &self.author_name)
    }

    pub fn fields(&self, blogpost_id: Option<i64>) -> CommentFields {
        CommentFields {
            content: self.content.clone(),
            author_name: self.author_name.clone(),
            timestamp: self.timestamp,
            blogpost_id,
        }
    }
}

// ============================================================
// Views
// ============================================================

/// Flat JSON view of a blog post.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlogPost {
    pub id: i64,
    pub title: String,
    pub content: String,
    #[serde(rename = "authorName")]
    pub author_name: String,
    pub timestamp: NaiveDate,
    pub image: String,
}

impl From<BlogPostRecord> for BlogPost {
    fn from(record: BlogPostRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            content: record.content,
            author_name: record.author_name,
            timestamp: record.timestamp,
            image: record.image,
        }
    }
}

/// Flat JSON view of a comment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comment {
    pub id: i64,
    pub content: String,
    #[serde(rename = "authorName")]
    pub author_name: String,
    pub timestamp: NaiveDate,
    pub blogpost_id: Option<i64>,
}

impl From<CommentRecord> for Comment {
    fn from(record: CommentRecord) -> Self {
        Self {
            id: record.id,
            content: record.content,
            author_name: record.author_name,
            timestamp: record.timestamp,
            blogpost_id: record.blogpost_id,
        }
    }
}

/// A blog post with the ids of its comments.
///
/// Returned by get, create and update, and used for detailed pagination items.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlogPostWithCommentIds {
    pub blogpost: BlogPost,
    #[serde(rename = "hasComments_ids")]
    pub comment_ids: Vec<i64>,
}

/// A blog post with its comments embedded (detailed list mode).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlogPostWithComments {
    #[serde(flatten)]
    pub blogpost: BlogPost,
    #[serde(rename = "hasComments")]
    pub comments: Vec<Comment>,
}

/// A comment with its parent post embedded (detailed list mode).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentWithParent {
    #[serde(flatten)]
    pub comment: Comment,
    pub blogpost: Option<BlogPost>,
}

/// Envelope for a single comment lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentEnvelope {
    pub comment: Comment,
}

/// Result of a blog post list, plain or detailed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BlogPostListing {
    Plain(Vec<BlogPost>),
    Detailed(Vec<BlogPostWithComments>),
}

/// Result of a comment list, plain or detailed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CommentListing {
    Plain(Vec<Comment>),
    Detailed(Vec<CommentWithParent>),
}

/// Item of a blog post page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BlogPostPageItem {
    Plain(BlogPost),
    Detailed(BlogPostWithCommentIds),
}

/// One window of an id-ordered listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub total: u64,
    pub skip: u64,
    pub limit: u64,
    pub data: Vec<T>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CountResponse {
    pub count: u64,
}

/// Entity counts across both tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub comment_count: u64,
    pub blogpost_count: u64,
    pub total_entities: u64,
}

// ============================================================
// Bulk results
// ============================================================

/// A rejected row of a bulk create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkRowError {
    pub index: usize,
    pub error: String,
}

/// Successful bulk create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkCreateOutcome {
    pub created_count: usize,
    pub created_ids: Vec<i64>,
    pub message: String,
}

impl BulkCreateOutcome {
    pub(crate) fn new(entity: &str, created_ids: Vec<i64>) -> Self {
        Self {
            created_count: created_ids.len(),
            message: format!(
                "Successfully created {} {entity} entities",
                created_ids.len()
            ),
            created_ids,
        }
    }
}

/// Bulk delete result. Deletions of existing ids are kept even when some ids
/// were missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkDeleteOutcome {
    pub deleted_count: usize,
    pub not_found: Vec<i64>,
    pub message: String,
}

impl BulkDeleteOutcome {
    pub(crate) fn new(entity: &str, deleted_count: usize, not_found: Vec<i64>) -> Self {
        Self {
            deleted_count,
            not_found,
            message: format!("Successfully deleted {deleted_count} {entity} entities"),
        }
    }
}
