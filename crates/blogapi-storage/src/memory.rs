//! In-memory storage implementation for testing and local runs.
//!
//! Tables live behind a single `tokio::sync::Mutex`. A transaction holds the
//! lock for its whole lifetime and works on a private copy of the tables,
//! which replaces the shared state on commit. Units of work are therefore
//! serialized, and a dropped or rolled back transaction leaves no trace.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::instrument;

use crate::error::{StorageError, StorageResult};
use crate::traits::{
    BlogPostFields, BlogPostRecord, BlogStore, CommentFields, CommentRecord, PageWindow,
    StoreTransaction,
};

#[derive(Debug, Clone, Default)]
struct Tables {
    blogposts: BTreeMap<i64, BlogPostRecord>,
    comments: BTreeMap<i64, CommentRecord>,
    last_blogpost_id: i64,
    last_comment_id: i64,
}

impl Tables {
    fn require_blogpost(&self, blogpost_id: Option<i64>) -> StorageResult<()> {
        match blogpost_id {
            Some(id) if !self.blogposts.contains_key(&id) => {
                Err(StorageError::IntegrityViolation {
                    message: format!("comment references missing blogpost {id}"),
                })
            }
            _ => Ok(()),
        }
    }
}

/// In-memory implementation of [`BlogStore`].
///
/// Ids are assigned from per-table counters starting at 1 and are never
/// reused, matching the auto-increment behavior of the SQL backends.
#[derive(Debug, Default, Clone)]
pub struct MemoryBlogStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryBlogStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory store wrapped in Arc.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl BlogStore for MemoryBlogStore {
    async fn begin(&self) -> StorageResult<Box<dyn StoreTransaction>> {
        let guard = Arc::clone(&self.tables).lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTransaction { guard, working }))
    }

    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// Unit of work over a [`MemoryBlogStore`].
pub struct MemoryTransaction {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
}

fn window_of<T: Clone>(rows: impl Iterator<Item = T>, window: Option<PageWindow>) -> Vec<T> {
    match window {
        Some(w) => rows
            .skip(usize::try_from(w.skip).unwrap_or(usize::MAX))
            .take(usize::try_from(w.limit).unwrap_or(usize::MAX))
            .collect(),
        None => rows.collect(),
    }
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn get_blogpost(&mut self, id: i64) -> StorageResult<Option<BlogPostRecord>> {
        Ok(self.working.blogposts.get(&id).cloned())
    }

    async fn list_blogposts(
        &mut self,
        window: Option<PageWindow>,
    ) -> StorageResult<Vec<BlogPostRecord>> {
        Ok(window_of(self.working.blogposts.values().cloned(), window))
    }

    async fn count_blogposts(&mut self) -> StorageResult<u64> {
        Ok(self.working.blogposts.len() as u64)
    }

    #[instrument(skip(self, fields))]
    async fn insert_blogpost(&mut self, fields: &BlogPostFields) -> StorageResult<BlogPostRecord> {
        self.working.last_blogpost_id += 1;
        let record = fields.clone().into_record(self.working.last_blogpost_id);
        self.working.blogposts.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_blogpost(&mut self, id: i64, fields: &BlogPostFields) -> StorageResult<bool> {
        match self.working.blogposts.get_mut(&id) {
            Some(existing) => {
                *existing = fields.clone().into_record(id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    #[instrument(skip(self))]
    async fn delete_blogpost(&mut self, id: i64) -> StorageResult<bool> {
        if self.working.blogposts.remove(&id).is_none() {
            return Ok(false);
        }
        // ON DELETE SET NULL
        for comment in self.working.comments.values_mut() {
            if comment.blogpost_id == Some(id) {
                comment.blogpost_id = None;
            }
        }
        Ok(true)
    }

    async fn get_comment(&mut self, id: i64) -> StorageResult<Option<CommentRecord>> {
        Ok(self.working.comments.get(&id).cloned())
    }

    async fn list_comments(
        &mut self,
        window: Option<PageWindow>,
    ) -> StorageResult<Vec<CommentRecord>> {
        Ok(window_of(self.working.comments.values().cloned(), window))
    }

    async fn count_comments(&mut self) -> StorageResult<u64> {
        Ok(self.working.comments.len() as u64)
    }

    #[instrument(skip(self, fields))]
    async fn insert_comment(&mut self, fields: &CommentFields) -> StorageResult<CommentRecord> {
        self.working.require_blogpost(fields.blogpost_id)?;
        self.working.last_comment_id += 1;
        let record = fields.clone().into_record(self.working.last_comment_id);
        self.working.comments.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_comment(&mut self, id: i64, fields: &CommentFields) -> StorageResult<bool> {
        if !self.working.comments.contains_key(&id) {
            return Ok(false);
        }
        self.working.require_blogpost(fields.blogpost_id)?;
        self.working
            .comments
            .insert(id, fields.clone().into_record(id));
        Ok(true)
    }

    #[instrument(skip(self))]
    async fn delete_comment(&mut self, id: i64) -> StorageResult<bool> {
        Ok(self.working.comments.remove(&id).is_some())
    }

    async fn comments_of_blogpost(
        &mut self,
        blogpost_id: i64,
    ) -> StorageResult<Vec<CommentRecord>> {
        Ok(self
            .working
            .comments
            .values()
            .filter(|c| c.blogpost_id == Some(blogpost_id))
            .cloned()
            .collect())
    }

    async fn comment_ids_of_blogpost(&mut self, blogpost_id: i64) -> StorageResult<Vec<i64>> {
        Ok(self
            .working
            .comments
            .values()
            .filter(|c| c.blogpost_id == Some(blogpost_id))
            .map(|c| c.id)
            .collect())
    }

    async fn assign_comments(
        &mut self,
        comment_ids: &[i64],
        blogpost_id: Option<i64>,
    ) -> StorageResult<u64> {
        self.working.require_blogpost(blogpost_id)?;
        let mut changed = 0;
        for id in comment_ids {
            if let Some(comment) = self.working.comments.get_mut(id) {
                comment.blogpost_id = blogpost_id;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn detach_comments(&mut self, blogpost_id: i64) -> StorageResult<u64> {
        let mut changed = 0;
        for comment in self.working.comments.values_mut() {
            if comment.blogpost_id == Some(blogpost_id) {
                comment.blogpost_id = None;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn commit(self: Box<Self>) -> StorageResult<()> {
        let MemoryTransaction { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StorageResult<()> {
        Ok(())
    }
}
