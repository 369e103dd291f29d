//! Application state for HTTP handlers.

use std::sync::Arc;

use blogapi_server::handlers::MethodHandler;
use blogapi_server::{BlogPostHandler, CommentHandler, MethodRegistry};
use blogapi_storage::BlogStore;

/// Application state shared across all HTTP handlers.
///
/// Every handler holds its own `Arc` of the same store; units of work are
/// opened per request through [`BlogStore::begin`].
pub struct AppState<S: BlogStore> {
    /// The storage backend.
    pub storage: Arc<S>,
    pub blogposts: BlogPostHandler<S>,
    pub comments: CommentHandler<S>,
    /// Registered entity methods.
    pub methods: MethodHandler<S>,
}

impl<S: BlogStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            blogposts: self.blogposts.clone(),
            comments: self.comments.clone(),
            methods: self.methods.clone(),
        }
    }
}

impl<S: BlogStore> AppState<S> {
    /// Creates a state with no registered methods.
    pub fn new(storage: Arc<S>) -> Self {
        Self::with_methods(storage, MethodRegistry::new())
    }

    /// Creates a state whose method endpoints dispatch to `registry`.
    pub fn with_methods(storage: Arc<S>, registry: MethodRegistry) -> Self {
        Self {
            blogposts: BlogPostHandler::new(Arc::clone(&storage)),
            comments: CommentHandler::new(Arc::clone(&storage)),
            methods: MethodHandler::new(Arc::clone(&storage), Arc::new(registry)),
            storage,
        }
    }
}
