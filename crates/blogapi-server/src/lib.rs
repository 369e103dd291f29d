//! blogapi-server: Request handlers and business logic
//!
//! This crate contains the business logic layer including:
//! - BlogPost handler (CRUD, bulk operations, comment ownership)
//! - Comment handler (CRUD, bulk operations, parent validation)
//! - Method registry for pluggable entity methods
//! - Configuration management
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               blogapi-server                 │
//! ├─────────────────────────────────────────────┤
//! │  config.rs   - Configuration management     │
//! │  handlers/   - Request handlers             │
//! │    blogpost.rs - BlogPost operations        │
//! │    comment.rs  - Comment operations         │
//! │    methods.rs  - Pluggable entity methods   │
//! │    types.rs    - Payloads and views         │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Every handler operation opens exactly one unit of work on the store,
//! commits it on success and rolls it back on every error path.

pub mod config;
pub mod handlers;

// Re-exports for convenience
pub use config::{ConfigLoadError, ServerConfig};
pub use handlers::{BlogPostHandler, CommentHandler, HandlerError, HandlerResult, MethodRegistry};
