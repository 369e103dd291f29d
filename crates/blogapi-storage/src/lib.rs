//! blogapi-storage: Storage abstraction layer
//!
//! This crate provides the storage abstraction for the blog API, including:
//! - `BlogStore` trait for scoped transaction acquisition
//! - `StoreTransaction` trait for the queries executed inside one unit of work
//! - In-memory implementation for testing and local runs
//! - PostgreSQL and MySQL implementations for production
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              blogapi-storage                 │
//! ├─────────────────────────────────────────────┤
//! │  traits.rs   - BlogStore / StoreTransaction │
//! │  memory.rs   - In-memory implementation     │
//! │  postgres.rs - PostgreSQL implementation    │
//! │  mysql.rs    - MySQL implementation         │
//! └─────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod memory;
pub mod mysql;
pub mod postgres;
pub mod traits;

// Re-export commonly used types
pub use chrono::NaiveDate;
pub use error::{StorageError, StorageResult};
pub use memory::MemoryBlogStore;
pub use mysql::{MySQLBlogStore, MySQLConfig};
pub use postgres::{PostgresBlogStore, PostgresConfig};
pub use traits::{
    BlogPostFields, BlogPostRecord, BlogStore, CommentFields, CommentRecord, PageWindow,
    StoreTransaction,
};
