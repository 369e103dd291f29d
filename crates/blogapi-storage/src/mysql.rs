//! MySQL/MariaDB storage implementation.
//!
//! TiDB is also compatible as it uses the MySQL wire protocol.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{MySql, QueryBuilder, Row, Transaction};
use tracing::{debug, instrument};

use crate::error::{timed_query, StorageError, StorageResult};
use crate::traits::{
    BlogPostFields, BlogPostRecord, BlogStore, CommentFields, CommentRecord, PageWindow,
    StoreTransaction,
};

const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;

const BACKEND: &str = "mysql";

/// MySQL configuration options.
#[derive(Clone)]
pub struct MySQLConfig {
    /// Database connection URL.
    pub database_url: String,
    /// Maximum number of connections in the pool.
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    pub min_connections: u32,
    /// Pool acquire timeout in seconds.
    ///
    /// Passed to SQLx's `acquire_timeout()`, so it covers waiting for a free
    /// slot as well as establishing a new connection.
    pub connect_timeout_secs: u64,
    /// Maximum time a single query may run.
    pub query_timeout_secs: u64,
}

// Custom Debug implementation to hide credentials in database_url
impl std::fmt::Debug for MySQLConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySQLConfig")
            .field("database_url", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("query_timeout_secs", &self.query_timeout_secs)
            .finish()
    }
}

impl Default for MySQLConfig {
    fn default() -> Self {
        Self {
            database_url: "mysql://localhost/blogapi".to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 30,
            query_timeout_secs: DEFAULT_QUERY_TIMEOUT_SECS,
        }
    }
}

/// MySQL implementation of [`BlogStore`].
///
/// Supports MySQL 8.0+, MariaDB 10.5+, and TiDB.
///
/// MySQL has no `RETURNING` clause, so inserted ids come from
/// `LAST_INSERT_ID()` on the same connection.
pub struct MySQLBlogStore {
    pool: MySqlPool,
    query_timeout: Duration,
}

impl MySQLBlogStore {
    /// Creates a new MySQL store from a connection pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self {
            pool,
            query_timeout: Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS),
        }
    }

    /// Creates a new MySQL store with the given configuration.
    #[instrument(skip(config))]
    pub async fn from_config(config: &MySQLConfig) -> StorageResult<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(&config.database_url)
            .await
            .map_err(|e| StorageError::ConnectionError {
                message: e.to_string(),
            })?;

        Ok(Self {
            pool,
            query_timeout: Duration::from_secs(config.query_timeout_secs),
        })
    }

    /// Creates a new MySQL store from a database URL.
    pub async fn from_url(database_url: &str) -> StorageResult<Self> {
        let config = MySQLConfig {
            database_url: database_url.to_string(),
            ..Default::default()
        };
        Self::from_config(&config).await
    }

    /// Returns the underlying connection pool.
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// Runs database migrations to create required tables.
    ///
    /// Uses `BIGINT AUTO_INCREMENT` instead of PostgreSQL's `BIGSERIAL` and
    /// declares the comment index inline.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> StorageResult<()> {
        debug!("Running MySQL database migrations");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS blogpost (
                id BIGINT AUTO_INCREMENT PRIMARY KEY,
                title VARCHAR(100) NOT NULL,
                content VARCHAR(100) NOT NULL,
                author_name VARCHAR(100) NOT NULL,
                posted_on DATE NOT NULL,
                image VARCHAR(100) NOT NULL
            ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_unicode_ci
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::QueryError {
            message: format!("Failed to create blogpost table: {e}"),
        })?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS comment (
                id BIGINT AUTO_INCREMENT PRIMARY KEY,
                content VARCHAR(100) NOT NULL,
                author_name VARCHAR(100) NOT NULL,
                posted_on DATE NOT NULL,
                blogpost_id BIGINT NULL,
                INDEX idx_comment_blogpost (blogpost_id),
                CONSTRAINT fk_comment_blogpost FOREIGN KEY (blogpost_id)
                    REFERENCES blogpost(id) ON DELETE SET NULL
            ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_unicode_ci
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::QueryError {
            message: format!("Failed to create comment table: {e}"),
        })?;

        debug!("MySQL database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl BlogStore for MySQLBlogStore {
    async fn begin(&self) -> StorageResult<Box<dyn StoreTransaction>> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::TransactionError {
                message: format!("Failed to begin transaction: {e}"),
            })?;
        Ok(Box::new(MySQLTransaction {
            tx,
            query_timeout: self.query_timeout,
        }))
    }

    async fn health_check(&self) -> StorageResult<()> {
        timed_query(BACKEND, "health_check", self.query_timeout, async {
            sqlx::query("SELECT 1")
                .execute(&self.pool)
                .await
                .map_err(|e| StorageError::from_sqlx("health_check", e))?;
            Ok(())
        })
        .await
    }

    fn backend_name(&self) -> &'static str {
        BACKEND
    }
}

/// Unit of work over a [`MySQLBlogStore`].
pub struct MySQLTransaction {
    tx: Transaction<'static, MySql>,
    query_timeout: Duration,
}

const BLOGPOST_COLUMNS: &str = "id, title, content, author_name, posted_on, image";
const COMMENT_COLUMNS: &str = "id, content, author_name, posted_on, blogpost_id";

fn row_to_blogpost(row: &MySqlRow) -> BlogPostRecord {
    BlogPostRecord {
        id: row.get("id"),
        title: row.get("title"),
        content: row.get("content"),
        author_name: row.get("author_name"),
        timestamp: row.get("posted_on"),
        image: row.get("image"),
    }
}

fn row_to_comment(row: &MySqlRow) -> CommentRecord {
    CommentRecord {
        id: row.get("id"),
        content: row.get("content"),
        author_name: row.get("author_name"),
        timestamp: row.get("posted_on"),
        blogpost_id: row.get("blogpost_id"),
    }
}

fn last_insert_id(result: &sqlx::mysql::MySqlQueryResult) -> StorageResult<i64> {
    i64::try_from(result.last_insert_id()).map_err(|_| StorageError::InternalError {
        message: format!("inserted id {} out of range", result.last_insert_id()),
    })
}

impl MySQLTransaction {
    async fn row_exists(&mut self, operation: &'static str, sql: &str, id: i64) -> StorageResult<bool> {
        let found: Option<i64> = timed_query(BACKEND, operation, self.query_timeout, async {
            sqlx::query_scalar(sql)
                .bind(id)
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(|e| StorageError::from_sqlx(operation, e))
        })
        .await?;
        Ok(found.is_some())
    }

    async fn fetch_window(
        &mut self,
        operation: &'static str,
        table: &str,
        columns: &str,
        window: Option<PageWindow>,
    ) -> StorageResult<Vec<MySqlRow>> {
        let mut builder: QueryBuilder<'_, MySql> =
            QueryBuilder::new(format!("SELECT {columns} FROM {table} ORDER BY id ASC"));
        if let Some(window) = window {
            builder.push(" LIMIT ");
            builder.push_bind(window.limit);
            builder.push(" OFFSET ");
            builder.push_bind(window.skip);
        }
        timed_query(BACKEND, operation, self.query_timeout, async {
            builder
                .build()
                .fetch_all(&mut *self.tx)
                .await
                .map_err(|e| StorageError::from_sqlx(operation, e))
        })
        .await
    }
}

#[async_trait]
impl StoreTransaction for MySQLTransaction {
    async fn get_blogpost(&mut self, id: i64) -> StorageResult<Option<BlogPostRecord>> {
        let sql = format!("SELECT {BLOGPOST_COLUMNS} FROM blogpost WHERE id = ?");
        let row = timed_query(BACKEND, "get_blogpost", self.query_timeout, async {
            sqlx::query(&sql)
                .bind(id)
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(|e| StorageError::from_sqlx("get_blogpost", e))
        })
        .await?;
        Ok(row.as_ref().map(row_to_blogpost))
    }

    async fn list_blogposts(
        &mut self,
        window: Option<PageWindow>,
    ) -> StorageResult<Vec<BlogPostRecord>> {
        let rows = self
            .fetch_window("list_blogposts", "blogpost", BLOGPOST_COLUMNS, window)
            .await?;
        Ok(rows.iter().map(row_to_blogpost).collect())
    }

    async fn count_blogposts(&mut self) -> StorageResult<u64> {
        let count: i64 = timed_query(BACKEND, "count_blogposts", self.query_timeout, async {
            sqlx::query_scalar("SELECT COUNT(*) FROM blogpost")
                .fetch_one(&mut *self.tx)
                .await
                .map_err(|e| StorageError::from_sqlx("count_blogposts", e))
        })
        .await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    #[instrument(skip(self, fields))]
    async fn insert_blogpost(&mut self, fields: &BlogPostFields) -> StorageResult<BlogPostRecord> {
        let result = timed_query(BACKEND, "insert_blogpost", self.query_timeout, async {
            sqlx::query(
                r#"
                INSERT INTO blogpost (title, content, author_name, posted_on, image)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(&fields.title)
            .bind(&fields.content)
            .bind(&fields.author_name)
            .bind(fields.timestamp)
            .bind(&fields.image)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| StorageError::from_sqlx("insert_blogpost", e))
        })
        .await?;
        Ok(fields.clone().into_record(last_insert_id(&result)?))
    }

    async fn update_blogpost(&mut self, id: i64, fields: &BlogPostFields) -> StorageResult<bool> {
        // MySQL reports changed rows, not matched rows, so an update that
        // rewrites identical values would look like a miss.
        if !self
            .row_exists("blogpost_exists", "SELECT id FROM blogpost WHERE id = ?", id)
            .await?
        {
            return Ok(false);
        }
        timed_query(BACKEND, "update_blogpost", self.query_timeout, async {
            sqlx::query(
                r#"
                UPDATE blogpost
                SET title = ?, content = ?, author_name = ?, posted_on = ?, image = ?
                WHERE id = ?
                "#,
            )
            .bind(&fields.title)
            .bind(&fields.content)
            .bind(&fields.author_name)
            .bind(fields.timestamp)
            .bind(&fields.image)
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| StorageError::from_sqlx("update_blogpost", e))
        })
        .await?;
        Ok(true)
    }

    #[instrument(skip(self))]
    async fn delete_blogpost(&mut self, id: i64) -> StorageResult<bool> {
        let result = timed_query(BACKEND, "delete_blogpost", self.query_timeout, async {
            sqlx::query("DELETE FROM blogpost WHERE id = ?")
                .bind(id)
                .execute(&mut *self.tx)
                .await
                .map_err(|e| StorageError::from_sqlx("delete_blogpost", e))
        })
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_comment(&mut self, id: i64) -> StorageResult<Option<CommentRecord>> {
        let sql = format!("SELECT {COMMENT_COLUMNS} FROM comment WHERE id = ?");
        let row = timed_query(BACKEND, "get_comment", self.query_timeout, async {
            sqlx::query(&sql)
                .bind(id)
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(|e| StorageError::from_sqlx("get_comment", e))
        })
        .await?;
        Ok(row.as_ref().map(row_to_comment))
    }

    async fn list_comments(
        &mut self,
        window: Option<PageWindow>,
    ) -> StorageResult<Vec<CommentRecord>> {
        let rows = self
            .fetch_window("list_comments", "comment", COMMENT_COLUMNS, window)
            .await?;
        Ok(rows.iter().map(row_to_comment).collect())
    }

    async fn count_comments(&mut self) -> StorageResult<u64> {
        let count: i64 = timed_query(BACKEND, "count_comments", self.query_timeout, async {
            sqlx::query_scalar("SELECT COUNT(*) FROM comment")
                .fetch_one(&mut *self.tx)
                .await
                .map_err(|e| StorageError::from_sqlx("count_comments", e))
        })
        .await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    #[instrument(skip(self, fields))]
    async fn insert_comment(&mut self, fields: &CommentFields) -> StorageResult<CommentRecord> {
        let result = timed_query(BACKEND, "insert_comment", self.query_timeout, async {
            sqlx::query(
                r#"
                INSERT INTO comment (content, author_name, posted_on, blogpost_id)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(&fields.content)
            .bind(&fields.author_name)
            .bind(fields.timestamp)
            .bind(fields.blogpost_id)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| StorageError::from_sqlx("insert_comment", e))
        })
        .await?;
        Ok(fields.clone().into_record(last_insert_id(&result)?))
    }

    async fn update_comment(&mut self, id: i64, fields: &CommentFields) -> StorageResult<bool> {
        if !self
            .row_exists("comment_exists", "SELECT id FROM comment WHERE id = ?", id)
            .await?
        {
            return Ok(false);
        }
        timed_query(BACKEND, "update_comment", self.query_timeout, async {
            sqlx::query(
                r#"
                UPDATE comment
                SET content = ?, author_name = ?, posted_on = ?, blogpost_id = ?
                WHERE id = ?
                "#,
            )
            .bind(&fields.content)
            .bind(&fields.author_name)
            .bind(fields.timestamp)
            .bind(fields.blogpost_id)
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| StorageError::from_sqlx("update_comment", e))
        })
        .await?;
        Ok(true)
    }

    #[instrument(skip(self))]
    async fn delete_comment(&mut self, id: i64) -> StorageResult<bool> {
        let result = timed_query(BACKEND, "delete_comment", self.query_timeout, async {
            sqlx::query("DELETE FROM comment WHERE id = ?")
                .bind(id)
                .execute(&mut *self.tx)
                .await
                .map_err(|e| StorageError::from_sqlx("delete_comment", e))
        })
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn comments_of_blogpost(
        &mut self,
        blogpost_id: i64,
    ) -> StorageResult<Vec<CommentRecord>> {
        let sql =
            format!("SELECT {COMMENT_COLUMNS} FROM comment WHERE blogpost_id = ? ORDER BY id ASC");
        let rows = timed_query(BACKEND, "comments_of_blogpost", self.query_timeout, async {
            sqlx::query(&sql)
                .bind(blogpost_id)
                .fetch_all(&mut *self.tx)
                .await
                .map_err(|e| StorageError::from_sqlx("comments_of_blogpost", e))
        })
        .await?;
        Ok(rows.iter().map(row_to_comment).collect())
    }

    async fn comment_ids_of_blogpost(&mut self, blogpost_id: i64) -> StorageResult<Vec<i64>> {
        timed_query(BACKEND, "comment_ids_of_blogpost", self.query_timeout, async {
            sqlx::query_scalar("SELECT id FROM comment WHERE blogpost_id = ? ORDER BY id ASC")
                .bind(blogpost_id)
                .fetch_all(&mut *self.tx)
                .await
                .map_err(|e| StorageError::from_sqlx("comment_ids_of_blogpost", e))
        })
        .await
    }

    async fn assign_comments(
        &mut self,
        comment_ids: &[i64],
        blogpost_id: Option<i64>,
    ) -> StorageResult<u64> {
        if comment_ids.is_empty() {
            return Ok(0);
        }
        let mut builder: QueryBuilder<'_, MySql> =
            QueryBuilder::new("UPDATE comment SET blogpost_id = ");
        builder.push_bind(blogpost_id);
        builder.push(" WHERE id IN (");
        let mut separated = builder.separated(", ");
        for id in comment_ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let result = timed_query(BACKEND, "assign_comments", self.query_timeout, async {
            builder
                .build()
                .execute(&mut *self.tx)
                .await
                .map_err(|e| StorageError::from_sqlx("assign_comments", e))
        })
        .await?;
        Ok(result.rows_affected())
    }

    async fn detach_comments(&mut self, blogpost_id: i64) -> StorageResult<u64> {
        let result = timed_query(BACKEND, "detach_comments", self.query_timeout, async {
            sqlx::query("UPDATE comment SET blogpost_id = NULL WHERE blogpost_id = ?")
                .bind(blogpost_id)
                .execute(&mut *self.tx)
                .await
                .map_err(|e| StorageError::from_sqlx("detach_comments", e))
        })
        .await?;
        Ok(result.rows_affected())
    }

    async fn commit(self: Box<Self>) -> StorageResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| StorageError::TransactionError {
                message: format!("Failed to commit transaction: {e}"),
            })
    }

    async fn rollback(self: Box<Self>) -> StorageResult<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| StorageError::TransactionError {
                message: format!("Failed to rollback transaction: {e}"),
            })
    }
}
