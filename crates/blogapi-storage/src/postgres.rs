//! PostgreSQL storage implementation.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, Row, Transaction};
use tracing::{debug, instrument};

use crate::error::{timed_query, StorageError, StorageResult};
use crate::traits::{
    BlogPostFields, BlogPostRecord, BlogStore, CommentFields, CommentRecord, PageWindow,
    StoreTransaction,
};

/// Default query timeout in seconds.
const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;

const BACKEND: &str = "postgres";

/// PostgreSQL configuration options.
#[derive(Clone)]
pub struct PostgresConfig {
    /// Database connection URL.
    pub database_url: String,
    /// Maximum number of connections in the pool.
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    pub min_connections: u32,
    /// Connection timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Maximum time a single query may run before it fails with
    /// `StorageError::QueryTimeout`.
    pub query_timeout_secs: u64,
}

// Custom Debug implementation to hide credentials in database_url
impl std::fmt::Debug for PostgresConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresConfig")
            .field("database_url", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("query_timeout_secs", &self.query_timeout_secs)
            .finish()
    }
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: "postgres://localhost/blogapi".to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 30,
            query_timeout_secs: DEFAULT_QUERY_TIMEOUT_SECS,
        }
    }
}

/// PostgreSQL implementation of [`BlogStore`].
pub struct PostgresBlogStore {
    pool: PgPool,
    query_timeout: Duration,
}

impl PostgresBlogStore {
    /// Creates a new PostgreSQL store from a connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            query_timeout: Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS),
        }
    }

    /// Creates a new PostgreSQL store with the given configuration.
    #[instrument(skip(config))]
    pub async fn from_config(config: &PostgresConfig) -> StorageResult<Self> {
        let pool = PgPoolOptions::new()
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

    /// Creates a new PostgreSQL store from a database URL.
    pub async fn from_url(database_url: &str) -> StorageResult<Self> {
        let config = PostgresConfig {
            database_url: database_url.to_string(),
            ..Default::default()
        };
        Self::from_config(&config).await
    }

    /// Returns the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs database migrations to create required tables.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> StorageResult<()> {
        debug!("Running database migrations");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS blogpost (
                id BIGSERIAL PRIMARY KEY,
                title VARCHAR(100) NOT NULL,
                content VARCHAR(100) NOT NULL,
                author_name VARCHAR(100) NOT NULL,
                posted_on DATE NOT NULL,
                image VARCHAR(100) NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::QueryError {
            message: format!("Failed to create blogpost table: {e}"),
        })?;

        // Comments outlive their post: deleting a post only clears the key.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS comment (
                id BIGSERIAL PRIMARY KEY,
                content VARCHAR(100) NOT NULL,
                author_name VARCHAR(100) NOT NULL,
                posted_on DATE NOT NULL,
                blogpost_id BIGINT NULL,
                FOREIGN KEY (blogpost_id) REFERENCES blogpost(id) ON DELETE SET NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::QueryError {
            message: format!("Failed to create comment table: {e}"),
        })?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_comment_blogpost ON comment (blogpost_id)")
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::QueryError {
                message: format!("Failed to create comment index: {e}"),
            })?;

        debug!("Database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl BlogStore for PostgresBlogStore {
    async fn begin(&self) -> StorageResult<Box<dyn StoreTransaction>> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::TransactionError {
                message: format!("Failed to begin transaction: {e}"),
            })?;
        Ok(Box::new(PostgresTransaction {
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

/// Unit of work over a [`PostgresBlogStore`].
pub struct PostgresTransaction {
    tx: Transaction<'static, Postgres>,
    query_timeout: Duration,
}

const BLOGPOST_COLUMNS: &str = "id, title, content, author_name, posted_on, image";
const COMMENT_COLUMNS: &str = "id, content, author_name, posted_on, blogpost_id";

fn row_to_blogpost(row: &PgRow) -> BlogPostRecord {
    BlogPostRecord {
        id: row.get("id"),
        title: row.get("title"),
        content: row.get("content"),
        author_name: row.get("author_name"),
        timestamp: row.get("posted_on"),
        image: row.get("image"),
    }
}

fn row_to_comment(row: &PgRow) -> CommentRecord {
    CommentRecord {
        id: row.get("id"),
        content: row.get("content"),
        author_name: row.get("author_name"),
        timestamp: row.get("posted_on"),
        blogpost_id: row.get("blogpost_id"),
    }
}

fn window_bounds(window: PageWindow) -> (i64, i64) {
    (
        i64::try_from(window.limit).unwrap_or(i64::MAX),
        i64::try_from(window.skip).unwrap_or(i64::MAX),
    )
}

#[async_trait]
impl StoreTransaction for PostgresTransaction {
    async fn get_blogpost(&mut self, id: i64) -> StorageResult<Option<BlogPostRecord>> {
        let sql = format!("SELECT {BLOGPOST_COLUMNS} FROM blogpost WHERE id = $1");
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
        let rows = timed_query(BACKEND, "list_blogposts", self.query_timeout, async {
            let result = match window {
                Some(window) => {
                    let (limit, offset) = window_bounds(window);
                    let sql = format!(
                        "SELECT {BLOGPOST_COLUMNS} FROM blogpost ORDER BY id ASC LIMIT $1 OFFSET $2"
                    );
                    sqlx::query(&sql)
                        .bind(limit)
                        .bind(offset)
                        .fetch_all(&mut *self.tx)
                        .await
                }
                None => {
                    let sql = format!("SELECT {BLOGPOST_COLUMNS} FROM blogpost ORDER BY id ASC");
                    sqlx::query(&sql).fetch_all(&mut *self.tx).await
                }
            };
            result.map_err(|e| StorageError::from_sqlx("list_blogposts", e))
        })
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
        let id: i64 = timed_query(BACKEND, "insert_blogpost", self.query_timeout, async {
            sqlx::query_scalar(
                r#"
                INSERT INTO blogpost (title, content, author_name, posted_on, image)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id
                "#,
            )
            .bind(&fields.title)
            .bind(&fields.content)
            .bind(&fields.author_name)
            .bind(fields.timestamp)
            .bind(&fields.image)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| StorageError::from_sqlx("insert_blogpost", e))
        })
        .await?;
        Ok(fields.clone().into_record(id))
    }

    async fn update_blogpost(&mut self, id: i64, fields: &BlogPostFields) -> StorageResult<bool> {
        let result = timed_query(BACKEND, "update_blogpost", self.query_timeout, async {
            sqlx::query(
                r#"
                UPDATE blogpost
                SET title = $2, content = $3, author_name = $4, posted_on = $5, image = $6
                WHERE id = $1
                "#,
            )
            .bind(id)
            .bind(&fields.title)
            .bind(&fields.content)
            .bind(&fields.author_name)
            .bind(fields.timestamp)
            .bind(&fields.image)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| StorageError::from_sqlx("update_blogpost", e))
        })
        .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn delete_blogpost(&mut self, id: i64) -> StorageResult<bool> {
        let result = timed_query(BACKEND, "delete_blogpost", self.query_timeout, async {
            sqlx::query("DELETE FROM blogpost WHERE id = $1")
                .bind(id)
                .execute(&mut *self.tx)
                .await
                .map_err(|e| StorageError::from_sqlx("delete_blogpost", e))
        })
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_comment(&mut self, id: i64) -> StorageResult<Option<CommentRecord>> {
        let sql = format!("SELECT {COMMENT_COLUMNS} FROM comment WHERE id = $1");
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
        let rows = timed_query(BACKEND, "list_comments", self.query_timeout, async {
            let result = match window {
                Some(window) => {
                    let (limit, offset) = window_bounds(window);
                    let sql = format!(
                        "SELECT {COMMENT_COLUMNS} FROM comment ORDER BY id ASC LIMIT $1 OFFSET $2"
                    );
                    sqlx::query(&sql)
                        .bind(limit)
                        .bind(offset)
                        .fetch_all(&mut *self.tx)
                        .await
                }
                None => {
                    let sql = format!("SELECT {COMMENT_COLUMNS} FROM comment ORDER BY id ASC");
                    sqlx::query(&sql).fetch_all(&mut *self.tx).await
                }
            };
            result.map_err(|e| StorageError::from_sqlx("list_comments", e))
        })
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
        let id: i64 = timed_query(BACKEND, "insert_comment", self.query_timeout, async {
            sqlx::query_scalar(
                r#"
                INSERT INTO comment (content, author_name, posted_on, blogpost_id)
                VALUES ($1, $2, $3, $4)
                RETURNING id
                "#,
            )
            .bind(&fields.content)
            .bind(&fields.author_name)
            .bind(fields.timestamp)
            .bind(fields.blogpost_id)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| StorageError::from_sqlx("insert_comment", e))
        })
        .await?;
        Ok(fields.clone().into_record(id))
    }

    async fn update_comment(&mut self, id: i64, fields: &CommentFields) -> StorageResult<bool> {
        let result = timed_query(BACKEND, "update_comment", self.query_timeout, async {
            sqlx::query(
                r#"
                UPDATE comment
                SET content = $2, author_name = $3, posted_on = $4, blogpost_id = $5
                WHERE id = $1
                "#,
            )
            .bind(id)
            .bind(&fields.content)
            .bind(&fields.author_name)
            .bind(fields.timestamp)
            .bind(fields.blogpost_id)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| StorageError::from_sqlx("update_comment", e))
        })
        .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn delete_comment(&mut self, id: i64) -> StorageResult<bool> {
        let result = timed_query(BACKEND, "delete_comment", self.query_timeout, async {
            sqlx::query("DELETE FROM comment WHERE id = $1")
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
            format!("SELECT {COMMENT_COLUMNS} FROM comment WHERE blogpost_id = $1 ORDER BY id ASC");
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
            sqlx::query_scalar("SELECT id FROM comment WHERE blogpost_id = $1 ORDER BY id ASC")
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
        let result = timed_query(BACKEND, "assign_comments", self.query_timeout, async {
            sqlx::query("UPDATE comment SET blogpost_id = $1 WHERE id = ANY($2)")
                .bind(blogpost_id)
                .bind(comment_ids)
                .execute(&mut *self.tx)
                .await
                .map_err(|e| StorageError::from_sqlx("assign_comments", e))
        })
        .await?;
        Ok(result.rows_affected())
    }

    async fn detach_comments(&mut self, blogpost_id: i64) -> StorageResult<u64> {
        let result = timed_query(BACKEND, "detach_comments", self.query_timeout, async {
            sqlx::query("UPDATE comment SET blogpost_id = NULL WHERE blogpost_id = $1")
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
