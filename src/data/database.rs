//! SQLite database operations
//!
//! All database access goes through this module and its siblings
//! (`relationships`, `likes`, `counters`). Queries are runtime-checked sqlx
//! queries; the schema lives in `migrations/`.

use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, QueryBuilder, Sqlite, Transaction};
use std::path::Path;
use std::time::Duration;

use super::models::*;
use crate::config::DatabaseConfig;
use crate::error::AppError;

const DEFAULT_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// `true` when the error is a UNIQUE or PRIMARY KEY constraint violation.
pub(crate) fn is_unique_violation(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db_error) => {
            db_error.is_unique_violation()
                // SQLITE_CONSTRAINT_PRIMARYKEY / SQLITE_CONSTRAINT_UNIQUE
                || matches!(db_error.code().as_deref(), Some("1555") | Some("2067"))
        }
        _ => false,
    }
}

/// `true` when the error is a FOREIGN KEY constraint violation.
pub(crate) fn is_foreign_key_violation(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db_error) => {
            db_error.is_foreign_key_violation() || db_error.code().as_deref() == Some("787")
        }
        _ => false,
    }
}

/// `true` when the error is a CHECK constraint violation.
pub(crate) fn is_check_violation(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db_error) => {
            db_error.is_check_violation() || db_error.code().as_deref() == Some("275")
        }
        _ => false,
    }
}

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    // =========================================================================
    // Connection
    // =========================================================================

    /// Connect to SQLite database with default pool settings
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        Self::connect_with(path, DEFAULT_MAX_CONNECTIONS, DEFAULT_BUSY_TIMEOUT).await
    }

    /// Connect using the `[database]` configuration section.
    pub async fn connect_with_config(config: &DatabaseConfig) -> Result<Self, AppError> {
        Self::connect_with(
            &config.path,
            config.max_connections,
            Duration::from_millis(config.busy_timeout_ms),
        )
        .await
    }

    async fn connect_with(
        path: &Path,
        max_connections: u32,
        busy_timeout: Duration,
    ) -> Result<Self, AppError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        // Writers queue on the SQLite lock for up to `busy_timeout` instead of
        // failing with SQLITE_BUSY.
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(busy_timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        // Run migrations
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!(path = %path.display(), "Database connected and migrated successfully");

        Ok(Self { pool })
    }

    /// Start a transaction.
    ///
    /// Dropping the returned transaction without calling `commit` rolls it
    /// back, so an early `?` return undoes every write made on it.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, AppError> {
        Ok(self.pool.begin().await?)
    }

    pub(crate) fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// Insert a new account
    ///
    /// # Errors
    /// `Validation` if the username is already taken.
    pub async fn insert_account(&self, account: &Account) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, username, followers_count, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&account.id)
        .bind(&account.username)
        .bind(account.followers_count)
        .bind(account.created_at)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            if is_unique_violation(&error) {
                AppError::Validation(format!("user already exists: {}", account.username))
            } else {
                AppError::Database(error)
            }
        })?;

        Ok(())
    }

    /// Get account by ID
    pub async fn get_account(&self, id: &str) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(account)
    }

    /// Check if an account exists
    pub async fn account_exists(&self, id: &str) -> Result<bool, AppError> {
        let exists: i64 =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM accounts WHERE id = ?)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists != 0)
    }

    /// Check if a username is taken
    pub async fn username_exists(&self, username: &str) -> Result<bool, AppError> {
        let exists: i64 =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM accounts WHERE username = ?)")
                .bind(username)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists != 0)
    }

    /// Accounts ranked by follower count (ties broken by username)
    pub async fn get_top_accounts(&self, limit: i64) -> Result<Vec<Account>, AppError> {
        let accounts = sqlx::query_as::<_, Account>(
            r#"
            SELECT * FROM accounts
            ORDER BY followers_count DESC, username ASC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(accounts)
    }

    // =========================================================================
    // Posts
    // =========================================================================

    /// Insert a new post
    ///
    /// # Errors
    /// `NotFound` if the author does not exist.
    pub async fn insert_post(&self, post: &Post) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO posts (
                id, author_id, date, category, price, has_promo, discount,
                likes_count, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&post.id)
        .bind(&post.author_id)
        .bind(post.date)
        .bind(post.category)
        .bind(post.price)
        .bind(post.has_promo)
        .bind(post.discount)
        .bind(post.likes_count)
        .bind(post.created_at)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            if is_foreign_key_violation(&error) {
                AppError::NotFound(format!("user not found: {}", post.author_id))
            } else {
                AppError::Database(error)
            }
        })?;

        Ok(())
    }

    /// Get post by ID
    pub async fn get_post(&self, id: &str) -> Result<Option<Post>, AppError> {
        let post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(post)
    }

    /// Check if a post exists
    pub async fn post_exists(&self, id: &str) -> Result<bool, AppError> {
        let exists: i64 = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM posts WHERE id = ?)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists != 0)
    }

    /// Count an author's promotional posts
    pub async fn count_promo_posts(&self, author_id: &str) -> Result<i64, AppError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE author_id = ? AND has_promo = 1")
                .bind(author_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// Posts by the accounts `follower_id` follows, dated within
    /// `[start, end]` (inclusive)
    ///
    /// The followed authors are resolved by a subquery on `follows`, so the
    /// statement has a fixed number of bound parameters however many
    /// accounts the user follows. Ordering and the `LIMIT`/`OFFSET` window
    /// are applied by SQLite, so only the requested page is ever loaded.
    pub async fn get_followed_posts_between(
        &self,
        follower_id: &str,
        start: NaiveDate,
        end: NaiveDate,
        order: DateOrder,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, AppError> {
        let timer = crate::metrics::DB_QUERY_DURATION_SECONDS
            .with_label_values(&["SELECT", "posts"])
            .start_timer();

        let mut query_builder = QueryBuilder::<Sqlite>::new(
            "SELECT * FROM posts WHERE author_id IN (SELECT followed_id FROM follows WHERE follower_id = ",
        );
        query_builder.push_bind(follower_id);
        query_builder.push(") AND date BETWEEN ");
        query_builder.push_bind(start);
        query_builder.push(" AND ");
        query_builder.push_bind(end);
        query_builder.push(" ORDER BY ");
        query_builder.push(order.sql());
        query_builder.push(" LIMIT ");
        query_builder.push_bind(limit);
        query_builder.push(" OFFSET ");
        query_builder.push_bind(offset);

        let posts = query_builder
            .build_query_as::<Post>()
            .fetch_all(&self.pool)
            .await?;
        timer.observe_duration();

        Ok(posts)
    }

    /// One page of an author's promotional posts, newest first
    pub async fn get_promo_posts_page(
        &self,
        author_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, AppError> {
        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT * FROM posts
            WHERE author_id = ? AND has_promo = 1
            ORDER BY date DESC, id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(author_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }
}
