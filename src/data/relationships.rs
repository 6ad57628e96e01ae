//! Follow edge storage
//!
//! The `(follower_id, followed_id)` primary key is the concurrency gate for
//! follows: when two transactions insert the same pair, SQLite lets exactly
//! one through and the other sees a constraint violation, which is reported
//! here as the same `Conflict` a pre-check would have produced.
//!
//! Mutations take the caller's transaction connection so the edge and its
//! counter update commit or roll back together.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use super::database::{Database, is_check_violation, is_foreign_key_violation, is_unique_violation};
use super::models::{Account, FollowEdge, NameOrder};
use crate::error::AppError;

/// Insert a follow edge on `conn`.
///
/// # Errors
/// - `Conflict` if the edge already exists or `follower_id == followed_id`
/// - `NotFound` if either account does not exist
pub async fn insert_follow_edge(
    conn: &mut SqliteConnection,
    follower_id: &str,
    followed_id: &str,
    now: DateTime<Utc>,
) -> Result<FollowEdge, AppError> {
    if follower_id == followed_id {
        return Err(AppError::Conflict(format!(
            "user {follower_id} cannot follow itself"
        )));
    }

    sqlx::query("INSERT INTO follows (follower_id, followed_id, created_at) VALUES (?, ?, ?)")
        .bind(follower_id)
        .bind(followed_id)
        .bind(now)
        .execute(&mut *conn)
        .await
        .map_err(|error| {
            if is_unique_violation(&error) {
                AppError::Conflict(format!(
                    "user {follower_id} already follows user {followed_id}"
                ))
            } else if is_check_violation(&error) {
                AppError::Conflict(format!("user {follower_id} cannot follow itself"))
            } else if is_foreign_key_violation(&error) {
                AppError::NotFound(format!(
                    "user not found: {follower_id} or {followed_id}"
                ))
            } else {
                AppError::Database(error)
            }
        })?;

    Ok(FollowEdge {
        follower_id: follower_id.to_string(),
        followed_id: followed_id.to_string(),
        created_at: now,
    })
}

/// Delete a follow edge on `conn`.
///
/// # Errors
/// `NotFound` if no such edge exists.
pub async fn delete_follow_edge(
    conn: &mut SqliteConnection,
    follower_id: &str,
    followed_id: &str,
) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM follows WHERE follower_id = ? AND followed_id = ?")
        .bind(follower_id)
        .bind(followed_id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "user {follower_id} does not follow user {followed_id}"
        )));
    }

    Ok(())
}

impl Database {
    /// Check if `follower_id` follows `followed_id`
    pub async fn follow_exists(
        &self,
        follower_id: &str,
        followed_id: &str,
    ) -> Result<bool, AppError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM follows WHERE follower_id = ? AND followed_id = ?",
        )
        .bind(follower_id)
        .bind(followed_id)
        .fetch_one(self.pool())
        .await?;

        Ok(count > 0)
    }

    /// Check if `user_id` follows at least one account
    pub async fn follows_anyone(&self, user_id: &str) -> Result<bool, AppError> {
        let exists: i64 =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = ?)")
                .bind(user_id)
                .fetch_one(self.pool())
                .await?;

        Ok(exists != 0)
    }

    /// IDs of the accounts `user_id` follows
    pub async fn get_followed_ids(&self, user_id: &str) -> Result<Vec<String>, AppError> {
        let ids = sqlx::query_scalar::<_, String>(
            "SELECT followed_id FROM follows WHERE follower_id = ?",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;

        Ok(ids)
    }

    /// IDs of the accounts following `user_id`
    pub async fn get_follower_ids(&self, user_id: &str) -> Result<Vec<String>, AppError> {
        let ids = sqlx::query_scalar::<_, String>(
            "SELECT follower_id FROM follows WHERE followed_id = ?",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;

        Ok(ids)
    }

    /// One page of the accounts following `user_id`
    pub async fn get_followers_page(
        &self,
        user_id: &str,
        order: NameOrder,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Account>, AppError> {
        let sql = format!(
            r#"
            SELECT a.* FROM follows f
            JOIN accounts a ON a.id = f.follower_id
            WHERE f.followed_id = ?
            ORDER BY {}
            LIMIT ? OFFSET ?
            "#,
            order.sql()
        );

        let accounts = sqlx::query_as::<_, Account>(&sql)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool())
            .await?;

        Ok(accounts)
    }

    /// One page of the accounts `user_id` follows
    pub async fn get_followed_page(
        &self,
        user_id: &str,
        order: NameOrder,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Account>, AppError> {
        let sql = format!(
            r#"
            SELECT a.* FROM follows f
            JOIN accounts a ON a.id = f.followed_id
            WHERE f.follower_id = ?
            ORDER BY {}
            LIMIT ? OFFSET ?
            "#,
            order.sql()
        );

        let accounts = sqlx::query_as::<_, Account>(&sql)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool())
            .await?;

        Ok(accounts)
    }
}
