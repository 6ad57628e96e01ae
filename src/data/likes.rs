//! Like edge storage
//!
//! Same contract shape as the follow edges: the `(user_id, post_id)` primary
//! key decides concurrent likes, and a lost race surfaces as `Conflict`.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use super::database::{Database, is_foreign_key_violation, is_unique_violation};
use super::models::LikeEdge;
use crate::error::AppError;

/// Insert a like edge on `conn`.
///
/// # Errors
/// - `Conflict` if the user already liked the post
/// - `NotFound` if the user or the post does not exist
pub async fn insert_like_edge(
    conn: &mut SqliteConnection,
    user_id: &str,
    post_id: &str,
    now: DateTime<Utc>,
) -> Result<LikeEdge, AppError> {
    sqlx::query("INSERT INTO post_likes (user_id, post_id, created_at) VALUES (?, ?, ?)")
        .bind(user_id)
        .bind(post_id)
        .bind(now)
        .execute(&mut *conn)
        .await
        .map_err(|error| {
            if is_unique_violation(&error) {
                AppError::Conflict(format!("user {user_id} already liked post {post_id}"))
            } else if is_foreign_key_violation(&error) {
                AppError::NotFound(format!("user {user_id} or post {post_id} not found"))
            } else {
                AppError::Database(error)
            }
        })?;

    Ok(LikeEdge {
        user_id: user_id.to_string(),
        post_id: post_id.to_string(),
        created_at: now,
    })
}

/// Delete a like edge on `conn`.
///
/// # Errors
/// `NotFound` if the user has not liked the post.
pub async fn delete_like_edge(
    conn: &mut SqliteConnection,
    user_id: &str,
    post_id: &str,
) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM post_likes WHERE user_id = ? AND post_id = ?")
        .bind(user_id)
        .bind(post_id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "user {user_id} has not liked post {post_id}"
        )));
    }

    Ok(())
}

impl Database {
    /// Check if `user_id` liked `post_id`
    pub async fn like_exists(&self, user_id: &str, post_id: &str) -> Result<bool, AppError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM post_likes WHERE user_id = ? AND post_id = ?",
        )
        .bind(user_id)
        .bind(post_id)
        .fetch_one(self.pool())
        .await?;

        Ok(count > 0)
    }

    /// Number of like edges on a post, counted from the edge table
    pub async fn count_post_likes(&self, post_id: &str) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM post_likes WHERE post_id = ?")
            .bind(post_id)
            .fetch_one(self.pool())
            .await?;

        Ok(count)
    }
}
