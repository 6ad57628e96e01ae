//! Denormalized engagement counters
//!
//! `accounts.followers_count` and `posts.likes_count` are caches of edge
//! counts. They are only ever changed by a single in-place `UPDATE` on the
//! same transaction as the edge mutation; the application never writes back
//! a value it read earlier, so concurrent increments cannot lose updates.

use sqlx::SqliteConnection;

use crate::error::AppError;

/// Entity that owns a counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterOwner {
    /// `accounts.followers_count`
    Account,
    /// `posts.likes_count`
    Post,
}

impl CounterOwner {
    fn increment_sql(&self) -> &'static str {
        match self {
            Self::Account => {
                "UPDATE accounts SET followers_count = followers_count + 1 WHERE id = ? RETURNING followers_count"
            }
            Self::Post => {
                "UPDATE posts SET likes_count = likes_count + 1 WHERE id = ? RETURNING likes_count"
            }
        }
    }

    fn decrement_sql(&self) -> &'static str {
        match self {
            Self::Account => {
                "UPDATE accounts SET followers_count = MAX(followers_count - 1, 0) WHERE id = ? RETURNING followers_count"
            }
            Self::Post => {
                "UPDATE posts SET likes_count = MAX(likes_count - 1, 0) WHERE id = ? RETURNING likes_count"
            }
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Account => "account",
            Self::Post => "post",
        }
    }
}

/// Add one to the owner's counter and return the new value.
///
/// # Errors
/// `NotFound` if the owner row does not exist.
pub async fn increment(
    conn: &mut SqliteConnection,
    owner: CounterOwner,
    owner_id: &str,
) -> Result<i64, AppError> {
    apply(conn, owner, owner_id, owner.increment_sql()).await
}

/// Subtract one from the owner's counter, flooring at zero, and return the
/// new value. A counter already at zero stays at zero.
///
/// # Errors
/// `NotFound` if the owner row does not exist.
pub async fn decrement(
    conn: &mut SqliteConnection,
    owner: CounterOwner,
    owner_id: &str,
) -> Result<i64, AppError> {
    apply(conn, owner, owner_id, owner.decrement_sql()).await
}

async fn apply(
    conn: &mut SqliteConnection,
    owner: CounterOwner,
    owner_id: &str,
    sql: &'static str,
) -> Result<i64, AppError> {
    sqlx::query_scalar::<_, i64>(sql)
        .bind(owner_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} not found: {owner_id}", owner.label())))
}
