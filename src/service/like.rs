//! Like service
//!
//! Mirrors the follow state machine for (user, post) pairs, with the post's
//! `likes_count` as the counter. State mismatches are `Unprocessable` rather
//! than `Conflict`.

use std::sync::Arc;

use chrono::Utc;

use super::require_id;
use crate::data::{CounterOwner, Database, counters, likes};
use crate::error::AppError;
use crate::metrics;

/// Like service
pub struct LikeService {
    db: Arc<Database>,
}

impl LikeService {
    /// Create new like service
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Record that `user_id` likes `post_id`
    ///
    /// # Errors
    /// - `Validation` if either id is blank
    /// - `NotFound` if the user, then the post, does not exist
    /// - `Unprocessable` if the user already liked the post
    pub async fn like(&self, post_id: &str, user_id: &str) -> Result<(), AppError> {
        let (post_id, user_id) = self.check_pair(post_id, user_id).await?;

        if self.db.like_exists(user_id, post_id).await? {
            tracing::warn!(post_id = %post_id, user_id = %user_id, "Like rejected: already liked");
            return Err(already_liked());
        }

        let mut tx = self.db.begin().await?;
        likes::insert_like_edge(&mut tx, user_id, post_id, Utc::now())
            .await
            .map_err(|error| match error {
                AppError::Conflict(_) => already_liked(),
                other => other,
            })?;
        let likes_count = counters::increment(&mut tx, CounterOwner::Post, post_id).await?;
        tx.commit().await?;

        metrics::record_mutation("like", "create");
        tracing::info!(post_id = %post_id, user_id = %user_id, likes_count, "Post liked");

        Ok(())
    }

    /// Remove the like of `user_id` on `post_id`
    ///
    /// # Errors
    /// - `Validation` if either id is blank
    /// - `NotFound` if the user, then the post, does not exist
    /// - `Unprocessable` if the user has not liked the post
    pub async fn unlike(&self, post_id: &str, user_id: &str) -> Result<(), AppError> {
        let (post_id, user_id) = self.check_pair(post_id, user_id).await?;

        if !self.db.like_exists(user_id, post_id).await? {
            tracing::warn!(post_id = %post_id, user_id = %user_id, "Unlike rejected: not liked");
            return Err(not_liked());
        }

        let mut tx = self.db.begin().await?;
        likes::delete_like_edge(&mut tx, user_id, post_id)
            .await
            .map_err(|error| match error {
                AppError::NotFound(_) => not_liked(),
                other => other,
            })?;
        let likes_count = counters::decrement(&mut tx, CounterOwner::Post, post_id).await?;
        tx.commit().await?;

        metrics::record_mutation("like", "delete");
        tracing::info!(post_id = %post_id, user_id = %user_id, likes_count, "Post unliked");

        Ok(())
    }

    async fn check_pair<'a>(
        &self,
        post_id: &'a str,
        user_id: &'a str,
    ) -> Result<(&'a str, &'a str), AppError> {
        let post_id = require_id(post_id, "post_id")?;
        let user_id = require_id(user_id, "user_id")?;

        if !self.db.account_exists(user_id).await? {
            return Err(AppError::NotFound(format!("user not found: {user_id}")));
        }
        if !self.db.post_exists(post_id).await? {
            return Err(AppError::NotFound(format!("post not found: {post_id}")));
        }

        Ok((post_id, user_id))
    }
}

fn already_liked() -> AppError {
    AppError::Unprocessable("already liked".to_string())
}

fn not_liked() -> AppError {
    AppError::Unprocessable("not liked".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Account, EntityId, Post};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    async fn create_test_db() -> (Arc<Database>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("service-like.db");
        let db = Database::connect(&db_path).await.unwrap();
        (Arc::new(db), temp_dir)
    }

    async fn create_account(db: &Database, username: &str) -> Account {
        let account = Account {
            id: EntityId::new().0,
            username: username.to_string(),
            followers_count: 0,
            created_at: Utc::now(),
        };
        db.insert_account(&account).await.unwrap();
        account
    }

    async fn create_post(db: &Database, author_id: &str) -> Post {
        let post = Post {
            id: EntityId::new().0,
            author_id: author_id.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            category: 3,
            price: 99.5,
            has_promo: false,
            discount: None,
            likes_count: 0,
            created_at: Utc::now(),
        };
        db.insert_post(&post).await.unwrap();
        post
    }

    async fn likes_count(db: &Database, post_id: &str) -> i64 {
        db.get_post(post_id).await.unwrap().unwrap().likes_count
    }

    #[tokio::test]
    async fn like_then_unlike_toggles_edge_and_counter() {
        let (db, _temp_dir) = create_test_db().await;
        let service = LikeService::new(db.clone());
        let author = create_account(&db, "author").await;
        let fan = create_account(&db, "fan").await;
        let post = create_post(&db, &author.id).await;

        service.like(&post.id, &fan.id).await.unwrap();
        assert!(db.like_exists(&fan.id, &post.id).await.unwrap());
        assert_eq!(likes_count(&db, &post.id).await, 1);

        service.unlike(&post.id, &fan.id).await.unwrap();
        assert!(!db.like_exists(&fan.id, &post.id).await.unwrap());
        assert_eq!(likes_count(&db, &post.id).await, 0);
    }

    #[tokio::test]
    async fn duplicate_like_and_missing_unlike_are_unprocessable() {
        let (db, _temp_dir) = create_test_db().await;
        let service = LikeService::new(db.clone());
        let author = create_account(&db, "author").await;
        let fan = create_account(&db, "fan").await;
        let post = create_post(&db, &author.id).await;

        assert!(matches!(
            service.unlike(&post.id, &fan.id).await,
            Err(AppError::Unprocessable(_))
        ));
        assert_eq!(likes_count(&db, &post.id).await, 0);

        service.like(&post.id, &fan.id).await.unwrap();
        assert!(matches!(
            service.like(&post.id, &fan.id).await,
            Err(AppError::Unprocessable(_))
        ));
        assert_eq!(likes_count(&db, &post.id).await, 1);
    }

    #[tokio::test]
    async fn author_may_like_own_post() {
        let (db, _temp_dir) = create_test_db().await;
        let service = LikeService::new(db.clone());
        let author = create_account(&db, "author").await;
        let post = create_post(&db, &author.id).await;

        service.like(&post.id, &author.id).await.unwrap();
        assert_eq!(likes_count(&db, &post.id).await, 1);
    }

    #[tokio::test]
    async fn blank_and_unknown_ids() {
        let (db, _temp_dir) = create_test_db().await;
        let service = LikeService::new(db.clone());
        let author = create_account(&db, "author").await;
        let post = create_post(&db, &author.id).await;

        assert!(matches!(
            service.like("", &author.id).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            service.unlike(&post.id, "  ").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            service.like(&post.id, "ghost").await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.like("missing", &author.id).await,
            Err(AppError::NotFound(_))
        ));
        // The user is checked before the post
        match service.unlike("missing", "ghost").await {
            Err(AppError::NotFound(message)) => assert!(message.contains("user")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_likes_of_one_post_all_count() {
        let (db, _temp_dir) = create_test_db().await;
        let service = Arc::new(LikeService::new(db.clone()));
        let author = create_account(&db, "author").await;
        let post = create_post(&db, &author.id).await;

        let mut user_ids = Vec::new();
        for i in 0..20 {
            user_ids.push(create_account(&db, &format!("fan {i}")).await.id);
        }

        let tasks = user_ids.into_iter().map(|user_id| {
            let service = service.clone();
            let post_id = post.id.clone();
            tokio::spawn(async move { service.like(&post_id, &user_id).await })
        });
        for result in futures::future::join_all(tasks).await {
            result.unwrap().unwrap();
        }

        assert_eq!(likes_count(&db, &post.id).await, 20);
        assert_eq!(db.count_post_likes(&post.id).await.unwrap(), 20);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_likes_of_same_pair_succeed_once() {
        let (db, _temp_dir) = create_test_db().await;
        let service = Arc::new(LikeService::new(db.clone()));
        let author = create_account(&db, "author").await;
        let fan = create_account(&db, "fan").await;
        let post = create_post(&db, &author.id).await;

        let tasks = (0..10).map(|_| {
            let service = service.clone();
            let post_id = post.id.clone();
            let fan_id = fan.id.clone();
            tokio::spawn(async move { service.like(&post_id, &fan_id).await })
        });

        let mut successes = 0;
        let mut rejected = 0;
        for result in futures::future::join_all(tasks).await {
            match result.unwrap() {
                Ok(()) => successes += 1,
                Err(AppError::Unprocessable(_)) => rejected += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(successes, 1);
        assert_eq!(rejected, 9);
        assert_eq!(likes_count(&db, &post.id).await, 1);
    }
}
