//! Feed service
//!
//! Builds a user's feed from the posts of the accounts they follow, limited
//! to a trailing window of `FEED_WINDOW_DAYS` days ending today.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;

use super::{FEED_WINDOW_DAYS, Pagination, require_id};
use crate::data::{Database, DateOrder, Post};
use crate::error::AppError;

/// One page of a user's feed
#[derive(Debug, Clone, Serialize)]
pub struct Feed {
    pub user_id: String,
    pub posts: Vec<Post>,
}

/// Feed service
pub struct FeedService {
    db: Arc<Database>,
}

impl FeedService {
    /// Create new feed service
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Get a page of the feed for `user_id` as of today (UTC)
    ///
    /// See [`FeedService::get_feed_at`].
    pub async fn get_feed(
        &self,
        user_id: &str,
        order: Option<&str>,
        page: i64,
        size: i64,
    ) -> Result<Feed, AppError> {
        self.get_feed_at(user_id, order, page, size, Utc::now().date_naive())
            .await
    }

    /// Get a page of the feed for `user_id` relative to `today`
    ///
    /// # Arguments
    /// * `order` - `date_asc` for oldest first; anything else is newest first
    /// * `page` - Zero-based page number
    /// * `size` - Page size (1..=100)
    /// * `today` - Last day of the window
    ///
    /// # Errors
    /// - `Validation` for a blank user id or bad pagination
    /// - `NotFound` if the user does not exist
    pub async fn get_feed_at(
        &self,
        user_id: &str,
        order: Option<&str>,
        page: i64,
        size: i64,
        today: NaiveDate,
    ) -> Result<Feed, AppError> {
        let user_id = require_id(user_id, "user_id")?;
        if !self.db.account_exists(user_id).await? {
            return Err(AppError::NotFound(format!("user not found: {user_id}")));
        }
        let pagination = Pagination::new(page, size)?;
        let order = DateOrder::parse_lenient(order);

        if !self.db.follows_anyone(user_id).await? {
            tracing::debug!(user_id = %user_id, "Feed requested by user following nobody");
            return Ok(Feed {
                user_id: user_id.to_string(),
                posts: Vec::new(),
            });
        }

        let start = today - Duration::days(FEED_WINDOW_DAYS);
        let posts = self
            .db
            .get_followed_posts_between(
                user_id,
                start,
                today,
                order,
                pagination.limit(),
                pagination.offset(),
            )
            .await?;

        tracing::debug!(user_id = %user_id, returned = posts.len(), "Feed page loaded");

        Ok(Feed {
            user_id: user_id.to_string(),
            posts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Account, EntityId};
    use crate::service::FollowService;
    use tempfile::TempDir;

    async fn create_test_db() -> (Arc<Database>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("service-feed.db");
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

    async fn create_post(db: &Database, author_id: &str, date: NaiveDate) -> Post {
        let post = Post {
            id: EntityId::new().0,
            author_id: author_id.to_string(),
            date,
            category: 1,
            price: 10.0,
            has_promo: false,
            discount: None,
            likes_count: 0,
            created_at: Utc::now(),
        };
        db.insert_post(&post).await.unwrap();
        post
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    fn days_ago(days: i64) -> NaiveDate {
        today() - Duration::days(days)
    }

    fn ids(feed: &Feed) -> Vec<String> {
        feed.posts.iter().map(|post| post.id.clone()).collect()
    }

    #[tokio::test]
    async fn feed_contains_followed_posts_inside_window() {
        let (db, _temp_dir) = create_test_db().await;
        let follows = FollowService::new(db.clone());
        let service = FeedService::new(db.clone());

        let reader = create_account(&db, "reader").await;
        let followed = create_account(&db, "followed").await;
        let stranger = create_account(&db, "stranger").await;
        follows.follow(&reader.id, &followed.id).await.unwrap();

        let recent = create_post(&db, &followed.id, days_ago(1)).await;
        let edge_of_window = create_post(&db, &followed.id, days_ago(FEED_WINDOW_DAYS)).await;
        let posted_today = create_post(&db, &followed.id, today()).await;
        let _too_old = create_post(&db, &followed.id, days_ago(FEED_WINDOW_DAYS + 1)).await;
        let _not_followed = create_post(&db, &stranger.id, days_ago(1)).await;

        let feed = service
            .get_feed_at(&reader.id, None, 0, 10, today())
            .await
            .unwrap();
        assert_eq!(feed.user_id, reader.id);
        assert_eq!(
            ids(&feed),
            vec![posted_today.id, recent.id, edge_of_window.id]
        );
    }

    #[tokio::test]
    async fn feed_sort_order() {
        let (db, _temp_dir) = create_test_db().await;
        let follows = FollowService::new(db.clone());
        let service = FeedService::new(db.clone());

        let reader = create_account(&db, "reader").await;
        let followed = create_account(&db, "followed").await;
        follows.follow(&reader.id, &followed.id).await.unwrap();

        let older = create_post(&db, &followed.id, days_ago(5)).await;
        let newer = create_post(&db, &followed.id, days_ago(2)).await;

        let asc = service
            .get_feed_at(&reader.id, Some("DATE_ASC"), 0, 10, today())
            .await
            .unwrap();
        assert_eq!(ids(&asc), vec![older.id.clone(), newer.id.clone()]);

        for order in [None, Some(""), Some("date_desc"), Some("by_price")] {
            let desc = service
                .get_feed_at(&reader.id, order, 0, 10, today())
                .await
                .unwrap();
            assert_eq!(ids(&desc), vec![newer.id.clone(), older.id.clone()]);
        }
    }

    #[tokio::test]
    async fn feed_pages_cover_every_post_once() {
        let (db, _temp_dir) = create_test_db().await;
        let follows = FollowService::new(db.clone());
        let service = FeedService::new(db.clone());

        let reader = create_account(&db, "reader").await;
        let followed = create_account(&db, "followed").await;
        follows.follow(&reader.id, &followed.id).await.unwrap();

        let mut expected = Vec::new();
        for day in 0..7 {
            // Two posts per day exercise the id tie-break
            expected.push(create_post(&db, &followed.id, days_ago(day)).await.id);
            expected.push(create_post(&db, &followed.id, days_ago(day)).await.id);
        }

        let mut seen = Vec::new();
        for page in 0.. {
            let feed = service
                .get_feed_at(&reader.id, Some("date_asc"), page, 3, today())
                .await
                .unwrap();
            if feed.posts.is_empty() {
                break;
            }
            assert!(feed.posts.len() <= 3);
            seen.extend(ids(&feed));
        }

        let mut seen_sorted = seen.clone();
        seen_sorted.sort();
        seen_sorted.dedup();
        assert_eq!(seen.len(), expected.len());
        assert_eq!(seen_sorted.len(), expected.len());
    }

    #[tokio::test]
    async fn feed_handles_more_follows_than_sqlite_bind_limit() {
        let (db, _temp_dir) = create_test_db().await;
        let service = FeedService::new(db.clone());
        let reader = create_account(&db, "reader").await;

        // Above SQLite's default limit of 32766 bound variables per statement
        let followed = 33_000;
        let mut tx = db.begin().await.unwrap();
        sqlx::query(
            r#"
            WITH RECURSIVE seq(n) AS (SELECT 1 UNION ALL SELECT n + 1 FROM seq WHERE n < ?)
            INSERT INTO accounts (id, username, followers_count, created_at)
            SELECT 'bulk-' || n, 'bulk ' || n, 1, '2024-01-01T00:00:00Z' FROM seq
            "#,
        )
        .bind(followed)
        .execute(&mut *tx)
        .await
        .unwrap();
        sqlx::query(
            r#"
            INSERT INTO follows (follower_id, followed_id, created_at)
            SELECT ?, id, '2024-01-01T00:00:00Z' FROM accounts WHERE id LIKE 'bulk-%'
            "#,
        )
        .bind(&reader.id)
        .execute(&mut *tx)
        .await
        .unwrap();
        tx.commit().await.unwrap();

        let first = create_post(&db, "bulk-1", days_ago(3)).await;
        let last = create_post(&db, "bulk-33000", days_ago(1)).await;

        let feed = service
            .get_feed_at(&reader.id, None, 0, 10, today())
            .await
            .unwrap();
        assert_eq!(ids(&feed), vec![last.id, first.id]);
    }

    #[tokio::test]
    async fn feed_of_user_following_nobody_is_empty() {
        let (db, _temp_dir) = create_test_db().await;
        let service = FeedService::new(db.clone());
        let loner = create_account(&db, "loner").await;

        let feed = service.get_feed(&loner.id, None, 0, 10).await.unwrap();
        assert_eq!(feed.user_id, loner.id);
        assert!(feed.posts.is_empty());
    }

    #[tokio::test]
    async fn feed_rejects_unknown_user_and_bad_pagination() {
        let (db, _temp_dir) = create_test_db().await;
        let service = FeedService::new(db.clone());
        let reader = create_account(&db, "reader").await;

        assert!(matches!(
            service.get_feed("ghost", None, 0, 10).await,
            Err(AppError::NotFound(_))
        ));
        // Existence is checked before pagination
        assert!(matches!(
            service.get_feed("ghost", None, -1, 0).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.get_feed(&reader.id, None, -1, 10).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            service.get_feed(&reader.id, None, 0, 0).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            service.get_feed(&reader.id, None, 0, 101).await,
            Err(AppError::Validation(_))
        ));
    }
}
