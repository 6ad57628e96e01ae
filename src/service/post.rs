//! Post service
//!
//! Publishing and reading posts. Like counters are owned by `LikeService`;
//! this service only ever inserts posts with a zero count.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use super::{Pagination, require_id};
use crate::data::{Database, EntityId, Post};
use crate::error::AppError;

/// Highest accepted post price
const MAX_PRICE: f64 = 10_000_000.0;

/// Input for [`PostService::publish`]
#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub user_id: String,
    /// `YYYY-MM-DD` or `DD-MM-YYYY`; absent or blank means today
    pub date: Option<String>,
    pub category: i64,
    pub price: f64,
    pub has_promo: bool,
    pub discount: Option<f64>,
}

/// One page of an account's promotional posts
#[derive(Debug, Clone, Serialize)]
pub struct PromoListing {
    pub user_id: String,
    pub username: String,
    pub posts: Vec<Post>,
}

/// Parse a post date, falling back to `today` when none is given.
fn resolve_date(date: Option<&str>, today: NaiveDate) -> Result<NaiveDate, AppError> {
    let Some(date) = date.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(today);
    };

    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(date, "%d-%m-%Y"))
        .map_err(|_| {
            AppError::Validation(format!(
                "invalid date: {date} (expected YYYY-MM-DD or DD-MM-YYYY)"
            ))
        })
}

/// Post service
pub struct PostService {
    db: Arc<Database>,
}

impl PostService {
    /// Create new post service
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Publish a post
    ///
    /// # Errors
    /// - `Validation` for a blank author, a price outside `0..=10_000_000`,
    ///   a negative discount or an unparseable date
    /// - `NotFound` if the author does not exist
    pub async fn publish(&self, new_post: NewPost) -> Result<Post, AppError> {
        let author_id = require_id(&new_post.user_id, "user_id")?;

        if !new_post.price.is_finite() || new_post.price < 0.0 {
            return Err(AppError::Validation(
                "price must be a non-negative number".to_string(),
            ));
        }
        if new_post.price > MAX_PRICE {
            return Err(AppError::Validation(
                "price must not exceed 10,000,000".to_string(),
            ));
        }
        if let Some(discount) = new_post.discount {
            if !discount.is_finite() || discount < 0.0 {
                return Err(AppError::Validation(
                    "discount must be a non-negative number".to_string(),
                ));
            }
        }
        let date = resolve_date(new_post.date.as_deref(), Utc::now().date_naive())?;

        if !self.db.account_exists(author_id).await? {
            return Err(AppError::NotFound(format!("user not found: {author_id}")));
        }

        let post = Post {
            id: EntityId::new().0,
            author_id: author_id.to_string(),
            date,
            category: new_post.category,
            price: new_post.price,
            has_promo: new_post.has_promo,
            discount: new_post.discount,
            likes_count: 0,
            created_at: Utc::now(),
        };
        self.db.insert_post(&post).await?;

        tracing::info!(post_id = %post.id, author_id = %post.author_id, date = %post.date, "Post published");
        Ok(post)
    }

    /// Get a post by ID
    pub async fn get_post(&self, post_id: &str) -> Result<Post, AppError> {
        let post_id = require_id(post_id, "post_id")?;
        self.db
            .get_post(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("post not found: {post_id}")))
    }

    /// Number of promotional posts published by `user_id`
    ///
    /// # Errors
    /// `NotFound` if the user does not exist.
    pub async fn promo_count(&self, user_id: &str) -> Result<i64, AppError> {
        let user_id = require_id(user_id, "user_id")?;
        if !self.db.account_exists(user_id).await? {
            return Err(AppError::NotFound(format!("user not found: {user_id}")));
        }
        self.db.count_promo_posts(user_id).await
    }

    /// One page of the promotional posts published by `user_id`, newest
    /// first
    ///
    /// # Errors
    /// - `Validation` for bad pagination
    /// - `NotFound` if the user does not exist
    pub async fn promo_list(
        &self,
        user_id: &str,
        page: i64,
        size: i64,
    ) -> Result<PromoListing, AppError> {
        let pagination = Pagination::new(page, size)?;
        let user_id = require_id(user_id, "user_id")?;
        let user = self
            .db
            .get_account(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user not found: {user_id}")))?;

        let posts = self
            .db
            .get_promo_posts_page(&user.id, pagination.limit(), pagination.offset())
            .await?;

        Ok(PromoListing {
            user_id: user.id,
            username: user.username,
            posts,
        })
    }
}
