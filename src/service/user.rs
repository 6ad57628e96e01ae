//! User service
//!
//! Registration, lookups and the follower/followed listings.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use super::{MAX_PAGE_SIZE, Pagination, require_id};
use crate::data::{Account, Database, EntityId, NameOrder};
use crate::error::AppError;

/// Longest accepted username, in characters
const MAX_USERNAME_CHARS: usize = 15;

/// One page of an account's followers or followed accounts
#[derive(Debug, Clone, Serialize)]
pub struct FollowListing {
    pub user_id: String,
    pub username: String,
    pub accounts: Vec<Account>,
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Followers,
    Followed,
}

fn validate_username(username: &str) -> Result<&str, AppError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(AppError::Validation("username cannot be empty".to_string()));
    }
    if username.chars().count() > MAX_USERNAME_CHARS {
        return Err(AppError::Validation(format!(
            "username must be at most {MAX_USERNAME_CHARS} characters"
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || c == ' ')
    {
        return Err(AppError::Validation(
            "username may only contain letters, digits and spaces".to_string(),
        ));
    }
    Ok(username)
}

/// User service
pub struct UserService {
    db: Arc<Database>,
}

impl UserService {
    /// Create new user service
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Register a new account
    ///
    /// # Errors
    /// `Validation` if the name is blank, too long, has characters other
    /// than letters, digits and spaces, or is already taken.
    pub async fn register(&self, username: &str) -> Result<Account, AppError> {
        let username = validate_username(username)?;

        if self.db.username_exists(username).await? {
            return Err(AppError::Validation(format!(
                "user already exists: {username}"
            )));
        }

        let account = Account {
            id: EntityId::new().0,
            username: username.to_string(),
            followers_count: 0,
            created_at: Utc::now(),
        };
        // The UNIQUE constraint still catches a concurrent registration
        self.db.insert_account(&account).await?;

        tracing::info!(user_id = %account.id, username = %account.username, "Account registered");
        Ok(account)
    }

    /// Get an account by ID
    pub async fn get_user(&self, user_id: &str) -> Result<Account, AppError> {
        let user_id = require_id(user_id, "user_id")?;
        self.db
            .get_account(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user not found: {user_id}")))
    }

    /// Get an account together with its follower count
    pub async fn followers_count(&self, user_id: &str) -> Result<Account, AppError> {
        self.get_user(user_id).await
    }

    /// Accounts with the most followers
    ///
    /// # Errors
    /// `Validation` if `limit` is outside `1..=100`.
    pub async fn top_users(&self, limit: i64) -> Result<Vec<Account>, AppError> {
        if !(1..=MAX_PAGE_SIZE).contains(&limit) {
            return Err(AppError::Validation(format!(
                "limit must be between 1 and {MAX_PAGE_SIZE}, got {limit}"
            )));
        }
        self.db.get_top_accounts(limit).await
    }

    /// One page of the accounts following `user_id`
    ///
    /// # Errors
    /// - `Validation` for bad pagination or an order other than
    ///   `name_asc`/`name_desc`
    /// - `NotFound` if the user does not exist
    pub async fn list_followers(
        &self,
        user_id: &str,
        order: Option<&str>,
        page: i64,
        size: i64,
    ) -> Result<FollowListing, AppError> {
        self.list(Direction::Followers, user_id, order, page, size)
            .await
    }

    /// One page of the accounts `user_id` follows
    ///
    /// Same errors as [`UserService::list_followers`].
    pub async fn list_followed(
        &self,
        user_id: &str,
        order: Option<&str>,
        page: i64,
        size: i64,
    ) -> Result<FollowListing, AppError> {
        self.list(Direction::Followed, user_id, order, page, size)
            .await
    }

    async fn list(
        &self,
        direction: Direction,
        user_id: &str,
        order: Option<&str>,
        page: i64,
        size: i64,
    ) -> Result<FollowListing, AppError> {
        let pagination = Pagination::new(page, size)?;
        let order = NameOrder::parse(order)?;
        let user = self.get_user(user_id).await?;

        let accounts = match direction {
            Direction::Followers => {
                self.db
                    .get_followers_page(&user.id, order, pagination.limit(), pagination.offset())
                    .await?
            }
            Direction::Followed => {
                self.db
                    .get_followed_page(&user.id, order, pagination.limit(), pagination.offset())
                    .await?
            }
        };

        tracing::debug!(user_id = %user.id, ?direction, ?order, returned = accounts.len(), "Listing loaded");

        Ok(FollowListing {
            user_id: user.id,
            username: user.username,
            accounts,
        })
    }
}
