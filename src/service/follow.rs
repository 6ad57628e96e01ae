//! Follow service
//!
//! Each pair of accounts is either not following or following. `follow` and
//! `unfollow` move between the two states and reject the request when the
//! pair is already in the target state. The edge and the followed account's
//! `followers_count` always change in the same transaction.

use std::sync::Arc;

use chrono::Utc;

use super::require_id;
use crate::data::{Account, CounterOwner, Database, counters, relationships};
use crate::error::AppError;
use crate::metrics;

/// Follow service
pub struct FollowService {
    db: Arc<Database>,
}

impl FollowService {
    /// Create new follow service
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Check whether `follower_id` follows `followed_id`
    ///
    /// # Errors
    /// `Validation` if either id is blank or both are the same account.
    pub async fn is_following(
        &self,
        follower_id: &str,
        followed_id: &str,
    ) -> Result<bool, AppError> {
        let follower_id = require_id(follower_id, "follower_id")?;
        let followed_id = require_id(followed_id, "followed_id")?;
        if follower_id == followed_id {
            return Err(AppError::Validation(
                "a user cannot follow themselves".to_string(),
            ));
        }

        self.db.follow_exists(follower_id, followed_id).await
    }

    /// Make `follower_id` follow `followed_id`
    ///
    /// # Returns
    /// The follower account
    ///
    /// # Errors
    /// - `Validation` for a self-follow or a blank id
    /// - `NotFound` if either account does not exist
    /// - `Conflict` if the follow already exists, including when a
    ///   concurrent request created it first
    pub async fn follow(&self, follower_id: &str, followed_id: &str) -> Result<Account, AppError> {
        let (follower, followed_id) = self.check_pair(follower_id, followed_id).await?;

        if self.db.follow_exists(&follower.id, followed_id).await? {
            tracing::warn!(follower_id = %follower.id, followed_id = %followed_id, "Follow rejected: already following");
            return Err(AppError::Conflict("already following".to_string()));
        }

        let mut tx = self.db.begin().await?;
        relationships::insert_follow_edge(&mut tx, &follower.id, followed_id, Utc::now())
            .await
            .map_err(|error| match error {
                AppError::Conflict(_) => AppError::Conflict("already following".to_string()),
                other => other,
            })?;
        let followers_count = counters::increment(&mut tx, CounterOwner::Account, followed_id).await?;
        tx.commit().await?;

        metrics::record_mutation("follow", "create");
        tracing::info!(
            follower_id = %follower.id,
            followed_id = %followed_id,
            followers_count,
            "Follow created"
        );

        Ok(follower)
    }

    /// Make `follower_id` stop following `followed_id`
    ///
    /// # Returns
    /// The follower account
    ///
    /// # Errors
    /// - `Validation` for a self-unfollow or a blank id
    /// - `NotFound` if either account does not exist
    /// - `Conflict` if there is no follow to remove
    pub async fn unfollow(
        &self,
        follower_id: &str,
        followed_id: &str,
    ) -> Result<Account, AppError> {
        let (follower, followed_id) = self.check_pair(follower_id, followed_id).await?;

        if !self.db.follow_exists(&follower.id, followed_id).await? {
            tracing::warn!(follower_id = %follower.id, followed_id = %followed_id, "Unfollow rejected: not following");
            return Err(AppError::Conflict("not following".to_string()));
        }

        let mut tx = self.db.begin().await?;
        relationships::delete_follow_edge(&mut tx, &follower.id, followed_id)
            .await
            .map_err(|error| match error {
                // Another request removed the edge after the check above
                AppError::NotFound(_) => AppError::Conflict("not following".to_string()),
                other => other,
            })?;
        let followers_count = counters::decrement(&mut tx, CounterOwner::Account, followed_id).await?;
        tx.commit().await?;

        metrics::record_mutation("follow", "delete");
        tracing::info!(
            follower_id = %follower.id,
            followed_id = %followed_id,
            followers_count,
            "Follow removed"
        );

        Ok(follower)
    }

    /// Shared validation for follow and unfollow: self-reference first, then
    /// blank ids, then existence of the follower and the followed account.
    async fn check_pair<'a>(
        &self,
        follower_id: &str,
        followed_id: &'a str,
    ) -> Result<(Account, &'a str), AppError> {
        if follower_id.trim() == followed_id.trim() {
            return Err(AppError::Validation(
                "a user cannot follow themselves".to_string(),
            ));
        }
        let follower_id = require_id(follower_id, "follower_id")?;
        let followed_id = require_id(followed_id, "followed_id")?;

        let follower = self
            .db
            .get_account(follower_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user not found: {follower_id}")))?;
        if !self.db.account_exists(followed_id).await? {
            return Err(AppError::NotFound(format!("user not found: {followed_id}")));
        }

        Ok((follower, followed_id))
    }
}
