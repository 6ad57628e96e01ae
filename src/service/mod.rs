//! Service layer
//!
//! Contains business logic separated from HTTP handlers.
//! Services validate input, run existence checks and wrap each edge mutation
//! and its counter update in a single database transaction.

mod feed;
mod follow;
mod like;
mod post;
mod user;

pub use feed::{Feed, FeedService};
pub use follow::FollowService;
pub use like::LikeService;
pub use post::{NewPost, PostService, PromoListing};
pub use user::{FollowListing, UserService};

use crate::error::AppError;

/// Length of the feed window in days, ending today (inclusive)
pub const FEED_WINDOW_DAYS: i64 = 14;

/// Largest accepted page size for any paginated listing
pub const MAX_PAGE_SIZE: i64 = 100;

/// Validated page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: i64,
    size: i64,
}

impl Pagination {
    /// Validate a zero-based page number and a page size.
    ///
    /// # Errors
    /// `Validation` if `page < 0` or `size` is outside `1..=MAX_PAGE_SIZE`.
    pub fn new(page: i64, size: i64) -> Result<Self, AppError> {
        if page < 0 {
            return Err(AppError::Validation(format!(
                "page must be zero or greater, got {page}"
            )));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&size) {
            return Err(AppError::Validation(format!(
                "size must be between 1 and {MAX_PAGE_SIZE}, got {size}"
            )));
        }
        Ok(Self { page, size })
    }

    pub fn limit(&self) -> i64 {
        self.size
    }

    pub fn offset(&self) -> i64 {
        self.page.saturating_mul(self.size)
    }
}

/// Reject blank identifiers before they reach the database.
pub(crate) fn require_id<'a>(value: &'a str, field: &str) -> Result<&'a str, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    Ok(value)
}
