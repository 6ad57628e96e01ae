//! Data models
//!
//! Rust structs representing database entities.
//! All models use ULID for IDs and chrono for timestamps.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

// =============================================================================
// ID Types
// =============================================================================

/// Entity ID wrapper (ULID format, 26 characters)
///
/// Example: "01ARZ3NDEKTSV4RRFFQ69G5FAV"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Generate a new ULID
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Account
// =============================================================================

/// A registered user
///
/// Holds no relationship collections: follow edges live in their own table
/// and are queried, never traversed from here.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    pub id: String,
    /// Unique display handle (1-15 letters, digits or spaces)
    pub username: String,
    /// Cached `COUNT(*)` of follow edges pointing at this account
    pub followers_count: i64,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Follow relationships
// =============================================================================

/// Directed edge meaning "follower follows followed"
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FollowEdge {
    pub follower_id: String,
    pub followed_id: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Posts and likes
// =============================================================================

/// A published post
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: String,
    pub author_id: String,
    /// Calendar date of the post, no time-of-day
    pub date: NaiveDate,
    pub category: i64,
    pub price: f64,
    pub has_promo: bool,
    pub discount: Option<f64>,
    /// Cached `COUNT(*)` of like edges on this post
    pub likes_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Edge meaning "user liked post"
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LikeEdge {
    pub user_id: String,
    pub post_id: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Ordering
// =============================================================================

/// Ordering of follower/followed listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameOrder {
    /// Edge creation order
    #[default]
    Unspecified,
    NameAsc,
    NameDesc,
}

impl NameOrder {
    /// Parse a listing order strictly.
    ///
    /// Absent or blank means [`NameOrder::Unspecified`]; anything other than
    /// `name_asc`/`name_desc` (case-insensitive) is a validation error.
    pub fn parse(order: Option<&str>) -> Result<Self, AppError> {
        let Some(order) = order.map(str::trim).filter(|value| !value.is_empty()) else {
            return Ok(Self::Unspecified);
        };

        if order.eq_ignore_ascii_case("name_asc") {
            Ok(Self::NameAsc)
        } else if order.eq_ignore_ascii_case("name_desc") {
            Ok(Self::NameDesc)
        } else {
            Err(AppError::Validation(format!("invalid order: {order}")))
        }
    }

    pub(crate) fn sql(&self) -> &'static str {
        match self {
            Self::Unspecified => "f.created_at ASC, a.id ASC",
            Self::NameAsc => "a.username ASC, a.id ASC",
            Self::NameDesc => "a.username DESC, a.id DESC",
        }
    }
}

/// Ordering of feed posts by date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateOrder {
    Asc,
    #[default]
    Desc,
}

impl DateOrder {
    /// Parse a feed order leniently.
    ///
    /// Only `date_asc` (case-insensitive) selects ascending order. Absent,
    /// blank, `date_desc` and unrecognized values all mean descending.
    pub fn parse_lenient(order: Option<&str>) -> Self {
        match order.map(str::trim) {
            Some(order) if order.eq_ignore_ascii_case("date_asc") => Self::Asc,
            _ => Self::Desc,
        }
    }

    pub(crate) fn sql(&self) -> &'static str {
        match self {
            Self::Asc => "date ASC, id ASC",
            Self::Desc => "date DESC, id DESC",
        }
    }
}
