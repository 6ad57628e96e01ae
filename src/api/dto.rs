//! API request and response DTOs
//!
//! Wire shapes for the `/users` and `/products` endpoints. Field names are
//! snake_case; request fields also accept their camelCase spelling.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::data::{Account, Post};
use crate::service::{Feed, FollowListing, NewPost, PromoListing};

// =============================================================================
// Requests
// =============================================================================

/// POST /users
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterUserRequest {
    #[serde(alias = "userName")]
    pub user_name: String,
}

/// POST /products/publish
#[derive(Debug, Clone, Deserialize)]
pub struct PublishPostRequest {
    #[serde(alias = "userId")]
    pub user_id: String,
    #[serde(default)]
    pub date: Option<String>,
    pub category: i64,
    pub price: f64,
    #[serde(default, alias = "hasPromo")]
    pub has_promo: bool,
    #[serde(default)]
    pub discount: Option<f64>,
}

impl From<PublishPostRequest> for NewPost {
    fn from(request: PublishPostRequest) -> Self {
        Self {
            user_id: request.user_id,
            date: request.date,
            category: request.category,
            price: request.price,
            has_promo: request.has_promo,
            discount: request.discount,
        }
    }
}

/// `?order&page&size` for listings and the feed
#[derive(Debug, Clone, Deserialize)]
pub struct ListParams {
    pub order: Option<String>,
    #[serde(default)]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub size: i64,
}

fn default_page_size() -> i64 {
    10
}

/// `?limit` for GET /users/top
#[derive(Debug, Clone, Deserialize)]
pub struct TopUsersParams {
    #[serde(default = "default_top_limit")]
    pub limit: i64,
}

fn default_top_limit() -> i64 {
    100
}

/// `?user_id` for GET /products/promo-pub/count
#[derive(Debug, Clone, Deserialize)]
pub struct PromoCountParams {
    #[serde(alias = "userId")]
    pub user_id: String,
}

/// `?user_id&page&size` for GET /products/promo-pub/list
#[derive(Debug, Clone, Deserialize)]
pub struct PromoListParams {
    #[serde(alias = "userId")]
    pub user_id: String,
    #[serde(default)]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub size: i64,
}

// =============================================================================
// Responses
// =============================================================================

/// Account with its follower count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountResponse {
    pub user_id: String,
    pub user_name: String,
    pub followers_count: i64,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            user_id: account.id,
            user_name: account.username,
            followers_count: account.followers_count,
        }
    }
}

/// Entry of a follower/followed listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub user_id: String,
    pub user_name: String,
}

/// GET /users/:id/followers/list and /users/:id/followed/list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowListingResponse {
    pub user_id: String,
    pub user_name: String,
    pub users: Vec<UserSummary>,
}

impl From<FollowListing> for FollowListingResponse {
    fn from(listing: FollowListing) -> Self {
        Self {
            user_id: listing.user_id,
            user_name: listing.username,
            users: listing
                .accounts
                .into_iter()
                .map(|account| UserSummary {
                    user_id: account.id,
                    user_name: account.username,
                })
                .collect(),
        }
    }
}

/// GET /users/:id/following/:target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowingResponse {
    pub following: bool,
}

/// A post as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub post_id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub category: i64,
    pub price: f64,
    pub has_promo: bool,
    pub discount: Option<f64>,
    pub likes_count: i64,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self {
            post_id: post.id,
            user_id: post.author_id,
            date: post.date,
            category: post.category,
            price: post.price,
            has_promo: post.has_promo,
            discount: post.discount,
            likes_count: post.likes_count,
        }
    }
}

/// GET /products/followed/:id/list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedResponse {
    pub user_id: String,
    pub posts: Vec<PostResponse>,
}

impl From<Feed> for FeedResponse {
    fn from(feed: Feed) -> Self {
        Self {
            user_id: feed.user_id,
            posts: feed.posts.into_iter().map(PostResponse::from).collect(),
        }
    }
}

/// GET /products/promo-pub/count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromoCountResponse {
    pub user_id: String,
    pub user_name: String,
    pub promo_products_count: i64,
}

/// GET /products/promo-pub/list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromoListResponse {
    pub user_id: String,
    pub user_name: String,
    pub posts: Vec<PostResponse>,
}

impl From<PromoListing> for PromoListResponse {
    fn from(listing: PromoListing) -> Self {
        Self {
            user_id: listing.user_id,
            user_name: listing.username,
            posts: listing.posts.into_iter().map(PostResponse::from).collect(),
        }
    }
}
