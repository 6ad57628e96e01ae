//! User endpoints
//!
//! Registration, lookups, follow/unfollow and the follower listings.

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};

use super::dto::{
    AccountResponse, FollowListingResponse, FollowingResponse, ListParams, RegisterUserRequest,
    TopUsersParams,
};
use crate::AppState;
use crate::error::AppError;
use crate::service::{FollowService, UserService};

/// Create users router
pub fn users_router() -> Router<AppState> {
    Router::new()
        .route("/users", post(register_user))
        .route("/users/top", get(top_users))
        .route("/users/:id", get(get_user))
        .route("/users/:id/follow/:target", post(follow_user))
        .route("/users/:id/unfollow/:target", post(unfollow_user))
        .route("/users/:id/following/:target", get(is_following))
        .route("/users/:id/followers/count", get(followers_count))
        .route("/users/:id/followers/list", get(list_followers))
        .route("/users/:id/followed/list", get(list_followed))
}

/// POST /users
async fn register_user(
    State(state): State<AppState>,
    Json(request): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), AppError> {
    let service = UserService::new(state.db.clone());
    let account = service.register(&request.user_name).await?;
    Ok((StatusCode::CREATED, Json(account.into())))
}

/// GET /users/top
async fn top_users(
    State(state): State<AppState>,
    Query(params): Query<TopUsersParams>,
) -> Result<Json<Vec<AccountResponse>>, AppError> {
    let service = UserService::new(state.db.clone());
    let accounts = service.top_users(params.limit).await?;
    Ok(Json(accounts.into_iter().map(AccountResponse::from).collect()))
}

/// GET /users/:id
async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AccountResponse>, AppError> {
    let service = UserService::new(state.db.clone());
    Ok(Json(service.get_user(&id).await?.into()))
}

/// POST /users/:id/follow/:target
///
/// Returns the follower.
async fn follow_user(
    State(state): State<AppState>,
    Path((id, target)): Path<(String, String)>,
) -> Result<Json<AccountResponse>, AppError> {
    let service = FollowService::new(state.db.clone());
    Ok(Json(service.follow(&id, &target).await?.into()))
}

/// POST /users/:id/unfollow/:target
///
/// Returns the follower.
async fn unfollow_user(
    State(state): State<AppState>,
    Path((id, target)): Path<(String, String)>,
) -> Result<Json<AccountResponse>, AppError> {
    let service = FollowService::new(state.db.clone());
    Ok(Json(service.unfollow(&id, &target).await?.into()))
}

/// GET /users/:id/following/:target
async fn is_following(
    State(state): State<AppState>,
    Path((id, target)): Path<(String, String)>,
) -> Result<Json<FollowingResponse>, AppError> {
    let service = FollowService::new(state.db.clone());
    let following = service.is_following(&id, &target).await?;
    Ok(Json(FollowingResponse { following }))
}

/// GET /users/:id/followers/count
async fn followers_count(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AccountResponse>, AppError> {
    let service = UserService::new(state.db.clone());
    Ok(Json(service.followers_count(&id).await?.into()))
}

/// GET /users/:id/followers/list
async fn list_followers(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Json<FollowListingResponse>, AppError> {
    let service = UserService::new(state.db.clone());
    let listing = service
        .list_followers(&id, params.order.as_deref(), params.page, params.size)
        .await?;
    Ok(Json(listing.into()))
}

/// GET /users/:id/followed/list
async fn list_followed(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Json<FollowListingResponse>, AppError> {
    let service = UserService::new(state.db.clone());
    let listing = service
        .list_followed(&id, params.order.as_deref(), params.page, params.size)
        .await?;
    Ok(Json(listing.into()))
}
