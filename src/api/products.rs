//! Product post endpoints
//!
//! Publishing, the followed-accounts feed and likes.

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};

use super::dto::{
    FeedResponse, ListParams, PostResponse, PromoCountParams, PromoCountResponse,
    PromoListParams, PromoListResponse, PublishPostRequest,
};
use crate::AppState;
use crate::error::AppError;
use crate::service::{FeedService, LikeService, PostService, UserService};

/// Create products router
pub fn products_router() -> Router<AppState> {
    Router::new()
        .route("/products/publish", post(publish_post))
        .route("/products/posts/:id", get(get_post))
        .route("/products/promo-pub", post(publish_promo_post))
        .route("/products/promo-pub/count", get(promo_count))
        .route("/products/promo-pub/list", get(promo_list))
        .route("/products/followed/:id/list", get(followed_feed))
        .route("/products/:post_id/like/:user_id", post(like_post))
        .route("/products/:post_id/unlike/:user_id", post(unlike_post))
}

/// POST /products/publish
async fn publish_post(
    State(state): State<AppState>,
    Json(request): Json<PublishPostRequest>,
) -> Result<(StatusCode, Json<PostResponse>), AppError> {
    let service = PostService::new(state.db.clone());
    let post = service.publish(request.into()).await?;
    Ok((StatusCode::CREATED, Json(post.into())))
}

/// POST /products/promo-pub
///
/// Same as `/products/publish` with `has_promo` forced on.
async fn publish_promo_post(
    State(state): State<AppState>,
    Json(mut request): Json<PublishPostRequest>,
) -> Result<(StatusCode, Json<PostResponse>), AppError> {
    request.has_promo = true;
    let service = PostService::new(state.db.clone());
    let post = service.publish(request.into()).await?;
    Ok((StatusCode::CREATED, Json(post.into())))
}

/// GET /products/posts/:id
async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PostResponse>, AppError> {
    let service = PostService::new(state.db.clone());
    Ok(Json(service.get_post(&id).await?.into()))
}

/// GET /products/promo-pub/count?user_id=
async fn promo_count(
    State(state): State<AppState>,
    Query(params): Query<PromoCountParams>,
) -> Result<Json<PromoCountResponse>, AppError> {
    let user = UserService::new(state.db.clone())
        .get_user(&params.user_id)
        .await?;
    let promo_products_count = PostService::new(state.db.clone())
        .promo_count(&user.id)
        .await?;

    Ok(Json(PromoCountResponse {
        user_id: user.id,
        user_name: user.username,
        promo_products_count,
    }))
}

/// GET /products/promo-pub/list?user_id&page&size
async fn promo_list(
    State(state): State<AppState>,
    Query(params): Query<PromoListParams>,
) -> Result<Json<PromoListResponse>, AppError> {
    let service = PostService::new(state.db.clone());
    let listing = service
        .promo_list(&params.user_id, params.page, params.size)
        .await?;
    Ok(Json(listing.into()))
}

/// GET /products/followed/:id/list
async fn followed_feed(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Json<FeedResponse>, AppError> {
    let service = FeedService::new(state.db.clone());
    let feed = service
        .get_feed(&id, params.order.as_deref(), params.page, params.size)
        .await?;
    Ok(Json(feed.into()))
}

/// POST /products/:post_id/like/:user_id
async fn like_post(
    State(state): State<AppState>,
    Path((post_id, user_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let service = LikeService::new(state.db.clone());
    service.like(&post_id, &user_id).await?;
    Ok(StatusCode::OK)
}

/// POST /products/:post_id/unlike/:user_id
async fn unlike_post(
    State(state): State<AppState>,
    Path((post_id, user_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let service = LikeService::new(state.db.clone());
    service.unlike(&post_id, &user_id).await?;
    Ok(StatusCode::OK)
}
