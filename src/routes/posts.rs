//! Public post routes: the blog index, post pages, and comment threads.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use validator::Validate;

use crate::config::listing::contexts;
use crate::errors::{ApiResponse, AppError};
use crate::middleware::auth::CurrentUser;
use crate::models::comment::{Comment, CommentWithAuthor, CreateComment};
use crate::models::pagination::PagedResult;
use crate::models::post::{PostDetail, PostSummary};
use crate::services::post_scope::{FilterCriteria, PostQuery};
use crate::services::{comment as comment_service, post as post_service, view_cache};
use crate::AppState;

/// GET /api/v1/posts: published posts, filtered and paged.
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<ApiResponse<PagedResult<PostSummary>>>, AppError> {
    let page = state.pages.resolve_request(contexts::POSTS, &params);
    let criteria = FilterCriteria::from_query(&params);
    let query = PostQuery::public(Utc::now()).apply(&criteria);

    let result = post_service::list(&state.db, &query, &page).await?;
    Ok(ApiResponse::success(result))
}

/// GET /api/v1/posts/{slug}: one published post. Counts the view.
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<PostDetail>>, AppError> {
    let mut detail = post_service::find_published_by_slug(&state.db, &slug).await?;
    let post_id = detail.post.id;

    if let Some(views) = view_cache::cached_views(&state.redis, post_id).await {
        detail.post.view_count = detail.post.view_count.max(views);
    }
    view_cache::refresh_in_background(
        state.db.clone(),
        state.redis.clone(),
        post_id,
        state.config.view_cache_ttl_secs,
    );

    Ok(ApiResponse::success(detail))
}

/// GET /api/v1/posts/{slug}/comments
pub async fn comments(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<ApiResponse<PagedResult<CommentWithAuthor>>>, AppError> {
    let post = post_service::find_published_by_slug(&state.db, &slug).await?;
    let page = state.pages.resolve_request(contexts::COMMENTS, &params);

    let result = comment_service::list_for_post(&state.db, post.post.id, &page).await?;
    Ok(ApiResponse::success(result))
}

/// POST /api/v1/posts/{slug}/comments: any signed-in user may comment on a
/// published post.
pub async fn add_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(slug): Path<String>,
    Json(body): Json<CreateComment>,
) -> Result<Json<ApiResponse<Comment>>, AppError> {
    body.validate()?;
    let post = post_service::find_published_by_slug(&state.db, &slug).await?;

    let comment = comment_service::create(&state.db, post.post.id, user.id, &body).await?;
    Ok(ApiResponse::success(comment))
}
