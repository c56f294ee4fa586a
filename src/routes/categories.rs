//! Public category routes.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;

use crate::config::listing::contexts;
use crate::errors::{ApiResponse, AppError};
use crate::models::category::CategorySummary;
use crate::models::pagination::PagedResult;
use crate::models::post::PostSummary;
use crate::services::post_scope::{FilterCriteria, PostQuery};
use crate::services::{category as category_service, post as post_service};
use crate::AppState;

/// GET /api/v1/categories
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<ApiResponse<PagedResult<CategorySummary>>>, AppError> {
    let page = state.pages.resolve_request(contexts::CATEGORIES, &params);
    let result = category_service::list(&state.db, &page).await?;
    Ok(ApiResponse::success(result))
}

/// GET /api/v1/categories/{slug}/posts: published posts of one category.
/// Other filters in the query string still apply; the category filter is
/// narrowed to this category.
pub async fn posts(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<ApiResponse<PagedResult<PostSummary>>>, AppError> {
    let category = category_service::find_by_slug(&state.db, &slug).await?;
    let page = state.pages.resolve_request(contexts::POSTS, &params);

    let criteria = FilterCriteria {
        category_ids: vec![category.id],
        ..FilterCriteria::from_query(&params)
    };
    let query = PostQuery::public(Utc::now()).apply(&criteria);

    let result = post_service::list(&state.db, &query, &page).await?;
    Ok(ApiResponse::success(result))
}
