//! Back-office routes. Every listing here runs under the admin context and
//! may widen past the published-only view; creating and editing posts is
//! also open to authors.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::config::listing::contexts;
use crate::errors::{ApiResponse, AppError};
use crate::middleware::rbac::{RequireAdmin, RequireAuthor};
use crate::models::category::{Category, CategorySummary, CreateCategory};
use crate::models::comment::AdminComment;
use crate::models::export::PostExport;
use crate::models::pagination::PagedResult;
use crate::models::post::{CreatePost, Post, PostStatus, PostSummary, UpdatePost};
use crate::models::user::{User, UserRole};
use crate::services::export::{self as export_service, ExportRequest};
use crate::services::post_scope::FilterCriteria;
use crate::services::user::{self as user_service, UserFilters};
use crate::services::{
    category as category_service, comment as comment_service, post as post_service,
};
use crate::AppState;

fn status_filter(params: &HashMap<String, String>) -> Option<PostStatus> {
    params.get("status").and_then(|raw| PostStatus::parse(raw))
}

/// GET /api/v1/admin/posts: every untrashed post, or one status partition
/// with `?status=published|draft|trashed`.
pub async fn list_posts(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<ApiResponse<PagedResult<PostSummary>>>, AppError> {
    let page = state.pages.resolve_request(contexts::ADMIN, &params);
    let criteria = FilterCriteria::from_query(&params);
    let query = post_service::admin_query(
        &admin.access(),
        Utc::now(),
        &criteria,
        status_filter(&params),
    );

    let result = post_service::list(&state.db, &query, &page).await?;
    Ok(ApiResponse::success(result))
}

/// POST /api/v1/admin/posts
pub async fn create_post(
    State(state): State<AppState>,
    RequireAuthor(author): RequireAuthor,
    Json(body): Json<CreatePost>,
) -> Result<Json<ApiResponse<Post>>, AppError> {
    body.validate()?;
    let post = post_service::create(&state.db, author.id, &body).await?;
    Ok(ApiResponse::success(post))
}

/// PUT /api/v1/admin/posts/{id}: authors edit their own posts, admins any.
pub async fn update_post(
    State(state): State<AppState>,
    RequireAuthor(editor): RequireAuthor,
    Path(id): Path<i64>,
    Json(body): Json<UpdatePost>,
) -> Result<Json<ApiResponse<Post>>, AppError> {
    body.validate()?;
    let can_edit_any = editor.role == UserRole::Admin;
    let post = post_service::update(&state.db, id, editor.id, can_edit_any, &body).await?;
    Ok(ApiResponse::success(post))
}

/// DELETE /api/v1/admin/posts/{id}: move to trash.
pub async fn delete_post(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    post_service::soft_delete(&state.db, &admin.access(), id).await?;
    Ok(ApiResponse::success(()))
}

/// POST /api/v1/admin/posts/{id}/restore
pub async fn restore_post(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Post>>, AppError> {
    let post = post_service::restore(&state.db, &admin.access(), id).await?;
    Ok(ApiResponse::success(post))
}

/// POST /api/v1/admin/posts/export: queue a CSV export of the posts the
/// same query string would list.
pub async fn start_export(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<ApiResponse<PostExport>>, AppError> {
    let request = ExportRequest {
        criteria: FilterCriteria::from_query(&params),
        status: status_filter(&params),
    };

    let export = export_service::start(
        &state.db,
        &admin.access(),
        &state.config.export_dir,
        admin.0.id,
        request,
    )
    .await?;
    Ok(ApiResponse::success(export))
}

/// GET /api/v1/admin/exports/{id}
pub async fn export_status(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<PostExport>>, AppError> {
    let export = export_service::find(&state.db, &admin.access(), id).await?;
    Ok(ApiResponse::success(export))
}

/// GET /api/v1/admin/categories
pub async fn list_categories(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<ApiResponse<PagedResult<CategorySummary>>>, AppError> {
    let page = state.pages.resolve_request(contexts::ADMIN, &params);
    let result = category_service::list(&state.db, &page).await?;
    Ok(ApiResponse::success(result))
}

/// POST /api/v1/admin/categories
pub async fn create_category(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Json(body): Json<CreateCategory>,
) -> Result<Json<ApiResponse<Category>>, AppError> {
    body.validate()?;
    let category = category_service::create(&state.db, &admin.access(), &body).await?;
    Ok(ApiResponse::success(category))
}

/// DELETE /api/v1/admin/categories/{id}
pub async fn delete_category(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    category_service::delete(&state.db, &admin.access(), id).await?;
    Ok(ApiResponse::success(()))
}

/// GET /api/v1/admin/comments
pub async fn list_comments(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<ApiResponse<PagedResult<AdminComment>>>, AppError> {
    let page = state.pages.resolve_request(contexts::ADMIN, &params);
    let result = comment_service::list_all(&state.db, &admin.access(), &page).await?;
    Ok(ApiResponse::success(result))
}

/// DELETE /api/v1/admin/comments/{id}
pub async fn delete_comment(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    comment_service::soft_delete(&state.db, &admin.access(), id).await?;
    Ok(ApiResponse::success(()))
}

/// GET /api/v1/admin/users?search=&role=
pub async fn list_users(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<ApiResponse<PagedResult<User>>>, AppError> {
    let page = state.pages.resolve_request(contexts::ADMIN, &params);
    let filters = UserFilters::from_query(&params);
    let result = user_service::list(&state.db, &admin.access(), &filters, &page).await?;
    Ok(ApiResponse::success(result))
}
