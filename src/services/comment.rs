//! Comment service: threads under a post and back-office moderation.

use sqlx::PgPool;

use crate::errors::AppError;
use crate::middleware::rbac::AdminAccess;
use crate::models::comment::{AdminComment, Comment, CommentWithAuthor, CreateComment};
use crate::models::pagination::{PageRequest, PagedResult};

/// Visible comments of one post, oldest first.
pub async fn list_for_post(
    pool: &PgPool,
    post_id: i64,
    page: &PageRequest,
) -> Result<PagedResult<CommentWithAuthor>, AppError> {
    let total = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM comments WHERE post_id = $1 AND deleted_at IS NULL",
    )
    .bind(post_id)
    .fetch_one(pool)
    .await?;

    let items = sqlx::query_as::<_, CommentWithAuthor>(
        r#"
        SELECT c.id, c.post_id, c.user_id, u.name AS author_name, c.body, c.created_at
        FROM comments c
        JOIN users u ON u.id = c.user_id
        WHERE c.post_id = $1 AND c.deleted_at IS NULL
        ORDER BY c.created_at ASC, c.id ASC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(post_id)
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    Ok(PagedResult::new(items, total, page))
}

pub async fn create(
    pool: &PgPool,
    post_id: i64,
    user_id: i64,
    input: &CreateComment,
) -> Result<Comment, AppError> {
    let comment = sqlx::query_as::<_, Comment>(
        "INSERT INTO comments (post_id, user_id, body) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(post_id)
    .bind(user_id)
    .bind(input.body.trim())
    .fetch_one(pool)
    .await?;

    tracing::debug!(comment_id = comment.id, post_id, "Comment added");
    Ok(comment)
}

/// Every visible comment across all posts, newest first.
pub async fn list_all(
    pool: &PgPool,
    _access: &AdminAccess,
    page: &PageRequest,
) -> Result<PagedResult<AdminComment>, AppError> {
    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments WHERE deleted_at IS NULL")
        .fetch_one(pool)
        .await?;

    let items = sqlx::query_as::<_, AdminComment>(
        r#"
        SELECT c.id, c.post_id, p.title AS post_title, p.slug AS post_slug,
            c.user_id, u.name AS author_name, c.body, c.created_at
        FROM comments c
        JOIN posts p ON p.id = c.post_id
        JOIN users u ON u.id = c.user_id
        WHERE c.deleted_at IS NULL
        ORDER BY c.created_at DESC, c.id DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    Ok(PagedResult::new(items, total, page))
}

pub async fn soft_delete(pool: &PgPool, _access: &AdminAccess, id: i64) -> Result<(), AppError> {
    let result = sqlx::query(
        "UPDATE comments SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Comment not found".to_string()));
    }
    Ok(())
}
