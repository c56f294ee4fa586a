//! Category service: listing with visible post counts, lookup, create, delete.

use chrono::Utc;
use sqlx::PgPool;

use crate::errors::AppError;
use crate::middleware::rbac::AdminAccess;
use crate::models::category::{Category, CategorySummary, CreateCategory};
use crate::models::pagination::{PageRequest, PagedResult};
use crate::services::slug::slugify;

/// List categories by name, each with its number of published posts.
pub async fn list(pool: &PgPool, page: &PageRequest) -> Result<PagedResult<CategorySummary>, AppError> {
    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM categories")
        .fetch_one(pool)
        .await?;

    let items = sqlx::query_as::<_, CategorySummary>(
        r#"
        SELECT c.id, c.name, c.slug,
            (SELECT COUNT(*) FROM category_post cp
             JOIN posts p ON p.id = cp.post_id
             WHERE cp.category_id = c.id
               AND p.deleted_at IS NULL
               AND p.published_at IS NOT NULL
               AND p.published_at <= $1) AS posts_count
        FROM categories c
        ORDER BY c.name ASC, c.id ASC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(Utc::now())
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    Ok(PagedResult::new(items, total, page))
}

pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Category, AppError> {
    sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE slug = $1")
        .bind(slug)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))
}

/// Create a category. Its slug is derived from the name and must be free.
pub async fn create(
    pool: &PgPool,
    _access: &AdminAccess,
    input: &CreateCategory,
) -> Result<Category, AppError> {
    let slug = slugify(&input.name);
    if slug.is_empty() {
        return Err(AppError::Validation(
            "Category name must contain letters or digits".to_string(),
        ));
    }

    sqlx::query_as::<_, Category>(
        "INSERT INTO categories (name, slug) VALUES ($1, $2) RETURNING *",
    )
    .bind(input.name.trim())
    .bind(&slug)
    .fetch_one(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            AppError::Conflict(format!("Category '{slug}' already exists"))
        }
        _ => AppError::Database(e),
    })
}

/// Delete a category; its post links go with it.
pub async fn delete(pool: &PgPool, _access: &AdminAccess, id: i64) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Category not found".to_string()));
    }
    tracing::info!(category_id = id, "Category deleted");
    Ok(())
}
