//! Post service: scoped listings, lookup, creation with slug allocation,
//! updates, soft delete and restore.

use chrono::{DateTime, Utc};
use sqlx::{Connection, PgConnection, PgPool, Postgres, QueryBuilder};

use crate::errors::AppError;
use crate::middleware::rbac::AdminAccess;
use crate::models::pagination::{PageRequest, PagedResult};
use crate::models::post::{CreatePost, Post, PostDetail, PostStatus, PostSummary, UpdatePost};
use crate::services::post_scope::{FilterCriteria, PostQuery};
use crate::services::slug;

/// Attempts at inserting a post before a slug conflict is reported.
const MAX_SLUG_ATTEMPTS: u32 = 3;

/// Name of the unique constraint on `posts.slug`.
const SLUG_CONSTRAINT: &str = "posts_slug_key";

const SUMMARY_SELECT: &str = "SELECT p.id, p.user_id, u.name AS author_name, p.title, p.slug, \
     p.excerpt, p.published_at, p.view_count, \
     ARRAY(SELECT c.category_id FROM category_post c WHERE c.post_id = p.id ORDER BY c.category_id) \
     AS category_ids, p.deleted_at \
     FROM posts p JOIN users u ON u.id = p.user_id";

const DETAIL_SELECT: &str = "SELECT p.*, u.name AS author_name, \
     ARRAY(SELECT c.category_id FROM category_post c WHERE c.post_id = p.id ORDER BY c.category_id) \
     AS category_ids \
     FROM posts p JOIN users u ON u.id = p.user_id";

/// Back-office query: request filters plus an optional status partition.
pub fn admin_query(
    access: &AdminAccess,
    now: DateTime<Utc>,
    criteria: &FilterCriteria,
    status: Option<PostStatus>,
) -> PostQuery {
    let query = PostQuery::admin(access, now);
    let query = match status {
        None => query,
        Some(PostStatus::Published) => query.published(),
        Some(PostStatus::Draft) => query.draft(),
        Some(PostStatus::Trashed) => query.only_trashed(access),
    };
    query.apply(criteria)
}

/// Run a scoped listing: one count and one bounded page fetch.
pub async fn list(
    pool: &PgPool,
    query: &PostQuery,
    page: &PageRequest,
) -> Result<PagedResult<PostSummary>, AppError> {
    let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM posts p");
    query.push_where(&mut count);
    let total = count.build_query_scalar::<i64>().fetch_one(pool).await?;

    let mut data = QueryBuilder::<Postgres>::new(SUMMARY_SELECT);
    query.push_where(&mut data);
    query.push_order_by(&mut data);
    data.push(" LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());

    let items = data
        .build_query_as::<PostSummary>()
        .fetch_all(pool)
        .await?;

    Ok(PagedResult::new(items, total, page))
}

/// Fetch the single post a query narrows to.
pub async fn find_one(pool: &PgPool, query: &PostQuery) -> Result<PostDetail, AppError> {
    let mut qb = QueryBuilder::<Postgres>::new(DETAIL_SELECT);
    query.push_where(&mut qb);
    qb.push(" LIMIT 1");

    qb.build_query_as::<PostDetail>()
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))
}

/// Published, untrashed post by slug.
pub async fn find_published_by_slug(pool: &PgPool, slug: &str) -> Result<PostDetail, AppError> {
    find_one(pool, &PostQuery::public(Utc::now()).filter_by_slug(slug)).await
}

/// Increment the stored view counter and return the new figure.
pub async fn record_view(pool: &PgPool, id: i64) -> Result<i64, AppError> {
    let views = sqlx::query_scalar::<_, i64>(
        "UPDATE posts SET view_count = view_count + 1 WHERE id = $1 RETURNING view_count",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;
    Ok(views)
}

fn is_slug_conflict(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.is_unique_violation() && db_err.constraint() == Some(SLUG_CONSTRAINT)
        }
        _ => false,
    }
}

/// Replace a post's category links, ignoring ids that do not exist.
async fn sync_categories(
    conn: &mut PgConnection,
    post_id: i64,
    category_ids: &[i64],
) -> Result<(), AppError> {
    sqlx::query("DELETE FROM category_post WHERE post_id = $1")
        .bind(post_id)
        .execute(&mut *conn)
        .await?;

    if !category_ids.is_empty() {
        sqlx::query(
            "INSERT INTO category_post (post_id, category_id) \
             SELECT $1, id FROM categories WHERE id = ANY($2)",
        )
        .bind(post_id)
        .bind(category_ids)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Create a post with a freshly allocated slug.
///
/// Allocation and insert run inside a savepoint. If a concurrent writer took
/// the slug first, the unique constraint rejects the insert, the savepoint
/// is rolled back, and allocation runs again.
pub async fn create(pool: &PgPool, author_id: i64, input: &CreatePost) -> Result<Post, AppError> {
    let mut tx = pool.begin().await?;

    let mut attempt = 0;
    let post = loop {
        if attempt >= MAX_SLUG_ATTEMPTS {
            return Err(AppError::Conflict(
                "Could not allocate a unique slug, retry the request".to_string(),
            ));
        }

        let mut savepoint = tx.begin().await?;
        let slug = slug::allocate_attempt(&mut *savepoint, &input.title, attempt).await?;

        let inserted = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (user_id, title, slug, excerpt, body, published_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(author_id)
        .bind(&input.title)
        .bind(&slug)
        .bind(&input.excerpt)
        .bind(&input.body)
        .bind(input.published_at)
        .fetch_one(&mut *savepoint)
        .await;

        match inserted {
            Ok(post) => {
                savepoint.commit().await?;
                break post;
            }
            Err(e) if is_slug_conflict(&e) => {
                savepoint.rollback().await?;
                tracing::warn!(slug = %slug, attempt, "Slug taken concurrently, retrying");
                attempt += 1;
            }
            Err(e) => return Err(e.into()),
        }
    };

    sync_categories(&mut tx, post.id, &input.category_ids).await?;
    tx.commit().await?;

    tracing::info!(post_id = post.id, slug = %post.slug, "Post created");
    Ok(post)
}

/// Update an untrashed post. Authors may edit only their own posts unless
/// `can_edit_any` is set. The slug never changes.
pub async fn update(
    pool: &PgPool,
    id: i64,
    editor_id: i64,
    can_edit_any: bool,
    input: &UpdatePost,
) -> Result<Post, AppError> {
    let mut tx = pool.begin().await?;

    let owner = sqlx::query_scalar::<_, i64>(
        "SELECT user_id FROM posts WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    if !can_edit_any && owner != editor_id {
        return Err(AppError::Forbidden(
            "Only the author may edit this post".to_string(),
        ));
    }

    let post = sqlx::query_as::<_, Post>(
        r#"
        UPDATE posts SET
            title = COALESCE($2, title),
            excerpt = COALESCE($3, excerpt),
            body = COALESCE($4, body),
            published_at = CASE WHEN $5 THEN NULL ELSE COALESCE($6, published_at) END,
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&input.title)
    .bind(&input.excerpt)
    .bind(&input.body)
    .bind(input.unpublish)
    .bind(input.published_at)
    .fetch_one(&mut *tx)
    .await?;

    if let Some(ref category_ids) = input.category_ids {
        sync_categories(&mut tx, id, category_ids).await?;
    }

    tx.commit().await?;
    Ok(post)
}

/// Move a post to the trash.
pub async fn soft_delete(pool: &PgPool, _access: &AdminAccess, id: i64) -> Result<(), AppError> {
    let result = sqlx::query(
        "UPDATE posts SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Post not found".to_string()));
    }
    tracing::info!(post_id = id, "Post trashed");
    Ok(())
}

/// Bring a trashed post back. Its slug was never released.
pub async fn restore(pool: &PgPool, _access: &AdminAccess, id: i64) -> Result<Post, AppError> {
    let post = sqlx::query_as::<_, Post>(
        "UPDATE posts SET deleted_at = NULL WHERE id = $1 AND deleted_at IS NOT NULL RETURNING *",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Trashed post not found".to_string()))?;

    tracing::info!(post_id = id, "Post restored");
    Ok(post)
}
