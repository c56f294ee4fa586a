//! Background post export to CSV.
//!
//! Job state lives in the `post_exports` table; the worker is a detached
//! task that pages through the same scoped query the admin listing uses.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::middleware::rbac::AdminAccess;
use crate::models::export::{ExportStatus, PostExport};
use crate::models::pagination::PageRequest;
use crate::models::post::{PostStatus, PostSummary};
use crate::services::post as post_service;
use crate::services::post_scope::FilterCriteria;

/// Rows fetched per page while exporting.
const EXPORT_BATCH_SIZE: i64 = 500;

/// Column names, in `ExportRow` field order.
const EXPORT_HEADER: [&str; 8] = [
    "id",
    "title",
    "slug",
    "author",
    "status",
    "published_at",
    "view_count",
    "categories",
];

/// Filters an export was requested with, stored as the job's snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRequest {
    #[serde(flatten)]
    pub criteria: FilterCriteria,
    pub status: Option<PostStatus>,
}

/// One CSV line.
#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    id: i64,
    title: &'a str,
    slug: &'a str,
    author: &'a str,
    status: PostStatus,
    published_at: Option<DateTime<Utc>>,
    view_count: i64,
    categories: String,
}

impl<'a> ExportRow<'a> {
    fn new(post: &'a PostSummary, now: DateTime<Utc>) -> Self {
        Self {
            id: post.id,
            title: &post.title,
            slug: &post.slug,
            author: &post.author_name,
            status: PostStatus::of(post.published_at, post.deleted_at, now),
            published_at: post.published_at,
            view_count: post.view_count,
            categories: post
                .category_ids
                .iter()
                .map(i64::to_string)
                .collect::<Vec<_>>()
                .join(";"),
        }
    }
}

/// Create the export file with its header row, so an export matching no
/// posts still produces a readable CSV.
pub fn create_writer(path: &Path) -> Result<csv::Writer<File>, AppError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .map_err(|e| AppError::Internal(format!("Cannot create export dir: {e}")))?;
    }
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| AppError::Internal(format!("Cannot open export file: {e}")))?;
    writer
        .write_record(EXPORT_HEADER)
        .map_err(|e| AppError::Internal(format!("CSV write failed: {e}")))?;
    Ok(writer)
}

/// Append posts to a CSV writer built by [`create_writer`].
pub fn write_rows<W: Write>(
    writer: &mut csv::Writer<W>,
    posts: &[PostSummary],
    now: DateTime<Utc>,
) -> Result<(), csv::Error> {
    for post in posts {
        writer.serialize(ExportRow::new(post, now))?;
    }
    Ok(())
}

/// Output path of an export job.
pub fn export_path(export_dir: &Path, id: Uuid) -> PathBuf {
    export_dir.join(format!("posts-{id}.csv"))
}

/// Record a pending export and start the worker.
pub async fn start(
    pool: &PgPool,
    access: &AdminAccess,
    export_dir: &Path,
    requested_by: i64,
    request: ExportRequest,
) -> Result<PostExport, AppError> {
    let filters = serde_json::to_value(&request)
        .map_err(|e| AppError::Internal(format!("Failed to snapshot export filters: {e}")))?;

    let export = sqlx::query_as::<_, PostExport>(
        r#"
        INSERT INTO post_exports (id, status, filters, requested_by)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::now_v7())
    .bind(ExportStatus::Pending)
    .bind(&filters)
    .bind(requested_by)
    .fetch_one(pool)
    .await?;

    tracing::info!(export_id = %export.id, requested_by, "Post export queued");

    let pool = pool.clone();
    let access = *access;
    let path = export_path(export_dir, export.id);
    let id = export.id;
    tokio::spawn(async move {
        run(&pool, &access, id, &path, &request).await;
    });

    Ok(export)
}

pub async fn find(pool: &PgPool, _access: &AdminAccess, id: Uuid) -> Result<PostExport, AppError> {
    sqlx::query_as::<_, PostExport>("SELECT * FROM post_exports WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Export not found".to_string()))
}

async fn run(pool: &PgPool, access: &AdminAccess, id: Uuid, path: &Path, request: &ExportRequest) {
    if let Err(e) = mark(pool, id, ExportStatus::Running, None, None, None).await {
        tracing::error!(error = %e, export_id = %id, "Failed to start export");
        return;
    }

    let outcome = write_export(pool, access, path, request).await;

    let marked = match outcome {
        Ok(rows) => {
            tracing::info!(export_id = %id, rows, path = %path.display(), "Post export completed");
            let file = path.to_string_lossy().into_owned();
            mark(pool, id, ExportStatus::Completed, Some(file), Some(rows), None).await
        }
        Err(e) => {
            tracing::error!(error = %e, export_id = %id, "Post export failed");
            mark(pool, id, ExportStatus::Failed, None, None, Some(e.to_string())).await
        }
    };

    if let Err(e) = marked {
        tracing::error!(error = %e, export_id = %id, "Failed to record export outcome");
    }
}

/// Run file work on the blocking pool.
async fn blocking<T, F>(work: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::Internal(format!("Export file task failed: {e}")))?
}

async fn write_export(
    pool: &PgPool,
    access: &AdminAccess,
    path: &Path,
    request: &ExportRequest,
) -> Result<i64, AppError> {
    let target = path.to_path_buf();
    let mut writer = blocking(move || create_writer(&target)).await?;

    let now = Utc::now();
    let query = post_service::admin_query(access, now, &request.criteria, request.status);

    let mut rows = 0i64;
    let mut page = 1;
    loop {
        let batch = PageRequest::new(page, EXPORT_BATCH_SIZE, vec![EXPORT_BATCH_SIZE]);
        let result = post_service::list(pool, &query, &batch).await?;
        rows += result.items.len() as i64;
        let total_pages = result.total_pages;

        let items = result.items;
        writer = blocking(move || {
            write_rows(&mut writer, &items, now)
                .map_err(|e| AppError::Internal(format!("CSV write failed: {e}")))?;
            Ok(writer)
        })
        .await?;

        if page >= total_pages {
            break;
        }
        page += 1;
    }

    blocking(move || {
        writer
            .flush()
            .map_err(|e| AppError::Internal(format!("CSV flush failed: {e}")))
    })
    .await?;
    Ok(rows)
}

async fn mark(
    pool: &PgPool,
    id: Uuid,
    status: ExportStatus,
    file_path: Option<String>,
    row_count: Option<i64>,
    error: Option<String>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE post_exports SET
            status = $2,
            file_path = COALESCE($3, file_path),
            row_count = COALESCE($4, row_count),
            error = $5,
            finished_at = CASE WHEN $6 THEN NOW() ELSE finished_at END
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(status)
    .bind(file_path)
    .bind(row_count)
    .bind(error)
    .bind(status.is_finished())
    .execute(pool)
    .await?;
    Ok(())
}
