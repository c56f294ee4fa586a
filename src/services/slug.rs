//! Unique slug allocation for posts.
//!
//! Uniqueness is checked against the unscoped posts table, so drafts and
//! trashed posts keep their slugs reserved.

use std::future::Future;

use sqlx::PgConnection;

/// Slugs that would shadow resource routes.
pub const RESERVED_SLUGS: &[&str] = &[
    "index", "create", "store", "show", "edit", "update", "destroy",
];

/// Suffix appended to a reserved slug.
pub const RESERVED_SUFFIX: &str = "-post";

/// Base slug used when a title has no sluggable characters.
pub const EMPTY_TITLE_SLUG: &str = "post";

/// Maximum slug length before any numeric suffix.
const MAX_SLUG_LENGTH: usize = 200;

/// Generate a URL-safe slug from a title: transliterated to ASCII,
/// lower-cased, punctuation removed, whitespace runs hyphenated.
pub fn slugify(title: &str) -> String {
    let spelled = title.replace('@', " at ");
    let ascii = deunicode::deunicode_with_tofu(&spelled, "");

    let mut folded = String::with_capacity(ascii.len());
    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() {
            folded.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c == '-' || c == '_' {
            folded.push('-');
        }
    }

    let slug = folded
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    if slug.len() <= MAX_SLUG_LENGTH {
        slug
    } else {
        slug[..MAX_SLUG_LENGTH].trim_end_matches('-').to_string()
    }
}

/// Check if slug shadows a resource route.
pub fn is_reserved_slug(slug: &str) -> bool {
    RESERVED_SLUGS.contains(&slug)
}

/// Slug for a title before any collision handling.
pub fn base_slug(title: &str) -> String {
    let slug = slugify(title);
    if slug.is_empty() {
        EMPTY_TITLE_SLUG.to_string()
    } else if is_reserved_slug(&slug) {
        format!("{slug}{RESERVED_SUFFIX}")
    } else {
        slug
    }
}

/// Lookups the allocator needs, answered without visibility restrictions.
pub trait SlugStore {
    fn slug_exists(&mut self, slug: &str) -> impl Future<Output = Result<bool, sqlx::Error>> + Send;

    /// Highest post id ever stored, 0 when empty.
    fn max_post_id(&mut self) -> impl Future<Output = Result<i64, sqlx::Error>> + Send;
}

impl SlugStore for PgConnection {
    async fn slug_exists(&mut self, slug: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM posts WHERE slug = $1)")
            .bind(slug)
            .fetch_one(&mut *self)
            .await
    }

    async fn max_post_id(&mut self) -> Result<i64, sqlx::Error> {
        let max = sqlx::query_scalar::<_, Option<i64>>("SELECT MAX(id) FROM posts")
            .fetch_one(&mut *self)
            .await?;
        Ok(max.unwrap_or(0))
    }
}

/// Allocate a slug for `title`: the base slug when free, otherwise the base
/// slug suffixed with `max(id) + 1`.
pub async fn allocate<S: SlugStore + ?Sized>(store: &mut S, title: &str) -> Result<String, sqlx::Error> {
    allocate_attempt(store, title, 0).await
}

/// Allocation for the `attempt`-th try after a unique-constraint conflict.
/// Each retry bumps the numeric suffix past the previous candidate.
pub async fn allocate_attempt<S: SlugStore + ?Sized>(
    store: &mut S,
    title: &str,
    attempt: u32,
) -> Result<String, sqlx::Error> {
    let slug = base_slug(title);
    if !store.slug_exists(&slug).await? {
        return Ok(slug);
    }

    let next = store.max_post_id().await? + 1 + i64::from(attempt);
    tracing::debug!(slug = %slug, suffix = next, "Slug taken, appending id suffix");
    Ok(format!("{slug}-{next}"))
}
