//! Post model, listing rows, and write DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Visibility state of a post at a given instant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Published,
    Draft,
    Trashed,
}

impl PostStatus {
    /// Derive the status from the row's timestamps.
    pub fn of(
        published_at: Option<DateTime<Utc>>,
        deleted_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        if deleted_at.is_some() {
            return Self::Trashed;
        }
        match published_at {
            Some(at) if at <= now => Self::Published,
            _ => Self::Draft,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "published" => Some(Self::Published),
            "draft" => Some(Self::Draft),
            "trashed" => Some(Self::Trashed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub body: String,
    pub published_at: Option<DateTime<Utc>>,
    pub view_count: i64,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing row: the columns a table or index card needs, plus the author's
/// name and the post's category ids.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PostSummary {
    pub id: i64,
    pub user_id: i64,
    pub author_name: String,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub view_count: i64,
    pub category_ids: Vec<i64>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Full post for the public detail page.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PostDetail {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub post: Post,
    pub author_name: String,
    pub category_ids: Vec<i64>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePost {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(max = 500))]
    pub excerpt: Option<String>,
    #[validate(length(min = 1))]
    pub body: String,
    /// Absent means the post is saved as a draft.
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub category_ids: Vec<i64>,
}

/// Partial update. The slug is fixed at creation and cannot be changed.
#[derive(Debug, Clone, Deserialize, Validate, Default)]
pub struct UpdatePost {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(length(max = 500))]
    pub excerpt: Option<String>,
    #[validate(length(min = 1))]
    pub body: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    /// Move the post back to draft. Takes precedence over `published_at`.
    #[serde(default)]
    pub unpublish: bool,
    pub category_ids: Option<Vec<i64>>,
}
