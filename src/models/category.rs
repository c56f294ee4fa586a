//! Category model and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

/// Category listing row with its number of visible posts.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CategorySummary {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub posts_count: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCategory {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}
