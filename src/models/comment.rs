//! Comment model and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub body: String,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Comment as shown in a post's thread.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CommentWithAuthor {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub author_name: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Comment as shown in the back-office moderation table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AdminComment {
    pub id: i64,
    pub post_id: i64,
    pub post_title: String,
    pub post_slug: String,
    pub user_id: i64,
    pub author_name: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateComment {
    #[validate(length(min = 1, max = 5000), custom(function = "not_blank"))]
    pub body: String,
}

/// Rejects text that is empty once surrounding whitespace is trimmed.
fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_comment_length_bounds() {
        assert!(CreateComment { body: String::new() }.validate().is_err());
        assert!(CreateComment { body: "x".repeat(5001) }.validate().is_err());
        assert!(CreateComment { body: "Nice post".to_string() }.validate().is_ok());
    }

    #[test]
    fn create_comment_rejects_whitespace_only_body() {
        assert!(CreateComment { body: "   \n\t ".to_string() }.validate().is_err());
        assert!(CreateComment { body: "  ok  ".to_string() }.validate().is_ok());
    }
}
