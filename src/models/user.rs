//! User model with role-based access control.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Author,
    Reader,
}

impl UserRole {
    /// Whether this role may write posts.
    pub fn can_author(&self) -> bool {
        matches!(self, Self::Admin | Self::Author)
    }
}

/// User row as exposed to the back-office. Credentials live outside this
/// service and are never selected.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}
