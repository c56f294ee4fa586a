//! User listing for the back-office.

use std::collections::HashMap;

use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::errors::AppError;
use crate::middleware::rbac::AdminAccess;
use crate::models::pagination::{PageRequest, PagedResult};
use crate::models::user::{User, UserRole};

/// Filters for listing users.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilters {
    pub search: Option<String>,
    pub role: Option<UserRole>,
}

impl UserFilters {
    /// Read `search` and `role`; an unknown role is ignored.
    pub fn from_query(query: &HashMap<String, String>) -> Self {
        Self {
            search: query
                .get("search")
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            role: query
                .get("role")
                .and_then(|raw| serde_json::from_str(&format!("\"{}\"", raw.trim())).ok()),
        }
    }

    fn push_where(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        let mut clauses = 0;

        if let Some(ref search) = self.search {
            qb.push(separator(&mut clauses));
            let pattern = format!("%{}%", escape_like(search));
            qb.push("(u.name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR u.email ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(role) = self.role {
            qb.push(separator(&mut clauses));
            qb.push("u.role = ").push_bind(role);
        }
    }
}

fn separator(clauses: &mut usize) -> &'static str {
    *clauses += 1;
    if *clauses == 1 {
        " WHERE "
    } else {
        " AND "
    }
}

fn escape_like(raw: &str) -> String {
    raw.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

pub async fn list(
    pool: &PgPool,
    _access: &AdminAccess,
    filters: &UserFilters,
    page: &PageRequest,
) -> Result<PagedResult<User>, AppError> {
    let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users u");
    filters.push_where(&mut count);
    let total = count.build_query_scalar::<i64>().fetch_one(pool).await?;

    let mut data = QueryBuilder::<Postgres>::new(
        "SELECT u.id, u.name, u.email, u.role, u.created_at FROM users u",
    );
    filters.push_where(&mut data);
    data.push(" ORDER BY u.name ASC, u.id ASC LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());

    let items = data.build_query_as::<User>().fetch_all(pool).await?;
    Ok(PagedResult::new(items, total, page))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn filters_from_query() {
        let filters = UserFilters::from_query(&query(&[("search", " ada "), ("role", "author")]));
        assert_eq!(filters.search.as_deref(), Some("ada"));
        assert_eq!(filters.role, Some(UserRole::Author));

        let ignored = UserFilters::from_query(&query(&[("search", "  "), ("role", "owner")]));
        assert_eq!(ignored, UserFilters::default());
    }

    #[test]
    fn renders_conditions() {
        let filters = UserFilters {
            search: Some("50%_off".to_string()),
            role: Some(UserRole::Admin),
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users u");
        filters.push_where(&mut qb);
        assert_eq!(
            qb.sql(),
            "SELECT COUNT(*) FROM users u WHERE (u.name ILIKE $1 OR u.email ILIKE $2) AND u.role = $3"
        );
    }

    #[test]
    fn escapes_like_wildcards() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }
}
