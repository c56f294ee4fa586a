//! Composable restrictions and ordering for post listings.
//!
//! A [`PostQuery`] never executes anything. It renders its conditions into a
//! `sqlx::QueryBuilder` for the database. Every listing starts from a
//! visibility base (published and not trashed for the public); widening it
//! requires an [`AdminAccess`] token.

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, QueryBuilder};

use crate::middleware::rbac::AdminAccess;

/// Ordering by publication timestamp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

impl SortDirection {
    /// Parse an `asc`/`desc` token.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(Self::Ascending),
            "desc" => Some(Self::Descending),
            _ => None,
        }
    }

    fn sql(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// Optional listing filters taken from a request. Absent or empty fields
/// mean "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub category_ids: Vec<i64>,
    pub author_ids: Vec<i64>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub sort: SortDirection,
}

impl FilterCriteria {
    /// Read `categories`, `authors` (comma-separated ids), `from`, `to`
    /// (`YYYY-MM-DD`) and `sort` (`asc`|`desc`). Unparseable values and
    /// days the database cannot store are dropped rather than rejected.
    pub fn from_query(query: &HashMap<String, String>) -> Self {
        let date = |key: &str| {
            query.get(key).and_then(|raw| {
                let parsed = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                    .ok()
                    .filter(|&day| is_storable_day(day));
                if parsed.is_none() && !raw.trim().is_empty() {
                    tracing::debug!(param = key, value = %raw, "Ignoring unparseable date filter");
                }
                parsed
            })
        };

        Self {
            category_ids: parse_ids(query.get("categories")),
            author_ids: parse_ids(query.get("authors")),
            from: date("from"),
            to: date("to"),
            sort: query
                .get("sort")
                .and_then(|raw| SortDirection::parse(raw))
                .unwrap_or_default(),
        }
    }
}

fn parse_ids(raw: Option<&String>) -> Vec<i64> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    let mut ids: Vec<i64> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| match s.parse::<i64>() {
            Ok(id) => Some(id),
            Err(_) => {
                tracing::debug!(value = %s, "Ignoring unparseable id filter");
                None
            }
        })
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// First instant of `day` in UTC.
pub fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

/// Last representable instant of `day` in UTC (microsecond precision).
/// `None` for the last day chrono can represent.
pub fn end_of_day(day: NaiveDate) -> Option<DateTime<Utc>> {
    start_of_day(day)
        .checked_add_signed(Duration::days(1))?
        .checked_sub_signed(Duration::microseconds(1))
}

/// Earliest day a Postgres `timestamptz` holds: 4714-11-24 BC, Julian day 0.
fn earliest_storable_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(-4713, 11, 24).unwrap_or(NaiveDate::MIN)
}

/// Whether both ends of `day` can be bound as a `timestamptz`. The upper
/// Postgres limit (294276 AD) lies past anything chrono parses.
pub fn is_storable_day(day: NaiveDate) -> bool {
    day >= earliest_storable_day() && end_of_day(day).is_some()
}

/// A single restriction. SQL assumes the posts table is aliased `p`.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Scope {
    Slug(String),
    Categories(Vec<i64>),
    Authors(Vec<i64>),
    PublishedFrom(DateTime<Utc>),
    PublishedUntil(DateTime<Utc>),
    Published(DateTime<Utc>),
    Draft(DateTime<Utc>),
    NotTrashed,
    Trashed,
}

impl Scope {
    fn push_sql(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        match self {
            Scope::Slug(slug) => {
                qb.push("p.slug = ");
                qb.push_bind(slug.clone());
            }
            Scope::Categories(ids) => {
                qb.push(
                    "EXISTS (SELECT 1 FROM category_post cp \
                     WHERE cp.post_id = p.id AND cp.category_id = ANY(",
                );
                qb.push_bind(ids.clone());
                qb.push("))");
            }
            Scope::Authors(ids) => {
                qb.push("p.user_id = ANY(");
                qb.push_bind(ids.clone());
                qb.push(")");
            }
            Scope::PublishedFrom(at) => {
                qb.push("p.published_at >= ");
                qb.push_bind(*at);
            }
            Scope::PublishedUntil(at) => {
                qb.push("p.published_at <= ");
                qb.push_bind(*at);
            }
            Scope::Published(now) => {
                qb.push("(p.published_at IS NOT NULL AND p.published_at <= ");
                qb.push_bind(*now);
                qb.push(")");
            }
            Scope::Draft(now) => {
                qb.push("(p.published_at IS NULL OR p.published_at > ");
                qb.push_bind(*now);
                qb.push(")");
            }
            Scope::NotTrashed => {
                qb.push("p.deleted_at IS NULL");
            }
            Scope::Trashed => {
                qb.push("p.deleted_at IS NOT NULL");
            }
        }
    }
}

/// A non-executing post query: visibility base, optional scopes, ordering.
#[derive(Debug, Clone)]
pub struct PostQuery {
    now: DateTime<Utc>,
    base: Vec<Scope>,
    scopes: Vec<Scope>,
    sort: SortDirection,
}

impl PostQuery {
    /// Public view: published posts that are not trashed.
    pub fn public(now: DateTime<Utc>) -> Self {
        Self {
            now,
            base: vec![Scope::NotTrashed, Scope::Published(now)],
            scopes: Vec::new(),
            sort: SortDirection::default(),
        }
    }

    /// Back-office view: every post that is not trashed, drafts included.
    pub fn admin(_access: &AdminAccess, now: DateTime<Utc>) -> Self {
        Self {
            now,
            base: vec![Scope::NotTrashed],
            scopes: Vec::new(),
            sort: SortDirection::default(),
        }
    }

    /// Drop every visibility restriction, trashed rows included.
    pub fn unscoped(mut self, _access: &AdminAccess) -> Self {
        self.base.clear();
        self
    }

    /// Restrict to trashed rows only.
    pub fn only_trashed(mut self, access: &AdminAccess) -> Self {
        self = self.unscoped(access);
        self.scopes.push(Scope::Trashed);
        self
    }

    /// Exactly one post by slug.
    pub fn filter_by_slug(mut self, slug: &str) -> Self {
        self.scopes.push(Scope::Slug(slug.to_string()));
        self
    }

    /// Posts in ANY of the given categories. Empty is a no-op.
    pub fn filter_by_categories(mut self, ids: &[i64]) -> Self {
        if !ids.is_empty() {
            self.scopes.push(Scope::Categories(ids.to_vec()));
        }
        self
    }

    /// Posts written by any of the given users. Empty is a no-op.
    pub fn filter_by_authors(mut self, ids: &[i64]) -> Self {
        if !ids.is_empty() {
            self.scopes.push(Scope::Authors(ids.to_vec()));
        }
        self
    }

    /// Inclusive date range on the publication timestamp. Each bound is
    /// independent; `from` after `to` yields an empty result. A bound the
    /// database cannot store is dropped.
    pub fn filter_by_date_range(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        if let Some(from) = from.filter(|&day| is_storable_day(day)) {
            self.scopes.push(Scope::PublishedFrom(start_of_day(from)));
        }
        if let Some(until) = to.filter(|&day| is_storable_day(day)).and_then(end_of_day) {
            self.scopes.push(Scope::PublishedUntil(until));
        }
        self
    }

    pub fn sort_by_published_date(mut self, direction: SortDirection) -> Self {
        self.sort = direction;
        self
    }

    /// Publication timestamp set and not in the future.
    pub fn published(mut self) -> Self {
        self.scopes.push(Scope::Published(self.now));
        self
    }

    /// No publication timestamp, or one in the future.
    pub fn draft(mut self) -> Self {
        self.scopes.push(Scope::Draft(self.now));
        self
    }

    /// Apply every filter a request carries.
    pub fn apply(self, criteria: &FilterCriteria) -> Self {
        self.filter_by_categories(&criteria.category_ids)
            .filter_by_authors(&criteria.author_ids)
            .filter_by_date_range(criteria.from, criteria.to)
            .sort_by_published_date(criteria.sort)
    }

    fn conditions(&self) -> impl Iterator<Item = &Scope> {
        self.base.iter().chain(self.scopes.iter())
    }

    /// Append a `WHERE` clause for every active condition.
    pub fn push_where(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        for (i, scope) in self.conditions().enumerate() {
            qb.push(if i == 0 { " WHERE " } else { " AND " });
            scope.push_sql(qb);
        }
    }

    /// Append a stable `ORDER BY` on publication date, ties broken by id.
    pub fn push_order_by(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        let dir = self.sort.sql();
        qb.push(format!(
            " ORDER BY p.published_at {dir} NULLS LAST, p.id {dir}"
        ));
    }
}
