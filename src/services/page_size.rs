//! Per-page resolution: turns a raw request value into a validated page size.
//!
//! Invalid input is never an error here. Anything that is not an exact member
//! of the context's allowed set falls back to the context default.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::ListingConfig;
use crate::models::pagination::PageRequest;

/// Resolve the per-page value for a request.
pub fn resolve(requested: Option<i64>, allowed: &[i64], context_default: i64) -> i64 {
    match requested {
        Some(value) if value > 0 && allowed.contains(&value) => value,
        _ => context_default,
    }
}

/// Allowed per-page values for rendering a selector: de-duplicated, order
/// preserved, and always containing the default exactly once.
pub fn options(allowed: &[i64], context_default: i64) -> Vec<i64> {
    let mut out: Vec<i64> = Vec::with_capacity(allowed.len() + 1);
    for &value in allowed {
        if !out.contains(&value) {
            out.push(value);
        }
    }

    if !out.contains(&context_default) {
        // Keep an ascending list ascending; otherwise append.
        let ascending = out.windows(2).all(|w| w[0] < w[1]);
        let at = if ascending {
            out.iter()
                .position(|&v| v > context_default)
                .unwrap_or(out.len())
        } else {
            out.len()
        };
        out.insert(at, context_default);
    }

    out
}

/// Parse a raw request value as a positive integer.
pub fn parse_requested(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|&v| v > 0)
}

/// Parse a raw page number; anything unusable is page 1.
pub fn parse_page(raw: Option<&str>) -> i64 {
    parse_requested(raw).unwrap_or(1)
}

/// Pagination resolution service, built once and injected into handlers.
#[derive(Debug, Clone)]
pub struct PageSizeResolver {
    config: Arc<ListingConfig>,
}

impl PageSizeResolver {
    pub fn new(config: Arc<ListingConfig>) -> Self {
        Self { config }
    }

    /// Resolve the page and per-page values for `context` from raw query
    /// parameters, using the context's own parameter names.
    pub fn resolve_request(&self, context: &str, query: &HashMap<String, String>) -> PageRequest {
        let default = self.config.context_default(context);
        let allowed = self.config.context_options(context);

        let raw = query.get(self.config.query_param(context)).map(String::as_str);
        let requested = parse_requested(raw);
        let per_page = resolve(requested, &allowed, default);

        if raw.is_some() && requested != Some(per_page) {
            tracing::debug!(
                context,
                requested = raw.unwrap_or_default(),
                per_page,
                "Coerced per-page to context default"
            );
        }

        let page = parse_page(query.get(self.config.page_param(context)).map(String::as_str));

        PageRequest::new(page, per_page, options(&allowed, default))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::listing::{contexts, FALLBACK_PER_PAGE};
    use proptest::prelude::*;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn resolver() -> PageSizeResolver {
        PageSizeResolver::new(Arc::new(ListingConfig::default()))
    }

    #[test]
    fn resolve_absent_uses_default() {
        assert_eq!(resolve(None, &[12, 18, 24], 12), 12);
    }

    #[test]
    fn resolve_requires_exact_member() {
        assert_eq!(resolve(Some(20), &[12, 18, 24], 12), 12);
        assert_eq!(resolve(Some(0), &[0, 12], 12), 12);
        assert_eq!(resolve(Some(-18), &[12, 18], 12), 12);
        assert_eq!(resolve(Some(24), &[12, 18, 24], 12), 24);
    }

    #[test]
    fn options_inserts_missing_default() {
        assert_eq!(options(&[10, 20, 50], 15), vec![10, 15, 20, 50]);
        assert_eq!(options(&[10, 20], 100), vec![10, 20, 100]);
        assert_eq!(options(&[50, 10], 20), vec![50, 10, 20]);
    }

    #[test]
    fn options_deduplicates_in_order() {
        assert_eq!(options(&[24, 12, 24, 12, 36], 12), vec![24, 12, 36]);
    }

    #[test]
    fn parse_requested_rejects_garbage() {
        assert_eq!(parse_requested(Some("18")), Some(18));
        assert_eq!(parse_requested(Some(" 18 ")), Some(18));
        assert_eq!(parse_requested(Some("abc")), None);
        assert_eq!(parse_requested(Some("")), None);
        assert_eq!(parse_requested(Some("-3")), None);
        assert_eq!(parse_requested(Some("0")), None);
        assert_eq!(parse_requested(Some("1.5")), None);
        assert_eq!(parse_requested(None), None);
    }

    #[test]
    fn parse_page_defaults_to_first() {
        assert_eq!(parse_page(Some("3")), 3);
        assert_eq!(parse_page(Some("0")), 1);
        assert_eq!(parse_page(Some("x")), 1);
        assert_eq!(parse_page(None), 1);
    }

    #[test]
    fn posts_context_accepts_allowed_value() {
        let req = resolver().resolve_request(contexts::POSTS, &query(&[("per_page", "18")]));
        assert_eq!(req.per_page(), 18);
        assert_eq!(req.options(), &[12, 18, 24, 36]);
        assert_eq!(req.current_page(), 1);
    }

    #[test]
    fn comments_context_rejects_unlisted_value() {
        let req = resolver().resolve_request(
            contexts::COMMENTS,
            &query(&[("comments_per_page", "999"), ("comments_page", "2")]),
        );
        assert_eq!(req.per_page(), 10);
        assert_eq!(req.current_page(), 2);
    }

    #[test]
    fn comments_context_ignores_post_param() {
        let req = resolver().resolve_request(
            contexts::COMMENTS,
            &query(&[("per_page", "20"), ("page", "4")]),
        );
        assert_eq!(req.per_page(), 10);
        assert_eq!(req.current_page(), 1);
    }

    #[test]
    fn unknown_context_uses_fallback() {
        let req = resolver().resolve_request("tags", &query(&[("per_page", "50")]));
        assert_eq!(req.per_page(), FALLBACK_PER_PAGE);
        assert_eq!(req.options(), &[FALLBACK_PER_PAGE]);
    }

    proptest! {
        #[test]
        fn resolve_non_member_returns_default(
            allowed in proptest::collection::vec(1i64..200, 1..8),
            default in 1i64..200,
            requested in any::<i64>(),
        ) {
            prop_assume!(!allowed.contains(&requested));
            prop_assert_eq!(resolve(Some(requested), &allowed, default), default);
        }

        #[test]
        fn resolve_member_is_identity(
            allowed in proptest::collection::vec(1i64..200, 1..8),
            default in 1i64..200,
            pick in any::<proptest::sample::Index>(),
        ) {
            let requested = allowed[pick.index(allowed.len())];
            prop_assert_eq!(resolve(Some(requested), &allowed, default), requested);
        }

        #[test]
        fn options_contain_default_once(
            allowed in proptest::collection::vec(1i64..50, 0..10),
            default in 1i64..50,
        ) {
            let opts = options(&allowed, default);
            prop_assert_eq!(opts.iter().filter(|&&v| v == default).count(), 1);
            for value in &allowed {
                prop_assert_eq!(opts.iter().filter(|&&v| v == *value).count(), 1);
            }
        }
    }
}
