//! Per-context pagination settings for every listing surface.
//!
//! The store is built once at startup and shared read-only behind an `Arc`.
//! Lookups never fail: an unknown context name resolves to the global
//! fallback so that a listing is always renderable.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Per-page value used when a context is not configured at all.
pub const FALLBACK_PER_PAGE: i64 = 15;

/// Request field carrying the desired per-page value.
pub const DEFAULT_QUERY_PARAM: &str = "per_page";

/// Request field carrying the 1-indexed page number.
pub const DEFAULT_PAGE_PARAM: &str = "page";

/// Names of the built-in listing contexts.
pub mod contexts {
    pub const POSTS: &str = "posts";
    pub const CATEGORIES: &str = "categories";
    pub const COMMENTS: &str = "comments";
    pub const ADMIN: &str = "admin";
}

/// Errors raised while loading listing configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read listing config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed listing config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid listing context '{context}': {reason}")]
    InvalidContext { context: String, reason: String },
}

/// A named listing surface and its pagination defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingContext {
    name: String,
    default_per_page: i64,
    options: Vec<i64>,
    query_param: String,
    page_param: String,
}

impl ListingContext {
    /// Build a context, rejecting non-positive sizes and empty option lists.
    pub fn new(
        name: impl Into<String>,
        default_per_page: i64,
        options: Vec<i64>,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        if default_per_page <= 0 {
            return Err(ConfigError::InvalidContext {
                context: name,
                reason: format!("default must be positive, got {default_per_page}"),
            });
        }
        if options.is_empty() {
            return Err(ConfigError::InvalidContext {
                context: name,
                reason: "options must not be empty".to_string(),
            });
        }
        if let Some(bad) = options.iter().find(|&&o| o <= 0) {
            return Err(ConfigError::InvalidContext {
                context: name,
                reason: format!("options must be positive, got {bad}"),
            });
        }

        Ok(Self {
            name,
            default_per_page,
            options,
            query_param: DEFAULT_QUERY_PARAM.to_string(),
            page_param: DEFAULT_PAGE_PARAM.to_string(),
        })
    }

    /// Override the request field names for this context.
    pub fn with_params(mut self, query_param: &str, page_param: &str) -> Self {
        self.query_param = query_param.to_string();
        self.page_param = page_param.to_string();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default_per_page(&self) -> i64 {
        self.default_per_page
    }

    /// Allowed per-page values exactly as configured.
    pub fn options(&self) -> &[i64] {
        &self.options
    }

    pub fn query_param(&self) -> &str {
        &self.query_param
    }

    pub fn page_param(&self) -> &str {
        &self.page_param
    }
}

/// On-disk shape of a single context entry.
#[derive(Debug, Deserialize)]
struct ContextSettings {
    default: i64,
    options: Vec<i64>,
    query_param: Option<String>,
    page_param: Option<String>,
}

/// On-disk shape of the whole document.
#[derive(Debug, Deserialize)]
struct ListingSettings {
    #[serde(default = "default_fallback")]
    fallback_per_page: i64,
    #[serde(default)]
    contexts: HashMap<String, ContextSettings>,
}

fn default_fallback() -> i64 {
    FALLBACK_PER_PAGE
}

/// Immutable map from context name to pagination settings.
#[derive(Debug, Clone)]
pub struct ListingConfig {
    fallback_per_page: i64,
    contexts: HashMap<String, ListingContext>,
}

impl Default for ListingConfig {
    fn default() -> Self {
        let builtin = [
            (contexts::POSTS, 12, vec![12, 18, 24, 36], DEFAULT_QUERY_PARAM, DEFAULT_PAGE_PARAM),
            (contexts::CATEGORIES, 15, vec![15, 30, 45], DEFAULT_QUERY_PARAM, DEFAULT_PAGE_PARAM),
            (contexts::COMMENTS, 10, vec![10, 20, 50], "comments_per_page", "comments_page"),
            (contexts::ADMIN, 20, vec![10, 20, 50, 100], DEFAULT_QUERY_PARAM, DEFAULT_PAGE_PARAM),
        ];

        let contexts = builtin
            .into_iter()
            .map(|(name, default, options, query_param, page_param)| {
                let context = ListingContext {
                    name: name.to_string(),
                    default_per_page: default,
                    options,
                    query_param: query_param.to_string(),
                    page_param: page_param.to_string(),
                };
                (name.to_string(), context)
            })
            .collect();

        Self {
            fallback_per_page: FALLBACK_PER_PAGE,
            contexts,
        }
    }
}

impl ListingConfig {
    /// Build a store from explicit contexts.
    pub fn new(fallback_per_page: i64, contexts: Vec<ListingContext>) -> Result<Self, ConfigError> {
        if fallback_per_page <= 0 {
            return Err(ConfigError::InvalidContext {
                context: "<fallback>".to_string(),
                reason: format!("fallback must be positive, got {fallback_per_page}"),
            });
        }
        Ok(Self {
            fallback_per_page,
            contexts: contexts
                .into_iter()
                .map(|c| (c.name.clone(), c))
                .collect(),
        })
    }

    /// Parse a JSON document. Contexts it names replace the built-in ones;
    /// contexts it omits keep their built-in settings.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: ListingSettings = serde_json::from_str(json)?;
        let mut config = Self::default();
        if settings.fallback_per_page <= 0 {
            return Err(ConfigError::InvalidContext {
                context: "<fallback>".to_string(),
                reason: format!("fallback must be positive, got {}", settings.fallback_per_page),
            });
        }
        config.fallback_per_page = settings.fallback_per_page;

        for (name, entry) in settings.contexts {
            let mut context = ListingContext::new(name.clone(), entry.default, entry.options)?;
            if let Some(param) = entry.query_param {
                context.query_param = param;
            }
            if let Some(param) = entry.page_param {
                context.page_param = param;
            }
            config.contexts.insert(name, context);
        }

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&raw)?;
        tracing::info!(path = %path.display(), contexts = config.contexts.len(), "Loaded listing config");
        Ok(config)
    }

    pub fn context(&self, name: &str) -> Option<&ListingContext> {
        self.contexts.get(name)
    }

    pub fn fallback_per_page(&self) -> i64 {
        self.fallback_per_page
    }

    /// Default per-page for a context, or the global fallback.
    pub fn context_default(&self, name: &str) -> i64 {
        self.context(name)
            .map(ListingContext::default_per_page)
            .unwrap_or(self.fallback_per_page)
    }

    /// Configured options for a context, or just the global fallback.
    pub fn context_options(&self, name: &str) -> Vec<i64> {
        self.context(name)
            .map(|c| c.options.clone())
            .unwrap_or_else(|| vec![self.fallback_per_page])
    }

    /// Request field carrying the per-page value for a context.
    pub fn query_param(&self, name: &str) -> &str {
        self.context(name)
            .map(ListingContext::query_param)
            .unwrap_or(DEFAULT_QUERY_PARAM)
    }

    /// Request field carrying the page number for a context.
    pub fn page_param(&self, name: &str) -> &str {
        self.context(name)
            .map(ListingContext::page_param)
            .unwrap_or(DEFAULT_PAGE_PARAM)
    }
}
