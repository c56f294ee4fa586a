pub mod config;
pub mod db;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::{AppConfig, ListingConfig};
use crate::services::page_size::PageSizeResolver;

/// Shared application state passed to all Axum handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: PgPool,
    pub redis: redis::Client,
    pub config: AppConfig,
    pub pages: PageSizeResolver,
}

impl AppState {
    pub fn new(db: PgPool, redis: redis::Client, config: AppConfig, listing: ListingConfig) -> Self {
        Self {
            db,
            redis,
            config,
            pages: PageSizeResolver::new(Arc::new(listing)),
        }
    }
}
