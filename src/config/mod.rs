use std::env;
use std::path::PathBuf;

pub mod listing;

pub use listing::{ConfigError, ListingConfig, ListingContext};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub redis_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_access_token_expiry_secs: i64,
    pub frontend_url: String,
    pub export_dir: PathBuf,
    pub view_cache_ttl_secs: u64,
    /// Optional JSON document overriding the built-in listing contexts.
    pub listing_config_path: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")?,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            host: env::var("BACKEND_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("BACKEND_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
            jwt_secret: env::var("JWT_SECRET")?,
            jwt_access_token_expiry_secs: env::var("JWT_ACCESS_TOKEN_EXPIRY_SECS")
                .unwrap_or_else(|_| "900".to_string())
                .parse()
                .unwrap_or(900),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "https://localhost:5173".to_string()),
            export_dir: env::var("EXPORT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./exports")),
            view_cache_ttl_secs: env::var("VIEW_CACHE_TTL_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .unwrap_or(300),
            listing_config_path: env::var("LISTING_CONFIG_PATH").ok().map(PathBuf::from),
        })
    }

    /// Load the listing contexts, falling back to the built-in set when no
    /// override file is configured.
    pub fn listing_config(&self) -> Result<ListingConfig, ConfigError> {
        match &self.listing_config_path {
            Some(path) => ListingConfig::from_file(path),
            None => Ok(ListingConfig::default()),
        }
    }
}
