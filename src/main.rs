use std::net::SocketAddr;

use anyhow::Context;
use folio::config::AppConfig;
use folio::AppState;
use mimalloc::MiMalloc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "folio=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config = AppConfig::from_env().context("Failed to load configuration")?;
    let listing = config
        .listing_config()
        .context("Failed to load listing configuration")?;

    let pool = folio::db::create_pool(&config.database_url, config.database_max_connections)
        .await
        .context("Failed to connect to database")?;
    folio::db::run_migrations(&pool).await?;

    let redis = redis::Client::open(config.redis_url.as_str())
        .context("Invalid REDIS_URL")?;

    let host: std::net::IpAddr = config.host.parse().context("Invalid BACKEND_HOST")?;
    let addr = SocketAddr::from((host, config.port));
    tracing::info!(host = %addr, "Starting Folio API server");

    let app = folio::routes::router(AppState::new(pool, redis, config, listing));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
