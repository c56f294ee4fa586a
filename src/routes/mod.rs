//! Route definitions for the Folio API.

pub mod admin;
pub mod categories;
pub mod health;
pub mod posts;

use axum::http::HeaderValue;
use axum::routing::{get, post, put};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::AppState;

/// Request bodies are small JSON documents.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/posts", get(posts::list))
        .route("/posts/{slug}", get(posts::show))
        .route(
            "/posts/{slug}/comments",
            get(posts::comments).post(posts::add_comment),
        )
        .route("/categories", get(categories::list))
        .route("/categories/{slug}/posts", get(categories::posts));

    let admin = Router::new()
        .route("/posts", get(admin::list_posts).post(admin::create_post))
        .route(
            "/posts/{id}",
            put(admin::update_post).delete(admin::delete_post),
        )
        .route("/posts/{id}/restore", post(admin::restore_post))
        .route("/posts/export", post(admin::start_export))
        .route("/exports/{id}", get(admin::export_status))
        .route(
            "/categories",
            get(admin::list_categories).post(admin::create_category),
        )
        .route("/categories/{id}", axum::routing::delete(admin::delete_category))
        .route("/comments", get(admin::list_comments))
        .route("/comments/{id}", axum::routing::delete(admin::delete_comment))
        .route("/users", get(admin::list_users));

    let cors = cors_layer(&state.config.frontend_url);

    Router::new()
        .route("/health/live", get(health::live))
        .route("/health/ready", get(health::ready))
        .nest("/api/v1", public)
        .nest("/api/v1/admin", admin)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
                .layer(cors),
        )
        .with_state(state)
}

fn cors_layer(frontend_url: &str) -> CorsLayer {
    let origin = match frontend_url.parse::<HeaderValue>() {
        Ok(value) => AllowOrigin::exact(value),
        Err(e) => {
            tracing::warn!(error = %e, frontend_url, "Invalid FRONTEND_URL, allowing any origin");
            AllowOrigin::from(Any)
        }
    };
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any)
}
