//! Cached view-count figures in Redis.
//!
//! The cache is advisory. Reads fall back to the row value and refreshes
//! run detached; a failed or duplicated refresh only means a stale or
//! re-written figure.

use redis::AsyncCommands;
use sqlx::PgPool;

use crate::services::post as post_service;

/// Redis key holding the cached view count of a post.
pub fn cache_key(post_id: i64) -> String {
    format!("folio:post:{post_id}:views")
}

/// Read the cached figure, if any.
pub async fn cached_views(client: &redis::Client, post_id: i64) -> Option<i64> {
    let mut conn = match client.get_multiplexed_async_connection().await {
        Ok(conn) => conn,
        Err(e) => {
            tracing::warn!(error = %e, "View cache unavailable");
            return None;
        }
    };

    match conn.get::<_, Option<i64>>(cache_key(post_id)).await {
        Ok(views) => views,
        Err(e) => {
            tracing::warn!(error = %e, post_id, "View cache read failed");
            None
        }
    }
}

async fn store(client: &redis::Client, post_id: i64, views: i64, ttl_secs: u64) -> redis::RedisResult<()> {
    let mut conn = client.get_multiplexed_async_connection().await?;
    conn.set_ex::<_, _, ()>(cache_key(post_id), views, ttl_secs).await
}

/// Record a view and refresh the cached figure without blocking the caller.
pub fn refresh_in_background(pool: PgPool, client: redis::Client, post_id: i64, ttl_secs: u64) {
    tokio::spawn(async move {
        let views = match post_service::record_view(&pool, post_id).await {
            Ok(views) => views,
            Err(e) => {
                tracing::warn!(error = %e, post_id, "Failed to record post view");
                return;
            }
        };

        if let Err(e) = store(&client, post_id, views, ttl_secs).await {
            tracing::warn!(error = %e, post_id, "View cache refresh failed");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_format() {
        assert_eq!(cache_key(42), "folio:post:42:views");
    }

    #[tokio::test]
    async fn unreachable_cache_reads_as_miss() {
        let client = redis::Client::open("redis://127.0.0.1:1/").unwrap();
        assert_eq!(cached_views(&client, 1).await, None);
    }
}
