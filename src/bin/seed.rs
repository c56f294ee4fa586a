//! Seed script for development: populates a fresh database with sample data.
//!
//! Usage: `cargo run --bin seed`
//!
//! Requires `DATABASE_URL` and `JWT_SECRET` environment variables (reads .env).
//! Prints a bearer token for the seeded admin on completion.

use anyhow::Context;
use chrono::{Duration, Utc};
use sqlx::PgPool;

use folio::config::AppConfig;
use folio::models::post::CreatePost;
use folio::models::user::User;
use folio::services::{auth as auth_service, post as post_service};

const CATEGORIES: &[(&str, &str)] = &[
    ("Rust", "rust"),
    ("Databases", "databases"),
    ("Operations", "operations"),
    ("Notes", "notes"),
];

/// (title, days since publication, category slugs). A negative day count
/// schedules the post; `None` leaves it as a draft.
const POSTS: &[(&str, Option<i64>, &[&str])] = &[
    ("Hello World", Some(40), &["notes"]),
    ("Ownership Without Tears", Some(30), &["rust"]),
    ("Indexes You Actually Need", Some(21), &["databases"]),
    ("Hello World", Some(14), &["notes"]),
    ("Zero-Downtime Migrations", Some(7), &["databases", "operations"]),
    ("Async Traits in Practice", Some(2), &["rust"]),
    ("Show", Some(1), &["notes"]),
    ("Next Week's Release", Some(-7), &["operations"]),
    ("Unfinished Thoughts", None, &["notes"]),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env().context("DATABASE_URL and JWT_SECRET must be set")?;
    let pool = folio::db::create_pool(&config.database_url, 5).await?;
    folio::db::run_migrations(&pool).await?;

    println!("=== Folio Seed Script ===");

    let admin = seed_users(&pool).await?;
    seed_categories(&pool).await?;
    seed_posts(&pool, &admin).await?;

    let token = auth_service::issue_access_token(
        &admin,
        &config.jwt_secret,
        config.jwt_access_token_expiry_secs,
    )?;

    println!("\n=== Seed complete! ===");
    println!("Admin token ({}s): {token}", config.jwt_access_token_expiry_secs);

    Ok(())
}

async fn seed_users(pool: &PgPool) -> anyhow::Result<User> {
    for (name, email, role) in [
        ("Ada Admin", "admin@folio.local", "admin"),
        ("Grace Author", "grace@folio.local", "author"),
        ("Rita Reader", "rita@folio.local", "reader"),
    ] {
        sqlx::query(
            "INSERT INTO users (name, email, role) VALUES ($1, $2, $3::user_role)
             ON CONFLICT (email) DO NOTHING",
        )
        .bind(name)
        .bind(email)
        .bind(role)
        .execute(pool)
        .await?;
    }

    let admin = sqlx::query_as::<_, User>(
        "SELECT id, name, email, role, created_at FROM users WHERE email = 'admin@folio.local'",
    )
    .fetch_one(pool)
    .await?;

    println!("[done] Users ready");
    Ok(admin)
}

async fn seed_categories(pool: &PgPool) -> anyhow::Result<()> {
    for (name, slug) in CATEGORIES {
        sqlx::query(
            "INSERT INTO categories (name, slug) VALUES ($1, $2) ON CONFLICT (slug) DO NOTHING",
        )
        .bind(name)
        .bind(slug)
        .execute(pool)
        .await?;
    }

    println!("[done] {} categories", CATEGORIES.len());
    Ok(())
}

async fn seed_posts(pool: &PgPool, author: &User) -> anyhow::Result<()> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
        .fetch_one(pool)
        .await?;
    if count > 0 {
        println!("[skip] Posts already seeded ({count})");
        return Ok(());
    }

    let now = Utc::now();
    for (title, days_ago, slugs) in POSTS {
        let slugs: Vec<String> = slugs.iter().map(|s| s.to_string()).collect();
        let category_ids: Vec<i64> =
            sqlx::query_scalar("SELECT id FROM categories WHERE slug = ANY($1)")
                .bind(&slugs)
                .fetch_all(pool)
                .await?;

        let input = CreatePost {
            title: title.to_string(),
            excerpt: Some(format!("A short look at {}.", title.to_lowercase())),
            body: format!("# {title}\n\nSample content."),
            published_at: days_ago.map(|days| now - Duration::days(days)),
            category_ids,
        };

        let post = post_service::create(pool, author.id, &input).await?;
        println!("  {} -> /posts/{}", post.title, post.slug);
    }

    println!("[done] {} posts", POSTS.len());
    Ok(())
}
