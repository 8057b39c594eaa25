//! # Database Persistence Layer
//!
//! Postgres persistence for restaurants via SQLx.
//!
//! The database is **optional**. When `DATABASE_URL` is set, restaurants are
//! stored in PostgreSQL through [`restaurants::PgRestaurantRepository`].
//! When absent, the service uses the in-memory repository from
//! `orders-core` and state does not survive restarts.

pub mod restaurants;

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};

pub use restaurants::PgRestaurantRepository;

/// Connect, then apply embedded migrations.
pub async fn init_pool(url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .max_lifetime(Duration::from_secs(60 * 60))
        .acquire_timeout(Duration::from_secs(5))
        .connect(url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(pool)
}
