use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use tracing::info;

/// Creates the postgres connection pool
///
/// # PANICS
/// panics when the pool cannot be built, the service cannot run without
/// its storage
pub async fn connect(db_url: &str) -> PgPool {
    info!("[DB] getting connection");

    PgPoolOptions::new()
        .max_connections(100)
        .min_connections(5)
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(8))
        .connect(db_url)
        .await
        .unwrap_or_else(|_| panic!("[DB] failed to build connection pool"))
}

/// Apply all pending migrations
pub async fn run_migrations(pool: &PgPool) {
    info!("[DB] running migrations");

    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .unwrap_or_else(|_| panic!("[DB] failed to run migrations"));
}
