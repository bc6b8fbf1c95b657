//! sqlx/Postgres data-access engine for stockroom.
//!
//! One generic [`repository::Repository`] / [`service::Service`] pair driven
//! by per-entity metadata, instead of a copied CRUD module per table. The
//! per-entity configuration objects live under [`entities`].

use sqlx::postgres::PgPoolOptions;

pub mod config;
pub mod entities;
pub mod error;
pub mod integrity;
pub mod repository;
pub mod service;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Run pending schema migrations.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}

/// Verify the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
