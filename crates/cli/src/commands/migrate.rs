//! Database migration commands.
//!
//! Storefront migrations live in `crates/storefront/migrations/` and are
//! embedded in the storefront library. The session table is owned by
//! `tower-sessions-sqlx-store` and created by its own migration.
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)

use tower_sessions_sqlx_store::PostgresStore;

use wendy_woo_storefront::db;

/// Migration failures.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run storefront migrations, then the session-store migration.
///
/// # Errors
///
/// Returns an error if the URL is missing, the database is unreachable, or a
/// migration fails.
pub async fn storefront() -> Result<(), MigrationError> {
    let database_url = super::database_url().map_err(|_| {
        MigrationError::MissingEnvVar("STOREFRONT_DATABASE_URL")
    })?;

    tracing::info!("Connecting to storefront database...");
    let pool = db::create_pool(&database_url).await?;

    tracing::info!("Running storefront migrations...");
    db::MIGRATOR.run(&pool).await?;

    tracing::info!("Running session store migration...");
    PostgresStore::new(pool.clone()).migrate().await?;

    tracing::info!("Storefront migrations complete!");
    Ok(())
}
