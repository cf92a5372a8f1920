//! Database migration commands.
//!
//! # Usage
//!
//! ```bash
//! pb-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `BRIDGE_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! # Migration Files
//!
//! Bridge migrations live in `crates/bridge/migrations/` and create the
//! `bridge` schema with its `product`, `variation` and `image` tables.

use secrecy::ExposeSecret;
use sqlx::PgPool;
use thiserror::Error;

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A migration failed to apply.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run the bridge database migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the database URL is missing, the connection
/// fails, or a migration cannot be applied.
pub async fn run() -> Result<(), MigrationError> {
    let database_url = super::database_url().map_err(MigrationError::MissingEnvVar)?;

    tracing::info!("Connecting to bridge database...");
    let pool = PgPool::connect(database_url.expose_secret()).await?;

    tracing::info!("Running bridge migrations...");
    sqlx::migrate!("../bridge/migrations").run(&pool).await?;

    tracing::info!("Bridge migrations complete!");
    Ok(())
}
