//! Catalog inspection commands.
//!
//! # Usage
//!
//! ```bash
//! # Print a mirrored product with its variations and images
//! pb-cli product show 42
//! ```

use product_bridge::db::{CatalogRepository, RepositoryError, create_pool};
use product_bridge_core::ProductId;
use thiserror::Error;

/// Errors that can occur while reading the catalog mirror.
#[derive(Debug, Error)]
pub enum ProductError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx::Error),

    /// Repository lookup failed.
    #[error("{0}")]
    Repository(#[from] RepositoryError),

    /// Product could not be rendered as JSON.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Print a mirrored product as pretty JSON.
///
/// # Errors
///
/// Returns `ProductError` if the database is unreachable or the product does
/// not exist.
pub async fn show(id: i32) -> Result<(), ProductError> {
    let database_url = super::database_url().map_err(ProductError::MissingEnvVar)?;
    let pool = create_pool(&database_url).await?;

    let product = CatalogRepository::new(&pool)
        .get_product(ProductId::new(id))
        .await?;

    #[allow(clippy::print_stdout)]
    {
        println!("{}", serde_json::to_string_pretty(&product)?);
    }
    Ok(())
}
