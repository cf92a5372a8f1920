//! Catalog mirror repository: products, variations and images.
//!
//! Queries are built at runtime with `sqlx::query_as` so the crate builds
//! without a live database.

use std::collections::HashMap;
use std::future::Future;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::instrument;

use product_bridge_core::{ImageId, Price, ProductId, VariationId};

use super::RepositoryError;
use crate::models::{StoredImage, StoredProduct, StoredVariation};

// =============================================================================
// Write model
// =============================================================================

/// Remote state of one product, ready to be written locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogMirror {
    /// Shopify product GID.
    pub shopify_id: String,
    pub title: String,
    pub description: Option<String>,
    pub variations: Vec<MirrorVariation>,
}

/// One variant with the image URLs that were attached to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorVariation {
    /// Shopify variant GID.
    pub shopify_id: String,
    pub title: String,
    pub price: Price,
    pub inventory_quantity: Option<i64>,
    pub images: Vec<String>,
}

/// Destination for mirrored catalog state.
pub trait CatalogStore: Send + Sync {
    /// Write a product with its variations and images as one unit.
    fn save_catalog(
        &self,
        mirror: &CatalogMirror,
    ) -> impl Future<Output = Result<StoredProduct, RepositoryError>> + Send;
}

/// [`CatalogStore`] backed by a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl CatalogStore for PgCatalogStore {
    async fn save_catalog(&self, mirror: &CatalogMirror) -> Result<StoredProduct, RepositoryError> {
        CatalogRepository::new(&self.pool).save(mirror).await
    }
}

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    shopify_id: String,
    title: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct VariationRow {
    id: i32,
    shopify_id: String,
    title: String,
    price: Decimal,
    inventory_quantity: Option<i64>,
}

#[derive(Debug, sqlx::FromRow)]
struct ImageRow {
    id: i32,
    variation_id: i32,
    src: String,
}

impl TryFrom<VariationRow> for StoredVariation {
    type Error = RepositoryError;

    fn try_from(row: VariationRow) -> Result<Self, Self::Error> {
        let price = Price::try_from(row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price in database: {e}"))
        })?;

        Ok(Self {
            id: VariationId::new(row.id),
            shopify_id: row.shopify_id,
            title: row.title,
            price,
            inventory_quantity: row.inventory_quantity,
            images: Vec::new(),
        })
    }
}

impl From<ImageRow> for StoredImage {
    fn from(row: ImageRow) -> Self {
        Self {
            id: ImageId::new(row.id),
            src: row.src,
        }
    }
}

fn product_from_row(row: ProductRow, variations: Vec<StoredVariation>) -> StoredProduct {
    StoredProduct {
        id: ProductId::new(row.id),
        shopify_id: row.shopify_id,
        title: row.title,
        description: row.description,
        created_at: row.created_at,
        updated_at: row.updated_at,
        variations,
    }
}

fn map_unique_violation(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already mirrored"));
    }
    RepositoryError::Database(e)
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for catalog mirror rows.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a product, its variations and their images in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the product or a variant was
    /// already mirrored, `RepositoryError::Database` otherwise. On error
    /// nothing is written.
    #[instrument(skip(self, mirror), fields(shopify_id = %mirror.shopify_id))]
    pub async fn save(&self, mirror: &CatalogMirror) -> Result<StoredProduct, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let product = sqlx::query_as::<_, ProductRow>(
            r"
            INSERT INTO bridge.product (shopify_id, title, description)
            VALUES ($1, $2, $3)
            RETURNING id, shopify_id, title, description, created_at, updated_at
            ",
        )
        .bind(&mirror.shopify_id)
        .bind(&mirror.title)
        .bind(mirror.description.as_deref())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, "product"))?;

        let mut variations = Vec::with_capacity(mirror.variations.len());
        for variation in &mirror.variations {
            variations.push(insert_variation(&mut tx, product.id, variation).await?);
        }

        tx.commit().await?;

        Ok(product_from_row(product, variations))
    }

    /// Get a stored product with its variations and images.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product has this id.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: ProductId) -> Result<StoredProduct, RepositoryError> {
        let product = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, shopify_id, title, description, created_at, updated_at
            FROM bridge.product
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let variation_rows = sqlx::query_as::<_, VariationRow>(
            r"
            SELECT id, shopify_id, title, price, inventory_quantity
            FROM bridge.variation
            WHERE product_id = $1
            ORDER BY id
            ",
        )
        .bind(id.as_i32())
        .fetch_all(self.pool)
        .await?;

        let variation_ids: Vec<i32> = variation_rows.iter().map(|v| v.id).collect();

        let image_rows = sqlx::query_as::<_, ImageRow>(
            r"
            SELECT id, variation_id, src
            FROM bridge.image
            WHERE variation_id = ANY($1)
            ORDER BY id
            ",
        )
        .bind(&variation_ids)
        .fetch_all(self.pool)
        .await?;

        let mut images_by_variation: HashMap<i32, Vec<StoredImage>> = HashMap::new();
        for row in image_rows {
            images_by_variation
                .entry(row.variation_id)
                .or_default()
                .push(row.into());
        }

        let variations = variation_rows
            .into_iter()
            .map(|row| {
                let images = images_by_variation.remove(&row.id).unwrap_or_default();
                StoredVariation::try_from(row).map(|variation| StoredVariation {
                    images,
                    ..variation
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(product_from_row(product, variations))
    }
}

async fn insert_variation(
    tx: &mut Transaction<'_, Postgres>,
    product_id: i32,
    variation: &MirrorVariation,
) -> Result<StoredVariation, RepositoryError> {
    let row = sqlx::query_as::<_, VariationRow>(
        r"
        INSERT INTO bridge.variation (product_id, shopify_id, title, price, inventory_quantity)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, shopify_id, title, price, inventory_quantity
        ",
    )
    .bind(product_id)
    .bind(&variation.shopify_id)
    .bind(&variation.title)
    .bind(variation.price.amount())
    .bind(variation.inventory_quantity)
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| map_unique_violation(e, "variant"))?;

    let mut stored = StoredVariation::try_from(row)?;

    for src in &variation.images {
        let image = sqlx::query_as::<_, ImageRow>(
            r"
            INSERT INTO bridge.image (variation_id, src)
            VALUES ($1, $2)
            RETURNING id, variation_id, src
            ",
        )
        .bind(stored.id.as_i32())
        .bind(src)
        .fetch_one(&mut **tx)
        .await?;
        stored.images.push(image.into());
    }

    Ok(stored)
}
