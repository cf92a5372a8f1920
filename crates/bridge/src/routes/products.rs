//! Product creation and lookup handlers.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Serialize;
use tracing::instrument;

use product_bridge_core::ProductId;

use crate::{
    db::CatalogRepository,
    error::AppError,
    models::{ProductPayload, StoredProduct, ValidationErrors},
    shopify::{AdminClient, RemoteVariant, ShopCredentials},
    state::AppState,
    sync::{ProductSync, SyncReport},
};

/// Variant as returned to API callers.
#[derive(Debug, Clone, Serialize)]
pub struct VariantView {
    pub id: String,
    pub title: String,
    pub price: String,
    pub sku: Option<String>,
    pub inventory_quantity: Option<i64>,
}

impl From<RemoteVariant> for VariantView {
    fn from(variant: RemoteVariant) -> Self {
        Self {
            id: variant.id,
            title: variant.title,
            price: variant.price,
            sku: variant.sku,
            inventory_quantity: variant.inventory_quantity,
        }
    }
}

/// `POST /products` success body.
#[derive(Debug, Serialize)]
pub struct CreateProductResponse {
    pub success: bool,
    /// Local mirror; `null` if it could not be written.
    pub product: Option<StoredProduct>,
    pub shopify_product_id: String,
    pub title: String,
    pub variants: Vec<VariantView>,
    pub warnings: Vec<String>,
}

impl From<SyncReport> for CreateProductResponse {
    fn from(report: SyncReport) -> Self {
        let warnings = report.warnings();
        Self {
            success: true,
            product: report.product,
            shopify_product_id: report.product_id,
            title: report.title,
            variants: report.variants.into_iter().map(VariantView::from).collect(),
            warnings,
        }
    }
}

/// Create a product on Shopify and mirror it locally.
///
/// Credentials are checked before the body is parsed; validation runs before
/// any Shopify call. The whole sequence is bounded by the configured request
/// deadline.
#[instrument(skip_all, fields(shop = %credentials.shop_domain))]
pub async fn create(
    State(state): State<AppState>,
    credentials: ShopCredentials,
    payload: Result<Json<ProductPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateProductResponse>), AppError> {
    let Json(payload) =
        payload.map_err(|rejection| ValidationErrors::single("body", rejection.body_text()))?;
    let product = payload.validate()?;

    let config = state.config();
    let client = AdminClient::new(&credentials, &config.shopify, state.http().clone());
    let sync = ProductSync::new(&client, state.catalog(), &config.sync);

    let report = tokio::time::timeout(config.request_deadline, sync.run(&product))
        .await
        .map_err(|_| AppError::DeadlineExceeded(config.request_deadline.as_secs()))??;

    tracing::info!(
        product_id = %report.product_id,
        variants = report.variants.len(),
        images = report.attached_images,
        warnings = report.image_failures.len() + report.skipped_variations.len(),
        "Product created"
    );

    Ok((StatusCode::CREATED, Json(report.into())))
}

/// Read a mirrored product with its variations and images.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<StoredProduct>, AppError> {
    let product = CatalogRepository::new(state.pool())
        .get_product(ProductId::new(id))
        .await?;
    Ok(Json(product))
}
