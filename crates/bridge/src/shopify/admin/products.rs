//! Product and variant operations for the Admin API.

use serde::Deserialize;
use tracing::instrument;

use super::{
    AdminClient, GraphQLTransport, ShopifyError, execute,
    queries::{self, ProductCreateInput, VariantInput},
};
use crate::shopify::types::{CreatedProduct, RemoteVariant, UserError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductCreateData {
    product_create: Option<ProductCreatePayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductCreatePayload {
    product: Option<CreatedProduct>,
    #[serde(default)]
    user_errors: Vec<UserError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VariantsBulkCreateData {
    product_variants_bulk_create: Option<VariantsBulkCreatePayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VariantsBulkCreatePayload {
    #[serde(default)]
    product_variants: Option<Vec<RemoteVariant>>,
    #[serde(default)]
    user_errors: Vec<UserError>,
}

#[derive(Debug, Deserialize)]
struct ProductVariantsData {
    product: Option<ProductVariantsNode>,
}

#[derive(Debug, Deserialize)]
struct ProductVariantsNode {
    variants: Nodes<RemoteVariant>,
}

#[derive(Debug, Deserialize)]
pub(super) struct Nodes<T> {
    #[serde(default = "Vec::new")]
    pub(super) nodes: Vec<T>,
}

impl<T: GraphQLTransport> AdminClient<T> {
    /// Create a product together with its option schema.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::UserErrors` if Shopify rejects the input and
    /// `ShopifyError::MissingData` if the payload carries no product id.
    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn create_product(
        &self,
        input: ProductCreateInput,
    ) -> Result<CreatedProduct, ShopifyError> {
        let request = queries::product_create(input);
        let response: ProductCreateData = execute(self.transport(), &request).await?;

        let payload = response
            .product_create
            .ok_or_else(|| ShopifyError::MissingData("productCreate payload".to_string()))?;

        if !payload.user_errors.is_empty() {
            return Err(ShopifyError::UserErrors {
                operation: "productCreate",
                errors: payload.user_errors,
            });
        }

        payload
            .product
            .filter(|product| !product.id.is_empty())
            .ok_or_else(|| ShopifyError::MissingData("productCreate returned no product id".to_string()))
    }

    /// Create all variants of a product in one mutation.
    ///
    /// Uses the `REMOVE_STANDALONE_VARIANT` strategy so the default variant
    /// Shopify creates alongside the product is replaced.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::UserErrors` if any variant is rejected; in that
    /// case Shopify creates none of them.
    #[instrument(skip(self, variants), fields(product_id = %product_id, count = variants.len()))]
    pub async fn create_variants(
        &self,
        product_id: &str,
        variants: Vec<VariantInput>,
    ) -> Result<Vec<RemoteVariant>, ShopifyError> {
        let request = queries::variants_bulk_create(product_id, variants);
        let response: VariantsBulkCreateData = execute(self.transport(), &request).await?;

        let payload = response.product_variants_bulk_create.ok_or_else(|| {
            ShopifyError::MissingData("productVariantsBulkCreate payload".to_string())
        })?;

        if !payload.user_errors.is_empty() {
            return Err(ShopifyError::UserErrors {
                operation: "productVariantsBulkCreate",
                errors: payload.user_errors,
            });
        }

        Ok(payload.product_variants.unwrap_or_default())
    }

    /// Fetch every variant of a product.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::MissingData` if the product does not exist.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn product_variants(
        &self,
        product_id: &str,
    ) -> Result<Vec<RemoteVariant>, ShopifyError> {
        let request = queries::product_variants(product_id);
        let response: ProductVariantsData = execute(self.transport(), &request).await?;

        response
            .product
            .map(|product| product.variants.nodes)
            .ok_or_else(|| ShopifyError::MissingData(format!("product {product_id} not found")))
    }
}
