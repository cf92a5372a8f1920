//! Media operations for the Admin API.

use serde::Deserialize;
use tracing::instrument;

use super::{AdminClient, GraphQLTransport, ShopifyError, execute, products::Nodes, queries};
use crate::shopify::types::{MediaItem, UserError};

/// Result of attaching one media item to one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachOutcome {
    /// The media is now attached.
    Attached,
    /// Shopify reported the media as already attached; nothing changed.
    AlreadyAttached,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateMediaData {
    product_create_media: Option<CreateMediaPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateMediaPayload {
    #[serde(default)]
    media: Option<Vec<MediaItem>>,
    #[serde(default)]
    media_user_errors: Vec<UserError>,
}

#[derive(Debug, Deserialize)]
struct MediaStatusData {
    product: Option<MediaStatusNode>,
}

#[derive(Debug, Deserialize)]
struct MediaStatusNode {
    media: Nodes<MediaItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendMediaData {
    product_variant_append_media: Option<AppendMediaPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendMediaPayload {
    #[serde(default)]
    user_errors: Vec<UserError>,
}

impl<T: GraphQLTransport> AdminClient<T> {
    /// Create an image media item on a product from an external URL.
    ///
    /// Shopify processes the upload asynchronously; poll
    /// [`media_statuses`](Self::media_statuses) until it is `READY`.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::UserErrors` if Shopify rejects the source and
    /// `ShopifyError::MissingData` if no media item comes back.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn create_media(
        &self,
        product_id: &str,
        image_url: &str,
    ) -> Result<MediaItem, ShopifyError> {
        let request = queries::product_create_media(product_id, image_url);
        let response: CreateMediaData = execute(self.transport(), &request).await?;

        let payload = response
            .product_create_media
            .ok_or_else(|| ShopifyError::MissingData("productCreateMedia payload".to_string()))?;

        if !payload.media_user_errors.is_empty() {
            return Err(ShopifyError::UserErrors {
                operation: "productCreateMedia",
                errors: payload.media_user_errors,
            });
        }

        payload
            .media
            .and_then(|media| media.into_iter().next())
            .ok_or_else(|| ShopifyError::MissingData("productCreateMedia returned no media".to_string()))
    }

    /// List every media item of a product with its processing status.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::MissingData` if the product does not exist.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn media_statuses(&self, product_id: &str) -> Result<Vec<MediaItem>, ShopifyError> {
        let request = queries::product_media_status(product_id);
        let response: MediaStatusData = execute(self.transport(), &request).await?;

        response
            .product
            .map(|product| product.media.nodes)
            .ok_or_else(|| ShopifyError::MissingData(format!("product {product_id} not found")))
    }

    /// Attach one ready media item to one variant.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::UserErrors` for rejections other than
    /// `MEDIA_ALREADY_ATTACHED`, which is reported as
    /// [`AttachOutcome::AlreadyAttached`].
    #[instrument(skip(self), fields(product_id = %product_id, variant_id = %variant_id))]
    pub async fn append_variant_media(
        &self,
        product_id: &str,
        variant_id: &str,
        media_id: &str,
    ) -> Result<AttachOutcome, ShopifyError> {
        let request = queries::variant_append_media(product_id, variant_id, media_id);
        let response: AppendMediaData = execute(self.transport(), &request).await?;

        let payload = response.product_variant_append_media.ok_or_else(|| {
            ShopifyError::MissingData("productVariantAppendMedia payload".to_string())
        })?;

        if payload.user_errors.is_empty() {
            return Ok(AttachOutcome::Attached);
        }

        if payload.user_errors.iter().all(UserError::is_already_attached) {
            return Ok(AttachOutcome::AlreadyAttached);
        }

        Err(ShopifyError::UserErrors {
            operation: "productVariantAppendMedia",
            errors: payload.user_errors,
        })
    }
}
