//! Response types for the Shopify Admin API operations used by the bridge.
//!
//! Field names follow the Admin GraphQL schema (camelCase on the wire).

use serde::Deserialize;

/// A mutation-level error (`userErrors` / `mediaUserErrors`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserError {
    /// Path to the offending input field.
    #[serde(default)]
    pub field: Option<Vec<String>>,
    /// Human-readable message.
    pub message: String,
    /// Machine-readable code, when the payload type exposes one.
    #[serde(default)]
    pub code: Option<String>,
}

impl UserError {
    /// Whether this error reports that the same media is already attached
    /// to the variant.
    ///
    /// `PRODUCT_VARIANT_ALREADY_HAS_MEDIA` is not a duplicate: the variant
    /// carries a different media item and the new one was not attached.
    #[must_use]
    pub fn is_already_attached(&self) -> bool {
        self.code.as_deref() == Some("MEDIA_ALREADY_ATTACHED")
    }
}

/// A product returned by `productCreate`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedProduct {
    /// Product GID.
    pub id: String,
    /// Product title as stored by Shopify.
    pub title: String,
    /// Option definitions in position order.
    #[serde(default)]
    pub options: Vec<ProductOption>,
}

impl CreatedProduct {
    /// Find an option by name.
    #[must_use]
    pub fn option(&self, name: &str) -> Option<&ProductOption> {
        self.options.iter().find(|o| o.name == name)
    }
}

/// A product option (e.g. `Color`) with its values.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductOption {
    /// Option GID.
    pub id: String,
    /// Option name.
    pub name: String,
    /// 1-based position.
    pub position: i64,
    /// Value names in position order.
    #[serde(default)]
    pub values: Vec<String>,
}

/// A product variant as returned by Shopify.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteVariant {
    /// Variant GID.
    pub id: String,
    /// Variant title (`Red / Small`).
    pub title: String,
    /// Price as a decimal string.
    pub price: String,
    /// Stock keeping unit.
    #[serde(default)]
    pub sku: Option<String>,
    /// Total inventory across locations.
    #[serde(default)]
    pub inventory_quantity: Option<i64>,
}

/// Processing status of an uploaded media item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaStatus {
    /// Upload received, not yet processed.
    Uploaded,
    /// Being processed.
    Processing,
    /// Ready to be attached.
    Ready,
    /// Processing failed.
    Failed,
    /// Status added to the schema after this client was written.
    #[serde(other)]
    Unknown,
}

/// A media item with its processing status.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MediaItem {
    /// Media GID.
    pub id: String,
    /// Processing status.
    pub status: MediaStatus,
}
