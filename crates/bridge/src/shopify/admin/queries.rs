//! GraphQL documents for the Shopify Admin API.
//!
//! Every document is a static string; all caller-supplied values travel in
//! the `variables` object, so quoting and escaping (backslash, quote,
//! newline, carriage return) is done by the JSON encoder rather than by
//! string interpolation. The same input always yields the same request body.

use graphql_client::QueryBody;
use serde::Serialize;

/// Page size for connection fields; Shopify's maximum.
pub const MAX_PAGE_SIZE: i64 = 250;

// =============================================================================
// Product creation
// =============================================================================

pub const PRODUCT_CREATE: &str = r"
mutation ProductCreate($product: ProductCreateInput!) {
  productCreate(product: $product) {
    product {
      id
      title
      options {
        id
        name
        position
        values
      }
    }
    userErrors {
      field
      message
    }
  }
}
";

/// Variables for [`PRODUCT_CREATE`].
#[derive(Debug, Clone, Serialize)]
pub struct ProductCreateVariables {
    pub product: ProductCreateInput,
}

/// `ProductCreateInput`, restricted to the fields the bridge sets.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCreateInput {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_html: Option<String>,
    pub product_options: Vec<OptionCreateInput>,
}

/// `OptionCreateInput`: an option name with its ordered values.
#[derive(Debug, Clone, Serialize)]
pub struct OptionCreateInput {
    pub name: String,
    pub values: Vec<OptionValueCreateInput>,
}

/// `OptionValueCreateInput`.
#[derive(Debug, Clone, Serialize)]
pub struct OptionValueCreateInput {
    pub name: String,
}

/// Build the product-with-options creation mutation.
#[must_use]
pub fn product_create(input: ProductCreateInput) -> QueryBody<ProductCreateVariables> {
    QueryBody {
        variables: ProductCreateVariables { product: input },
        query: PRODUCT_CREATE,
        operation_name: "ProductCreate",
    }
}

// =============================================================================
// Variant creation
// =============================================================================

pub const VARIANTS_BULK_CREATE: &str = r"
mutation ProductVariantsBulkCreate($productId: ID!, $variants: [ProductVariantsBulkInput!]!) {
  productVariantsBulkCreate(productId: $productId, variants: $variants, strategy: REMOVE_STANDALONE_VARIANT) {
    productVariants {
      id
      title
      price
      sku
      inventoryQuantity
    }
    userErrors {
      field
      message
      code
    }
  }
}
";

/// Variables for [`VARIANTS_BULK_CREATE`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantsBulkCreateVariables {
    pub product_id: String,
    pub variants: Vec<VariantInput>,
}

/// `ProductVariantsBulkInput`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantInput {
    pub price: String,
    pub option_values: Vec<VariantOptionValueInput>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inventory_quantities: Vec<InventoryLevelInput>,
}

/// `VariantOptionValueInput`: option id plus the value name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantOptionValueInput {
    pub option_id: String,
    pub name: String,
}

/// `InventoryLevelInput`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryLevelInput {
    pub available_quantity: i64,
    pub location_id: String,
}

/// Build the bulk variant creation mutation for one product.
#[must_use]
pub fn variants_bulk_create(
    product_id: &str,
    variants: Vec<VariantInput>,
) -> QueryBody<VariantsBulkCreateVariables> {
    QueryBody {
        variables: VariantsBulkCreateVariables {
            product_id: product_id.to_string(),
            variants,
        },
        query: VARIANTS_BULK_CREATE,
        operation_name: "ProductVariantsBulkCreate",
    }
}

// =============================================================================
// Media
// =============================================================================

pub const PRODUCT_CREATE_MEDIA: &str = r"
mutation ProductCreateMedia($productId: ID!, $media: [CreateMediaInput!]!) {
  productCreateMedia(productId: $productId, media: $media) {
    media {
      id
      status
    }
    mediaUserErrors {
      field
      message
      code
    }
  }
}
";

/// Variables for [`PRODUCT_CREATE_MEDIA`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCreateMediaVariables {
    pub product_id: String,
    pub media: Vec<CreateMediaInput>,
}

/// `CreateMediaInput` for an externally hosted image.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMediaInput {
    pub original_source: String,
    pub media_content_type: &'static str,
}

/// Build the media creation mutation for a single image URL.
#[must_use]
pub fn product_create_media(
    product_id: &str,
    image_url: &str,
) -> QueryBody<ProductCreateMediaVariables> {
    QueryBody {
        variables: ProductCreateMediaVariables {
            product_id: product_id.to_string(),
            media: vec![CreateMediaInput {
                original_source: image_url.to_string(),
                media_content_type: "IMAGE",
            }],
        },
        query: PRODUCT_CREATE_MEDIA,
        operation_name: "ProductCreateMedia",
    }
}

pub const PRODUCT_MEDIA_STATUS: &str = r"
query ProductMediaStatus($id: ID!, $first: Int!) {
  product(id: $id) {
    media(first: $first) {
      nodes {
        id
        status
      }
    }
  }
}
";

/// Variables for the product-scoped read queries.
#[derive(Debug, Clone, Serialize)]
pub struct ProductNodeVariables {
    pub id: String,
    pub first: i64,
}

/// Build the media status poll query.
#[must_use]
pub fn product_media_status(product_id: &str) -> QueryBody<ProductNodeVariables> {
    QueryBody {
        variables: ProductNodeVariables {
            id: product_id.to_string(),
            first: MAX_PAGE_SIZE,
        },
        query: PRODUCT_MEDIA_STATUS,
        operation_name: "ProductMediaStatus",
    }
}

pub const VARIANT_APPEND_MEDIA: &str = r"
mutation ProductVariantAppendMedia($productId: ID!, $variantMedia: [ProductVariantAppendMediaInput!]!) {
  productVariantAppendMedia(productId: $productId, variantMedia: $variantMedia) {
    productVariants {
      id
    }
    userErrors {
      field
      message
      code
    }
  }
}
";

/// Variables for [`VARIANT_APPEND_MEDIA`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantAppendMediaVariables {
    pub product_id: String,
    pub variant_media: [VariantMediaInput; 1],
}

/// `ProductVariantAppendMediaInput`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantMediaInput {
    pub variant_id: String,
    pub media_ids: [String; 1],
}

/// Build the attachment mutation for exactly one media item on one variant.
///
/// Shopify rejects a `variantMedia` list naming the same variant twice, so
/// the input is a fixed one-element array.
#[must_use]
pub fn variant_append_media(
    product_id: &str,
    variant_id: &str,
    media_id: &str,
) -> QueryBody<VariantAppendMediaVariables> {
    QueryBody {
        variables: VariantAppendMediaVariables {
            product_id: product_id.to_string(),
            variant_media: [VariantMediaInput {
                variant_id: variant_id.to_string(),
                media_ids: [media_id.to_string()],
            }],
        },
        query: VARIANT_APPEND_MEDIA,
        operation_name: "ProductVariantAppendMedia",
    }
}

// =============================================================================
// Variant re-fetch
// =============================================================================

pub const PRODUCT_VARIANTS: &str = r"
query ProductVariants($id: ID!, $first: Int!) {
  product(id: $id) {
    variants(first: $first) {
      nodes {
        id
        title
        price
        sku
        inventoryQuantity
      }
    }
  }
}
";

/// Build the variant re-fetch query.
#[must_use]
pub fn product_variants(product_id: &str) -> QueryBody<ProductNodeVariables> {
    QueryBody {
        variables: ProductNodeVariables {
            id: product_id.to_string(),
            first: MAX_PAGE_SIZE,
        },
        query: PRODUCT_VARIANTS,
        operation_name: "ProductVariants",
    }
}
