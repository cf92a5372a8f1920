//! Product domain models: inbound payload, validated input and stored rows.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use product_bridge_core::{ImageId, Price, ProductId, VariationId, VariationTitle};

/// Maximum length of a product title.
pub const MAX_TITLE_LENGTH: usize = 255;

// =============================================================================
// Inbound payload
// =============================================================================

/// `POST /products` request body as received.
///
/// Every field is optional here so that [`ProductPayload::validate`] can
/// report all problems at once instead of failing on the first.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPayload {
    pub title: Option<String>,
    pub description: Option<String>,
    pub variations: Option<Vec<VariationPayload>>,
}

/// One variation in the request body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VariationPayload {
    pub title: Option<String>,
    /// Number or numeric string.
    pub price: Option<Value>,
    pub inventory_quantity: Option<Value>,
    pub images: Option<Vec<ImagePayload>>,
}

/// One image reference in the request body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImagePayload {
    pub src: Option<String>,
}

// =============================================================================
// Validated input
// =============================================================================

/// A product ready to be created remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub title: String,
    pub description: Option<String>,
    pub variations: Vec<NewVariation>,
}

/// A validated variation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVariation {
    pub title: VariationTitle,
    pub price: Price,
    pub inventory_quantity: Option<i64>,
    /// Absolute http(s) image URLs.
    pub images: Vec<String>,
}

/// Field-level validation failures keyed by dotted path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    /// Create an empty error set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an error set holding a single message.
    #[must_use]
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Record a message against a field.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages recorded for a field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Number of fields with at least one message.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.0.keys().map(String::as_str).collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

impl ProductPayload {
    /// Check the payload shape and convert it into a [`NewProduct`].
    ///
    /// # Errors
    ///
    /// Returns every field-level problem found, keyed by dotted path
    /// (for example `variations.0.images.1.src`).
    pub fn validate(self) -> Result<NewProduct, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let title = match self.title.as_deref().map(str::trim) {
            None | Some("") => {
                errors.add("title", "The title field is required.");
                None
            }
            Some(title) if title.chars().count() > MAX_TITLE_LENGTH => {
                errors.add(
                    "title",
                    format!("The title may not be greater than {MAX_TITLE_LENGTH} characters."),
                );
                None
            }
            Some(title) => Some(title.to_string()),
        };

        let description = self.description.filter(|d| !d.trim().is_empty());

        let mut variations = Vec::new();
        match self.variations {
            None => errors.add("variations", "The variations field is required."),
            Some(list) if list.is_empty() => {
                errors.add("variations", "At least one variation is required.");
            }
            Some(list) => {
                for (index, variation) in list.into_iter().enumerate() {
                    if let Some(valid) = variation.validate(index, &mut errors) {
                        variations.push(valid);
                    }
                }
            }
        }

        match title {
            Some(title) if errors.is_empty() => Ok(NewProduct {
                title,
                description,
                variations,
            }),
            _ => Err(errors),
        }
    }
}

impl VariationPayload {
    fn validate(self, index: usize, errors: &mut ValidationErrors) -> Option<NewVariation> {
        let prefix = format!("variations.{index}");

        let title = match self.title.as_deref() {
            None => {
                errors.add(format!("{prefix}.title"), "The title field is required.");
                None
            }
            Some(raw) => VariationTitle::parse(raw)
                .map_err(|e| errors.add(format!("{prefix}.title"), e.to_string()))
                .ok(),
        };

        let price = match self.price {
            None | Some(Value::Null) => {
                errors.add(format!("{prefix}.price"), "The price field is required.");
                None
            }
            Some(value) => parse_price(&value)
                .map_err(|message| errors.add(format!("{prefix}.price"), message))
                .ok(),
        };

        let inventory_quantity = match self.inventory_quantity {
            None | Some(Value::Null) => Ok(None),
            Some(value) => parse_quantity(&value).map(Some),
        }
        .map_err(|message| errors.add(format!("{prefix}.inventory_quantity"), message))
        .ok();

        let mut images = Vec::new();
        for (position, image) in self.images.unwrap_or_default().into_iter().enumerate() {
            let field = format!("{prefix}.images.{position}.src");
            match image.src.as_deref().map(str::trim) {
                None | Some("") => errors.add(field, "The image source is required."),
                Some(src) if is_valid_image_url(src) => images.push(src.to_string()),
                Some(_) => errors.add(field, "The image source must be a valid URL."),
            }
        }

        Some(NewVariation {
            title: title?,
            price: price?,
            inventory_quantity: inventory_quantity?,
            images,
        })
    }
}

fn parse_price(value: &Value) -> Result<Price, String> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        _ => return Err("The price must be a number.".to_string()),
    };
    Price::parse(&text).map_err(|e| e.to_string())
}

fn parse_quantity(value: &Value) -> Result<i64, String> {
    let quantity = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
    .ok_or_else(|| "The inventory quantity must be an integer.".to_string())?;

    if quantity < 0 {
        return Err("The inventory quantity must be at least 0.".to_string());
    }
    Ok(quantity)
}

/// Whether `src` is an absolute http(s) URL with a host.
#[must_use]
pub fn is_valid_image_url(src: &str) -> bool {
    url::Url::parse(src)
        .is_ok_and(|url| matches!(url.scheme(), "http" | "https") && url.host().is_some())
}

// =============================================================================
// Stored rows
// =============================================================================

/// A product mirrored into the local database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredProduct {
    /// Local row id.
    pub id: ProductId,
    /// Shopify product GID.
    pub shopify_id: String,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub variations: Vec<StoredVariation>,
}

/// A variation mirrored into the local database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredVariation {
    pub id: VariationId,
    /// Shopify variant GID.
    pub shopify_id: String,
    pub title: String,
    pub price: Price,
    pub inventory_quantity: Option<i64>,
    pub images: Vec<StoredImage>,
}

/// An image attached to a stored variation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredImage {
    pub id: ImageId,
    pub src: String,
}
