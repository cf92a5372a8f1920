//! Product creation sequence against Shopify.
//!
//! [`ProductSync::run`] drives one product through:
//!
//! 1. title made unique with a timestamp suffix
//! 2. `productCreate` with the option schema extracted from variation titles
//! 3. `productVariantsBulkCreate` for every variation that resolves to options
//! 4. settle, then re-fetch variants
//! 5. per image: create media, poll until ready, attach to its variant
//! 6. settle, re-fetch variants, mirror everything into the [`CatalogStore`]
//!
//! Steps 2 and 3 decide the outcome. Everything after is best effort:
//! failures are logged and reported in the [`SyncReport`].

pub mod options;
pub mod poll;

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::db::{CatalogMirror, CatalogStore, MirrorVariation};
use crate::models::product::{MAX_TITLE_LENGTH, is_valid_image_url};
use crate::models::{NewProduct, NewVariation, StoredProduct};
use crate::shopify::admin::AttachOutcome;
use crate::shopify::admin::queries::{InventoryLevelInput, ProductCreateInput, VariantInput};
use crate::shopify::{
    AdminClient, GraphQLTransport, MediaStatus, RemoteErrorDetail, RemoteVariant, ShopifyError,
};
use product_bridge_core::Price;

pub use options::{ExtractedOption, extract_options, option_name};
pub use poll::{Backoff, PollOutcome, Readiness, poll_until};

/// Timing and retry settings for the creation sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    /// Pause before each variant re-fetch.
    pub settle_delay: Duration,
    /// Media status polling schedule.
    pub media_poll: Backoff,
    /// Attempts per media attachment (transient errors only).
    pub attach_attempts: u32,
    /// Pause after each attachment call.
    pub attach_pause: Duration,
    /// Location for initial inventory quantities.
    pub location_id: Option<String>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_secs(2),
            media_poll: Backoff::default(),
            attach_attempts: 3,
            attach_pause: Duration::from_millis(500),
            location_id: None,
        }
    }
}

/// Failures that abort the creation sequence.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("product creation failed: {0}")]
    ProductCreate(#[source] ShopifyError),

    #[error("variant creation failed for {product_id}: {source}")]
    VariantCreate {
        product_id: String,
        #[source]
        source: ShopifyError,
    },

    /// No variation title resolved to the product's options.
    #[error("no variation of {product_id} matched the product options")]
    NoVariants {
        product_id: String,
        skipped: Vec<String>,
    },
}

impl SyncError {
    /// Vendor error details for the API response.
    #[must_use]
    pub fn remote_details(&self) -> Vec<RemoteErrorDetail> {
        match self {
            Self::ProductCreate(source) | Self::VariantCreate { source, .. } => {
                source.remote_details()
            }
            Self::NoVariants { skipped, .. } => skipped
                .iter()
                .map(|title| RemoteErrorDetail {
                    field: Some("variations".to_string()),
                    message: format!("variation '{title}' matched no product option"),
                })
                .collect(),
        }
    }

    /// The Shopify product id, once the product exists remotely.
    #[must_use]
    pub fn product_id(&self) -> Option<&str> {
        match self {
            Self::ProductCreate(_) => None,
            Self::VariantCreate { product_id, .. } | Self::NoVariants { product_id, .. } => {
                Some(product_id)
            }
        }
    }
}

/// An image that could not be attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFailure {
    /// Title of the variation the image belongs to.
    pub variation: String,
    pub url: String,
    pub reason: String,
}

/// Outcome of a successful creation sequence.
#[derive(Debug, Clone)]
pub struct SyncReport {
    /// Shopify product GID.
    pub product_id: String,
    /// Title as created (with the uniqueness suffix).
    pub title: String,
    /// Final variant list.
    pub variants: Vec<RemoteVariant>,
    pub attached_images: usize,
    pub image_failures: Vec<ImageFailure>,
    /// Variation titles left out of variant creation.
    pub skipped_variations: Vec<String>,
    /// Local mirror, absent when persistence failed.
    pub product: Option<StoredProduct>,
    pub persistence_error: Option<String>,
}

impl SyncReport {
    /// Human-readable notes about everything that did not go to plan.
    #[must_use]
    pub fn warnings(&self) -> Vec<String> {
        let skipped = self
            .skipped_variations
            .iter()
            .map(|title| format!("variation '{title}' matched no product option and was skipped"));
        let images = self.image_failures.iter().map(|failure| {
            format!(
                "image {} for variation '{}' was not attached: {}",
                failure.url, failure.variation, failure.reason
            )
        });
        let persistence = self
            .persistence_error
            .iter()
            .map(|e| format!("local mirror not saved: {e}"));

        skipped.chain(images).chain(persistence).collect()
    }
}

/// Append the creation timestamp to a title.
///
/// The base title is shortened so the result stays within
/// [`MAX_TITLE_LENGTH`] characters.
#[must_use]
pub fn unique_title(title: &str, now: DateTime<Utc>) -> String {
    let suffix = format!(" - {}", now.timestamp());
    let keep = MAX_TITLE_LENGTH.saturating_sub(suffix.chars().count());
    let base: String = title.chars().take(keep).collect();
    format!("{}{suffix}", base.trim_end())
}

/// One product creation against one shop.
pub struct ProductSync<'a, T, S> {
    client: &'a AdminClient<T>,
    store: &'a S,
    settings: &'a SyncSettings,
}

impl<'a, T, S> ProductSync<'a, T, S>
where
    T: GraphQLTransport,
    S: CatalogStore,
{
    #[must_use]
    pub const fn new(client: &'a AdminClient<T>, store: &'a S, settings: &'a SyncSettings) -> Self {
        Self {
            client,
            store,
            settings,
        }
    }

    /// Create the product remotely and mirror it locally.
    ///
    /// # Errors
    ///
    /// Returns `SyncError` if the product or its variants could not be
    /// created. Image and persistence failures are reported in the
    /// returned [`SyncReport`] instead.
    #[instrument(skip(self, product), fields(title = %product.title))]
    pub async fn run(&self, product: &NewProduct) -> Result<SyncReport, SyncError> {
        let title = unique_title(&product.title, Utc::now());
        let extracted = extract_options(product.variations.iter().map(|v| v.title.segments()));

        let created = self
            .client
            .create_product(ProductCreateInput {
                title,
                description_html: product.description.clone(),
                product_options: options::to_option_inputs(&extracted),
            })
            .await
            .map_err(SyncError::ProductCreate)?;
        info!(product_id = %created.id, title = %created.title, "Created product");

        let mut variant_inputs = Vec::with_capacity(product.variations.len());
        let mut skipped_variations = Vec::new();
        for variation in &product.variations {
            let option_values = options::resolve_option_values(&created, variation.title.segments());
            if option_values.is_empty() {
                warn!(
                    product_id = %created.id,
                    variation = %variation.title,
                    "Variation matched no product option, skipping"
                );
                skipped_variations.push(variation.title.as_str().to_string());
                continue;
            }
            variant_inputs.push(VariantInput {
                price: variation.price.to_string(),
                option_values,
                inventory_quantities: self.inventory_for(variation),
            });
        }

        if variant_inputs.is_empty() {
            return Err(SyncError::NoVariants {
                product_id: created.id,
                skipped: skipped_variations,
            });
        }

        let bulk_created = self
            .client
            .create_variants(&created.id, variant_inputs)
            .await
            .map_err(|source| SyncError::VariantCreate {
                product_id: created.id.clone(),
                source,
            })?;
        info!(product_id = %created.id, count = bulk_created.len(), "Created variants");

        tokio::time::sleep(self.settings.settle_delay).await;
        let fetched = self.refetch_variants(&created.id, bulk_created).await;

        let mut image_failures = Vec::new();
        let mut attached: HashMap<String, Vec<String>> = HashMap::new();
        for variant in &fetched {
            let Some(variation) = match_variation(&product.variations, &variant.title) else {
                continue;
            };
            for url in &variation.images {
                match self.attach_image(&created.id, &variant.id, url).await {
                    Ok(_) => attached.entry(variant.id.clone()).or_default().push(url.clone()),
                    Err(reason) => {
                        warn!(
                            product_id = %created.id,
                            variant_id = %variant.id,
                            url = %url,
                            reason = %reason,
                            "Image not attached"
                        );
                        image_failures.push(ImageFailure {
                            variation: variation.title.as_str().to_string(),
                            url: url.clone(),
                            reason,
                        });
                    }
                }
            }
        }
        let attached_images = attached.values().map(Vec::len).sum();

        tokio::time::sleep(self.settings.settle_delay).await;
        let variants = self.refetch_variants(&created.id, fetched).await;

        let mirror = CatalogMirror {
            shopify_id: created.id.clone(),
            title: created.title.clone(),
            description: product.description.clone(),
            variations: variants
                .iter()
                .map(|variant| mirror_variation(variant, &product.variations, &mut attached))
                .collect(),
        };

        let (stored, persistence_error) = match self.store.save_catalog(&mirror).await {
            Ok(stored) => (Some(stored), None),
            Err(e) => {
                error!(product_id = %created.id, error = %e, "Failed to mirror product locally");
                (None, Some(e.to_string()))
            }
        };

        Ok(SyncReport {
            product_id: created.id,
            title: created.title,
            variants,
            attached_images,
            image_failures,
            skipped_variations,
            product: stored,
            persistence_error,
        })
    }

    fn inventory_for(&self, variation: &NewVariation) -> Vec<InventoryLevelInput> {
        match (variation.inventory_quantity, &self.settings.location_id) {
            (Some(quantity), Some(location_id)) => vec![InventoryLevelInput {
                available_quantity: quantity,
                location_id: location_id.clone(),
            }],
            _ => Vec::new(),
        }
    }

    /// Re-fetch variants, keeping the previous list if the fetch fails.
    async fn refetch_variants(
        &self,
        product_id: &str,
        previous: Vec<RemoteVariant>,
    ) -> Vec<RemoteVariant> {
        match self.client.product_variants(product_id).await {
            Ok(variants) => variants,
            Err(e) => {
                warn!(product_id = %product_id, error = %e, "Variant re-fetch failed, using previous list");
                previous
            }
        }
    }

    /// Create, await and attach one image. Returns the failure reason on error.
    #[instrument(skip(self), fields(product_id = %product_id, variant_id = %variant_id))]
    async fn attach_image(
        &self,
        product_id: &str,
        variant_id: &str,
        url: &str,
    ) -> Result<AttachOutcome, String> {
        if !is_valid_image_url(url) {
            return Err("invalid image URL".to_string());
        }

        let media = self
            .client
            .create_media(product_id, url)
            .await
            .map_err(|e| format!("media creation failed: {e}"))?;

        let client = self.client;
        let media_id = media.id.as_str();
        let outcome = poll_until(&self.settings.media_poll, |attempt| async move {
            media_readiness(client, product_id, media_id, attempt).await
        })
        .await;

        match outcome {
            PollOutcome::Ready(()) => {}
            PollOutcome::Failed => return Err("media processing failed".to_string()),
            PollOutcome::Exhausted => {
                return Err(format!(
                    "media not ready after {} status checks",
                    self.settings.media_poll.max_attempts
                ));
            }
        }

        let attempts = self.settings.attach_attempts.max(1);
        for attempt in 1..=attempts {
            let result = self
                .client
                .append_variant_media(product_id, variant_id, media_id)
                .await;
            tokio::time::sleep(self.settings.attach_pause).await;

            match result {
                Ok(AttachOutcome::Attached) => {
                    info!(media_id = %media_id, "Attached image");
                    return Ok(AttachOutcome::Attached);
                }
                Ok(AttachOutcome::AlreadyAttached) => {
                    info!(media_id = %media_id, "Image already attached");
                    return Ok(AttachOutcome::AlreadyAttached);
                }
                Err(e) if e.is_transient() && attempt < attempts => {
                    warn!(media_id = %media_id, attempt, error = %e, "Attach failed, retrying");
                }
                Err(e) => return Err(format!("attach failed: {e}")),
            }
        }

        Err("attach failed".to_string())
    }
}

async fn media_readiness<T: GraphQLTransport>(
    client: &AdminClient<T>,
    product_id: &str,
    media_id: &str,
    attempt: u32,
) -> Readiness<()> {
    match client.media_statuses(product_id).await {
        Ok(items) => match items.iter().find(|item| item.id == media_id) {
            Some(item) if item.status == MediaStatus::Ready => Readiness::Ready(()),
            Some(item) if item.status == MediaStatus::Failed => Readiness::Failed,
            _ => Readiness::Pending,
        },
        Err(e) => {
            warn!(media_id = %media_id, attempt, error = %e, "Media status check failed");
            Readiness::Pending
        }
    }
}

/// Find the input variation a remote variant was created from.
fn match_variation<'v>(variations: &'v [NewVariation], remote_title: &str) -> Option<&'v NewVariation> {
    let remote_title = remote_title.trim();
    variations
        .iter()
        .find(|v| v.title.canonical() == remote_title || v.title.as_str().trim() == remote_title)
}

fn mirror_variation(
    variant: &RemoteVariant,
    variations: &[NewVariation],
    attached: &mut HashMap<String, Vec<String>>,
) -> MirrorVariation {
    let input = match_variation(variations, &variant.title);
    let price = Price::parse(&variant.price)
        .ok()
        .or_else(|| input.map(|v| v.price))
        .unwrap_or(Price::ZERO);

    MirrorVariation {
        shopify_id: variant.id.clone(),
        title: variant.title.clone(),
        price,
        inventory_quantity: variant
            .inventory_quantity
            .or_else(|| input.and_then(|v| v.inventory_quantity)),
        images: attached.remove(&variant.id).unwrap_or_default(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use graphql_client::QueryBody;
    use product_bridge_core::{ProductId, VariationId, VariationTitle};
    use serde::Serialize;
    use serde_json::{Value, json};

    use super::*;
    use crate::db::RepositoryError;
    use crate::models::StoredVariation;

    // -------------------------------------------------------------------------
    // Fakes
    // -------------------------------------------------------------------------

    enum Scripted {
        Data(Value),
        Status(u16),
    }

    /// Transport answering by operation name; the last scripted answer for
    /// an operation repeats once the queue is down to one.
    #[derive(Default)]
    struct FakeTransport {
        script: Mutex<HashMap<&'static str, VecDeque<Scripted>>>,
        requests: Mutex<Vec<Value>>,
    }

    impl FakeTransport {
        fn respond(&self, operation: &'static str, data: Value) -> &Self {
            self.push(operation, Scripted::Data(json!({ "data": data })))
        }

        fn fail(&self, operation: &'static str, status: u16) -> &Self {
            self.push(operation, Scripted::Status(status))
        }

        fn push(&self, operation: &'static str, answer: Scripted) -> &Self {
            self.script
                .lock()
                .unwrap()
                .entry(operation)
                .or_default()
                .push_back(answer);
            self
        }

        fn requests_for(&self, operation: &str) -> Vec<Value> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r["operationName"] == operation)
                .cloned()
                .collect()
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    impl GraphQLTransport for FakeTransport {
        async fn send<V>(&self, request: &QueryBody<V>) -> Result<Value, ShopifyError>
        where
            V: Serialize + Sync,
        {
            let wire = serde_json::to_string(request)?;
            self.requests
                .lock()
                .unwrap()
                .push(serde_json::from_str(&wire)?);

            let mut script = self.script.lock().unwrap();
            let queue = script
                .get_mut(request.operation_name)
                .ok_or_else(|| ShopifyError::MissingData(request.operation_name.to_string()))?;
            let answer = if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().map(|a| match a {
                    Scripted::Data(v) => Scripted::Data(v.clone()),
                    Scripted::Status(s) => Scripted::Status(*s),
                })
            };
            match answer {
                Some(Scripted::Data(value)) => Ok(value),
                Some(Scripted::Status(status)) => Err(ShopifyError::Status {
                    status,
                    body: String::new(),
                }),
                None => Err(ShopifyError::MissingData(request.operation_name.to_string())),
            }
        }
    }

    #[derive(Default)]
    struct FakeStore {
        saved: Mutex<Vec<CatalogMirror>>,
        fail: bool,
    }

    impl CatalogStore for FakeStore {
        async fn save_catalog(
            &self,
            mirror: &CatalogMirror,
        ) -> Result<StoredProduct, RepositoryError> {
            if self.fail {
                return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
            }
            self.saved.lock().unwrap().push(mirror.clone());
            let now = Utc::now();
            Ok(StoredProduct {
                id: ProductId::new(1),
                shopify_id: mirror.shopify_id.clone(),
                title: mirror.title.clone(),
                description: mirror.description.clone(),
                created_at: now,
                updated_at: now,
                variations: mirror
                    .variations
                    .iter()
                    .zip(1..)
                    .map(|(v, id)| StoredVariation {
                        id: VariationId::new(id),
                        shopify_id: v.shopify_id.clone(),
                        title: v.title.clone(),
                        price: v.price,
                        inventory_quantity: v.inventory_quantity,
                        images: vec![],
                    })
                    .collect(),
            })
        }
    }

    // -------------------------------------------------------------------------
    // Fixtures
    // -------------------------------------------------------------------------

    const PRODUCT_ID: &str = "gid://shopify/Product/1";
    const RED: &str = "gid://shopify/ProductVariant/11";
    const BLUE: &str = "gid://shopify/ProductVariant/12";

    fn settings() -> SyncSettings {
        SyncSettings {
            settle_delay: Duration::from_secs(2),
            media_poll: Backoff {
                max_attempts: 3,
                initial_interval: Duration::from_secs(1),
                max_interval: Duration::from_secs(2),
                multiplier: 2,
            },
            attach_attempts: 2,
            attach_pause: Duration::from_millis(500),
            location_id: Some("gid://shopify/Location/9".to_string()),
        }
    }

    fn variation(title: &str, price: &str, images: &[&str]) -> NewVariation {
        NewVariation {
            title: VariationTitle::parse(title).unwrap(),
            price: Price::parse(price).unwrap(),
            inventory_quantity: Some(3),
            images: images.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    fn shirt(variations: Vec<NewVariation>) -> NewProduct {
        NewProduct {
            title: "Shirt".to_string(),
            description: Some("<p>Soft</p>".to_string()),
            variations,
        }
    }

    fn created_product(options: Value) -> Value {
        json!({"productCreate": {
            "product": {"id": PRODUCT_ID, "title": "Shirt - 1", "options": options},
            "userErrors": []
        }})
    }

    fn color_size_options() -> Value {
        json!([
            {"id": "gid://shopify/ProductOption/1", "name": "Color", "position": 1, "values": ["Red", "Blue"]},
            {"id": "gid://shopify/ProductOption/2", "name": "Size", "position": 2, "values": ["Small"]}
        ])
    }

    fn variants_json() -> Value {
        json!([
            {"id": RED, "title": "Red / Small", "price": "10.00", "sku": "", "inventoryQuantity": 3},
            {"id": BLUE, "title": "Blue / Small", "price": "12.00", "sku": "", "inventoryQuantity": 3}
        ])
    }

    fn media(id: &str) -> Value {
        json!({"productCreateMedia": {
            "media": [{"id": id, "status": "UPLOADED"}],
            "mediaUserErrors": []
        }})
    }

    fn attached() -> Value {
        json!({"productVariantAppendMedia": {"productVariants": [], "userErrors": []}})
    }

    /// Happy-path script for Red (two images) and Blue (one image).
    fn scripted_shop() -> FakeTransport {
        let transport = FakeTransport::default();
        transport
            .respond("ProductCreate", created_product(color_size_options()))
            .respond(
                "ProductVariantsBulkCreate",
                json!({"productVariantsBulkCreate": {"productVariants": variants_json(), "userErrors": []}}),
            )
            .respond("ProductVariants", json!({"product": {"variants": {"nodes": variants_json()}}}))
            .respond("ProductCreateMedia", media("gid://shopify/MediaImage/1"))
            .respond("ProductCreateMedia", media("gid://shopify/MediaImage/2"))
            .respond("ProductCreateMedia", media("gid://shopify/MediaImage/3"))
            .respond("ProductVariantAppendMedia", attached());
        transport
    }

    fn media_statuses(statuses: &[(&str, &str)]) -> Value {
        let nodes: Vec<Value> = statuses
            .iter()
            .map(|(id, status)| json!({"id": id, "status": status}))
            .collect();
        json!({"product": {"media": {"nodes": nodes}}})
    }

    fn two_variation_shirt() -> NewProduct {
        shirt(vec![
            variation(
                "Red / Small",
                "10",
                &["https://cdn.example.com/red-1.png", "https://cdn.example.com/red-2.png"],
            ),
            variation("Blue / Small", "12", &["https://cdn.example.com/blue.png"]),
        ])
    }

    // -------------------------------------------------------------------------
    // Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_unique_title_appends_timestamp() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        assert_eq!(unique_title("Shirt", now), "Shirt - 1700000000");
    }

    #[test]
    fn test_unique_title_fits_title_limit() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let title = "é".repeat(MAX_TITLE_LENGTH);

        let unique = unique_title(&title, now);
        assert_eq!(unique.chars().count(), MAX_TITLE_LENGTH);
        assert!(unique.ends_with(" - 1700000000"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_longest_valid_title_is_sent_within_limit() {
        let transport = scripted_shop();
        transport.respond("ProductMediaStatus", media_statuses(&[]));
        let client = AdminClient::with_transport(transport);
        let store = FakeStore::default();
        let settings = settings();

        let product = crate::models::ProductPayload {
            title: Some("x".repeat(MAX_TITLE_LENGTH)),
            description: None,
            variations: Some(vec![crate::models::VariationPayload {
                title: Some("Red / Small".to_string()),
                price: Some(json!("10")),
                inventory_quantity: None,
                images: None,
            }]),
        }
        .validate()
        .unwrap();
        ProductSync::new(&client, &store, &settings)
            .run(&product)
            .await
            .unwrap();

        let creates = client.transport().requests_for("ProductCreate");
        let sent = creates[0]["variables"]["product"]["title"].as_str().unwrap();
        assert!(sent.chars().count() <= MAX_TITLE_LENGTH);
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_sequence_mirrors_product() {
        let transport = scripted_shop();
        transport.respond(
            "ProductMediaStatus",
            media_statuses(&[
                ("gid://shopify/MediaImage/1", "READY"),
                ("gid://shopify/MediaImage/2", "READY"),
                ("gid://shopify/MediaImage/3", "READY"),
            ]),
        );
        let client = AdminClient::with_transport(transport);
        let store = FakeStore::default();
        let settings = settings();

        let report = ProductSync::new(&client, &store, &settings)
            .run(&two_variation_shirt())
            .await
            .unwrap();

        assert_eq!(report.product_id, PRODUCT_ID);
        assert_eq!(report.variants.len(), 2);
        assert_eq!(report.attached_images, 3);
        assert!(report.image_failures.is_empty());
        assert!(report.warnings().is_empty());
        assert!(report.product.is_some());

        let saved = store.saved.lock().unwrap();
        let mirror = saved.first().unwrap();
        assert_eq!(mirror.shopify_id, PRODUCT_ID);
        assert_eq!(mirror.description.as_deref(), Some("<p>Soft</p>"));
        assert_eq!(mirror.variations.len(), 2);
        assert_eq!(mirror.variations[0].images.len(), 2);
        assert_eq!(mirror.variations[1].images, ["https://cdn.example.com/blue.png"]);
        assert_eq!(mirror.variations[1].price, Price::parse("12.00").unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_product_and_variant_requests_carry_options() {
        let transport = scripted_shop();
        transport.respond("ProductMediaStatus", media_statuses(&[]));
        let client = AdminClient::with_transport(transport);
        let store = FakeStore::default();
        let settings = settings();

        let product = shirt(vec![
            variation("Red / Small", "10", &[]),
            variation("Blue / Small", "12", &[]),
        ]);
        ProductSync::new(&client, &store, &settings)
            .run(&product)
            .await
            .unwrap();

        let creates = client.transport().requests_for("ProductCreate");
        let create = &creates[0];
        let options = &create["variables"]["product"]["productOptions"];
        assert_eq!(options[0]["name"], "Color");
        assert_eq!(options[0]["values"], json!([{"name": "Red"}, {"name": "Blue"}]));
        assert_eq!(options[1]["name"], "Size");

        let bulks = client.transport().requests_for("ProductVariantsBulkCreate");
        let bulk = &bulks[0];
        let variants = &bulk["variables"]["variants"];
        assert_eq!(variants.as_array().unwrap().len(), 2);
        assert_eq!(variants[1]["price"], "12");
        assert_eq!(
            variants[1]["optionValues"],
            json!([
                {"optionId": "gid://shopify/ProductOption/1", "name": "Blue"},
                {"optionId": "gid://shopify/ProductOption/2", "name": "Small"}
            ])
        );
        assert_eq!(
            variants[0]["inventoryQuantities"],
            json!([{"availableQuantity": 3, "locationId": "gid://shopify/Location/9"}])
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_product_id_fails_without_writes() {
        let transport = FakeTransport::default();
        transport.respond(
            "ProductCreate",
            json!({"productCreate": {"product": null, "userErrors": []}}),
        );
        let client = AdminClient::with_transport(transport);
        let store = FakeStore::default();
        let settings = settings();

        let err = ProductSync::new(&client, &store, &settings)
            .run(&two_variation_shirt())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SyncError::ProductCreate(ShopifyError::MissingData(_))
        ));
        assert!(store.saved.lock().unwrap().is_empty());
        assert_eq!(client.transport().request_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_variant_user_errors_abort() {
        let transport = FakeTransport::default();
        transport
            .respond("ProductCreate", created_product(color_size_options()))
            .respond(
                "ProductVariantsBulkCreate",
                json!({"productVariantsBulkCreate": {
                    "productVariants": null,
                    "userErrors": [{"field": ["variants", "0", "price"], "message": "is invalid", "code": "INVALID"}]
                }}),
            );
        let client = AdminClient::with_transport(transport);
        let store = FakeStore::default();
        let settings = settings();

        let err = ProductSync::new(&client, &store, &settings)
            .run(&two_variation_shirt())
            .await
            .unwrap_err();

        assert_eq!(err.product_id(), Some(PRODUCT_ID));
        assert_eq!(
            err.remote_details()[0].field.as_deref(),
            Some("variants.0.price")
        );
        assert!(store.saved.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_failed_image_keeps_the_rest() {
        let transport = scripted_shop();
        transport.respond(
            "ProductMediaStatus",
            media_statuses(&[
                ("gid://shopify/MediaImage/1", "READY"),
                ("gid://shopify/MediaImage/2", "FAILED"),
                ("gid://shopify/MediaImage/3", "READY"),
            ]),
        );
        let client = AdminClient::with_transport(transport);
        let store = FakeStore::default();
        let settings = settings();

        let report = ProductSync::new(&client, &store, &settings)
            .run(&two_variation_shirt())
            .await
            .unwrap();

        assert_eq!(report.attached_images, 2);
        assert_eq!(report.image_failures.len(), 1);
        assert_eq!(report.image_failures[0].url, "https://cdn.example.com/red-2.png");
        assert_eq!(report.image_failures[0].variation, "Red / Small");
        assert_eq!(report.warnings().len(), 1);

        let saved = store.saved.lock().unwrap();
        let mirror = saved.first().unwrap();
        assert_eq!(mirror.variations.len(), 2);
        assert_eq!(mirror.variations[0].images, ["https://cdn.example.com/red-1.png"]);
        assert_eq!(mirror.variations[1].images, ["https://cdn.example.com/blue.png"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_images_use_two_attach_calls() {
        let transport = scripted_shop();
        transport.respond(
            "ProductMediaStatus",
            media_statuses(&[
                ("gid://shopify/MediaImage/1", "READY"),
                ("gid://shopify/MediaImage/2", "READY"),
                ("gid://shopify/MediaImage/3", "READY"),
            ]),
        );
        let client = AdminClient::with_transport(transport);
        let store = FakeStore::default();
        let settings = settings();

        ProductSync::new(&client, &store, &settings)
            .run(&two_variation_shirt())
            .await
            .unwrap();

        let red_calls: Vec<Value> = client
            .transport()
            .requests_for("ProductVariantAppendMedia")
            .into_iter()
            .filter(|r| r["variables"]["variantMedia"][0]["variantId"] == RED)
            .collect();
        assert_eq!(red_calls.len(), 2);
        for call in &red_calls {
            let entries = call["variables"]["variantMedia"].as_array().unwrap();
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0]["mediaIds"].as_array().unwrap().len(), 1);
        }
        assert_ne!(
            red_calls[0]["variables"]["variantMedia"][0]["mediaIds"],
            red_calls[1]["variables"]["variantMedia"][0]["mediaIds"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_media_never_ready_is_skipped() {
        let transport = scripted_shop();
        transport.respond(
            "ProductMediaStatus",
            media_statuses(&[("gid://shopify/MediaImage/1", "PROCESSING")]),
        );
        let client = AdminClient::with_transport(transport);
        let store = FakeStore::default();
        let settings = settings();

        let product = shirt(vec![variation(
            "Red / Small",
            "10",
            &["https://cdn.example.com/red-1.png"],
        )]);
        let report = ProductSync::new(&client, &store, &settings)
            .run(&product)
            .await
            .unwrap();

        assert_eq!(report.attached_images, 0);
        assert_eq!(report.image_failures.len(), 1);
        assert_eq!(
            client.transport().requests_for("ProductMediaStatus").len(),
            3
        );
        assert!(client.transport().requests_for("ProductVariantAppendMedia").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_attach_error_is_retried() {
        let transport = scripted_shop();
        transport.respond(
            "ProductMediaStatus",
            media_statuses(&[("gid://shopify/MediaImage/1", "READY")]),
        );
        {
            let mut script = transport.script.lock().unwrap();
            let queue = script.get_mut("ProductVariantAppendMedia").unwrap();
            queue.push_front(Scripted::Status(502));
        }
        let client = AdminClient::with_transport(transport);
        let store = FakeStore::default();
        let settings = settings();

        let product = shirt(vec![variation(
            "Red / Small",
            "10",
            &["https://cdn.example.com/red-1.png"],
        )]);
        let report = ProductSync::new(&client, &store, &settings)
            .run(&product)
            .await
            .unwrap();

        assert_eq!(report.attached_images, 1);
        assert_eq!(
            client.transport().requests_for("ProductVariantAppendMedia").len(),
            2
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_attached_counts_as_attached() {
        let transport = scripted_shop();
        transport.respond(
            "ProductMediaStatus",
            media_statuses(&[("gid://shopify/MediaImage/1", "READY")]),
        );
        {
            let mut script = transport.script.lock().unwrap();
            let queue = script.get_mut("ProductVariantAppendMedia").unwrap();
            queue.clear();
            queue.push_back(Scripted::Data(json!({"data": {"productVariantAppendMedia": {
                "productVariants": [],
                "userErrors": [{"field": null, "message": "Media is already attached", "code": "MEDIA_ALREADY_ATTACHED"}]
            }}})));
        }
        let client = AdminClient::with_transport(transport);
        let store = FakeStore::default();
        let settings = settings();

        let product = shirt(vec![variation(
            "Red / Small",
            "10",
            &["https://cdn.example.com/red-1.png"],
        )]);
        let report = ProductSync::new(&client, &store, &settings)
            .run(&product)
            .await
            .unwrap();

        assert_eq!(report.attached_images, 1);
        assert_eq!(
            client.transport().requests_for("ProductVariantAppendMedia").len(),
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_variant_with_other_media_is_not_mirrored() {
        let transport = scripted_shop();
        transport.respond(
            "ProductMediaStatus",
            media_statuses(&[("gid://shopify/MediaImage/1", "READY")]),
        );
        {
            let mut script = transport.script.lock().unwrap();
            let queue = script.get_mut("ProductVariantAppendMedia").unwrap();
            queue.clear();
            queue.push_back(Scripted::Data(json!({"data": {"productVariantAppendMedia": {
                "productVariants": [],
                "userErrors": [{
                    "field": ["variantMedia"],
                    "message": "Product variant already has attached media",
                    "code": "PRODUCT_VARIANT_ALREADY_HAS_MEDIA"
                }]
            }}})));
        }
        let client = AdminClient::with_transport(transport);
        let store = FakeStore::default();
        let settings = settings();

        let product = shirt(vec![variation(
            "Red / Small",
            "10",
            &["https://cdn.example.com/red-1.png"],
        )]);
        let report = ProductSync::new(&client, &store, &settings)
            .run(&product)
            .await
            .unwrap();

        assert_eq!(report.attached_images, 0);
        assert_eq!(report.image_failures.len(), 1);
        assert_eq!(report.image_failures[0].url, "https://cdn.example.com/red-1.png");
        // Rejections are not retried
        assert_eq!(
            client.transport().requests_for("ProductVariantAppendMedia").len(),
            1
        );

        let saved = store.saved.lock().unwrap();
        let mirror = saved.first().unwrap();
        assert!(mirror.variations.iter().all(|v| v.images.is_empty()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmatched_variation_is_skipped_with_warning() {
        let transport = FakeTransport::default();
        transport
            .respond(
                "ProductCreate",
                created_product(json!([
                    {"id": "gid://shopify/ProductOption/1", "name": "Color", "position": 1, "values": ["Red"]}
                ])),
            )
            .respond(
                "ProductVariantsBulkCreate",
                json!({"productVariantsBulkCreate": {"productVariants": [
                    {"id": RED, "title": "Red", "price": "10.00", "sku": null, "inventoryQuantity": 3}
                ], "userErrors": []}}),
            )
            .respond(
                "ProductVariants",
                json!({"product": {"variants": {"nodes": [
                    {"id": RED, "title": "Red", "price": "10.00", "sku": null, "inventoryQuantity": 3}
                ]}}}),
            );
        let client = AdminClient::with_transport(transport);
        let store = FakeStore::default();
        let settings = settings();

        let product = shirt(vec![variation("Red", "10", &[]), variation("Green", "10", &[])]);
        let report = ProductSync::new(&client, &store, &settings)
            .run(&product)
            .await
            .unwrap();

        assert_eq!(report.skipped_variations, ["Green"]);
        assert!(report.warnings()[0].contains("Green"));
        let bulks = client.transport().requests_for("ProductVariantsBulkCreate");
        let bulk = &bulks[0];
        assert_eq!(bulk["variables"]["variants"].as_array().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_matching_variation_fails() {
        let transport = FakeTransport::default();
        transport.respond("ProductCreate", created_product(json!([])));
        let client = AdminClient::with_transport(transport);
        let store = FakeStore::default();
        let settings = settings();

        let err = ProductSync::new(&client, &store, &settings)
            .run(&shirt(vec![variation("Red", "10", &[])]))
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::NoVariants { ref skipped, .. } if skipped == &["Red"]));
        assert!(client.transport().requests_for("ProductVariantsBulkCreate").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refetch_failure_falls_back_to_created_variants() {
        let transport = FakeTransport::default();
        transport
            .respond("ProductCreate", created_product(color_size_options()))
            .respond(
                "ProductVariantsBulkCreate",
                json!({"productVariantsBulkCreate": {"productVariants": variants_json(), "userErrors": []}}),
            )
            .fail("ProductVariants", 503);
        let client = AdminClient::with_transport(transport);
        let store = FakeStore::default();
        let settings = settings();

        let product = shirt(vec![
            variation("Red / Small", "10", &[]),
            variation("Blue / Small", "12", &[]),
        ]);
        let report = ProductSync::new(&client, &store, &settings)
            .run(&product)
            .await
            .unwrap();

        assert_eq!(report.variants.len(), 2);
        assert_eq!(store.saved.lock().unwrap()[0].variations.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_persistence_failure_is_not_fatal() {
        let transport = scripted_shop();
        transport.respond("ProductMediaStatus", media_statuses(&[]));
        let client = AdminClient::with_transport(transport);
        let store = FakeStore {
            fail: true,
            ..FakeStore::default()
        };
        let settings = settings();

        let product = shirt(vec![variation("Red / Small", "10", &[])]);
        let report = ProductSync::new(&client, &store, &settings)
            .run(&product)
            .await
            .unwrap();

        assert!(report.product.is_none());
        assert!(report.persistence_error.is_some());
        assert!(report.warnings().iter().any(|w| w.contains("local mirror")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hostile_title_reaches_shopify_intact() {
        let transport = FakeTransport::default();
        transport.respond(
            "ProductCreate",
            json!({"productCreate": {"product": null, "userErrors": [{"field": ["title"], "message": "rejected"}]}}),
        );
        let client = AdminClient::with_transport(transport);
        let store = FakeStore::default();
        let settings = settings();

        let hostile = "Tee \"quoted\" back\\slash\nline\r) { mutation";
        let product = NewProduct {
            title: hostile.to_string(),
            description: None,
            variations: vec![variation("Red", "1", &[])],
        };
        let _ = ProductSync::new(&client, &store, &settings).run(&product).await;

        let creates = client.transport().requests_for("ProductCreate");
        let create = &creates[0];
        let sent = create["variables"]["product"]["title"].as_str().unwrap();
        assert!(sent.starts_with(&format!("{hostile} - ")));
        assert!(!create["query"].as_str().unwrap().contains("quoted"));
    }
}
