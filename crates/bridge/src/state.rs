//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::BridgeConfig;
use crate::db::PgCatalogStore;
use crate::shopify::admin::build_http_client;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. Shopify clients are not part
/// of it: each request builds one from its own credentials on top of the
/// shared HTTP client.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: BridgeConfig,
    pool: PgPool,
    catalog: PgCatalogStore,
    http: reqwest::Client,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Bridge configuration
    /// * `pool` - `PostgreSQL` connection pool
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the HTTP client cannot be built.
    pub fn new(config: BridgeConfig, pool: PgPool) -> Result<Self, reqwest::Error> {
        let http = build_http_client(&config.shopify)?;
        Ok(Self::with_http_client(config, pool, http))
    }

    /// Create application state around an existing HTTP client.
    #[must_use]
    pub fn with_http_client(config: BridgeConfig, pool: PgPool, http: reqwest::Client) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                catalog: PgCatalogStore::new(pool.clone()),
                config,
                pool,
                http,
            }),
        }
    }

    /// Get a reference to the bridge configuration.
    #[must_use]
    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get the catalog mirror store.
    #[must_use]
    pub fn catalog(&self) -> &PgCatalogStore {
        &self.inner.catalog
    }

    /// Get the shared HTTP client for Shopify calls.
    #[must_use]
    pub fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }
}
