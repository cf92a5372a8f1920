//! Request extractors and middleware for the bridge.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (new hub per request, HTTP context)
//! 2. `TraceLayer` (request tracing)
//! 3. [`ShopCredentials`](crate::shopify::ShopCredentials) extractor on
//!    Shopify-facing routes

pub mod credentials;

pub use credentials::{ACCESS_TOKEN_HEADER, SHOP_DOMAIN_HEADER};
