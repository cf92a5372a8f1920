//! Shopify Admin API client used by the product bridge.
//!
//! # Security
//!
//! The access token arrives per request in the `X-Shopify-Access-Token`
//! header and is only held for the lifetime of that request's client.
//!
//! # Architecture
//!
//! - [`GraphQLTransport`] POSTs a GraphQL request body and returns the parsed
//!   JSON envelope; [`HttpTransport`] is the reqwest implementation
//! - [`admin::queries`] holds the static documents and their typed variables
//! - [`AdminClient`] wraps a transport with typed product, variant and media
//!   operations
//!
//! # Example
//!
//! ```rust,ignore
//! use product_bridge::shopify::{AdminClient, ShopCredentials};
//!
//! let client = AdminClient::new(&credentials, &config.shopify, http.clone());
//! let variants = client.product_variants("gid://shopify/Product/1").await?;
//! ```

pub mod admin;
pub mod types;

pub use admin::{AdminClient, GraphQLTransport, HttpTransport, ShopCredentials};
pub use types::*;

use thiserror::Error;

/// Errors that can occur when interacting with Shopify Admin API.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed before a response was received.
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Shopify answered with an unexpected HTTP status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// Response status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Authentication/authorization failed.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// GraphQL query returned top-level errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// A mutation returned `userErrors`.
    #[error("{operation} failed: {}", format_user_errors(.errors))]
    UserErrors {
        /// Mutation field name (e.g. `productCreate`).
        operation: &'static str,
        /// Errors reported by Shopify.
        errors: Vec<UserError>,
    },

    /// The response was well-formed but lacked an expected field.
    #[error("Missing data: {0}")]
    MissingData(String),

    /// JSON decoding failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ShopifyError {
    /// True when the request never produced a GraphQL response.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Status { .. } | Self::RateLimited(_)
        )
    }

    /// True when retrying the same request may succeed.
    ///
    /// `userErrors` and authorization failures are deterministic; everything
    /// else (transport failures, top-level GraphQL errors, malformed payloads)
    /// is worth another attempt.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        !matches!(self, Self::UserErrors { .. } | Self::Unauthorized(_))
    }

    /// Vendor error details suitable for returning to API callers.
    #[must_use]
    pub fn remote_details(&self) -> Vec<RemoteErrorDetail> {
        match self {
            Self::GraphQL(errors) => errors
                .iter()
                .map(|e| RemoteErrorDetail {
                    field: None,
                    message: e.message.clone(),
                })
                .collect(),
            Self::UserErrors { errors, .. } => errors
                .iter()
                .map(|e| RemoteErrorDetail {
                    field: e.field.as_ref().map(|f| f.join(".")),
                    message: e.message.clone(),
                })
                .collect(),
            other => vec![RemoteErrorDetail {
                field: None,
                message: other.to_string(),
            }],
        }
    }
}

/// A GraphQL error returned by the Shopify Admin API.
#[derive(Debug, Clone)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Source locations in the query.
    pub locations: Vec<GraphQLErrorLocation>,
    /// Path to the error in the response.
    pub path: Vec<serde_json::Value>,
}

/// Location in a GraphQL query where an error occurred.
#[derive(Debug, Clone)]
pub struct GraphQLErrorLocation {
    /// Line number (1-indexed).
    pub line: i64,
    /// Column number (1-indexed).
    pub column: i64,
}

/// Field/message pair exposed in error responses.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RemoteErrorDetail {
    /// Dotted input path, when Shopify reported one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Shopify's message.
    pub message: String,
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    errors
        .iter()
        .map(|e| e.message.clone())
        .collect::<Vec<_>>()
        .join("; ")
}

fn format_user_errors(errors: &[UserError]) -> String {
    errors
        .iter()
        .map(|e| {
            let field = e.field.as_ref().map_or_else(String::new, |f| f.join("."));
            if field.is_empty() {
                e.message.clone()
            } else {
                format!("{field}: {}", e.message)
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}
