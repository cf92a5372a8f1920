//! Shopify Admin API GraphQL client.
//!
//! The client is built per inbound request from the shop domain and access
//! token supplied in that request's headers. The underlying
//! `reqwest::Client` (connection pool, timeout) is shared process-wide.

use std::future::Future;

use graphql_client::QueryBody;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::instrument;

use crate::config::ShopifyApiConfig;

use super::{GraphQLError, GraphQLErrorLocation, ShopifyError};

mod media;
mod products;
pub mod queries;

pub use media::AttachOutcome;

/// Maximum number of response body bytes kept in `ShopifyError::Status`.
const MAX_ERROR_BODY: usize = 512;

/// Per-request shop credentials.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct ShopCredentials {
    /// Shop domain (e.g., your-store.myshopify.com)
    pub shop_domain: String,
    /// Admin API access token
    pub access_token: SecretString,
}

impl std::fmt::Debug for ShopCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopCredentials")
            .field("shop_domain", &self.shop_domain)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

/// Sends a GraphQL request body and returns the decoded JSON response.
///
/// Implementations only fail for transport-level problems (connection,
/// HTTP status, undecodable body); GraphQL `errors` are left in the
/// returned envelope for [`execute`] to interpret.
pub trait GraphQLTransport: Send + Sync {
    /// POST one GraphQL request.
    fn send<V>(
        &self,
        request: &QueryBody<V>,
    ) -> impl Future<Output = Result<serde_json::Value, ShopifyError>> + Send
    where
        V: Serialize + Sync;
}

/// reqwest-backed transport for one shop's Admin API endpoint.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
    access_token: SecretString,
}

impl HttpTransport {
    /// Create a transport for `https://{shop}/admin/api/{version}/graphql.json`.
    #[must_use]
    pub fn new(
        credentials: &ShopCredentials,
        config: &ShopifyApiConfig,
        client: reqwest::Client,
    ) -> Self {
        let endpoint = format!(
            "https://{}/admin/api/{}/graphql.json",
            credentials.shop_domain, config.api_version
        );
        Self::with_endpoint(endpoint, credentials.access_token.clone(), client)
    }

    /// Create a transport for an explicit endpoint URL.
    #[must_use]
    pub const fn with_endpoint(
        endpoint: String,
        access_token: SecretString,
        client: reqwest::Client,
    ) -> Self {
        Self {
            client,
            endpoint,
            access_token,
        }
    }

    /// The GraphQL endpoint this transport posts to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl GraphQLTransport for HttpTransport {
    #[instrument(skip(self, request), fields(operation = request.operation_name))]
    async fn send<V>(&self, request: &QueryBody<V>) -> Result<serde_json::Value, ShopifyError>
    where
        V: Serialize + Sync,
    {
        let response = self
            .client
            .post(&self.endpoint)
            .header("X-Shopify-Access-Token", self.access_token.expose_secret())
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .json(request)
            .send()
            .await?;

        let status = response.status();

        // Check for rate limiting
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(2);
            return Err(ShopifyError::RateLimited(retry_after));
        }

        // Check for unauthorized
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(ShopifyError::Unauthorized(
                "Invalid or expired access token".to_string(),
            ));
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let body = text.chars().take(MAX_ERROR_BODY).collect();
            return Err(ShopifyError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}

/// GraphQL response wrapper.
#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLErrorResponse>>,
}

#[derive(Debug, Deserialize)]
struct GraphQLErrorResponse {
    message: String,
    #[serde(default)]
    locations: Vec<GraphQLErrorLocationResponse>,
    #[serde(default)]
    path: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GraphQLErrorLocationResponse {
    line: i64,
    column: i64,
}

/// Send a request and decode its `data` as `T`.
///
/// # Errors
///
/// Returns transport errors unchanged, `ShopifyError::GraphQL` if the
/// envelope carries top-level `errors`, `ShopifyError::MissingData` if
/// `data` is absent and `ShopifyError::Parse` if `data` does not match `T`.
pub async fn execute<T, V, Tr>(transport: &Tr, request: &QueryBody<V>) -> Result<T, ShopifyError>
where
    T: DeserializeOwned,
    V: Serialize + Sync,
    Tr: GraphQLTransport,
{
    let body = transport.send(request).await?;
    let graphql_response: GraphQLResponse<T> = serde_json::from_value(body)?;

    // Check for GraphQL errors
    if let Some(errors) = graphql_response.errors
        && !errors.is_empty()
    {
        let converted_errors: Vec<GraphQLError> = errors
            .into_iter()
            .map(|e| GraphQLError {
                message: e.message,
                locations: e
                    .locations
                    .into_iter()
                    .map(|l| GraphQLErrorLocation {
                        line: l.line,
                        column: l.column,
                    })
                    .collect(),
                path: e.path,
            })
            .collect();
        return Err(ShopifyError::GraphQL(converted_errors));
    }

    graphql_response
        .data
        .ok_or_else(|| ShopifyError::MissingData(format!("{}: no data", request.operation_name)))
}

/// Shopify Admin API client.
///
/// Wraps a [`GraphQLTransport`] with typed operations for products,
/// variants and media. Cheap to clone when the transport is.
#[derive(Clone)]
pub struct AdminClient<T = HttpTransport> {
    transport: T,
}

impl AdminClient<HttpTransport> {
    /// Create a client for one shop.
    ///
    /// # Arguments
    ///
    /// * `credentials` - Shop domain and access token from the inbound request
    /// * `config` - API version and timeouts
    /// * `http` - Shared HTTP client
    #[must_use]
    pub fn new(
        credentials: &ShopCredentials,
        config: &ShopifyApiConfig,
        http: reqwest::Client,
    ) -> Self {
        Self::with_transport(HttpTransport::new(credentials, config, http))
    }
}

impl<T: GraphQLTransport> AdminClient<T> {
    /// Create a client over an arbitrary transport.
    #[must_use]
    pub const fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    /// Get the underlying transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }
}

/// Build the shared HTTP client with the configured transport timeout.
///
/// # Errors
///
/// Returns `reqwest::Error` if the TLS backend cannot be initialised.
pub fn build_http_client(config: &ShopifyApiConfig) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(config.request_timeout)
        .user_agent(concat!("product-bridge/", env!("CARGO_PKG_VERSION")))
        .build()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn transport_for(server: &MockServer) -> HttpTransport {
        HttpTransport::with_endpoint(
            format!("{}/admin/api/2025-01/graphql.json", server.uri()),
            SecretString::from("shpat_test_token"),
            reqwest::Client::new(),
        )
    }

    #[test]
    fn test_endpoint_is_templated_from_shop_and_version() {
        let credentials = ShopCredentials {
            shop_domain: "demo.myshopify.com".to_string(),
            access_token: SecretString::from("shpat_x"),
        };
        let config = ShopifyApiConfig {
            api_version: "2025-01".to_string(),
            request_timeout: Duration::from_secs(5),
        };
        let transport = HttpTransport::new(&credentials, &config, reqwest::Client::new());
        assert_eq!(
            transport.endpoint(),
            "https://demo.myshopify.com/admin/api/2025-01/graphql.json"
        );
    }

    #[test]
    fn test_credentials_debug_redacts_token() {
        let credentials = ShopCredentials {
            shop_domain: "demo.myshopify.com".to_string(),
            access_token: SecretString::from("shpat_super_secret"),
        };
        let debug = format!("{credentials:?}");
        assert!(debug.contains("demo.myshopify.com"));
        assert!(!debug.contains("shpat_super_secret"));
    }

    #[tokio::test]
    async fn test_send_attaches_required_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/admin/api/2025-01/graphql.json"))
            .and(header("X-Shopify-Access-Token", "shpat_test_token"))
            .and(header("Content-Type", "application/json"))
            .and(body_partial_json(json!({"operationName": "ProductVariants"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"product": null}})))
            .expect(1)
            .mount(&server)
            .await;

        let transport = transport_for(&server);
        let body = transport
            .send(&queries::product_variants("gid://shopify/Product/1"))
            .await
            .unwrap();
        assert_eq!(body, json!({"data": {"product": null}}));
    }

    #[tokio::test]
    async fn test_rate_limit_maps_to_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "2"))
            .mount(&server)
            .await;

        let err = transport_for(&server)
            .send(&queries::product_variants("gid://shopify/Product/1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ShopifyError::RateLimited(2)));
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_unauthorized_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = transport_for(&server)
            .send(&queries::product_variants("gid://shopify/Product/1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ShopifyError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_server_error_keeps_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
            .mount(&server)
            .await;

        let err = transport_for(&server)
            .send(&queries::product_variants("gid://shopify/Product/1"))
            .await
            .unwrap_err();
        match err {
            ShopifyError::Status { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "upstream unavailable");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_connection_failure_is_transport_error() {
        let transport = HttpTransport::with_endpoint(
            "http://127.0.0.1:9/graphql.json".to_string(),
            SecretString::from("shpat_test_token"),
            reqwest::Client::new(),
        );
        let err = transport
            .send(&queries::product_variants("gid://shopify/Product/1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ShopifyError::Transport(_)));
    }

    #[tokio::test]
    async fn test_execute_surfaces_top_level_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "errors": [{"message": "Throttled", "locations": [{"line": 1, "column": 2}]}]
            })))
            .mount(&server)
            .await;

        let err = execute::<serde_json::Value, _, _>(
            &transport_for(&server),
            &queries::product_variants("gid://shopify/Product/1"),
        )
        .await
        .unwrap_err();
        match err {
            ShopifyError::GraphQL(errors) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors.first().unwrap().message, "Throttled");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_execute_reports_missing_data() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let err = execute::<serde_json::Value, _, _>(
            &transport_for(&server),
            &queries::product_variants("gid://shopify/Product/1"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ShopifyError::MissingData(_)));
    }
}
