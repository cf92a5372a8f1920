//! Per-request Shopify credentials taken from request headers.
//!
//! Every Shopify-facing route receives the shop domain and Admin API token
//! from its caller; nothing is stored server-side.

use axum::{extract::FromRequestParts, http::request::Parts};
use secrecy::SecretString;
use url::{Host, Url};

use crate::error::AppError;
use crate::shopify::ShopCredentials;

/// Header carrying the shop domain (`your-store.myshopify.com`).
pub const SHOP_DOMAIN_HEADER: &str = "X-Shopify-Shop-Domain";

/// Header carrying the Admin API access token.
pub const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

fn header_value(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToOwned::to_owned)
}

/// Whether `domain` is a bare DNS hostname.
///
/// The domain is templated into the Admin API URL that receives the access
/// token, so userinfo, ports, paths and IP literals are all refused.
#[must_use]
pub fn is_valid_shop_domain(domain: &str) -> bool {
    let Ok(url) = Url::parse(&format!("https://{domain}/")) else {
        return false;
    };

    url.username().is_empty()
        && url.password().is_none()
        && url.port().is_none()
        && url.path() == "/"
        && url.query().is_none()
        && url.fragment().is_none()
        && matches!(url.host(), Some(Host::Domain(host)) if host.eq_ignore_ascii_case(domain))
}

/// Extracts [`ShopCredentials`] from the request headers.
///
/// Rejects with [`AppError::MissingCredentials`] naming every absent header,
/// and with [`AppError::InvalidShopDomain`] if the domain is not a bare
/// hostname. As a parts extractor it runs before the body is read.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(credentials: ShopCredentials) -> impl IntoResponse {
///     credentials.shop_domain
/// }
/// ```
impl<S> FromRequestParts<S> for ShopCredentials
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let shop_domain = header_value(parts, SHOP_DOMAIN_HEADER);
        let access_token = header_value(parts, ACCESS_TOKEN_HEADER);

        match (shop_domain, access_token) {
            (Some(shop_domain), Some(_)) if !is_valid_shop_domain(&shop_domain) => {
                Err(AppError::InvalidShopDomain(shop_domain))
            }
            (Some(shop_domain), Some(access_token)) => Ok(Self {
                shop_domain,
                access_token: SecretString::from(access_token),
            }),
            (shop_domain, access_token) => {
                let mut missing = Vec::new();
                if shop_domain.is_none() {
                    missing.push(SHOP_DOMAIN_HEADER);
                }
                if access_token.is_none() {
                    missing.push(ACCESS_TOKEN_HEADER);
                }
                Err(AppError::MissingCredentials(missing))
            }
        }
    }
}
