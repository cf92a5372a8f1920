//! Unified error handling for the bridge.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::models::ValidationErrors;
use crate::shopify::RemoteErrorDetail;
use crate::sync::SyncError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Request body failed validation.
    #[error("The given data was invalid.")]
    Validation(#[from] ValidationErrors),

    /// Shop domain and/or access token headers are absent.
    #[error("Missing Shopify credentials: {}", .0.join(", "))]
    MissingCredentials(Vec<&'static str>),

    /// Shop domain header is not a bare hostname.
    #[error("Invalid shop domain: {0}")]
    InvalidShopDomain(String),

    /// Product or variant creation failed on Shopify.
    #[error("Shopify error: {0}")]
    Sync(#[from] SyncError),

    /// The creation sequence did not finish within the request deadline.
    #[error("Request deadline of {0} seconds exceeded")]
    DeadlineExceeded(u64),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<ValidationErrors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_errors: Option<Vec<RemoteErrorDetail>>,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::MissingCredentials(_) => StatusCode::UNAUTHORIZED,
            Self::InvalidShopDomain(_) => StatusCode::BAD_REQUEST,
            Self::Sync(_) => StatusCode::BAD_GATEWAY,
            Self::DeadlineExceeded(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::Database(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(self) -> ErrorBody {
        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(RepositoryError::NotFound) => "Not found".to_string(),
            Self::Database(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        };

        let (errors, remote_errors) = match self {
            Self::Validation(errors) => (Some(errors), None),
            Self::Sync(e) => (None, Some(e.remote_details())),
            _ => (None, None),
        };

        ErrorBody {
            success: false,
            message,
            errors,
            remote_errors,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Log server errors with Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Bridge request error"
            );
        }

        (status, Json(self.body())).into_response()
    }
}
