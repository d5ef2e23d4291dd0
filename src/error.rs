//! Request-scoped error type.
//!
//! Every variant is confined to the request that raised it. The client sees
//! only the status reason; the detail goes to the log.

use axum::http::header::InvalidHeaderValue;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::security::trust::TrustProxyError;

#[derive(Debug, Error)]
pub enum ProxyError {
    /// Connecting to or exchanging headers with the upstream failed.
    #[error("upstream request failed: {0}")]
    Upstream(#[source] reqwest::Error),

    /// The upstream response body could not be read.
    #[error("failed to read upstream body: {0}")]
    Body(#[source] reqwest::Error),

    /// The page shell failed to render.
    #[error("failed to render page: {0}")]
    Render(#[from] askama::Error),

    /// A header value could not be encoded.
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] InvalidHeaderValue),

    /// The upstream HTTP client could not be built.
    #[error("failed to build upstream client: {0}")]
    Client(#[source] reqwest::Error),

    #[error(transparent)]
    TrustProxy(#[from] TrustProxyError),
}

impl ProxyError {
    /// Status code reported to the client.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Upstream(_) | ProxyError::Body(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = status.canonical_reason().unwrap_or("Error");
        (status, body).into_response()
    }
}
