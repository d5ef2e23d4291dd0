//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4) when the client sent none
//! - Capture the inbound request as an immutable `ProxyRequest`
//! - Build proxy-visible URLs for the current request
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Only the headers the upstream fetch needs are kept
//! - Public scheme/host come from the trusted-proxy policy

use std::net::{IpAddr, SocketAddr};

use axum::extract::ConnectInfo;
use axum::http::{header, request::Parts, HeaderMap, HeaderValue, Method, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use url::Url;
use uuid::Uuid;

use crate::security::headers::{resolve_forwarded, ForwardedInfo};
use crate::security::trust::TrustProxy;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates a UUID v4 request ID.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// The inbound request as seen by the rewriting pipeline.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub method: Method,
    /// Path plus query, exactly as received.
    pub original_url: String,
    pub accept: Option<HeaderValue>,
    pub accept_language: Option<HeaderValue>,
    pub user_agent: Option<HeaderValue>,
    pub request_id: String,
    pub forwarded: ForwardedInfo,
}

impl ProxyRequest {
    pub fn from_parts(parts: &Parts, trust: &TrustProxy) -> Self {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        let original_url = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| "/".to_string());

        Self {
            method: parts.method.clone(),
            original_url,
            accept: header_value(&parts.headers, header::ACCEPT),
            accept_language: header_value(&parts.headers, header::ACCEPT_LANGUAGE),
            user_agent: header_value(&parts.headers, header::USER_AGENT),
            request_id: parts
                .headers
                .get(X_REQUEST_ID)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("unknown")
                .to_string(),
            forwarded: resolve_forwarded(trust, peer, &parts.headers),
        }
    }

    pub fn client_ip(&self) -> Option<IpAddr> {
        self.forwarded.client_ip
    }

    /// Client address for log lines.
    pub fn client_label(&self) -> String {
        self.client_ip()
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Absolute URL of `path` on the proxy, as the client addresses it.
    pub fn public_url(&self, path: &str, external_port: u16) -> String {
        let Ok(mut url) = Url::parse("http://localhost").and_then(|base| base.join(path)) else {
            return format!("{}://{}:{}/", self.forwarded.scheme, self.forwarded.host, external_port);
        };

        if url.set_scheme(&self.forwarded.scheme).is_err() {
            tracing::debug!(scheme = %self.forwarded.scheme, "Unusable public scheme");
        }
        if url.set_host(Some(&self.forwarded.host)).is_err() {
            tracing::debug!(host = %self.forwarded.host, "Unusable public host");
        }
        let _ = url.set_port(Some(external_port));
        url.into()
    }
}

fn header_value(headers: &HeaderMap, name: header::HeaderName) -> Option<HeaderValue> {
    headers.get(name).filter(|v| !v.is_empty()).cloned()
}
