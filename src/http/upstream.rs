//! Outbound client for the mirrored upstream.
//!
//! # Responsibilities
//! - Build the upstream target URL for an inbound request
//! - Issue exactly one GET per request with the mirrored header set
//! - Surface redirects to the caller instead of following them
//!
//! # Design Decisions
//! - No retries; the first transport failure is final for that request
//! - Client-supplied Accept/Accept-Language/User-Agent win over defaults
//! - `DNT: 1` is always sent

use std::time::Duration;

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};
use hyper::ext::ReasonPhrase;
use reqwest::redirect::Policy;

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::http::request::ProxyRequest;
use crate::http::response::UpstreamStatus;

pub const DNT: HeaderName = HeaderName::from_static("dnt");

/// Upstream URL for an inbound path: `base` + `original_url`, with a leading
/// slash inserted when the path lacks one.
pub fn upstream_target(base: &str, original_url: &str) -> String {
    if original_url.starts_with('/') {
        format!("{}{}", base, original_url)
    } else {
        format!("{}/{}", base, original_url)
    }
}

/// Header defaults encoded once at startup.
#[derive(Debug, Clone)]
struct DefaultHeaders {
    accept: HeaderValue,
    accept_language: HeaderValue,
    user_agent: HeaderValue,
}

/// HTTP client bound to the configured upstream.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    defaults: DefaultHeaders,
}

impl UpstreamClient {
    pub fn new(config: &ProxyConfig) -> Result<Self, ProxyError> {
        let client = reqwest::Client::builder()
            .redirect(Policy::none())
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .timeout(Duration::from_secs(config.timeouts.upstream_secs))
            .build()
            .map_err(ProxyError::Client)?;

        let upstream = &config.upstream;
        let defaults = DefaultHeaders {
            accept: HeaderValue::from_str(&upstream.default_accept)?,
            accept_language: HeaderValue::from_str(&upstream.default_accept_language)?,
            user_agent: HeaderValue::from_str(&upstream.default_user_agent)?,
        };

        Ok(Self { client, defaults })
    }

    /// Headers sent upstream on behalf of `request`.
    pub fn outbound_headers(&self, request: &ProxyRequest) -> HeaderMap {
        let pick = |value: &Option<HeaderValue>, default: &HeaderValue| {
            value.clone().unwrap_or_else(|| default.clone())
        };

        let mut headers = HeaderMap::with_capacity(4);
        headers.insert(header::ACCEPT, pick(&request.accept, &self.defaults.accept));
        headers.insert(
            header::ACCEPT_LANGUAGE,
            pick(&request.accept_language, &self.defaults.accept_language),
        );
        headers.insert(DNT, HeaderValue::from_static("1"));
        headers.insert(header::USER_AGENT, pick(&request.user_agent, &self.defaults.user_agent));
        headers
    }

    /// Fetch `target`. Redirect responses are returned, not followed.
    pub async fn fetch(&self, target: &str, request: &ProxyRequest) -> Result<UpstreamResponse, ProxyError> {
        let response = self
            .client
            .get(target)
            .headers(self.outbound_headers(request))
            .send()
            .await
            .map_err(ProxyError::Upstream)?;

        Ok(UpstreamResponse { inner: response })
    }
}

/// Upstream response, owned by the request that fetched it.
#[derive(Debug)]
pub struct UpstreamResponse {
    inner: reqwest::Response,
}

impl UpstreamResponse {
    pub fn status(&self) -> UpstreamStatus {
        UpstreamStatus {
            code: self.inner.status(),
            reason: self.inner.extensions().get::<ReasonPhrase>().cloned(),
        }
    }

    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// Read the full body as text, honoring the declared charset.
    pub async fn text(self) -> Result<String, ProxyError> {
        self.inner.text().await.map_err(ProxyError::Body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;

    use crate::security::trust::TrustProxy;

    fn proxy_request(headers: &[(&'static str, &'static str)]) -> ProxyRequest {
        let mut builder = Request::builder().uri("/docs/Foo");
        for &(name, value) in headers {
            builder = builder.header(name, value);
        }
        let (parts, _) = builder.body(Body::empty()).unwrap().into_parts();
        ProxyRequest::from_parts(&parts, &TrustProxy::Never)
    }

    fn client() -> UpstreamClient {
        let mut config = ProxyConfig::default();
        config.upstream.base_url = "https://upstream.example".to_string();
        UpstreamClient::new(&config).unwrap()
    }

    #[test]
    fn test_upstream_target() {
        assert_eq!(
            upstream_target("https://upstream.example", "/docs/Foo"),
            "https://upstream.example/docs/Foo"
        );
        assert_eq!(
            upstream_target("https://upstream.example", "docs/Foo?x=1"),
            "https://upstream.example/docs/Foo?x=1"
        );
        assert_eq!(upstream_target("https://upstream.example", ""), "https://upstream.example/");
    }

    #[test]
    fn test_defaults_when_client_sends_nothing() {
        let headers = client().outbound_headers(&proxy_request(&[]));
        assert_eq!(
            headers[header::ACCEPT],
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"
        );
        assert_eq!(headers[header::ACCEPT_LANGUAGE], "en-US");
        assert!(headers[header::USER_AGENT].to_str().unwrap().contains("Firefox"));
        assert_eq!(headers[DNT], "1");
        assert_eq!(headers.len(), 4);
    }

    #[test]
    fn test_client_headers_forwarded() {
        let request = proxy_request(&[
            ("accept", "text/html"),
            ("accept-language", "fr-FR"),
            ("user-agent", "curl/8.0"),
            ("cookie", "secret=1"),
        ]);
        let headers = client().outbound_headers(&request);
        assert_eq!(headers[header::ACCEPT], "text/html");
        assert_eq!(headers[header::ACCEPT_LANGUAGE], "fr-FR");
        assert_eq!(headers[header::USER_AGENT], "curl/8.0");
        assert!(headers.get(header::COOKIE).is_none());
    }
}
