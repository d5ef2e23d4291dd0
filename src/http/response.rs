//! Response handling and transformation.
//!
//! # Responsibilities
//! - Classify an upstream response into one of the pipeline outcomes
//! - Build the client-facing redirect and page responses
//! - Carry the upstream status code and reason phrase through
//!
//! # Design Decisions
//! - Non-HTML content is never proxied; the client is sent to the upstream
//! - Upstream headers other than content-type/location are not forwarded
//! - Upstream body is only read when a page will be rendered

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use hyper::ext::ReasonPhrase;

use crate::error::ProxyError;

/// Terminal decision for one upstream response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Not HTML: send the client straight to the upstream resource.
    RedirectPassthrough,
    /// HTML response carrying a `Location`: keep the client on the proxy.
    RedirectRewrite { location: String },
    /// Plain HTML page: rewrite and render.
    HtmlRender,
}

impl Outcome {
    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::RedirectPassthrough => "redirect_passthrough",
            Outcome::RedirectRewrite { .. } => "redirect_rewrite",
            Outcome::HtmlRender => "html_render",
        }
    }
}

/// Decide what to do with an upstream response from its headers.
pub fn classify(headers: &HeaderMap) -> Outcome {
    let is_html = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(is_html);
    if !is_html {
        return Outcome::RedirectPassthrough;
    }

    match headers.get(header::LOCATION).and_then(|v| v.to_str().ok()) {
        Some(location) => Outcome::RedirectRewrite {
            location: location.to_string(),
        },
        None => Outcome::HtmlRender,
    }
}

/// Whether `content_type` is `text/html`, with or without parameters.
pub fn is_html(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(str::trim)
        .is_some_and(|essence| essence.eq_ignore_ascii_case("text/html"))
}

/// Status line pieces copied from the upstream.
#[derive(Debug, Clone)]
pub struct UpstreamStatus {
    pub code: StatusCode,
    /// Set only when the upstream used a non-canonical phrase.
    pub reason: Option<ReasonPhrase>,
}

impl UpstreamStatus {
    pub fn message(&self) -> &str {
        self.reason
            .as_ref()
            .and_then(|r| std::str::from_utf8(r.as_bytes()).ok())
            .or_else(|| self.code.canonical_reason())
            .unwrap_or_default()
    }

    fn apply(&self, response: &mut Response) {
        *response.status_mut() = self.code;
        if let Some(reason) = &self.reason {
            response.extensions_mut().insert(reason.clone());
        }
    }
}

/// `302 Found` pointing at the upstream URL that was fetched.
pub fn passthrough_redirect(target: &str) -> Result<Response, ProxyError> {
    let location = HeaderValue::from_str(target)?;
    Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}

/// Empty-bodied redirect with the upstream status and a proxy-side location.
pub fn rewritten_redirect(status: &UpstreamStatus, location: &str) -> Result<Response, ProxyError> {
    let location = HeaderValue::from_str(location)?;
    let mut response = Response::new(Body::empty());
    response.headers_mut().insert(header::LOCATION, location);
    status.apply(&mut response);
    Ok(response)
}

/// Rendered page with the upstream status.
pub fn rendered_page(status: &UpstreamStatus, page: String) -> Response {
    let mut response = Html(page).into_response();
    status.apply(&mut response);
    response
}
