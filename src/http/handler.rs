//! Request handlers.
//!
//! # Pipeline
//! ```text
//! FETCHING ──transport error──────────────────────────▶ ERROR (404)
//!    │
//!    ▼
//! CLASSIFYING ──not text/html──────────────────────────▶ REDIRECT_PASSTHROUGH (302 → upstream)
//!    │        ──text/html + Location───────────────────▶ REDIRECT_REWRITE (upstream status → proxy)
//!    │
//!    └────────text/html───────────────────────────────▶ HTML_RENDER (upstream status, page shell)
//! ```

use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{header, Method, Request, StatusCode},
    response::{IntoResponse, Response},
};

use crate::error::ProxyError;
use crate::http::render::{render_page, RenderContext};
use crate::http::request::ProxyRequest;
use crate::http::response::{classify, passthrough_redirect, rendered_page, rewritten_redirect, Outcome};
use crate::http::server::AppState;
use crate::http::upstream::upstream_target;
use crate::observability::metrics;
use crate::rewrite::{resolve, retarget, rewrite_head};

pub const ROBOTS_TXT: &str = "User-agent: *\nDisallow: /\n";

/// `GET /robots.txt`: keep crawlers off the mirror.
pub async fn robots_txt() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], ROBOTS_TXT)
}

/// `GET /favicon.ico`: straight to the upstream asset, in a single hop.
pub async fn favicon(State(state): State<AppState>) -> Result<Response, ProxyError> {
    let target = format!("{}{}", state.config.upstream_base(), state.config.upstream.favicon_path);
    passthrough_redirect(&target)
}

pub async fn not_found(method: Method, request: Request<Body>) -> Response {
    tracing::info!(method = %method, path = %request.uri(), "404 Not Found");
    (StatusCode::NOT_FOUND, "Not Found").into_response()
}

/// Catch-all: GET/HEAD go through the rewriting pipeline, anything else is 404.
pub async fn mirror(State(state): State<AppState>, request: Request<Body>) -> Response {
    if !matches!(*request.method(), Method::GET | Method::HEAD) {
        let method = request.method().clone();
        return not_found(method, request).await;
    }

    let start = Instant::now();
    let (parts, _body) = request.into_parts();
    let req = ProxyRequest::from_parts(&parts, &state.trust);

    tracing::info!(
        request_id = %req.request_id,
        client_ip = %req.client_label(),
        method = %req.method,
        path = %req.original_url,
        "Mirroring request"
    );

    match run_pipeline(&state, &req).await {
        Ok((outcome, response)) => {
            metrics::record_request(outcome.label(), response.status().as_u16(), start);
            response
        }
        Err(e) => {
            tracing::error!(
                request_id = %req.request_id,
                client_ip = %req.client_label(),
                method = %req.method,
                path = %req.original_url,
                error = %e,
                "Fetch or rewrite failed"
            );
            let response = e.into_response();
            metrics::record_request("error", response.status().as_u16(), start);
            response
        }
    }
}

async fn run_pipeline(state: &AppState, req: &ProxyRequest) -> Result<(Outcome, Response), ProxyError> {
    let config = &state.config;
    let target = upstream_target(config.upstream_base(), &req.original_url);

    tracing::debug!(request_id = %req.request_id, target = %target, "Fetching upstream");
    let upstream = state.upstream.fetch(&target, req).await?;
    let status = upstream.status();

    let outcome = classify(upstream.headers());
    let response = match &outcome {
        Outcome::RedirectPassthrough => {
            tracing::info!(
                request_id = %req.request_id,
                content_type = upstream.content_type().unwrap_or("none"),
                target = %target,
                "Redirecting non-HTML resource to upstream"
            );
            passthrough_redirect(&target)?
        }
        Outcome::RedirectRewrite { location } => {
            let public_base = req.public_url("", config.external_port());
            let rewritten = retarget(&resolve(location, &target), &public_base);
            tracing::info!(
                request_id = %req.request_id,
                status = status.code.as_u16(),
                upstream_location = %location,
                location = %rewritten,
                "Rewriting upstream redirect"
            );
            rewritten_redirect(&status, &rewritten)?
        }
        Outcome::HtmlRender => {
            let html = upstream.text().await?;
            let page = rewrite_head(&html, config.upstream_base());

            let context = RenderContext {
                base_clone_url: config.upstream_base().to_string(),
                base_url: req.public_url("", config.external_port()),
                page_url: req.public_url(&req.original_url, config.external_port()),
                page_title: page.title.clone(),
                meta_title: page.non_empty_meta("og:title"),
                meta_description: page.non_empty_meta("og:description"),
                clone_url: target,
                headers: page.headers(),
                body_content: page.body_html,
            };
            tracing::debug!(
                request_id = %req.request_id,
                status = status.code.as_u16(),
                message = status.message(),
                head_lines = page.head_lines.len(),
                "Rendering page"
            );
            rendered_page(&status, render_page(&context)?)
        }
    };

    Ok((outcome, response))
}
