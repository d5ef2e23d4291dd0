//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, cache hint, panic boundary)
//! - Bind server to listener
//! - Graceful shutdown on the lifecycle signal

use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::http::handler::{favicon, mirror, not_found, robots_txt};
use crate::http::request::{MakeRequestUuid, X_REQUEST_ID};
use crate::http::upstream::UpstreamClient;
use crate::lifecycle::shutdown;
use crate::security::trust::TrustProxy;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ProxyConfig>,
    pub trust: Arc<TrustProxy>,
    pub upstream: UpstreamClient,
}

/// HTTP server for the mirror proxy.
pub struct HttpServer {
    router: Router,
    config: Arc<ProxyConfig>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, ProxyError> {
        let trust: TrustProxy = config.trust_proxy.parse()?;
        let upstream = UpstreamClient::new(&config)?;
        let cache_control = HeaderValue::from_str(&config.cache.header_value())?;
        let config = Arc::new(config);

        let state = AppState {
            config: config.clone(),
            trust: Arc::new(trust),
            upstream,
        };

        let router = Self::build_router(&config, state, cache_control);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState, cache_control: HeaderValue) -> Router {
        let routes = Router::new()
            .route("/robots.txt", get(robots_txt).fallback(not_found))
            .route("/favicon.ico", get(favicon).fallback(not_found))
            .fallback(mirror)
            .with_state(state);
        Self::with_layers(routes, config, cache_control)
    }

    /// Middleware stack, outermost last.
    #[allow(deprecated)]
    fn with_layers(routes: Router, config: &ProxyConfig, cache_control: HeaderValue) -> Router {
        routes
            .layer(CatchPanicLayer::custom(handle_panic))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(SetResponseHeaderLayer::if_not_present(header::CACHE_CONTROL, cache_control))
            .layer(TraceLayer::new_for_http().make_span_with(request_span))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown_rx` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream_base(),
            external_port = self.config.external_port(),
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown::wait(shutdown_rx))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Span for one request, carrying the ID set by the outer request-id layer.
fn request_span(request: &Request<Body>) -> tracing::Span {
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");
    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id
    )
}

/// Top-level error boundary: log the panic, tell the client nothing.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response<Body> {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = %detail, "Handler panicked");
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Method, Request};
    use tower::ServiceExt;

    fn server() -> HttpServer {
        let mut config = ProxyConfig::default();
        config.upstream.base_url = "https://upstream.example/".to_string();
        config.upstream.favicon_path = "/static/img/favicon32.png".to_string();
        HttpServer::new(config).unwrap()
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_robots_txt() {
        let response = server()
            .router()
            .oneshot(Request::get("/robots.txt").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));
        assert_eq!(response.headers()[header::CACHE_CONTROL], "public, max-age=86400");
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(body_string(response).await, "User-agent: *\nDisallow: /\n");
    }

    #[tokio::test]
    async fn test_favicon_redirects_to_upstream() {
        let response = server()
            .router()
            .oneshot(Request::get("/favicon.ico").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers()[header::LOCATION],
            "https://upstream.example/static/img/favicon32.png"
        );
    }

    #[tokio::test]
    async fn test_other_methods_are_not_found() {
        for (method, path) in [
            (Method::POST, "/docs/Foo"),
            (Method::PUT, "/"),
            (Method::DELETE, "/robots.txt"),
            (Method::POST, "/favicon.ico"),
        ] {
            let response = server()
                .router()
                .oneshot(Request::builder().method(method.clone()).uri(path).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{method} {path}");
            assert_eq!(body_string(response).await, "Not Found");
        }
    }

    #[tokio::test]
    async fn test_request_id_propagated() {
        let response = server()
            .router()
            .oneshot(
                Request::get("/robots.txt")
                    .header("x-request-id", "req-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()["x-request-id"], "req-42");
    }

    #[test]
    fn test_invalid_trust_setting_rejected() {
        let mut config = ProxyConfig::default();
        config.upstream.base_url = "https://upstream.example".to_string();
        config.trust_proxy = "bogus".to_string();
        assert!(matches!(HttpServer::new(config), Err(ProxyError::TrustProxy(_))));
    }

    async fn explode() -> &'static str {
        panic!("secret detail")
    }

    #[tokio::test]
    async fn test_panic_becomes_generic_500() {
        let config = ProxyConfig::default();
        let cache_control = HeaderValue::from_static("public, max-age=1");
        let routes = Router::new().route("/explode", get(explode));
        let response = HttpServer::with_layers(routes, &config, cache_control)
            .oneshot(Request::get("/explode").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().contains_key("x-request-id"));
        let body = body_string(response).await;
        assert_eq!(body, "Internal Server Error");
        assert!(!body.contains("secret detail"));
    }
}
