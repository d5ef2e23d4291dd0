//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the mirror proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind host and port).
    pub listener: ListenerConfig,

    /// How the proxy is reached from the outside.
    pub public: PublicConfig,

    /// The single site being mirrored.
    pub upstream: UpstreamConfig,

    /// Which peers may set X-Forwarded-* headers.
    ///
    /// Accepts `true`/`false`, a hop count, or a comma separated list of
    /// addresses, CIDR ranges and the names `loopback`, `linklocal`,
    /// `uniquelocal`.
    pub trust_proxy: String,

    /// Client cache hint.
    pub cache: CacheConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl ProxyConfig {
    /// Port that appears in proxy-visible URLs.
    pub fn external_port(&self) -> u16 {
        self.public.external_port.unwrap_or(self.listener.port)
    }

    /// Upstream base without a trailing slash, ready for path concatenation.
    pub fn upstream_base(&self) -> &str {
        self.upstream.base_url.trim_end_matches('/')
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "127.0.0.1").
    pub host: String,

    /// Port to listen on.
    pub port: u16,
}

impl ListenerConfig {
    pub fn bind_address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// Externally visible address settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PublicConfig {
    /// Port clients use to reach the proxy, when it differs from the
    /// listening port (e.g. behind a port-forwarding front proxy).
    pub external_port: Option<u16>,
}

/// Upstream origin settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Absolute base URL of the mirrored site (e.g., "https://developer.mozilla.org").
    pub base_url: String,

    /// Upstream path that `/favicon.ico` redirects to.
    pub favicon_path: String,

    /// `Accept` sent when the client did not provide one.
    pub default_accept: String,

    /// `Accept-Language` sent when the client did not provide one.
    pub default_accept_language: String,

    /// `User-Agent` sent when the client did not provide one.
    pub default_user_agent: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            favicon_path: "/favicon.ico".to_string(),
            default_accept: "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"
                .to_string(),
            default_accept_language: "en-US".to_string(),
            default_user_agent:
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:74.0) Gecko/20100101 Firefox/74.0"
                    .to_string(),
        }
    }
}

/// Cache hint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// `max-age` advertised in `Cache-Control`, in seconds.
    pub max_age_secs: u64,
}

impl CacheConfig {
    pub fn header_value(&self) -> String {
        format!("public, max-age={}", self.max_age_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_age_secs: 86_400, // 24 hours
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Upstream fetch timeout (headers and body) in seconds.
    pub upstream_secs: u64,

    /// Total time allowed for handling one inbound request, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            upstream_secs: 20,
            request_secs: 30,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level filter used when `RUST_LOG` is unset.
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "reskin_proxy=info,tower_http=info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
