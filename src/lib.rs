//! HTML-rewriting mirror proxy library.

// Core subsystems
pub mod config;
pub mod error;
pub mod http;
pub mod rewrite;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::schema::ProxyConfig;
pub use error::ProxyError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
