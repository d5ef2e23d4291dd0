//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, forwarded client info, proxy-visible URLs)
//!     → handler.rs (robots.txt, favicon, catch-all pipeline)
//!     → upstream.rs (single GET to the mirrored site)
//!     → response.rs (classify, build redirect or page response)
//!     → render.rs (page shell)
//!     → Send to client
//! ```

pub mod handler;
pub mod render;
pub mod request;
pub mod response;
pub mod server;
pub mod upstream;

pub use request::{MakeRequestUuid, ProxyRequest, X_REQUEST_ID};
pub use response::Outcome;
pub use server::{AppState, HttpServer};
pub use upstream::UpstreamClient;
