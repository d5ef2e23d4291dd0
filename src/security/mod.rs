//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → trust.rs (which peers may speak for the client)
//!     → headers.rs (client IP, scheme and host from X-Forwarded-*)
//!     → Pass to the pipeline
//! ```
//!
//! # Design Decisions
//! - No trust in client input: forwarding headers count only from trusted hops
//! - Parse the trust setting once at startup and fail on bad entries

pub mod headers;
pub mod trust;

pub use headers::{resolve_forwarded, ForwardedInfo};
pub use trust::{TrustProxy, TrustProxyError};
