//! Page rewriting subsystem.
//!
//! # Data Flow
//! ```text
//! upstream HTML
//!     → head.rs (parse, extract metadata, collect <link>/<style>, strip scripts)
//!         → url.rs (resolve hrefs against the upstream base)
//!         → css.rs (rewrite url(...) inside <style> blocks)
//!     → PageRewriteResult (handed to the renderer)
//!
//! upstream Location header
//!     → url.rs (resolve against the fetched target)
//!     → redirect.rs (move onto the proxy's public origin)
//! ```
//!
//! # Design Decisions
//! - Every function here is pure: no I/O, no shared state
//! - Malformed input never errors; each rewriter has a fallback value
//! - Resource URLs always point at the upstream, navigation points at the proxy

pub mod css;
pub mod head;
pub mod redirect;
pub mod url;

pub use head::{rewrite_head, PageRewriteResult};
pub use redirect::retarget;
pub use url::resolve;
