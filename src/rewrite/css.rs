//! CSS `url(...)` rewriting.
//!
//! A textual pass, not a CSS parser. Anything that does not look like a
//! well-formed `url(...)` is copied through untouched.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::rewrite::url::resolve;

// Groups: 1 = single-quoted, 2 = double-quoted, 3 = bare reference.
static CSS_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"url\s*\(\s*(?:'([^']*)'|"([^"]*)"|([^)'"]*))\s*\)"#)
        .expect("CSS url() pattern is valid")
});

/// Rewrite every `url(...)` in `css` to a single-quoted absolute URL
/// resolved against `base`.
pub fn rewrite(css: &str, base: &str) -> String {
    CSS_URL
        .replace_all(css, |caps: &Captures<'_>| {
            let reference = caps
                .get(1)
                .or_else(|| caps.get(2))
                .or_else(|| caps.get(3))
                .map(|m| m.as_str().trim())
                .unwrap_or_default();

            if reference.is_empty() {
                return caps[0].to_string();
            }
            format!("url('{}')", resolve(reference, base))
        })
        .into_owned()
}
