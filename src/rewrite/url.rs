//! URL normalization against a base.

use url::Url;

/// Resolve `maybe_relative` against `base`.
///
/// Handles scheme-relative (`//host/x`), absolute-path, relative-path and
/// query/fragment-only references. If either string fails to parse, the
/// input is returned unchanged so callers can pass it through as-is.
pub fn resolve(maybe_relative: &str, base: &str) -> String {
    Url::parse(base)
        .and_then(|base| base.join(maybe_relative))
        .map(String::from)
        .unwrap_or_else(|_| maybe_relative.to_string())
}
