//! Redirect target rewriting.
//!
//! Moves an absolute upstream `Location` onto the proxy's public origin so
//! the client's next request comes back through the proxy. Path, query and
//! fragment survive; everything that identifies the origin is replaced.

use url::Url;

/// Rewrite `upstream_location` so that it lives on `proxy_public_base`.
///
/// Returns `proxy_public_base` untouched if either URL fails to parse or the
/// location cannot carry a host (e.g. `mailto:`). The upstream location is
/// never returned as-is.
pub fn retarget(upstream_location: &str, proxy_public_base: &str) -> String {
    try_retarget(upstream_location, proxy_public_base)
        .unwrap_or_else(|| proxy_public_base.to_string())
}

fn try_retarget(upstream_location: &str, proxy_public_base: &str) -> Option<String> {
    let mut location = Url::parse(upstream_location).ok()?;
    let public = Url::parse(proxy_public_base).ok()?;

    location.set_scheme(public.scheme()).ok()?;
    location.set_host(public.host_str()).ok()?;
    location.set_port(public.port()).ok()?;
    location.set_username(public.username()).ok()?;
    location.set_password(public.password()).ok()?;

    Some(location.into())
}
