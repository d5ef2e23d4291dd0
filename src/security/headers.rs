//! Forwarded header resolution.
//!
//! # Responsibilities
//! - Determine the client IP from the peer and `X-Forwarded-For`
//! - Determine the public scheme and host the client used
//!
//! # Design Decisions
//! - Never trust existing X-Forwarded-* from untrusted sources
//! - `X-Forwarded-For` is walked right to left, stopping at the first untrusted hop
//! - Unknown peers (no socket info) trust nothing

use std::net::IpAddr;

use axum::http::{header, HeaderMap};

use crate::security::trust::TrustProxy;

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";
pub const X_FORWARDED_PROTO: &str = "x-forwarded-proto";
pub const X_FORWARDED_HOST: &str = "x-forwarded-host";

/// What the client used to reach us, after applying the trust policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardedInfo {
    pub client_ip: Option<IpAddr>,
    /// `http` or `https`.
    pub scheme: String,
    /// Hostname without port; IPv6 literals keep their brackets.
    pub host: String,
}

/// Resolve client address, scheme and host for a request from `peer`.
pub fn resolve_forwarded(
    trust: &TrustProxy,
    peer: Option<IpAddr>,
    headers: &HeaderMap,
) -> ForwardedInfo {
    let peer_trusted = peer.is_some_and(|addr| trust.trusts(addr, 0));

    let scheme = peer_trusted
        .then(|| first_value(headers, X_FORWARDED_PROTO))
        .flatten()
        .map(|proto| proto.to_ascii_lowercase())
        .unwrap_or_else(|| "http".to_string());

    let host = peer_trusted
        .then(|| first_value(headers, X_FORWARDED_HOST))
        .flatten()
        .or_else(|| first_value(headers, header::HOST.as_str()))
        .map(|host| strip_port(&host).to_string())
        .filter(|host| !host.is_empty())
        .unwrap_or_else(|| "localhost".to_string());

    ForwardedInfo {
        client_ip: peer.map(|addr| client_address(trust, addr, headers)),
        scheme,
        host,
    }
}

fn client_address(trust: &TrustProxy, peer: IpAddr, headers: &HeaderMap) -> IpAddr {
    let forwarded: Vec<&str> = headers
        .get_all(X_FORWARDED_FOR)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .collect();

    let mut client = peer;
    for (hop, candidate) in forwarded.iter().rev().enumerate() {
        if !trust.trusts(client, hop) {
            break;
        }
        match candidate.parse::<IpAddr>() {
            Ok(addr) => client = addr,
            Err(_) => break,
        }
    }
    client
}

fn first_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        return host.find(']').map_or(host, |end| &host[..=end]);
    }
    host.split(':').next().unwrap_or(host)
}
