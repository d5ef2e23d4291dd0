//! Trusted proxy policy.
//!
//! Decides whether a hop in the forwarding chain may vouch for the next one
//! (its `X-Forwarded-*` headers are believed only when it is trusted).

use std::net::IpAddr;
use std::str::FromStr;

use ipnet::IpNet;
use thiserror::Error;

const LOOPBACK: &[&str] = &["127.0.0.0/8", "::1/128"];
const LINK_LOCAL: &[&str] = &["169.254.0.0/16", "fe80::/10"];
const UNIQUE_LOCAL: &[&str] = &["10.0.0.0/8", "172.16.0.0/12", "192.168.0.0/16", "fc00::/7"];

/// Invalid entry in a trust proxy setting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid trusted proxy entry: {0:?}")]
pub struct TrustProxyError(pub String);

/// Which peers are allowed to forward client information.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TrustProxy {
    /// Forwarding headers are ignored.
    #[default]
    Never,
    /// Every hop is trusted.
    Always,
    /// The first `n` hops, counting from this process, are trusted.
    Hops(usize),
    /// Hops whose address falls in one of the ranges are trusted.
    Ranges(Vec<IpNet>),
}

impl TrustProxy {
    /// Whether the peer at `addr`, `hop` steps away from this process, is trusted.
    pub fn trusts(&self, addr: IpAddr, hop: usize) -> bool {
        match self {
            TrustProxy::Never => false,
            TrustProxy::Always => true,
            TrustProxy::Hops(n) => hop < *n,
            TrustProxy::Ranges(ranges) => {
                let addr = addr.to_canonical();
                ranges.iter().any(|range| range.contains(&addr))
            }
        }
    }
}

impl FromStr for TrustProxy {
    type Err = TrustProxyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "" | "false" => return Ok(TrustProxy::Never),
            "true" => return Ok(TrustProxy::Always),
            _ => {}
        }
        if let Ok(hops) = s.parse::<usize>() {
            return Ok(TrustProxy::Hops(hops));
        }

        let mut ranges = Vec::new();
        for entry in s.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            match entry {
                "loopback" => ranges.extend(named(LOOPBACK)),
                "linklocal" => ranges.extend(named(LINK_LOCAL)),
                "uniquelocal" => ranges.extend(named(UNIQUE_LOCAL)),
                _ => ranges.push(parse_range(entry)?),
            }
        }
        Ok(TrustProxy::Ranges(ranges))
    }
}

fn named(ranges: &'static [&'static str]) -> impl Iterator<Item = IpNet> {
    // Well-known ranges; a parse failure here would be a typo in the table.
    ranges.iter().filter_map(|r| r.parse::<IpNet>().ok())
}

fn parse_range(entry: &str) -> Result<IpNet, TrustProxyError> {
    entry
        .parse::<IpNet>()
        .or_else(|_| entry.parse::<IpAddr>().map(IpNet::from))
        .map_err(|_| TrustProxyError(entry.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_booleans() {
        assert_eq!("".parse::<TrustProxy>().unwrap(), TrustProxy::Never);
        assert_eq!("false".parse::<TrustProxy>().unwrap(), TrustProxy::Never);
        assert_eq!(" true ".parse::<TrustProxy>().unwrap(), TrustProxy::Always);
        assert!(!TrustProxy::Never.trusts(ip("127.0.0.1"), 0));
        assert!(TrustProxy::Always.trusts(ip("8.8.8.8"), 7));
    }

    #[test]
    fn test_hop_count() {
        let trust: TrustProxy = "2".parse().unwrap();
        assert!(trust.trusts(ip("1.2.3.4"), 0));
        assert!(trust.trusts(ip("1.2.3.4"), 1));
        assert!(!trust.trusts(ip("1.2.3.4"), 2));
    }

    #[test]
    fn test_named_and_explicit_ranges() {
        let trust: TrustProxy = "loopback, 203.0.113.7, 198.51.100.0/24".parse().unwrap();
        assert!(trust.trusts(ip("127.0.0.1"), 0));
        assert!(trust.trusts(ip("::1"), 0));
        assert!(trust.trusts(ip("203.0.113.7"), 3));
        assert!(trust.trusts(ip("198.51.100.200"), 0));
        assert!(!trust.trusts(ip("203.0.113.8"), 0));
        assert!(!trust.trusts(ip("10.0.0.1"), 0));
    }

    #[test]
    fn test_ipv4_mapped_peer() {
        let trust: TrustProxy = "uniquelocal".parse().unwrap();
        assert!(trust.trusts(ip("::ffff:192.168.1.10"), 0));
    }

    #[test]
    fn test_invalid_entry() {
        let err = "loopback,not-an-ip".parse::<TrustProxy>().unwrap_err();
        assert_eq!(err, TrustProxyError("not-an-ip".to_string()));
    }
}
