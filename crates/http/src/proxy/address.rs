use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use regex::Regex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PatternError {
    #[error("invalid address spec {spec:?}")]
    InvalidAddress { spec: String },

    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Compiles a `/regex/` or `/regex/i` literal, returning `None` when `text` is not one.
pub(crate) fn parse_regex_literal(text: &str) -> Option<Result<Regex, PatternError>> {
    let body = text.strip_prefix('/')?;
    let (source, insensitive) = match body.strip_suffix("/i") {
        Some(source) => (source, true),
        None => (body.strip_suffix('/')?, false),
    };

    let pattern = if insensitive { format!("(?i){source}") } else { source.to_string() };
    Some(Regex::new(&pattern).map_err(|source| PatternError::InvalidRegex { pattern: text.to_string(), source }))
}

/// A network range given as `address/prefix`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CidrRange {
    network: IpAddr,
    prefix_len: u8,
}

impl CidrRange {
    pub fn contains(&self, addr: IpAddr) -> bool {
        match (self.network, addr.to_canonical()) {
            (IpAddr::V4(network), IpAddr::V4(addr)) => {
                let mask = mask(self.prefix_len, 32);
                (u128::from(u32::from(addr)) & mask) == u128::from(u32::from(network))
            }
            (IpAddr::V6(network), IpAddr::V6(addr)) => {
                let mask = mask(self.prefix_len, 128);
                (u128::from(addr) & mask) == u128::from(network)
            }
            _ => false,
        }
    }
}

fn mask(prefix_len: u8, bits: u8) -> u128 {
    if prefix_len == 0 {
        0
    } else {
        let width_mask = if bits == 128 { u128::MAX } else { (1u128 << bits) - 1 };
        (width_mask << (bits - prefix_len)) & width_mask
    }
}

impl FromStr for CidrRange {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PatternError::InvalidAddress { spec: s.to_string() };
        let (ip, prefix) = s.split_once('/').ok_or_else(invalid)?;
        let ip = ip.trim().parse::<IpAddr>().map_err(|_| invalid())?.to_canonical();
        let prefix_len = prefix.trim().parse::<u8>().map_err(|_| invalid())?;

        let range = match ip {
            IpAddr::V4(v4) if prefix_len <= 32 => {
                let network = u32::from(v4) & u32::try_from(mask(prefix_len, 32)).map_err(|_| invalid())?;
                Self { network: IpAddr::V4(network.into()), prefix_len }
            }
            IpAddr::V6(v6) if prefix_len <= 128 => {
                let network = u128::from(v6) & mask(prefix_len, 128);
                Self { network: IpAddr::V6(network.into()), prefix_len }
            }
            _ => return Err(invalid()),
        };
        Ok(range)
    }
}

/// One entry of a trusted or untrusted proxy list.
#[derive(Debug, Clone)]
pub enum AddressSpec {
    /// `*`, every address
    Any,
    /// a single address such as `127.0.0.1` or `::1`
    Exact(IpAddr),
    /// a range such as `10.0.0.0/8`
    Cidr(CidrRange),
    /// `/regex/`, matched against the textual address
    Pattern(Regex),
}

impl AddressSpec {
    pub fn is_any(&self) -> bool {
        matches!(self, AddressSpec::Any)
    }

    /// Matches a textual address; text that is not an address only matches patterns.
    pub fn matches(&self, addr: &str) -> bool {
        match self {
            AddressSpec::Any => true,
            AddressSpec::Pattern(regex) => regex.is_match(addr),
            AddressSpec::Exact(_) | AddressSpec::Cidr(_) => addr.trim().parse::<IpAddr>().is_ok_and(|ip| self.matches_ip(ip)),
        }
    }

    pub fn matches_ip(&self, addr: IpAddr) -> bool {
        match self {
            AddressSpec::Any => true,
            AddressSpec::Exact(ip) => *ip == addr.to_canonical(),
            AddressSpec::Cidr(range) => range.contains(addr),
            AddressSpec::Pattern(regex) => regex.is_match(&addr.to_canonical().to_string()),
        }
    }
}

impl FromStr for AddressSpec {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let spec = s.trim();
        if spec == "*" {
            return Ok(AddressSpec::Any);
        }
        if let Some(regex) = parse_regex_literal(spec) {
            return regex.map(AddressSpec::Pattern);
        }
        if spec.contains('/') {
            return spec.parse().map(AddressSpec::Cidr);
        }

        spec.parse::<IpAddr>()
            .map(|ip| AddressSpec::Exact(ip.to_canonical()))
            .map_err(|_| PatternError::InvalidAddress { spec: s.to_string() })
    }
}

impl fmt::Display for AddressSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressSpec::Any => f.write_str("*"),
            AddressSpec::Exact(ip) => write!(f, "{ip}"),
            AddressSpec::Cidr(range) => write!(f, "{}/{}", range.network, range.prefix_len),
            AddressSpec::Pattern(regex) => write!(f, "/{}/", regex.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(text: &str) -> AddressSpec {
        text.parse().unwrap()
    }

    #[test]
    fn cidr_matches_members_only() {
        let range = spec("125.19.23.0/24");

        assert!(range.matches("125.19.23.0"));
        assert!(range.matches("125.19.23.255"));
        assert!(!range.matches("125.19.24.1"));
        assert!(!range.matches("::1"));
    }

    #[test]
    fn cidr_host_bits_are_ignored() {
        let range = spec("10.1.2.3/8");
        assert!(range.matches("10.200.0.1"));
        assert_eq!(range.to_string(), "10.0.0.0/8");
    }

    #[test]
    fn ipv6_ranges_and_mapped_addresses() {
        assert!(spec("fe80::/10").matches("fe80::1"));
        assert!(!spec("fe80::/10").matches("fec0::1"));
        assert!(spec("127.0.0.1").matches("::ffff:127.0.0.1"));
        assert!(spec("0.0.0.0/0").matches("8.8.8.8"));
    }

    #[test]
    fn patterns_match_text() {
        let pattern = spec(r"/^192\.168\./");
        assert!(pattern.matches("192.168.0.10"));
        assert!(!pattern.matches("10.0.0.1"));
    }

    #[test]
    fn rejects_invalid_specs() {
        assert!("10.0.0.0/33".parse::<AddressSpec>().is_err());
        assert!("localhost".parse::<AddressSpec>().is_err());
        assert!(matches!("/(/".parse::<AddressSpec>(), Err(PatternError::InvalidRegex { .. })));
    }
}
