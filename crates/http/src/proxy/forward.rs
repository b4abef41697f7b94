use std::net::IpAddr;

use http::HeaderMap;
use tracing::debug;

use crate::protocol::HeaderMapExt;
use crate::proxy::TrustPolicy;

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// The client address as seen through the trusted part of the proxy chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientAddress {
    ip: String,
    ips: Vec<String>,
}

impl ClientAddress {
    /// The address of the client, falling back to the socket peer.
    pub fn ip(&self) -> &str {
        &self.ip
    }

    /// The trusted forwarded chain, origin first; empty without a trusted hop.
    pub fn ips(&self) -> &[String] {
        &self.ips
    }

    pub fn into_parts(self) -> (String, Vec<String>) {
        (self.ip, self.ips)
    }
}

/// Walks `X-Forwarded-For` from the socket outwards.
#[derive(Debug)]
pub struct ForwardedChain;

impl ForwardedChain {
    /// Every address of the chain, the socket peer first, then the forwarded
    /// addresses from the nearest to the farthest proxy.
    pub fn addresses(remote_addr: IpAddr, headers: &HeaderMap) -> Vec<String> {
        let forwarded = headers.list_values(X_FORWARDED_FOR);
        let mut all = Vec::with_capacity(forwarded.len() + 1);
        all.push(remote_addr.to_canonical().to_string());
        all.extend(forwarded.into_iter().rev().map(str::to_string));
        all
    }

    /// Resolves the client address.
    ///
    /// Each address is believed only when the hop that reported it is trusted:
    /// the walk stops at the first untrusted hop. The last believed address is the
    /// client; the believed chain minus the socket peer, origin first, is `ips`.
    pub fn resolve(remote_addr: IpAddr, headers: &HeaderMap, policy: &TrustPolicy) -> ClientAddress {
        let mut all = Self::addresses(remote_addr, headers);

        if let Some(untrusted) = all[..all.len() - 1].iter().position(|addr| !policy.is_trusted(addr)) {
            all.truncate(untrusted + 1);
        }

        let ips: Vec<String> = all[1..].iter().rev().cloned().collect();
        let ip = all.pop().unwrap_or_else(|| remote_addr.to_string());

        debug!(ip, hops = ips.len(), "resolved client address");
        ClientAddress { ip, ips }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    const NONE: [&str; 0] = [];
    const CHAIN: &str = "223.19.23.0, 125.19.23.0, 125.19.23.55, 125.19.23.60";

    fn headers(chain: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(X_FORWARDED_FOR, HeaderValue::from_static(chain));
        headers
    }

    fn localhost() -> IpAddr {
        "127.0.0.1".parse().unwrap()
    }

    #[test]
    fn trusted_chain_yields_origin() {
        let policy = TrustPolicy::from_specs(["127.0.0.1", "125.19.23.0/24"], NONE);

        let client = ForwardedChain::resolve(localhost(), &headers(CHAIN), &policy);

        assert_eq!(client.ip(), "223.19.23.0");
        assert_eq!(client.ips(), ["223.19.23.0", "125.19.23.0", "125.19.23.55", "125.19.23.60"]);
    }

    #[test]
    fn untrusted_socket_yields_socket() {
        let policy = TrustPolicy::from_specs(["125.19.23.0/24"], NONE);

        let client = ForwardedChain::resolve(localhost(), &headers(CHAIN), &policy);

        assert_eq!(client.ip(), "127.0.0.1");
        assert!(client.ips().is_empty());

        let client = ForwardedChain::resolve(localhost(), &headers(CHAIN), &TrustPolicy::deny_all());
        assert_eq!(client.into_parts(), ("127.0.0.1".to_string(), Vec::new()));
    }

    #[test]
    fn stops_at_first_untrusted_hop() {
        let policy = TrustPolicy::from_specs(["127.0.0.1", "10.0.0.0/8"], NONE);

        let client = ForwardedChain::resolve(localhost(), &headers("1.1.1.1, 2.2.2.2, 10.0.0.2"), &policy);

        assert_eq!(client.ip(), "2.2.2.2");
        assert_eq!(client.ips(), ["2.2.2.2", "10.0.0.2"]);
    }

    #[test]
    fn spoofed_hop_behind_untrusted_entry_is_ignored() {
        let policy = TrustPolicy::from_specs(["127.0.0.1"], ["10.0.0.66"]);

        let client = ForwardedChain::resolve(localhost(), &headers("6.6.6.6, 10.0.0.66"), &policy);

        assert_eq!(client.ip(), "10.0.0.66");
        assert_eq!(client.ips(), ["10.0.0.66"]);
    }

    #[test]
    fn without_header_yields_socket() {
        let policy = TrustPolicy::from_specs(["*"], NONE);

        let client = ForwardedChain::resolve(localhost(), &HeaderMap::new(), &policy);

        assert_eq!(client.ip(), "127.0.0.1");
        assert!(client.ips().is_empty());
    }
}
