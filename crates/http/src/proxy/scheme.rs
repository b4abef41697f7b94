use std::fmt;
use std::net::IpAddr;

use http::HeaderMap;
use tracing::debug;

use crate::protocol::HeaderMapExt;
use crate::proxy::TrustPolicy;

pub const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// The effective scheme of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scheme {
    #[default]
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }

    pub fn is_secure(&self) -> bool {
        matches!(self, Scheme::Https)
    }

    /// Reads a forwarded proto value; anything but `https` degrades to `http`.
    fn from_forwarded(value: &str) -> Self {
        if value.eq_ignore_ascii_case("https") { Scheme::Https } else { Scheme::Http }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolves the scheme the client used.
///
/// Behind a trusted relay the first `X-Forwarded-Proto` value decides, otherwise
/// the encryption of the socket does. Missing or empty values mean `http`.
pub fn resolve_protocol(remote_addr: IpAddr, headers: &HeaderMap, encrypted: bool, policy: &TrustPolicy) -> Scheme {
    if !policy.is_trusted_ip(remote_addr) {
        return if encrypted { Scheme::Https } else { Scheme::Http };
    }

    let forwarded = headers.first_value(X_FORWARDED_PROTO).map_or("", str::trim);
    let scheme = Scheme::from_forwarded(forwarded);
    debug!(forwarded, scheme = %scheme, "resolved protocol from trusted relay");
    scheme
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use std::net::Ipv4Addr;

    const NONE: [&str; 0] = [];

    fn addr(text: &str) -> IpAddr {
        text.parse().unwrap()
    }

    #[test]
    fn untrusted_socket_uses_encryption_flag() {
        let policy = TrustPolicy::from_specs(NONE, ["*"]);
        let mut headers = HeaderMap::new();
        headers.insert(X_FORWARDED_PROTO, HeaderValue::from_static("http"));

        assert_eq!(resolve_protocol(addr("1.2.3.4"), &headers, true, &policy), Scheme::Https);
        assert_eq!(resolve_protocol(addr("1.2.3.4"), &HeaderMap::new(), false, &policy), Scheme::Http);
    }

    #[test]
    fn trusted_socket_uses_first_forwarded_value() {
        let policy = TrustPolicy::from_specs(["127.0.0.1"], NONE);
        let mut headers = HeaderMap::new();
        headers.insert("X-Forwarded-Proto", HeaderValue::from_static(" https ,http"));

        let scheme = resolve_protocol(IpAddr::V4(Ipv4Addr::LOCALHOST), &headers, false, &policy);
        assert_eq!(scheme.as_str(), "https");
    }

    #[test]
    fn trusted_socket_without_header_is_http() {
        let policy = TrustPolicy::from_specs(["127.0.0.1"], NONE);

        let scheme = resolve_protocol(IpAddr::V4(Ipv4Addr::LOCALHOST), &HeaderMap::new(), true, &policy);
        assert_eq!(scheme, Scheme::Http);
    }

    #[test]
    fn unknown_forwarded_value_degrades_to_http() {
        let policy = TrustPolicy::from_specs(["*"], NONE);
        let mut headers = HeaderMap::new();
        headers.insert(X_FORWARDED_PROTO, HeaderValue::from_static("wss"));

        assert_eq!(resolve_protocol(addr("10.0.0.1"), &headers, true, &policy), Scheme::Http);
    }
}
