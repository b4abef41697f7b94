use std::net::IpAddr;
use std::str::FromStr;

use http::HeaderMap;
use http::header::HOST;
use regex::Regex;
use tracing::debug;

use crate::protocol::HttpFailure;
use crate::proxy::TrustPolicy;
use crate::proxy::address::{PatternError, parse_regex_literal};

pub const X_FORWARDED_HOST: &str = "x-forwarded-host";

const MAX_LABEL_LEN: usize = 63;

/// An entry of the trusted hostname allow-list.
#[derive(Debug, Clone)]
pub enum HostPattern {
    /// the hostname must equal the literal
    Literal(String),
    /// `/regex/`, the hostname must match
    Pattern(Regex),
}

impl HostPattern {
    pub fn matches(&self, hostname: &str) -> bool {
        match self {
            HostPattern::Literal(literal) => literal == hostname,
            HostPattern::Pattern(regex) => regex.is_match(hostname),
        }
    }
}

impl FromStr for HostPattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match parse_regex_literal(s) {
            Some(regex) => regex.map(HostPattern::Pattern),
            None => Ok(HostPattern::Literal(s.to_string())),
        }
    }
}

impl From<Regex> for HostPattern {
    fn from(regex: Regex) -> Self {
        HostPattern::Pattern(regex)
    }
}

/// The configuration of hostname resolution.
#[derive(Debug, Clone, Default)]
pub struct HostPolicy {
    trusted_hosts: Vec<HostPattern>,
    trust: TrustPolicy,
}

impl HostPolicy {
    /// An empty allow-list puts no restriction on hostnames.
    pub fn new(trusted_hosts: Vec<HostPattern>, trust: TrustPolicy) -> Self {
        Self { trusted_hosts, trust }
    }

    pub fn trusted_hosts(&self) -> &[HostPattern] {
        &self.trusted_hosts
    }

    pub fn trust(&self) -> &TrustPolicy {
        &self.trust
    }
}

/// Whether `hostname` fits the conservative host grammar.
///
/// An optional leading `[` for IPv6 literals; the rest must not be all digits nor
/// start with `-`, and is made of dot separated labels of 1 to 63 characters out
/// of `A-Z a-z 0-9 - : ]`, with an optional trailing dot.
pub fn is_valid_hostname(hostname: &str) -> bool {
    let rest = hostname.strip_prefix('[').unwrap_or(hostname);
    if rest.is_empty() || rest.starts_with('-') || rest.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }

    let labels = rest.strip_suffix('.').unwrap_or(rest);
    labels.split('.').all(|label| {
        (1..=MAX_LABEL_LEN).contains(&label.len())
            && label.bytes().all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b':' | b']'))
    })
}

/// The content of the first `[hex-or-colon]` group.
fn ipv6_literal(raw: &str) -> Option<&str> {
    raw.match_indices('[').find_map(|(start, _)| {
        let rest = &raw[start + 1..];
        let len = rest.bytes().take_while(|b| b.is_ascii_hexdigit() || *b == b':').count();
        (len > 0 && rest[len..].starts_with(']')).then(|| &rest[..len])
    })
}

fn strip_port(host: &str) -> &str {
    match host.rsplit_once(':') {
        Some((name, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => name,
        _ => host,
    }
}

/// Resolves the hostname the client asked for.
///
/// Behind a trusted relay the first `X-Forwarded-Host` value replaces `Host`. An
/// empty result is returned as is, without validation.
///
/// # Errors
///
/// A `SuspiciousOperation` failure with `Invalid Host` when the header is not
/// visible ASCII or the hostname breaks the grammar, or `Untrusted Host` when it misses a non-empty allow-list.
pub fn resolve_hostname(remote_addr: IpAddr, headers: &HeaderMap, policy: &HostPolicy) -> Result<String, HttpFailure> {
    let forwarded = policy.trust.is_trusted_ip(remote_addr);
    let value = if forwarded { headers.get(X_FORWARDED_HOST) } else { headers.get(HOST) };
    let Some(value) = value else {
        return Ok(String::new());
    };

    let ip = remote_addr.to_canonical().to_string();
    let Ok(raw) = value.to_str() else {
        let lossy = String::from_utf8_lossy(value.as_bytes());
        return Err(HttpFailure::suspicious_operation("Invalid Host", &ip, &lossy));
    };
    let raw = if forwarded { raw.split(',').next().unwrap_or_default() } else { raw };

    if raw.is_empty() {
        return Ok(String::new());
    }

    let hostname = match ipv6_literal(raw) {
        Some(literal) => format!("[{literal}]"),
        None => strip_port(raw.trim()).to_lowercase(),
    };

    if !is_valid_hostname(&hostname) {
        return Err(HttpFailure::suspicious_operation("Invalid Host", &ip, &hostname));
    }

    if !policy.trusted_hosts.is_empty() && !policy.trusted_hosts.iter().any(|pattern| pattern.matches(&hostname)) {
        return Err(HttpFailure::suspicious_operation("Untrusted Host", &ip, &hostname));
    }

    debug!(hostname, "resolved hostname");
    Ok(hostname)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderValue, StatusCode};

    const NONE: [&str; 0] = [];

    fn localhost() -> IpAddr {
        "127.0.0.1".parse().unwrap()
    }

    fn host_headers(host: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(HOST, HeaderValue::from_static(host));
        headers
    }

    #[test]
    fn strips_port_and_lowercases() {
        let hostname = resolve_hostname(localhost(), &host_headers("WWW.Example.com:8080"), &HostPolicy::default()).unwrap();
        assert_eq!(hostname, "www.example.com");
    }

    #[test]
    fn invalid_host_reports_host_and_ip() {
        let failure = resolve_hostname(localhost(), &host_headers("-example_.com?lorem"), &HostPolicy::default()).unwrap_err();

        assert_eq!(failure.status(), StatusCode::BAD_REQUEST);
        assert_eq!(failure.body(), "Invalid Host -example_.com?lorem");
        assert_eq!(failure.message(), "SuspiciousOperation: Invalid Host -example_.com?lorem with ip(127.0.0.1)");
    }

    #[test]
    fn allow_list_patterns() {
        let pattern: HostPattern = r"/^(.+\.)+example\.com$/".parse().unwrap();
        let policy = HostPolicy::new(vec![pattern], TrustPolicy::deny_all());

        let hostname = resolve_hostname(localhost(), &host_headers("admin.dev.example.com"), &policy).unwrap();
        assert_eq!(hostname, "admin.dev.example.com");

        let failure = resolve_hostname(localhost(), &host_headers("www.domain.com"), &policy).unwrap_err();
        assert_eq!(failure.body(), "Untrusted Host www.domain.com");
        assert_eq!(failure.message(), "SuspiciousOperation: Untrusted Host www.domain.com with ip(127.0.0.1)");
    }

    #[test]
    fn allow_list_literals() {
        let policy = HostPolicy::new(vec!["example.com".parse().unwrap()], TrustPolicy::deny_all());

        assert!(resolve_hostname(localhost(), &host_headers("example.com"), &policy).is_ok());
        assert!(resolve_hostname(localhost(), &host_headers("api.example.com"), &policy).is_err());
    }

    #[test]
    fn trusted_relay_forwards_host() {
        let policy = HostPolicy::new(Vec::new(), TrustPolicy::from_specs(["127.0.0.1"], NONE));
        let mut headers = host_headers("internal.local");
        headers.insert(X_FORWARDED_HOST, HeaderValue::from_static("shop.example.com:443, internal.local"));

        assert_eq!(resolve_hostname(localhost(), &headers, &policy).unwrap(), "shop.example.com");
    }

    #[test]
    fn ipv6_literal_is_kept_verbatim() {
        let hostname = resolve_hostname(localhost(), &host_headers("[::1]:3000"), &HostPolicy::default()).unwrap();
        assert_eq!(hostname, "[::1]");
    }

    // Known edge case: a trusted relay without X-Forwarded-Host yields an empty
    // hostname that skips the grammar and the allow-list.
    #[test]
    fn empty_forwarded_host_passes_through_unvalidated() {
        let policy = HostPolicy::new(vec!["example.com".parse().unwrap()], TrustPolicy::from_specs(["*"], NONE));

        let hostname = resolve_hostname(localhost(), &host_headers("evil.com"), &policy).unwrap();
        assert_eq!(hostname, "");
    }

    #[test]
    fn non_ascii_host_is_rejected() {
        let policy = HostPolicy::new(vec!["example.com".parse().unwrap()], TrustPolicy::deny_all());
        let mut headers = HeaderMap::new();
        headers.insert(HOST, HeaderValue::from_bytes(b"evil\xe9.com").unwrap());

        let failure = resolve_hostname("1.2.3.4".parse().unwrap(), &headers, &policy).unwrap_err();

        assert_eq!(failure.status(), StatusCode::BAD_REQUEST);
        assert!(failure.body().starts_with("Invalid Host evil"));
        assert!(failure.message().ends_with("with ip(1.2.3.4)"));
    }

    #[test]
    fn non_ascii_forwarded_host_is_rejected() {
        let policy = HostPolicy::new(vec!["example.com".parse().unwrap()], TrustPolicy::from_specs(["127.0.0.1"], NONE));
        let mut headers = host_headers("example.com");
        headers.insert(X_FORWARDED_HOST, HeaderValue::from_bytes(b"\xe9vil.com, example.com").unwrap());

        let failure = resolve_hostname(localhost(), &headers, &policy).unwrap_err();

        assert_eq!(failure.status(), StatusCode::BAD_REQUEST);
        assert!(failure.body().starts_with("Invalid Host"));
    }

    #[test]
    fn grammar() {
        assert!(is_valid_hostname("example.com."));
        assert!(is_valid_hostname("127.0.0.1"));
        assert!(!is_valid_hostname("12345"));
        assert!(!is_valid_hostname("a..b"));
        assert!(!is_valid_hostname(&"a".repeat(64)));
        assert!(!is_valid_hostname("exa mple.com"));
    }
}
