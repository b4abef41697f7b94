use std::net::IpAddr;

use tracing::warn;

use crate::proxy::AddressSpec;

/// Decides whether an address is a relay whose forwarding headers can be believed.
///
/// The untrusted list always wins: an address matching both lists is untrusted,
/// and an untrusted `*` makes every address untrusted. An empty policy trusts
/// nothing.
#[derive(Debug, Clone, Default)]
pub struct TrustPolicy {
    trusted: Vec<AddressSpec>,
    untrusted: Vec<AddressSpec>,
}

impl TrustPolicy {
    pub fn new(trusted: Vec<AddressSpec>, untrusted: Vec<AddressSpec>) -> Self {
        Self { trusted, untrusted }
    }

    /// Trusts nothing.
    pub fn deny_all() -> Self {
        Self::default()
    }

    /// Builds the policy from textual specs; specs that cannot be parsed are dropped.
    pub fn from_specs<T, U>(trusted: T, untrusted: U) -> Self
    where
        T: IntoIterator,
        T::Item: AsRef<str>,
        U: IntoIterator,
        U::Item: AsRef<str>,
    {
        Self { trusted: parse_specs(trusted), untrusted: parse_specs(untrusted) }
    }

    pub fn trusted(&self) -> &[AddressSpec] {
        &self.trusted
    }

    pub fn untrusted(&self) -> &[AddressSpec] {
        &self.untrusted
    }

    pub fn is_trusted(&self, addr: &str) -> bool {
        if self.untrusted.iter().any(|spec| spec.matches(addr)) {
            return false;
        }
        self.trusted.iter().any(|spec| spec.matches(addr))
    }

    pub fn is_trusted_ip(&self, addr: IpAddr) -> bool {
        if self.untrusted.iter().any(|spec| spec.matches_ip(addr)) {
            return false;
        }
        self.trusted.iter().any(|spec| spec.matches_ip(addr))
    }
}

fn parse_specs<I>(specs: I) -> Vec<AddressSpec>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    specs
        .into_iter()
        .filter_map(|spec| match spec.as_ref().parse::<AddressSpec>() {
            Ok(spec) => Some(spec),
            Err(e) => {
                warn!(cause = %e, "drop proxy address spec");
                None
            }
        })
        .collect()
}
