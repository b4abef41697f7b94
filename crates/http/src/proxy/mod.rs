//! Trusted proxy resolution.
//!
//! A request that went through proxies carries `X-Forwarded-*` headers set by
//! each hop. They are only believed when the hop is trusted per a
//! [`TrustPolicy`]:
//!
//! - [`resolve_protocol`]: `http` or `https`
//! - [`resolve_hostname`]: the validated hostname, checked against a [`HostPolicy`]
//! - [`ForwardedChain`]: the client address and the trusted forwarded chain

mod address;
mod forward;
mod host;
mod scheme;
mod trust;

pub use address::AddressSpec;
pub use address::CidrRange;
pub use address::PatternError;
pub use forward::ClientAddress;
pub use forward::ForwardedChain;
pub use forward::X_FORWARDED_FOR;
pub use host::HostPattern;
pub use host::HostPolicy;
pub use host::X_FORWARDED_HOST;
pub use host::is_valid_hostname;
pub use host::resolve_hostname;
pub use scheme::Scheme;
pub use scheme::X_FORWARDED_PROTO;
pub use scheme::resolve_protocol;
pub use trust::TrustPolicy;
