//! Trusted-proxy normalization and streaming I/O for HTTP adapters
//!
//! This crate is the boundary layer between a raw inbound HTTP message and the
//! application: it derives trustworthy client information in the presence of
//! intermediary proxies, ingests multipart bodies straight to disk, and streams
//! files back to the client with exactly-once completion semantics.
//!
//! # Features
//!
//! - Trusted proxy evaluation with literal, CIDR, wildcard and pattern specs
//! - Effective scheme, hostname and client address resolution
//! - Conservative hostname validation with an optional allow-list
//! - Streaming multipart decoding without buffering whole bodies
//! - File streaming with range support and abort detection
//! - HTTP/1.1 response framing on top of any `AsyncWrite`
//!
//! # Example
//!
//! ```no_run
//! use std::net::{IpAddr, Ipv4Addr};
//! use edge_http::protocol::IncomingMessage;
//! use edge_http::proxy::{resolve_protocol, ForwardedChain, TrustPolicy};
//! use http::Request;
//!
//! let request = Request::builder()
//!     .uri("/users?page=2")
//!     .header("x-forwarded-for", "203.0.113.7, 10.0.0.3")
//!     .header("x-forwarded-proto", "https")
//!     .body(())
//!     .unwrap();
//!
//! let message = IncomingMessage::new(request, IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)), false);
//! let policy = TrustPolicy::from_specs(["10.0.0.0/8"], ["10.0.0.66"]);
//!
//! let protocol = resolve_protocol(message.remote_addr(), message.headers(), message.is_encrypted(), &policy);
//! let client = ForwardedChain::resolve(message.remote_addr(), message.headers(), &policy);
//!
//! assert_eq!(protocol.as_str(), "https");
//! assert_eq!(client.ip(), "203.0.113.7");
//! ```
//!
//! # Architecture
//!
//! The crate is organized into several key modules:
//!
//! - [`protocol`]: inbound message, response sink abstraction and failure type
//! - [`proxy`]: trust predicate and scheme, host and forwarded-chain resolvers
//! - [`codec`]: response encoders and the multipart decoder
//! - [`upload`]: multipart ingestion into temporary files
//! - [`transfer`]: file streaming state machine and driver
//! - [`connection`]: a [`protocol::ResponseSink`] writing HTTP/1.1 onto the wire
//!
//! # Error Handling
//!
//! Every failure surfaced to callers is a [`protocol::HttpFailure`] carrying a
//! status code, a public message, an internal message, an optional machine code
//! and the underlying cause. Lower level errors ([`upload::UploadError`],
//! [`protocol::SendError`]) convert into it.

pub mod codec;
pub mod connection;
pub mod protocol;
pub mod proxy;
pub mod transfer;
pub mod upload;

mod utils;
pub(crate) use utils::ensure;
