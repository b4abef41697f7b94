//! Outbound connection handling
//!
//! - [`WireResponse`]: the [`ResponseSink`](crate::protocol::ResponseSink) that
//!   encodes a response onto an async writer and reports when it is finished

mod wire_response;

pub use wire_response::WireResponse;
