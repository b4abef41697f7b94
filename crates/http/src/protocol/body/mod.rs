//! Inbound request body handling.
//!
//! The inbound collaborator hands over either a live byte stream or a body that
//! has already been fully buffered. [`RequestBody`] covers both behind the
//! standard `http_body::Body` interface, so consumers can read frames the same
//! way regardless of where the bytes come from, or branch on
//! [`RequestBody::as_buffered`] when they want to drive a parser with a single
//! write.

mod request_body;

pub use request_body::RequestBody;
