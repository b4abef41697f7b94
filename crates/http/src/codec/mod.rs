//! Codecs for the adapter layer
//!
//! This module provides the streaming state machines that sit between raw bytes
//! and typed items:
//!
//! - Response handling:
//!   - [`ResponseEncoder`]: Encodes outgoing HTTP responses
//!   - Header encoding via the `header` module
//!   - Payload encoding via the `body` module
//!
//! - Multipart handling:
//!   - [`MultipartDecoder`]: Splits a `multipart/form-data` body into part headers and chunks
//!
//! # Example
//!
//! ```
//! use bytes::BytesMut;
//! use edge_http::codec::{MultipartDecoder, PartItem};
//! use tokio_util::codec::Decoder;
//!
//! let mut decoder = MultipartDecoder::new("XyZ");
//! let mut buffer = BytesMut::from(
//!     "--XyZ\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\n1\r\n--XyZ--\r\n",
//! );
//!
//! assert!(matches!(decoder.decode(&mut buffer), Ok(Some(PartItem::Header(_)))));
//! assert!(matches!(decoder.decode(&mut buffer), Ok(Some(PartItem::Chunk(_)))));
//! assert!(matches!(decoder.decode(&mut buffer), Ok(Some(PartItem::PartEnd))));
//! assert!(matches!(decoder.decode(&mut buffer), Ok(Some(PartItem::Eof))));
//! ```
//!
//! # Features
//!
//! - Streaming processing: no item waits for the whole message
//! - Support for chunked transfer encoding
//! - Content-Length based payload handling
//! - State machine based processing

mod body;
mod header;
mod multipart;
mod response_encoder;

pub use multipart::MultipartDecoder;
pub use multipart::PartHeader;
pub use multipart::PartItem;
pub use response_encoder::ResponseEncoder;
