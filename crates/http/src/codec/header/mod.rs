//! HTTP response header encoding
//!
//! - [`HeaderEncoder`]: Encodes the status line and header fields to bytes
//!   - Writes custom reason phrases when present
//!   - Manages content-length and transfer-encoding headers

mod header_encoder;

pub use header_encoder::HeaderEncoder;
