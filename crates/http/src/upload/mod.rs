//! Multipart upload ingestion.
//!
//! [`MultipartIngestor`] drives a [`MultipartDecoder`](crate::codec::MultipartDecoder)
//! over a request body: form fields are collected in memory, file parts are
//! written to uniquely named files. [`ingest`] is the one call entry point for a
//! whole [`RequestBody`](crate::protocol::RequestBody).

mod error;
mod ingestor;
mod options;
mod size;

pub use error::UploadError;
pub use ingestor::MultipartIngestor;
pub use ingestor::UploadResult;
pub use ingestor::UploadedFile;
pub use ingestor::ingest;
pub use ingestor::is_multipart;
pub use options::UploadLimits;
pub use options::UploadOptions;
pub use size::ByteSize;
pub use size::InvalidByteSize;
