//! File streaming with exactly-once completion.
//!
//! A [`FileTransfer`] reads a file and writes it to a
//! [`ResponseSink`](crate::protocol::ResponseSink), reporting [`TransferEvent`]s.
//! The [`StreamMachine`] reconciles those events with the finished signal of the
//! response, and [`stream_file`] drives both until a single [`StreamOutcome`]
//! is known.

mod file_transfer;
mod machine;
mod outcome;
mod range;
mod streamer;

pub use file_transfer::DEFAULT_CHUNK_SIZE;
pub use file_transfer::DownloadOptions;
pub use file_transfer::FileTransfer;
pub use machine::StreamMachine;
pub use machine::StreamState;
pub use outcome::StreamOutcome;
pub use outcome::TransferEvent;
pub use outcome::TransferFailure;
pub use range::ByteRange;
pub use streamer::stream_file;
