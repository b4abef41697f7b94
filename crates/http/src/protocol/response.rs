//! Outbound response handling.
//!
//! [`ResponseHead`] is the header portion of a response. [`ResponseSink`] is the
//! contract of the outbound collaborator: the adapter sets status and headers,
//! writes body bytes, ends the response, and observes when the underlying
//! connection is finished.

use std::io;

use async_trait::async_trait;
use bytes::Bytes;
use http::Response;
use tokio::sync::oneshot;

/// Type alias for HTTP response headers.
///
/// This type represents the header portion of an HTTP response, using
/// `http::Response<()>` with an empty body placeholder.
pub type ResponseHead = Response<()>;

/// A custom status message, stored in the response extensions.
///
/// When absent the canonical reason of the status code is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasonPhrase(pub String);

/// Notification that the response is finished, fired at most once.
///
/// `None` means the response was fully handed to the transport; `Some` carries
/// the error that closed the connection. A dropped sender counts as a clean
/// finish.
pub type FinishedSignal = oneshot::Receiver<Option<io::Error>>;

/// The outbound response collaborator.
#[async_trait]
pub trait ResponseSink: Send {
    /// Status, headers and extensions; changes are ignored once the head is written.
    fn head_mut(&mut self) -> &mut ResponseHead;

    fn is_head_written(&self) -> bool;

    async fn write_head(&mut self) -> io::Result<()>;

    /// Writes a body chunk, writing the head first when needed.
    async fn write(&mut self, chunk: Bytes) -> io::Result<()>;

    /// Ends the response, optionally with a last chunk.
    async fn end(&mut self, chunk: Option<Bytes>) -> io::Result<()>;

    /// Subscribes to the finished notification.
    fn on_finished(&mut self) -> FinishedSignal;
}
