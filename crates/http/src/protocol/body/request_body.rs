use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use http_body::{Body, Frame, SizeHint};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, StreamBody};
use std::fmt;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::protocol::BoxError;

/// The body of an inbound message: either buffered bytes or a live stream.
pub struct RequestBody {
    kind: Kind,
}

enum Kind {
    Buffered(Option<Bytes>),
    Stream(UnsyncBoxBody<Bytes, io::Error>),
}

impl RequestBody {
    pub fn empty() -> Self {
        Self { kind: Kind::Buffered(None) }
    }

    /// A body that was fully received before reaching the adapter.
    pub fn buffered<B: Into<Bytes>>(bytes: B) -> Self {
        let bytes = bytes.into();
        if bytes.is_empty() { Self::empty() } else { Self { kind: Kind::Buffered(Some(bytes)) } }
    }

    /// Wraps any `http_body::Body`, e.g. the body of a `hyper` request.
    pub fn from_body<B>(body: B) -> Self
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        let body = body.map_err(|e| {
            let e: BoxError = e.into();
            match e.downcast::<io::Error>() {
                Ok(e) => *e,
                Err(e) => io::Error::other(e),
            }
        });
        Self { kind: Kind::Stream(UnsyncBoxBody::new(body)) }
    }

    /// Wraps a stream of byte chunks, e.g. a socket read through `tokio_util::io::ReaderStream`.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = io::Result<Bytes>> + Send + 'static,
    {
        Self::from_body(StreamBody::new(stream.map_ok(Frame::data)))
    }

    pub fn is_stream(&self) -> bool {
        matches!(self.kind, Kind::Stream(_))
    }

    /// Returns the bytes of a buffered body, `None` for a live stream.
    pub fn as_buffered(&self) -> Option<&[u8]> {
        match &self.kind {
            Kind::Buffered(Some(bytes)) => Some(bytes.as_ref()),
            Kind::Buffered(None) => Some(&[]),
            Kind::Stream(_) => None,
        }
    }
}

impl Default for RequestBody {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Kind::Buffered(bytes) => f.debug_tuple("Buffered").field(&bytes.as_ref().map_or(0, Bytes::len)).finish(),
            Kind::Stream(_) => f.write_str("Stream"),
        }
    }
}

impl Body for RequestBody {
    type Data = Bytes;
    type Error = io::Error;

    fn poll_frame(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match &mut self.get_mut().kind {
            Kind::Buffered(option_bytes) => Poll::Ready(option_bytes.take().map(|bytes| Ok(Frame::data(bytes)))),
            Kind::Stream(box_body) => Pin::new(box_body).poll_frame(cx),
        }
    }

    fn is_end_stream(&self) -> bool {
        match &self.kind {
            Kind::Buffered(option_bytes) => option_bytes.is_none(),
            Kind::Stream(box_body) => box_body.is_end_stream(),
        }
    }

    fn size_hint(&self) -> SizeHint {
        match &self.kind {
            Kind::Buffered(None) => SizeHint::with_exact(0),
            Kind::Buffered(Some(bytes)) => SizeHint::with_exact(bytes.len() as u64),
            Kind::Stream(box_body) => box_body.size_hint(),
        }
    }
}
