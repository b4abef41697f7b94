use std::io;
use std::mem;

use async_trait::async_trait;
use bytes::Bytes;
use futures::SinkExt;
use http::header::{CONTENT_LENGTH, TRANSFER_ENCODING};
use tokio::io::AsyncWrite;
use tokio::sync::oneshot;
use tokio_util::codec::FramedWrite;
use tracing::{error, trace};

use crate::codec::ResponseEncoder;
use crate::protocol::{FinishedSignal, Message, PayloadItem, PayloadSize, ResponseHead, ResponseSink};

/// A [`ResponseSink`] writing HTTP/1.1 onto any [`AsyncWrite`].
///
/// The body is framed by `Content-Length` when the head announces one and
/// chunked otherwise. Ending a response whose head is not written yet with a
/// last chunk announces that chunk's length.
#[derive(Debug)]
pub struct WireResponse<W> {
    framed_write: FramedWrite<W, ResponseEncoder>,
    head: ResponseHead,
    head_written: bool,
    ended: bool,
    subscribers: Vec<oneshot::Sender<Option<io::Error>>>,
    finished: Option<Option<(io::ErrorKind, String)>>,
}

impl<W> WireResponse<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W) -> Self {
        Self {
            framed_write: FramedWrite::new(writer, ResponseEncoder::new()),
            head: ResponseHead::default(),
            head_written: false,
            ended: false,
            subscribers: Vec::new(),
            finished: None,
        }
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn into_inner(self) -> W {
        self.framed_write.into_inner()
    }

    async fn send(&mut self, message: Message<(ResponseHead, PayloadSize)>) -> io::Result<()> {
        match self.framed_write.send(message).await {
            Ok(()) => Ok(()),
            Err(e) => {
                let e = io::Error::from(e);
                error!(cause = %e, "failed to write response");
                self.finish(Some(&e));
                Err(e)
            }
        }
    }

    fn finish(&mut self, error: Option<&io::Error>) {
        if self.finished.is_some() {
            return;
        }

        let outcome = error.map(|e| (e.kind(), e.to_string()));
        for subscriber in self.subscribers.drain(..) {
            let _ = subscriber.send(outcome.as_ref().map(|(kind, message)| io::Error::new(*kind, message.clone())));
        }
        self.finished = Some(outcome);
    }

    fn ensure_open(&self) -> io::Result<()> {
        if self.ended {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "response already ended"));
        }
        Ok(())
    }
}

#[async_trait]
impl<W> ResponseSink for WireResponse<W>
where
    W: AsyncWrite + Unpin + Send,
{
    fn head_mut(&mut self) -> &mut ResponseHead {
        &mut self.head
    }

    fn is_head_written(&self) -> bool {
        self.head_written
    }

    async fn write_head(&mut self) -> io::Result<()> {
        self.ensure_open()?;
        if self.head_written {
            return Ok(());
        }

        let length = self
            .head
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok());
        let payload_size = PayloadSize::from_content_length(length);

        let head = mem::take(&mut self.head);
        self.head_written = true;
        trace!(status = %head.status(), ?payload_size, "write response head");
        self.send(Message::Header((head, payload_size))).await
    }

    async fn write(&mut self, chunk: Bytes) -> io::Result<()> {
        self.ensure_open()?;
        self.write_head().await?;
        if chunk.is_empty() {
            return Ok(());
        }
        self.send(Message::Payload(PayloadItem::Chunk(chunk))).await
    }

    async fn end(&mut self, chunk: Option<Bytes>) -> io::Result<()> {
        self.ensure_open()?;

        if !self.head_written {
            let headers = self.head.headers_mut();
            if !headers.contains_key(CONTENT_LENGTH) && !headers.contains_key(TRANSFER_ENCODING) {
                let length = chunk.as_ref().map_or(0, Bytes::len);
                headers.insert(CONTENT_LENGTH, length.into());
            }
        }

        if let Some(chunk) = chunk {
            self.write(chunk).await?;
        } else {
            self.write_head().await?;
        }

        self.send(Message::Payload(PayloadItem::Eof)).await?;
        self.ended = true;
        self.finish(None);
        Ok(())
    }

    fn on_finished(&mut self) -> FinishedSignal {
        let (sender, receiver) = oneshot::channel();
        match &self.finished {
            Some(outcome) => {
                let _ = sender.send(outcome.as_ref().map(|(kind, message)| io::Error::new(*kind, message.clone())));
            }
            None => self.subscribers.push(sender),
        }
        receiver
    }
}
