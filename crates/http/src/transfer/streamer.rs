use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::protocol::ResponseSink;
use crate::transfer::{FileTransfer, StreamMachine, StreamOutcome};

/// Streams a file into the response and resolves exactly once.
///
/// The transfer runs until its events, the finished signal of `sink` or the
/// deferred check decide the outcome. The transfer is dropped, and so
/// cancelled, as soon as the outcome is known.
pub async fn stream_file<S>(sink: &mut S, transfer: &FileTransfer) -> StreamOutcome
where
    S: ResponseSink + ?Sized,
{
    let (mut machine, outcome) = StreamMachine::new();
    let (events_sender, mut events) = mpsc::unbounded_channel();
    let mut finished = sink.on_finished();

    {
        let running = transfer.run(sink, events_sender);
        tokio::pin!(running);

        let mut events_closed = false;
        let mut finished_done = false;
        let mut transfer_done = false;

        while !machine.is_resolved() {
            tokio::select! {
                biased;

                event = events.recv(), if !events_closed => match event {
                    Some(event) => machine.on_event(event),
                    None => events_closed = true,
                },

                result = &mut finished, if !finished_done => {
                    finished_done = true;
                    // a dropped sender counts as a clean finish
                    machine.on_finished(result.ok().flatten());
                }

                result = &mut running, if !transfer_done => {
                    transfer_done = true;
                    if let Err(e) = result {
                        debug!(cause = %e, "transfer stopped writing the response");
                    }
                }

                () = tokio::task::yield_now(), if machine.is_deferred() => machine.on_deferred_check(),

                else => {
                    warn!(path = %transfer.path().display(), "transfer stalled without outcome");
                    machine.abandon();
                }
            }
        }
    }

    outcome.await.unwrap_or(StreamOutcome::Aborted)
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::io::Write;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use bytes::Bytes;
    use http::StatusCode;
    use tempfile::NamedTempFile;
    use tokio::io::AsyncWrite;

    use super::*;
    use crate::connection::WireResponse;
    use crate::transfer::DownloadOptions;

    fn temp_file(content: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file
    }

    fn options(chunk_size: usize) -> DownloadOptions {
        DownloadOptions { chunk_size, ..DownloadOptions::default() }
    }

    fn body_of(wire: Vec<u8>) -> Vec<u8> {
        let split = wire.windows(4).position(|w| w == b"\r\n\r\n").unwrap();
        wire[split + 4..].to_vec()
    }

    #[tokio::test]
    async fn small_file_completes_with_single_write() {
        let file = temp_file(b"hello world");
        let mut response = WireResponse::new(Vec::new());

        let outcome = stream_file(&mut response, &FileTransfer::new(file.path(), options(64))).await;

        assert!(outcome.is_completed());
        let wire = response.into_inner();
        let text = String::from_utf8_lossy(&wire);
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("content-length: 11\r\n"));
        assert!(text.contains("accept-ranges: bytes\r\n"));
        assert_eq!(body_of(wire), b"hello world");
    }

    #[tokio::test]
    async fn large_file_is_streamed_in_chunks() {
        let content: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        let file = temp_file(&content);
        let mut response = WireResponse::new(Vec::new());

        let outcome = stream_file(&mut response, &FileTransfer::new(file.path(), options(1024))).await;

        assert!(outcome.is_completed());
        let wire = response.into_inner();
        assert!(String::from_utf8_lossy(&wire).contains("content-length: 10000\r\n"));
        assert_eq!(body_of(wire), content);
    }

    #[tokio::test]
    async fn range_request_gets_partial_content() {
        let file = temp_file(b"0123456789");
        let mut response = WireResponse::new(Vec::new());
        let transfer = FileTransfer::new(file.path(), options(64)).with_range(Some("bytes=2-5"));

        let outcome = stream_file(&mut response, &transfer).await;

        assert!(outcome.is_completed());
        let wire = response.into_inner();
        let text = String::from_utf8_lossy(&wire);
        assert!(text.starts_with("HTTP/1.1 206 Partial Content\r\n"));
        assert!(text.contains("content-range: bytes 2-5/10\r\n"));
        assert_eq!(body_of(wire), b"2345");
    }

    #[tokio::test]
    async fn extra_headers_are_applied() {
        let file = temp_file(b"{}");
        let mut response = WireResponse::new(Vec::new());
        let mut download = options(64);
        download.headers.insert("cache-control", "no-store".parse().unwrap());

        let outcome = stream_file(&mut response, &FileTransfer::new(file.path(), download)).await;

        assert!(outcome.is_completed());
        assert!(String::from_utf8_lossy(&response.into_inner()).contains("cache-control: no-store\r\n"));
    }

    #[tokio::test]
    async fn directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut response = WireResponse::new(Vec::new());

        let outcome = stream_file(&mut response, &FileTransfer::new(dir.path(), options(64))).await;

        let failure = outcome.into_result().unwrap_err();
        assert_eq!(failure.status(), StatusCode::NOT_FOUND);
        assert_eq!(failure.code(), Some("HTTP_FILE-EISDIR"));
        assert!(response.into_inner().is_empty());
    }

    #[tokio::test]
    async fn missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut response = WireResponse::new(Vec::new());

        let outcome = stream_file(&mut response, &FileTransfer::new(dir.path().join("missing.txt"), options(64))).await;

        let failure = outcome.into_result().unwrap_err();
        assert_eq!(failure.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(failure.code(), Some("HTTP_FILE-ENOENT"));
    }

    /// Accepts the head, then resets the connection.
    struct ResetAfter {
        budget: usize,
    }

    impl AsyncWrite for ResetAfter {
        fn poll_write(mut self: Pin<&mut Self>, _: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
            if self.budget == 0 {
                return Poll::Ready(Err(io::Error::from(io::ErrorKind::ConnectionReset)));
            }
            let n = buf.len().min(self.budget);
            self.budget -= n;
            Poll::Ready(Ok(n))
        }

        fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn reset_while_streaming_aborts() {
        let file = temp_file(&[7u8; 8192]);
        let mut response = WireResponse::new(ResetAfter { budget: 1024 });

        let outcome = stream_file(&mut response, &FileTransfer::new(file.path(), options(512))).await;

        let failure = outcome.into_result().unwrap_err();
        assert_eq!(failure.status(), StatusCode::BAD_REQUEST);
        assert_eq!(failure.code(), Some("HTTP_FILE-ECONNABORTED"));
    }

    /// A sink whose connection finishes cleanly before any body is written.
    struct ClosedSink {
        head: http::Response<()>,
    }

    #[async_trait::async_trait]
    impl ResponseSink for ClosedSink {
        fn head_mut(&mut self) -> &mut http::Response<()> {
            &mut self.head
        }

        fn is_head_written(&self) -> bool {
            false
        }

        async fn write_head(&mut self) -> io::Result<()> {
            std::future::pending().await
        }

        async fn write(&mut self, _chunk: Bytes) -> io::Result<()> {
            std::future::pending().await
        }

        async fn end(&mut self, _chunk: Option<Bytes>) -> io::Result<()> {
            std::future::pending().await
        }

        fn on_finished(&mut self) -> crate::protocol::FinishedSignal {
            let (sender, receiver) = tokio::sync::oneshot::channel();
            let _ = sender.send(None);
            receiver
        }
    }

    #[tokio::test]
    async fn clean_close_before_end_aborts() {
        let file = temp_file(&[1u8; 4096]);
        let mut sink = ClosedSink { head: http::Response::new(()) };

        let outcome = stream_file(&mut sink, &FileTransfer::new(file.path(), options(1024))).await;

        assert!(matches!(outcome, StreamOutcome::Aborted));
    }
}
