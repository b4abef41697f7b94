use std::io;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use bytes::{Bytes, BytesMut};
use http::header::{ACCEPT_RANGES, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, StatusCode};
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::mpsc::UnboundedSender;
use tracing::trace;

use crate::protocol::ResponseSink;
use crate::transfer::{ByteRange, TransferEvent};

/// Default size of a body chunk read from disk.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// How files are sent.
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// extra headers applied to every file response
    pub headers: HeaderMap,
    /// answer single `Range` requests and announce `Accept-Ranges: bytes`
    pub accept_ranges: bool,
    pub chunk_size: usize,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self { headers: HeaderMap::new(), accept_ranges: true, chunk_size: DEFAULT_CHUNK_SIZE }
    }
}

/// Sends one file as the body of a response, reporting [`TransferEvent`]s.
#[derive(Debug, Clone)]
pub struct FileTransfer {
    path: PathBuf,
    options: DownloadOptions,
    range: Option<String>,
}

impl FileTransfer {
    pub fn new<P: Into<PathBuf>>(path: P, options: DownloadOptions) -> Self {
        Self { path: path.into(), options, range: None }
    }

    /// Uses the `Range` header of the request.
    #[must_use]
    pub fn with_range<S: Into<String>>(mut self, range: Option<S>) -> Self {
        self.range = range.map(Into::into);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Runs the transfer.
    ///
    /// Problems with the file are reported as events and end the transfer with
    /// `Ok`; the event channel closes when the transfer returns. An `Err` means the response could not be written; the finished
    /// signal of the sink reports that case.
    pub async fn run<S>(&self, sink: &mut S, events: UnboundedSender<TransferEvent>) -> io::Result<()>
    where
        S: ResponseSink + ?Sized,
    {
        // the receiver may be gone once the outcome is decided
        let emit = |event: TransferEvent| {
            let _ = events.send(event);
        };

        let metadata = match fs::metadata(&self.path).await {
            Ok(metadata) => metadata,
            Err(e) => {
                emit(TransferEvent::Error(e));
                return Ok(());
            }
        };
        if metadata.is_dir() {
            emit(TransferEvent::Directory);
            return Ok(());
        }

        let mut file = match File::open(&self.path).await {
            Ok(file) => file,
            Err(e) => {
                emit(TransferEvent::Error(e));
                return Ok(());
            }
        };

        let size = metadata.len();
        let range = if self.options.accept_ranges {
            self.range.as_deref().and_then(|range| ByteRange::parse(range, size))
        } else {
            None
        };

        emit(TransferEvent::Headers);
        let length = self.apply_headers(sink, size, range);

        if let Some(range) = range {
            if let Err(e) = file.seek(SeekFrom::Start(range.start)).await {
                emit(TransferEvent::Error(e));
                return Ok(());
            }
        }

        let chunk_size = self.options.chunk_size.max(1);
        if length <= chunk_size as u64 {
            let mut buffer = vec![0; usize::try_from(length).unwrap_or(chunk_size)];
            if let Err(e) = file.read_exact(&mut buffer).await {
                emit(TransferEvent::Error(e));
                return Ok(());
            }
            emit(TransferEvent::File);
            sink.end(Some(Bytes::from(buffer))).await?;
        } else {
            emit(TransferEvent::Stream);
            let mut reader = file.take(length);
            let mut sent = 0;
            loop {
                let mut buffer = BytesMut::with_capacity(chunk_size);
                match reader.read_buf(&mut buffer).await {
                    Ok(0) => break,
                    Ok(n) => sent += n as u64,
                    Err(e) => {
                        emit(TransferEvent::Error(e));
                        return Ok(());
                    }
                }
                sink.write(buffer.freeze()).await?;
            }

            if sent < length {
                emit(TransferEvent::Error(io::Error::new(io::ErrorKind::UnexpectedEof, "file shrank while sending")));
                return Ok(());
            }
            sink.end(None).await?;
        }

        trace!(path = %self.path.display(), length, "file sent");
        emit(TransferEvent::End);
        Ok(())
    }

    /// Sets the headers of the file response and returns the body length.
    fn apply_headers<S>(&self, sink: &mut S, size: u64, range: Option<ByteRange>) -> u64
    where
        S: ResponseSink + ?Sized,
    {
        let head = sink.head_mut();
        let headers = head.headers_mut();

        for (name, value) in &self.options.headers {
            headers.insert(name.clone(), value.clone());
        }

        if !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, guess_content_type(&self.path));
        }
        if self.options.accept_ranges && !headers.contains_key(ACCEPT_RANGES) {
            headers.insert(ACCEPT_RANGES, HeaderValue::from_static("bytes"));
        }

        let length = match range {
            Some(range) => {
                if let Ok(value) = HeaderValue::from_str(&range.content_range(size)) {
                    headers.insert(CONTENT_RANGE, value);
                }
                *head.status_mut() = StatusCode::PARTIAL_CONTENT;
                range.length()
            }
            None => size,
        };

        head.headers_mut().insert(CONTENT_LENGTH, length.into());
        length
    }
}

fn guess_content_type(path: &Path) -> HeaderValue {
    let extension = path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase);
    let mime = match extension.as_deref() {
        Some("html" | "htm") => mime::TEXT_HTML_UTF_8,
        Some("txt") => mime::TEXT_PLAIN_UTF_8,
        Some("css") => mime::TEXT_CSS_UTF_8,
        Some("csv") => mime::TEXT_CSV_UTF_8,
        Some("js" | "mjs") => mime::TEXT_JAVASCRIPT,
        Some("json") => mime::APPLICATION_JSON,
        Some("pdf") => mime::APPLICATION_PDF,
        Some("png") => mime::IMAGE_PNG,
        Some("jpg" | "jpeg") => mime::IMAGE_JPEG,
        Some("gif") => mime::IMAGE_GIF,
        Some("svg") => mime::IMAGE_SVG,
        Some("woff") => mime::FONT_WOFF,
        Some("woff2") => mime::FONT_WOFF2,
        _ => mime::APPLICATION_OCTET_STREAM,
    };
    HeaderValue::from_str(mime.as_ref()).unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"))
}
