use std::path::PathBuf;

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};

/// What the response body is made of.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ResultContent {
    #[default]
    Empty,
    Bytes(Bytes),
    /// a file streamed from disk
    File(PathBuf),
}

/// The result the application produced for an [`IncomingEvent`](crate::IncomingEvent).
#[derive(Debug, Clone, Default)]
pub struct OutgoingResult {
    pub(crate) status: Option<StatusCode>,
    pub(crate) status_message: Option<String>,
    pub(crate) headers: HeaderMap,
    pub(crate) content: ResultContent,
}

impl OutgoingResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bytes<B: Into<Bytes>>(status: StatusCode, content: B) -> Self {
        Self::new().with_status(status).with_content(ResultContent::Bytes(content.into()))
    }

    pub fn file<P: Into<PathBuf>>(path: P) -> Self {
        Self::new().with_status(StatusCode::OK).with_content(ResultContent::File(path.into()))
    }

    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn with_status_message<S: Into<String>>(mut self, message: S) -> Self {
        self.status_message = Some(message.into());
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    #[must_use]
    pub fn with_content(mut self, content: ResultContent) -> Self {
        self.content = content;
        self
    }

    /// The status, `None` until the application sets one.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn content(&self) -> &ResultContent {
        &self.content
    }
}
