use http::StatusCode;
use std::error::Error;
use std::fmt;
use std::io;
use thiserror::Error;

pub type BoxError = Box<dyn Error + Send + Sync>;

/// The failure surfaced by every fallible operation of the adapter layer.
///
/// It carries everything another layer needs to render a response: the status,
/// a message that is safe to show to the client, a detailed internal message,
/// an optional machine readable code and the underlying cause.
#[derive(Error)]
#[error("{message}")]
pub struct HttpFailure {
    status: StatusCode,
    body: String,
    message: String,
    code: Option<String>,
    #[source]
    cause: Option<BoxError>,
}

impl HttpFailure {
    pub fn new<B: Into<String>, M: Into<String>>(status: StatusCode, body: B, message: M) -> Self {
        Self { status, body: body.into(), message: message.into(), code: None, cause: None }
    }

    #[must_use]
    pub fn with_code<C: Into<String>>(mut self, code: C) -> Self {
        self.code = Some(code.into());
        self
    }

    #[must_use]
    pub fn with_cause<E: Into<BoxError>>(mut self, cause: E) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// A request whose host information cannot be trusted, e.g. `Invalid Host` or `Untrusted Host`.
    pub fn suspicious_operation(reason: &str, ip: &str, host: &str) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            format!("{reason} {host}"),
            format!("SuspiciousOperation: {reason} {host} with ip({ip})"),
        )
    }

    pub fn request_aborted() -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Request aborted.", "Request aborted.").with_code("HTTP_FILE-ECONNABORTED")
    }

    pub fn file_not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "This file cannot be found.", "EISDIR, read").with_code("HTTP_FILE-EISDIR")
    }

    pub fn unexpected<S: Into<String>>(message: S, native_code: &str) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "An unexpected error has occurred.", message)
            .with_code(format!("HTTP_FILE-{native_code}"))
    }

    pub fn io(e: io::Error) -> Self {
        Self::unexpected(e.to_string(), native_code(&e)).with_cause(e)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The message that is safe to send to the client.
    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn cause(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        self.cause.as_deref()
    }
}

impl fmt::Debug for HttpFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpFailure")
            .field("status", &self.status)
            .field("body", &self.body)
            .field("message", &self.message)
            .field("code", &self.code)
            .field("cause", &self.cause.as_ref().map(ToString::to_string))
            .finish()
    }
}

/// Maps an io error onto the errno-like code used in machine codes.
pub fn native_code(e: &io::Error) -> &'static str {
    match e.kind() {
        io::ErrorKind::NotFound => "ENOENT",
        io::ErrorKind::PermissionDenied => "EACCES",
        io::ErrorKind::ConnectionReset => "ECONNRESET",
        io::ErrorKind::ConnectionAborted => "ECONNABORTED",
        io::ErrorKind::BrokenPipe => "EPIPE",
        io::ErrorKind::IsADirectory => "EISDIR",
        io::ErrorKind::NotADirectory => "ENOTDIR",
        io::ErrorKind::TimedOut => "ETIMEDOUT",
        io::ErrorKind::StorageFull => "ENOSPC",
        io::ErrorKind::InvalidInput | io::ErrorKind::InvalidData => "EINVAL",
        _ => "EIO",
    }
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}

impl From<SendError> for io::Error {
    fn from(e: SendError) -> Self {
        match e {
            SendError::Io { source } => source,
            SendError::InvalidBody { reason } => io::Error::new(io::ErrorKind::InvalidInput, reason),
        }
    }
}
