use std::io;

use crate::protocol::{HttpFailure, native_code};

/// What a file transfer reports while it runs.
#[derive(Debug)]
pub enum TransferEvent {
    /// the file could not be read
    Error(io::Error),
    /// the path is a directory
    Directory,
    /// response headers are about to be set
    Headers,
    /// the body is streamed in several writes
    Stream,
    /// the body is sent with a single write
    File,
    /// the whole body was handed to the response
    End,
}

/// The detail of a failed transfer.
#[derive(Debug)]
pub struct TransferFailure {
    message: String,
    code: &'static str,
    cause: Option<io::Error>,
}

impl TransferFailure {
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The errno-like code, e.g. `ENOENT`.
    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl From<io::Error> for TransferFailure {
    fn from(e: io::Error) -> Self {
        Self { message: e.to_string(), code: native_code(&e), cause: Some(e) }
    }
}

/// How a file transfer ended; exactly one is produced per transfer.
#[derive(Debug)]
pub enum StreamOutcome {
    Completed,
    Aborted,
    Failed(TransferFailure),
    DirectoryRejected,
}

impl StreamOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, StreamOutcome::Completed)
    }

    /// Maps the outcome onto the failure reported to the caller.
    ///
    /// # Errors
    ///
    /// - `Aborted`: 400 `Request aborted.`, `HTTP_FILE-ECONNABORTED`
    /// - `Failed`: 500 `An unexpected error has occurred.`, `HTTP_FILE-<code>`
    /// - `DirectoryRejected`: 404 `This file cannot be found.`, `HTTP_FILE-EISDIR`
    pub fn into_result(self) -> Result<(), HttpFailure> {
        match self {
            StreamOutcome::Completed => Ok(()),
            StreamOutcome::Aborted => Err(HttpFailure::request_aborted()),
            StreamOutcome::DirectoryRejected => Err(HttpFailure::file_not_found()),
            StreamOutcome::Failed(TransferFailure { message, code, cause }) => {
                let failure = HttpFailure::unexpected(message, code);
                Err(match cause {
                    Some(cause) => failure.with_cause(cause),
                    None => failure,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[test]
    fn outcomes_map_to_failures() {
        assert!(StreamOutcome::Completed.into_result().is_ok());

        let aborted = StreamOutcome::Aborted.into_result().unwrap_err();
        assert_eq!(aborted.status(), StatusCode::BAD_REQUEST);
        assert_eq!(aborted.body(), "Request aborted.");
        assert_eq!(aborted.message(), "Request aborted.");
        assert_eq!(aborted.code(), Some("HTTP_FILE-ECONNABORTED"));

        let directory = StreamOutcome::DirectoryRejected.into_result().unwrap_err();
        assert_eq!(directory.status(), StatusCode::NOT_FOUND);
        assert_eq!(directory.body(), "This file cannot be found.");
        assert_eq!(directory.message(), "EISDIR, read");
        assert_eq!(directory.code(), Some("HTTP_FILE-EISDIR"));

        let e = io::Error::new(io::ErrorKind::PermissionDenied, "permission denied");
        let failed = StreamOutcome::Failed(e.into()).into_result().unwrap_err();
        assert_eq!(failed.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(failed.body(), "An unexpected error has occurred.");
        assert_eq!(failed.message(), "permission denied");
        assert_eq!(failed.code(), Some("HTTP_FILE-EACCES"));
        assert!(failed.cause().is_some());
    }
}
