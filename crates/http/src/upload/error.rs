use std::io;

use http::StatusCode;
use thiserror::Error;

use crate::protocol::{HttpFailure, native_code};

/// Errors raised while ingesting a multipart body.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Multipart: Boundary not found")]
    MissingBoundary,

    #[error("Malformed part header: {reason}")]
    Malformed { reason: String },

    #[error("Unexpected end of form")]
    UnexpectedEnd,

    #[error("Field name too large: more than {limit} bytes")]
    FieldNameTooLarge { limit: u64 },

    #[error("Field value too large: more than {limit} bytes")]
    FieldTooLarge { limit: u64 },

    #[error("File too large: more than {limit} bytes")]
    FileTooLarge { limit: u64 },

    #[error("body read error: {source}")]
    Body { source: io::Error },

    #[error("{source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl UploadError {
    pub fn malformed<S: ToString>(reason: S) -> Self {
        Self::Malformed { reason: reason.to_string() }
    }

    pub fn body(source: io::Error) -> Self {
        Self::Body { source }
    }

    /// The machine code appended to `HTTP_FILE-`.
    pub fn code(&self) -> &'static str {
        match self {
            UploadError::MissingBoundary => "EBOUNDARY",
            UploadError::Malformed { .. } => "EMALFORMED",
            UploadError::UnexpectedEnd => "EUNEXPECTEDEND",
            UploadError::FieldNameTooLarge { .. } => "LIMIT_FIELD_NAME_SIZE",
            UploadError::FieldTooLarge { .. } => "LIMIT_FIELD_SIZE",
            UploadError::FileTooLarge { .. } => "LIMIT_FILE_SIZE",
            UploadError::Body { source } | UploadError::Io { source } => native_code(source),
        }
    }
}

impl From<UploadError> for HttpFailure {
    fn from(e: UploadError) -> Self {
        let code = format!("HTTP_FILE-{}", e.code());
        HttpFailure::new(StatusCode::INTERNAL_SERVER_ERROR, "Cannot upload files.", e.to_string())
            .with_code(code)
            .with_cause(e)
    }
}
