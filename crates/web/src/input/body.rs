use std::collections::HashMap;
use std::io;

use async_trait::async_trait;
use bytes::Bytes;
use edge_http::protocol::{HttpFailure, RequestBody};
use edge_http::upload::{ByteSize, is_multipart};
use http::header::{CONTENT_ENCODING, CONTENT_TYPE};
use http::{HeaderMap, StatusCode};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use mime::Mime;
use thiserror::Error;
use tracing::debug;

use crate::config::BodyOptions;
use crate::{EventBody, InputContext, InputMiddleware};

#[derive(Error, Debug)]
pub enum BodyError {
    #[error("request entity too large, limit is {limit}")]
    TooLarge { limit: ByteSize },

    #[error("{reason}")]
    Parse { reason: String },

    #[error("unsupported charset \"{charset}\"")]
    UnsupportedCharset { charset: String },

    #[error("unsupported content encoding \"{encoding}\"")]
    UnsupportedEncoding { encoding: String },

    #[error("request aborted")]
    Aborted {
        #[source]
        source: io::Error,
    },
}

impl BodyError {
    pub fn parse<S: ToString>(reason: S) -> Self {
        Self::Parse { reason: reason.to_string() }
    }

    pub fn code(&self) -> &'static str {
        match self {
            BodyError::TooLarge { .. } => "entity.too.large",
            BodyError::Parse { .. } => "entity.parse.failed",
            BodyError::UnsupportedCharset { .. } => "charset.unsupported",
            BodyError::UnsupportedEncoding { .. } => "encoding.unsupported",
            BodyError::Aborted { .. } => "request.aborted",
        }
    }
}

impl From<BodyError> for HttpFailure {
    fn from(e: BodyError) -> Self {
        let code = e.code();
        HttpFailure::new(StatusCode::BAD_REQUEST, "Invalid body.", e.to_string()).with_code(code).with_cause(e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Json,
    Form,
    Text,
    Raw,
}

impl BodyKind {
    fn of(mime: &Mime) -> Option<Self> {
        match mime.essence_str() {
            "application/json" => Some(BodyKind::Json),
            "application/x-www-form-urlencoded" => Some(BodyKind::Form),
            "text/plain" => Some(BodyKind::Text),
            "application/octet-stream" => Some(BodyKind::Raw),
            _ => None,
        }
    }

    fn is_textual(self) -> bool {
        self != BodyKind::Raw
    }
}

/// Parses json, url encoded, text and binary bodies into the event.
///
/// Multipart bodies are left to [`FilesMiddleware`](crate::input::FilesMiddleware).
/// A body is read only when its type is one of the four above.
#[derive(Debug, Clone, Default)]
pub struct BodyMiddleware {
    options: BodyOptions,
}

impl BodyMiddleware {
    pub fn new(options: BodyOptions) -> Self {
        Self { options }
    }

    fn content_type(&self, headers: &HeaderMap) -> Option<Mime> {
        match headers.get(CONTENT_TYPE) {
            Some(value) => value.to_str().ok()?.parse().ok(),
            None => self.options.default_type.parse().ok(),
        }
    }

    fn check_charset(&self, mime: &Mime) -> Result<(), BodyError> {
        let charset = mime.get_param(mime::CHARSET).map_or(self.options.default_charset.as_str(), |name| name.as_str());
        if charset.eq_ignore_ascii_case("utf-8") || charset.eq_ignore_ascii_case("us-ascii") {
            Ok(())
        } else {
            Err(BodyError::UnsupportedCharset { charset: charset.to_lowercase() })
        }
    }

    async fn read(&self, body: RequestBody) -> Result<Bytes, BodyError> {
        let limit = self.options.limit;
        let max = usize::try_from(limit.as_u64()).unwrap_or(usize::MAX);

        match Limited::new(body, max).collect().await {
            Ok(collected) => Ok(collected.to_bytes()),
            Err(e) if e.is::<LengthLimitError>() => Err(BodyError::TooLarge { limit }),
            Err(e) => {
                let source = match e.downcast::<io::Error>() {
                    Ok(e) => *e,
                    Err(e) => io::Error::other(e),
                };
                Err(BodyError::Aborted { source })
            }
        }
    }
}

fn check_encoding(headers: &HeaderMap) -> Result<(), BodyError> {
    let encoding = headers.get(CONTENT_ENCODING).and_then(|value| value.to_str().ok()).map(str::trim).unwrap_or("identity");
    if encoding.eq_ignore_ascii_case("identity") {
        Ok(())
    } else {
        Err(BodyError::UnsupportedEncoding { encoding: encoding.to_lowercase() })
    }
}

fn parse(kind: BodyKind, bytes: Bytes) -> Result<EventBody, BodyError> {
    match kind {
        BodyKind::Raw => Ok(EventBody::Raw(bytes)),
        BodyKind::Text => String::from_utf8(bytes.to_vec()).map(EventBody::Text).map_err(BodyError::parse),
        BodyKind::Form => {
            let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(&bytes).map_err(BodyError::parse)?;
            Ok(EventBody::Fields(pairs.into_iter().collect::<HashMap<_, _>>()))
        }
        BodyKind::Json => {
            let text = std::str::from_utf8(&bytes).map_err(BodyError::parse)?.trim_start();
            match text.chars().next() {
                None => Ok(EventBody::Json(serde_json::Value::Object(serde_json::Map::new()))),
                Some('{' | '[') => serde_json::from_str(text).map(EventBody::Json).map_err(BodyError::parse),
                Some(_) => Err(BodyError::parse("json body must be an object or an array")),
            }
        }
    }
}

#[async_trait]
impl InputMiddleware for BodyMiddleware {
    async fn handle(&self, ctx: &mut InputContext) -> Result<(), HttpFailure> {
        let headers = ctx.message.headers();
        if is_multipart(headers) || !ctx.message.has_body() {
            return Ok(());
        }

        let Some(mime) = self.content_type(headers) else {
            return Ok(());
        };
        let Some(kind) = BodyKind::of(&mime) else {
            debug!(content_type = %mime, "body type not parsed");
            return Ok(());
        };

        if kind.is_textual() {
            self.check_charset(&mime)?;
        }
        check_encoding(headers)?;

        let Some(body) = ctx.message.take_body() else {
            return Ok(());
        };
        let bytes = self.read(body).await?;
        debug!(?kind, size = bytes.len(), "body received");

        ctx.event.body = parse(kind, bytes)?;
        Ok(())
    }
}
