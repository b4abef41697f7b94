use std::collections::HashMap;
use std::path::{Path, PathBuf};

use bytes::BytesMut;
use http::HeaderMap;
use http::header::CONTENT_TYPE;
use http_body_util::BodyExt;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio_util::codec::Decoder;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::codec::{MultipartDecoder, PartHeader, PartItem};
use crate::ensure;
use crate::protocol::{HttpFailure, RequestBody};
use crate::upload::{UploadError, UploadOptions};

/// A file written to disk while ingesting a multipart body.
///
/// The file is owned by the caller; nothing removes it afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    path: PathBuf,
    original_name: String,
    mime_type: String,
}

impl UploadedFile {
    pub fn new<P: Into<PathBuf>, N: Into<String>, M: Into<String>>(path: P, original_name: N, mime_type: M) -> Self {
        Self { path: path.into(), original_name: original_name.into(), mime_type: mime_type.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }
}

/// The fields and files of an ingested multipart body.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UploadResult {
    fields: HashMap<String, String>,
    files: HashMap<String, Vec<UploadedFile>>,
}

impl UploadResult {
    /// Form fields; a repeated name keeps the last value.
    pub fn fields(&self) -> &HashMap<String, String> {
        &self.fields
    }

    /// Files per field name, in arrival order.
    pub fn files(&self) -> &HashMap<String, Vec<UploadedFile>> {
        &self.files
    }

    pub fn into_parts(self) -> (HashMap<String, String>, HashMap<String, Vec<UploadedFile>>) {
        (self.fields, self.files)
    }
}

#[derive(Debug)]
enum CurrentPart {
    Field { name: String, value: Vec<u8> },
    File { name: String, file: File, upload: UploadedFile, written: u64 },
    Skipped,
}

/// Push based multipart ingestion.
///
/// Feed the body with [`write`](Self::write) as it arrives and call
/// [`end`](Self::end) once it is exhausted. Fields are collected in memory, file
/// parts are streamed into uniquely named files in the configured directory.
#[derive(Debug)]
pub struct MultipartIngestor {
    decoder: MultipartDecoder,
    buffer: BytesMut,
    options: UploadOptions,
    result: UploadResult,
    current: Option<CurrentPart>,
}

impl MultipartIngestor {
    pub fn new(headers: &HeaderMap, options: UploadOptions) -> Result<Self, UploadError> {
        let decoder = MultipartDecoder::from_headers(headers)?;
        Ok(Self { decoder, buffer: BytesMut::new(), options, result: UploadResult::default(), current: None })
    }

    pub async fn write(&mut self, chunk: &[u8]) -> Result<(), UploadError> {
        if self.decoder.is_finished() {
            return Ok(());
        }

        self.buffer.extend_from_slice(chunk);
        while let Some(item) = self.decoder.decode(&mut self.buffer)? {
            self.handle(item).await?;
        }
        Ok(())
    }

    pub async fn end(mut self) -> Result<UploadResult, UploadError> {
        while let Some(item) = self.decoder.decode_eof(&mut self.buffer)? {
            self.handle(item).await?;
        }

        debug!(fields = self.result.fields.len(), files = self.result.files.len(), "multipart body ingested");
        Ok(self.result)
    }

    async fn handle(&mut self, item: PartItem) -> Result<(), UploadError> {
        match item {
            PartItem::Header(header) => self.start_part(header).await,
            PartItem::Chunk(chunk) => self.write_part(&chunk).await,
            PartItem::PartEnd => self.finish_part().await,
            PartItem::Eof => Ok(()),
        }
    }

    async fn start_part(&mut self, header: PartHeader) -> Result<(), UploadError> {
        let Some(name) = header.name() else {
            trace!("skip multipart part without a name");
            self.current = Some(CurrentPart::Skipped);
            return Ok(());
        };

        if let Some(limit) = self.options.limits().field_name_size {
            ensure!(name.len() as u64 <= limit.as_u64(), UploadError::FieldNameTooLarge { limit: limit.as_u64() });
        }

        let name = name.to_string();
        let part = match header.filename() {
            Some(filename) => {
                self.result.files.entry(name.clone()).or_default();
                let path = self.options.directory().join(format!("{}-{}", self.options.prefix(), Uuid::new_v4()));
                let file = File::create(&path).await?;
                trace!(field = %name, path = %path.display(), "receiving file");
                let upload = UploadedFile::new(path, filename, header.content_type());
                CurrentPart::File { name, file, upload, written: 0 }
            }
            None => CurrentPart::Field { name, value: Vec::new() },
        };

        self.current = Some(part);
        Ok(())
    }

    async fn write_part(&mut self, chunk: &[u8]) -> Result<(), UploadError> {
        let limits = self.options.limits();
        match &mut self.current {
            Some(CurrentPart::Field { value, .. }) => {
                if let Some(limit) = limits.field_size {
                    let size = (value.len() + chunk.len()) as u64;
                    ensure!(size <= limit.as_u64(), UploadError::FieldTooLarge { limit: limit.as_u64() });
                }
                value.extend_from_slice(chunk);
            }
            Some(CurrentPart::File { file, written, .. }) => {
                *written += chunk.len() as u64;
                if let Some(limit) = limits.file_size {
                    ensure!(*written <= limit.as_u64(), UploadError::FileTooLarge { limit: limit.as_u64() });
                }
                file.write_all(chunk).await?;
            }
            Some(CurrentPart::Skipped) | None => {}
        }
        Ok(())
    }

    async fn finish_part(&mut self) -> Result<(), UploadError> {
        match self.current.take() {
            Some(CurrentPart::Field { name, value }) => {
                let value = String::from_utf8_lossy(&value).into_owned();
                self.result.fields.insert(name, value);
            }
            Some(CurrentPart::File { name, mut file, upload, written }) => {
                file.flush().await?;
                trace!(field = %name, size = written, "file received");
                self.result.files.entry(name).or_default().push(upload);
            }
            Some(CurrentPart::Skipped) | None => {}
        }
        Ok(())
    }
}

/// Whether the message body is a `multipart/*` body.
pub fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<mime::Mime>().ok())
        .is_some_and(|mime| mime.type_() == mime::MULTIPART)
}

/// Ingests a whole multipart body, buffered or streaming.
///
/// # Errors
///
/// Any decoding, limit, body or disk failure is reported as a 500
/// `Cannot upload files.` failure tagged `HTTP_FILE-<code>`.
pub async fn ingest(headers: &HeaderMap, body: RequestBody, options: &UploadOptions) -> Result<UploadResult, HttpFailure> {
    let mut ingestor = MultipartIngestor::new(headers, options.clone())?;

    if let Some(bytes) = body.as_buffered() {
        ingestor.write(bytes).await?;
        return Ok(ingestor.end().await?);
    }

    let mut body = body;
    while let Some(frame) = body.frame().await {
        let frame = frame.map_err(UploadError::body)?;
        if let Ok(data) = frame.into_data() {
            ingestor.write(&data).await?;
        }
    }

    Ok(ingestor.end().await?)
}
