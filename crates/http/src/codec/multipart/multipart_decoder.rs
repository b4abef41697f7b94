use bytes::{Buf, Bytes, BytesMut};
use http::HeaderMap;
use http::header::CONTENT_TYPE;
use httparse::Status;
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::codec::multipart::PartHeader;
use crate::ensure;
use crate::upload::UploadError;
use crate::utils::find_subsequence;

/// Maximum number of headers allowed in a part
const MAX_PART_HEADER_NUM: usize = 16;

/// Maximum size in bytes of the header block of a part
const MAX_PART_HEADER_BYTES: usize = 8 * 1024;

const CRLF: &[u8] = b"\r\n";

/// An item of a decoded multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartItem {
    /// A new part starts
    Header(PartHeader),
    /// A piece of the current part's content
    Chunk(Bytes),
    /// The current part is complete
    PartEnd,
    /// The closing boundary was reached
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Skipping everything before the first boundary
    Preamble,
    /// Right after a boundary, expecting `\r\n` or the closing `--`
    BoundaryTail,
    /// Reading the header block of a part
    Headers,
    /// Reading the content of a part
    Body,
    /// Everything after the closing boundary is ignored
    Epilogue,
}

/// Streaming decoder for `multipart/form-data` bodies.
///
/// The decoder never holds more than one header block plus a boundary length of
/// content, so arbitrarily large parts pass through in bounded memory.
#[derive(Debug)]
pub struct MultipartDecoder {
    /// `--boundary`
    dash_boundary: Vec<u8>,
    /// `\r\n--boundary`
    delimiter: Vec<u8>,
    state: State,
}

impl MultipartDecoder {
    pub fn new<B: AsRef<str>>(boundary: B) -> Self {
        let dash_boundary = [b"--", boundary.as_ref().as_bytes()].concat();
        let delimiter = [CRLF, &dash_boundary].concat();
        Self { dash_boundary, delimiter, state: State::Preamble }
    }

    /// Creates a decoder from the `boundary` parameter of a `multipart/*` content type.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, UploadError> {
        let mime = headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<mime::Mime>().ok())
            .ok_or(UploadError::MissingBoundary)?;

        ensure!(mime.type_() == mime::MULTIPART, UploadError::MissingBoundary);

        let boundary = mime.get_param(mime::BOUNDARY).ok_or(UploadError::MissingBoundary)?;
        ensure!(!boundary.as_str().is_empty(), UploadError::MissingBoundary);

        Ok(Self::new(boundary.as_str()))
    }

    /// Whether the closing boundary has been decoded.
    pub fn is_finished(&self) -> bool {
        self.state == State::Epilogue
    }

    fn decode_preamble(&mut self, src: &mut BytesMut) -> Option<()> {
        match find_subsequence(src, &self.dash_boundary) {
            Some(index) => {
                src.advance(index + self.dash_boundary.len());
                self.state = State::BoundaryTail;
                Some(())
            }
            None => {
                let keep = self.dash_boundary.len() - 1;
                if src.len() > keep {
                    src.advance(src.len() - keep);
                }
                None
            }
        }
    }

    fn decode_boundary_tail(&mut self, src: &mut BytesMut) -> Result<Option<PartItem>, UploadError> {
        // transport padding may follow a boundary
        let padding = src.iter().take_while(|b| matches!(b, b' ' | b'\t')).count();
        if src.len() < padding + 2 {
            return Ok(None);
        }

        if src[padding..].starts_with(b"--") {
            src.clear();
            self.state = State::Epilogue;
            trace!("closing boundary reached");
            return Ok(Some(PartItem::Eof));
        }

        ensure!(src[padding..].starts_with(CRLF), UploadError::malformed("expected CRLF after boundary"));
        src.advance(padding + CRLF.len());
        self.state = State::Headers;
        Ok(None)
    }

    fn decode_headers(&mut self, src: &mut BytesMut) -> Result<Option<PartItem>, UploadError> {
        if src.starts_with(CRLF) {
            src.advance(CRLF.len());
            self.state = State::Body;
            return Ok(Some(PartItem::Header(PartHeader::from_headers(&[]))));
        }

        let Some(index) = find_subsequence(src, b"\r\n\r\n") else {
            ensure!(src.len() <= MAX_PART_HEADER_BYTES, UploadError::malformed("part header too large"));
            return Ok(None);
        };

        let header_len = index + 4;
        ensure!(header_len <= MAX_PART_HEADER_BYTES, UploadError::malformed("part header too large"));

        let block = src.split_to(header_len);
        let mut headers = [httparse::EMPTY_HEADER; MAX_PART_HEADER_NUM];
        let header = match httparse::parse_headers(&block, &mut headers) {
            Ok(Status::Complete((_, parsed))) => PartHeader::from_headers(parsed),
            Ok(Status::Partial) => return Err(UploadError::malformed("incomplete part header")),
            Err(e) => return Err(UploadError::malformed(e)),
        };

        trace!(name = ?header.name(), filename = ?header.filename(), "decoded part header");
        self.state = State::Body;
        Ok(Some(PartItem::Header(header)))
    }

    fn decode_body(&mut self, src: &mut BytesMut) -> Option<PartItem> {
        match find_subsequence(src, &self.delimiter) {
            Some(0) => {
                src.advance(self.delimiter.len());
                self.state = State::BoundaryTail;
                Some(PartItem::PartEnd)
            }
            Some(index) => Some(PartItem::Chunk(src.split_to(index).freeze())),
            None => {
                // the tail may be the start of a delimiter
                let safe = src.len().saturating_sub(self.delimiter.len() - 1);
                (safe > 0).then(|| PartItem::Chunk(src.split_to(safe).freeze()))
            }
        }
    }
}

impl Decoder for MultipartDecoder {
    type Item = PartItem;
    type Error = UploadError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            match self.state {
                State::Preamble => {
                    if self.decode_preamble(src).is_none() {
                        return Ok(None);
                    }
                }
                State::BoundaryTail => {
                    let before = self.state;
                    let item = self.decode_boundary_tail(src)?;
                    if item.is_some() || self.state == before {
                        return Ok(item);
                    }
                }
                State::Headers => return self.decode_headers(src),
                State::Body => return Ok(self.decode_body(src)),
                State::Epilogue => {
                    src.clear();
                    return Ok(None);
                }
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(item) = self.decode(src)? {
            return Ok(Some(item));
        }

        ensure!(self.state == State::Epilogue, UploadError::UnexpectedEnd);
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use indoc::indoc;

    fn crlf(text: &str) -> String {
        text.replace('\n', "\r\n")
    }

    fn decode_all(decoder: &mut MultipartDecoder, input: &[u8]) -> Result<Vec<PartItem>, UploadError> {
        let mut buffer = BytesMut::from(input);
        let mut items = Vec::new();
        while let Some(item) = decoder.decode_eof(&mut buffer)? {
            items.push(item);
        }
        Ok(items)
    }

    fn merge_chunks(items: Vec<PartItem>) -> Vec<PartItem> {
        let mut merged: Vec<PartItem> = Vec::new();
        for item in items {
            match (merged.last_mut(), item) {
                (Some(PartItem::Chunk(last)), PartItem::Chunk(next)) => {
                    *last = Bytes::from([last.as_ref(), next.as_ref()].concat());
                }
                (_, item) => merged.push(item),
            }
        }
        merged
    }

    const FORM: &str = indoc! {r#"
        preamble is ignored
        --XyZ
        Content-Disposition: form-data; name="username"

        stone
        --XyZ
        Content-Disposition: form-data; name="picture"; filename="me.png"
        Content-Type: image/png

        PNG--XyZ-ish
        --XyZ--
        epilogue
    "#};

    #[test]
    fn decodes_fields_and_files() {
        let mut decoder = MultipartDecoder::new("XyZ");
        let items = merge_chunks(decode_all(&mut decoder, crlf(FORM).as_bytes()).unwrap());

        assert_eq!(
            items,
            vec![
                PartItem::Header(PartHeader::new(Some("username".into()), None, None)),
                PartItem::Chunk(Bytes::from_static(b"stone")),
                PartItem::PartEnd,
                PartItem::Header(PartHeader::new(Some("picture".into()), Some("me.png".into()), Some("image/png".into()))),
                PartItem::Chunk(Bytes::from_static(b"PNG--XyZ-ish")),
                PartItem::PartEnd,
                PartItem::Eof,
            ]
        );
        assert!(decoder.is_finished());
    }

    #[test]
    fn byte_by_byte_input_gives_same_items() {
        let input = crlf(FORM);
        let mut decoder = MultipartDecoder::new("XyZ");
        let mut buffer = BytesMut::new();
        let mut items = Vec::new();

        for byte in input.as_bytes() {
            buffer.extend_from_slice(&[*byte]);
            while let Some(item) = decoder.decode(&mut buffer).unwrap() {
                items.push(item);
            }
        }

        let expected = merge_chunks(decode_all(&mut MultipartDecoder::new("XyZ"), input.as_bytes()).unwrap());
        assert_eq!(merge_chunks(items), expected);
    }

    #[test]
    fn truncated_body_is_unexpected_end() {
        let input = crlf(indoc! {r#"
            --XyZ
            Content-Disposition: form-data; name="username"

            sto"#});
        let mut decoder = MultipartDecoder::new("XyZ");

        let error = decode_all(&mut decoder, input.as_bytes()).unwrap_err();
        assert!(matches!(error, UploadError::UnexpectedEnd));
        assert_eq!(error.to_string(), "Unexpected end of form");
    }

    #[test]
    fn oversized_part_header_is_malformed() {
        let input = format!("--XyZ\r\nX-Filler: {}", "a".repeat(MAX_PART_HEADER_BYTES + 1));
        let mut decoder = MultipartDecoder::new("XyZ");
        let mut buffer = BytesMut::from(input.as_bytes());

        let error = decoder.decode(&mut buffer).unwrap_err();
        assert!(matches!(error, UploadError::Malformed { .. }));
    }

    #[test]
    fn boundary_comes_from_content_type() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("multipart/form-data; boundary=\"XyZ\""));
        assert!(MultipartDecoder::from_headers(&headers).is_ok());

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("multipart/form-data"));
        assert!(matches!(MultipartDecoder::from_headers(&headers), Err(UploadError::MissingBoundary)));

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; boundary=XyZ"));
        assert!(matches!(MultipartDecoder::from_headers(&headers), Err(UploadError::MissingBoundary)));
    }
}
