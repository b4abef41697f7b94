use bytes::{Buf, Bytes};

/// One item handed to the response encoder: the head, then body items.
pub enum Message<T, Data: Buf = Bytes> {
    Header(T),
    Payload(PayloadItem<Data>),
}

/// A piece of a response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadItem<Data: Buf = Bytes> {
    Chunk(Data),
    /// no more chunks follow
    Eof,
}

/// How the body following a head is framed on the wire.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PayloadSize {
    /// `Content-Length` framing
    Length(u64),
    /// `Transfer-Encoding: chunked` framing
    Chunked,
    Empty,
}

impl PayloadSize {
    /// Derives the framing from an announced `Content-Length`, chunked when there is none.
    pub fn from_content_length(length: Option<u64>) -> Self {
        match length {
            Some(0) => PayloadSize::Empty,
            Some(length) => PayloadSize::Length(length),
            None => PayloadSize::Chunked,
        }
    }
}

impl<T> From<Bytes> for Message<T> {
    fn from(bytes: Bytes) -> Self {
        Self::Payload(PayloadItem::Chunk(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn framing_follows_content_length() {
        assert_eq!(PayloadSize::from_content_length(Some(0)), PayloadSize::Empty);
        assert_eq!(PayloadSize::from_content_length(Some(12)), PayloadSize::Length(12));
        assert_eq!(PayloadSize::from_content_length(None), PayloadSize::Chunked);
    }
}
