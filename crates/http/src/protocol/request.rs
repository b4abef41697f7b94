//! Inbound message handling.
//!
//! [`RequestHeader`] wraps the standard `http::Request<()>`; [`IncomingMessage`]
//! adds what the transport knows about the connection: the socket's remote
//! address, whether the connection is encrypted, and the not yet consumed body.

use std::net::IpAddr;

use http::request::Parts;
use http::{HeaderMap, Method, Request, Uri, Version};

use crate::protocol::body::RequestBody;

/// Represents an HTTP request header.
#[derive(Debug)]
pub struct RequestHeader {
    inner: Request<()>,
}

impl AsRef<Request<()>> for RequestHeader {
    fn as_ref(&self) -> &Request<()> {
        &self.inner
    }
}

impl AsMut<Request<()>> for RequestHeader {
    fn as_mut(&mut self) -> &mut Request<()> {
        &mut self.inner
    }
}

impl RequestHeader {
    /// Consumes the header and returns the inner `Request<()>`.
    pub fn into_inner(self) -> Request<()> {
        self.inner
    }

    /// Returns a reference to the request's HTTP method.
    pub fn method(&self) -> &Method {
        self.inner.method()
    }

    /// Returns a reference to the request's URI.
    pub fn uri(&self) -> &Uri {
        self.inner.uri()
    }

    /// Returns the request's HTTP version.
    pub fn version(&self) -> Version {
        self.inner.version()
    }

    /// Returns a reference to the request's headers.
    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }
}

/// Converts request parts into a RequestHeader.
impl From<Parts> for RequestHeader {
    #[inline]
    fn from(parts: Parts) -> Self {
        Self { inner: Request::from_parts(parts, ()) }
    }
}

/// Converts a bodyless request into a RequestHeader.
impl From<Request<()>> for RequestHeader {
    #[inline]
    fn from(inner: Request<()>) -> Self {
        Self { inner }
    }
}

/// A raw inbound message as handed over by the transport.
#[derive(Debug)]
pub struct IncomingMessage {
    header: RequestHeader,
    remote_addr: IpAddr,
    encrypted: bool,
    body: Option<RequestBody>,
}

impl IncomingMessage {
    pub fn new<H: Into<RequestHeader>>(header: H, remote_addr: IpAddr, encrypted: bool) -> Self {
        Self { header: header.into(), remote_addr, encrypted, body: None }
    }

    /// Splits a full request into header and body.
    pub fn from_request(request: Request<RequestBody>, remote_addr: IpAddr, encrypted: bool) -> Self {
        let (parts, body) = request.into_parts();
        Self::new(parts, remote_addr, encrypted).with_body(body)
    }

    #[must_use]
    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }

    pub fn header(&self) -> &RequestHeader {
        &self.header
    }

    pub fn method(&self) -> &Method {
        self.header.method()
    }

    pub fn uri(&self) -> &Uri {
        self.header.uri()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.header.headers()
    }

    /// The address of the peer of the socket, which may be a proxy.
    pub fn remote_addr(&self) -> IpAddr {
        self.remote_addr
    }

    /// Whether the connection to the peer of the socket is encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    /// Whether the message announces or carries a body.
    ///
    /// Mirrors the usual rule: a `Transfer-Encoding` or a numeric `Content-Length`
    /// header means a body, even a zero length one. A buffered body without such
    /// headers counts when it is not empty.
    pub fn has_body(&self) -> bool {
        let headers = self.headers();
        if headers.contains_key(http::header::TRANSFER_ENCODING) {
            return true;
        }

        let announced = headers
            .get(http::header::CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.trim().parse::<u64>().is_ok());

        announced || self.body.as_ref().is_some_and(|body| body.as_buffered().is_some_and(|bytes| !bytes.is_empty()))
    }

    /// Takes the body out of the message, leaving `None` behind.
    pub fn take_body(&mut self) -> Option<RequestBody> {
        self.body.take()
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use http::Method;

    use super::*;

    fn message(request: Request<()>) -> IncomingMessage {
        IncomingMessage::new(request, IpAddr::V4(Ipv4Addr::LOCALHOST), false)
    }

    #[test]
    fn exposes_request_parts() {
        let request = Request::builder().method(Method::POST).uri("/upload?x=1").header("Host", "example.com").body(()).unwrap();
        let message = message(request);

        assert_eq!(message.method(), &Method::POST);
        assert_eq!(message.uri().path(), "/upload");
        assert_eq!(message.headers().get("host").unwrap(), "example.com");
        assert_eq!(message.remote_addr(), IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert!(!message.is_encrypted());
    }

    #[test]
    fn has_body_follows_framing_headers() {
        let chunked = Request::builder().header("transfer-encoding", "chunked").body(()).unwrap();
        assert!(message(chunked).has_body());

        let zero_length = Request::builder().header("content-length", "0").body(()).unwrap();
        assert!(message(zero_length).has_body());

        let garbage_length = Request::builder().header("content-length", "abc").body(()).unwrap();
        assert!(!message(garbage_length).has_body());

        let buffered = message(Request::new(())).with_body(RequestBody::buffered("a=1"));
        assert!(buffered.has_body());

        assert!(!message(Request::new(())).has_body());
    }

    #[test]
    fn body_can_be_taken_once() {
        let request = Request::builder().body(RequestBody::buffered("payload")).unwrap();
        let mut message = IncomingMessage::from_request(request, IpAddr::V4(Ipv4Addr::LOCALHOST), true);

        assert!(message.is_encrypted());
        assert!(message.take_body().is_some());
        assert!(message.take_body().is_none());
    }
}
