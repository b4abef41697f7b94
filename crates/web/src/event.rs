use std::collections::HashMap;

use bytes::Bytes;
use edge_http::proxy::Scheme;
use edge_http::upload::UploadedFile;
use http::{HeaderMap, Method};

/// The parsed body of a request.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum EventBody {
    /// no body, or a content type nobody parses
    #[default]
    Empty,
    /// url encoded form, or the fields of a multipart body
    Fields(HashMap<String, String>),
    Json(serde_json::Value),
    Text(String),
    Raw(Bytes),
}

impl EventBody {
    pub fn is_empty(&self) -> bool {
        matches!(self, EventBody::Empty)
    }

    pub fn fields(&self) -> Option<&HashMap<String, String>> {
        match self {
            EventBody::Fields(fields) => Some(fields),
            _ => None,
        }
    }
}

/// The normalized request handed to the application.
///
/// Filled by the input middlewares: every value here has already been checked
/// against the configured proxy trust and hostname policies.
#[derive(Debug, Clone, Default)]
pub struct IncomingEvent {
    pub(crate) method: Method,
    pub(crate) headers: HeaderMap,
    pub(crate) protocol: Scheme,
    pub(crate) hostname: String,
    pub(crate) url: String,
    pub(crate) query_string: String,
    pub(crate) ip: String,
    pub(crate) ips: Vec<String>,
    pub(crate) body: EventBody,
    pub(crate) files: HashMap<String, Vec<UploadedFile>>,
}

impl IncomingEvent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn is_method(&self, method: &Method) -> bool {
        &self.method == method
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn protocol(&self) -> Scheme {
        self.protocol
    }

    /// The hostname without port, empty when the request named none.
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// `<protocol>://<hostname><path>[?query]`, or the request target when there is no hostname.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// `?` followed by the query, or empty.
    pub fn query_string(&self) -> &str {
        &self.query_string
    }

    pub fn ip(&self) -> &str {
        &self.ip
    }

    /// The trusted forwarded chain, origin first; empty without trusted proxies.
    pub fn ips(&self) -> &[String] {
        &self.ips
    }

    pub fn body(&self) -> &EventBody {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut EventBody {
        &mut self.body
    }

    pub fn files(&self) -> &HashMap<String, Vec<UploadedFile>> {
        &self.files
    }
}
