//! The headers of a single `multipart/form-data` part.

use tracing::trace;

const DEFAULT_FILE_TYPE: &str = "application/octet-stream";
const DEFAULT_FIELD_TYPE: &str = "text/plain";

/// What a part announces about itself through `Content-Disposition` and `Content-Type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartHeader {
    name: Option<String>,
    filename: Option<String>,
    content_type: String,
}

impl PartHeader {
    pub fn new(name: Option<String>, filename: Option<String>, content_type: Option<String>) -> Self {
        let content_type = content_type.unwrap_or_else(|| {
            if filename.is_some() { DEFAULT_FILE_TYPE.to_string() } else { DEFAULT_FIELD_TYPE.to_string() }
        });
        Self { name, filename, content_type }
    }

    /// Builds the part header from parsed header fields.
    ///
    /// Header names are matched case insensitively; unknown headers are ignored.
    pub(crate) fn from_headers(headers: &[httparse::Header<'_>]) -> Self {
        let mut name = None;
        let mut filename = None;
        let mut content_type = None;

        for header in headers {
            let value = String::from_utf8_lossy(header.value);
            if header.name.eq_ignore_ascii_case("content-disposition") {
                let (kind, params) = split_params(&value);
                if !kind.eq_ignore_ascii_case("form-data") {
                    trace!(disposition = kind, "ignore non form-data disposition");
                    continue;
                }
                for (key, param) in params {
                    if key.eq_ignore_ascii_case("name") {
                        name = Some(param);
                    } else if key.eq_ignore_ascii_case("filename") {
                        filename = Some(basename(&param).to_string());
                    }
                }
            } else if header.name.eq_ignore_ascii_case("content-type") {
                let value = value.trim();
                if !value.is_empty() {
                    content_type = Some(value.to_string());
                }
            }
        }

        Self::new(name, filename, content_type)
    }

    /// The form field name, `None` when the part carries no `form-data` name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The client side file name, reduced to its last path segment.
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// A part is a file when its disposition carries a `filename` parameter.
    pub fn is_file(&self) -> bool {
        self.filename.is_some()
    }
}

fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Splits `form-data; name="a"; filename="b;c.txt"` into the disposition type and its parameters.
fn split_params(value: &str) -> (&str, Vec<(String, String)>) {
    let (kind, mut rest) = match value.find(';') {
        Some(index) => (value[..index].trim(), &value[index + 1..]),
        None => return (value.trim(), Vec::new()),
    };

    let mut params = Vec::new();
    loop {
        rest = rest.trim_start_matches([' ', '\t', ';']);
        if rest.is_empty() {
            break;
        }

        let Some(eq) = rest.find('=') else {
            break;
        };
        let key = rest[..eq].trim().to_string();
        rest = rest[eq + 1..].trim_start();

        let mut param = String::new();
        if let Some(quoted) = rest.strip_prefix('"') {
            let mut chars = quoted.char_indices();
            let mut end = quoted.len();
            while let Some((index, c)) = chars.next() {
                match c {
                    '\\' => {
                        if let Some((_, escaped)) = chars.next() {
                            param.push(escaped);
                        }
                    }
                    '"' => {
                        end = index + 1;
                        break;
                    }
                    c => param.push(c),
                }
            }
            rest = &quoted[end.min(quoted.len())..];
        } else {
            let end = rest.find(';').unwrap_or(rest.len());
            param.push_str(rest[..end].trim());
            rest = &rest[end..];
        }

        params.push((key, param));
    }

    (kind, params)
}
