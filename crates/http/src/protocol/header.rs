//! Helpers for reading proxy style header values.
//!
//! [`http::HeaderMap`] already normalizes header names, so lookups are case
//! insensitive. The helpers here only deal with the value side: proxies append to
//! comma separated lists and may send the same header on several lines.

use http::header::AsHeaderName;
use http::HeaderMap;

pub trait HeaderMapExt {
    /// Returns the first comma separated item of the first header line, untrimmed.
    fn first_value<K: AsHeaderName>(&self, name: K) -> Option<&str>;

    /// Returns every comma separated item over all header lines, trimmed, empty items dropped.
    fn list_values<K: AsHeaderName>(&self, name: K) -> Vec<&str>;
}

impl HeaderMapExt for HeaderMap {
    fn first_value<K: AsHeaderName>(&self, name: K) -> Option<&str> {
        let value = self.get(name)?.to_str().ok()?;
        value.split(',').next()
    }

    fn list_values<K: AsHeaderName>(&self, name: K) -> Vec<&str> {
        self.get_all(name)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(','))
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .collect()
    }
}
