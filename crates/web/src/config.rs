//! Adapter configuration.
//!
//! The configuration is plain serde data, usually read from JSON:
//!
//! ```
//! use edge_web::AdapterConfig;
//!
//! let config = AdapterConfig::from_json(r#"{
//!     "proxy": { "trusted": ["127.0.0.1", "10.0.0.0/8"], "untrusted": "10.0.0.66" },
//!     "domain": { "trusted": ["example.com", "/^(.+\\.)+example\\.com$/"] },
//!     "body": { "limit": "1mb" },
//!     "files": { "upload": { "limits": { "file_size": "10mb" }, "prefix": "upload" } }
//! }"#).unwrap();
//!
//! assert!(config.trust_policy().is_trusted("10.0.0.3"));
//! assert!(config.host_policy().is_ok());
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use edge_http::proxy::{HostPattern, HostPolicy, PatternError, TrustPolicy};
use edge_http::transfer::{DEFAULT_CHUNK_SIZE, DownloadOptions};
use edge_http::upload::{ByteSize, InvalidByteSize, UploadLimits, UploadOptions};
use http::{HeaderName, HeaderValue};
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid configuration: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    #[error("invalid size for {key}: {source}")]
    InvalidSize {
        key: &'static str,
        #[source]
        source: InvalidByteSize,
    },

    #[error(transparent)]
    InvalidPattern(#[from] PatternError),

    #[error("invalid download header {name}")]
    InvalidHeader { name: String },
}

impl ConfigError {
    fn invalid_size(key: &'static str) -> impl FnOnce(InvalidByteSize) -> Self {
        move |source| Self::InvalidSize { key, source }
    }
}

/// A single value or a list of values.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl Default for OneOrMany {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl OneOrMany {
    pub fn as_slice(&self) -> &[String] {
        match self {
            OneOrMany::One(value) => std::slice::from_ref(value),
            OneOrMany::Many(values) => values,
        }
    }
}

/// A byte size given either as a number of bytes or as a string like `"100kb"`.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum SizeValue {
    Bytes(u64),
    Text(String),
}

impl SizeValue {
    pub fn to_byte_size(&self) -> Result<ByteSize, InvalidByteSize> {
        match self {
            SizeValue::Bytes(bytes) => Ok(ByteSize::b(*bytes)),
            SizeValue::Text(text) => text.parse(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct ProxyConfig {
    pub trusted: OneOrMany,
    pub untrusted: OneOrMany,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct DomainConfig {
    /// hostnames, or `/regex/` patterns
    pub trusted: Vec<String>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct BodyConfig {
    pub limit: SizeValue,
    pub default_charset: String,
    pub default_type: String,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            limit: SizeValue::Text("100kb".to_string()),
            default_charset: "utf-8".to_string(),
            default_type: "text/plain".to_string(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct LimitsConfig {
    pub field_size: Option<SizeValue>,
    pub field_name_size: Option<SizeValue>,
    pub file_size: Option<SizeValue>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct UploadConfig {
    pub limits: LimitsConfig,
    pub prefix: Option<String>,
    pub directory: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct DownloadConfig {
    pub headers: HashMap<String, String>,
    pub accept_ranges: bool,
    pub chunk_size: Option<SizeValue>,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self { headers: HashMap::new(), accept_ranges: true, chunk_size: None }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct FilesConfig {
    pub upload: UploadConfig,
    pub download: DownloadConfig,
}

/// Options of the body parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyOptions {
    pub limit: ByteSize,
    pub default_charset: String,
    pub default_type: String,
}

impl Default for BodyOptions {
    fn default() -> Self {
        Self { limit: ByteSize::kb(100), default_charset: "utf-8".to_string(), default_type: "text/plain".to_string() }
    }
}

/// Everything the input and output pipelines can be configured with.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct AdapterConfig {
    pub proxy: ProxyConfig,
    pub domain: DomainConfig,
    pub body: BodyConfig,
    pub files: FilesConfig,
}

impl AdapterConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// The proxy trust policy; unusable address specs are dropped.
    pub fn trust_policy(&self) -> TrustPolicy {
        TrustPolicy::from_specs(self.proxy.trusted.as_slice(), self.proxy.untrusted.as_slice())
    }

    pub fn host_policy(&self) -> Result<HostPolicy, ConfigError> {
        let trusted_hosts = self.domain.trusted.iter().map(|host| host.parse::<HostPattern>()).collect::<Result<Vec<_>, _>>()?;
        Ok(HostPolicy::new(trusted_hosts, self.trust_policy()))
    }

    pub fn body_options(&self) -> Result<BodyOptions, ConfigError> {
        Ok(BodyOptions {
            limit: self.body.limit.to_byte_size().map_err(ConfigError::invalid_size("body.limit"))?,
            default_charset: self.body.default_charset.clone(),
            default_type: self.body.default_type.clone(),
        })
    }

    pub fn upload_options(&self) -> Result<UploadOptions, ConfigError> {
        let upload = &self.files.upload;
        let size = |value: &Option<SizeValue>, key: &'static str| {
            value.as_ref().map(SizeValue::to_byte_size).transpose().map_err(ConfigError::invalid_size(key))
        };

        let limits = UploadLimits {
            field_size: size(&upload.limits.field_size, "files.upload.limits.field_size")?,
            field_name_size: size(&upload.limits.field_name_size, "files.upload.limits.field_name_size")?,
            file_size: size(&upload.limits.file_size, "files.upload.limits.file_size")?,
        };

        let mut options = UploadOptions::new().with_limits(limits);
        if let Some(prefix) = &upload.prefix {
            options = options.with_prefix(prefix.as_str());
        }
        if let Some(directory) = &upload.directory {
            options = options.with_directory(directory.as_path());
        }
        Ok(options)
    }

    pub fn download_options(&self) -> Result<DownloadOptions, ConfigError> {
        let download = &self.files.download;
        let mut options = DownloadOptions { accept_ranges: download.accept_ranges, ..DownloadOptions::default() };

        for (name, value) in &download.headers {
            let invalid = || ConfigError::InvalidHeader { name: name.clone() };
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
            let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;
            options.headers.insert(header_name, header_value);
        }

        if let Some(chunk_size) = &download.chunk_size {
            let bytes = chunk_size.to_byte_size().map_err(ConfigError::invalid_size("files.download.chunk_size"))?;
            options.chunk_size = usize::try_from(bytes.as_u64()).unwrap_or(DEFAULT_CHUNK_SIZE).max(1);
        }
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn empty_config_uses_defaults() {
        let config = AdapterConfig::from_json("{}").unwrap();

        assert!(!config.trust_policy().is_trusted("127.0.0.1"));
        assert!(config.host_policy().unwrap().trusted_hosts().is_empty());
        assert_eq!(config.body_options().unwrap(), BodyOptions::default());
        assert_eq!(config.upload_options().unwrap(), UploadOptions::default());

        let download = config.download_options().unwrap();
        assert!(download.accept_ranges);
        assert_eq!(download.chunk_size, DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn reads_every_section() {
        let config = AdapterConfig::from_json(indoc! {r#"
            {
                "proxy": { "trusted": "*", "untrusted": ["10.0.0.66"] },
                "domain": { "trusted": ["/^(.+\\.)+example\\.com$/"] },
                "body": { "limit": 2048, "default_type": "application/json" },
                "files": {
                    "upload": {
                        "limits": { "field_size": "1kb", "file_size": "1.5mb" },
                        "prefix": "upload",
                        "directory": "/var/tmp"
                    },
                    "download": { "headers": { "Cache-Control": "no-store" }, "chunk_size": "16kb" }
                }
            }
        "#})
        .unwrap();

        let trust = config.trust_policy();
        assert!(trust.is_trusted("8.8.8.8"));
        assert!(!trust.is_trusted("10.0.0.66"));

        let hosts = config.host_policy().unwrap();
        assert!(hosts.trusted_hosts()[0].matches("admin.dev.example.com"));

        let body = config.body_options().unwrap();
        assert_eq!(body.limit, ByteSize::b(2048));
        assert_eq!(body.default_type, "application/json");
        assert_eq!(body.default_charset, "utf-8");

        let upload = config.upload_options().unwrap();
        assert_eq!(upload.limits().field_size, Some(ByteSize::kb(1)));
        assert_eq!(upload.limits().file_size, Some(ByteSize::b(1_572_864)));
        assert_eq!(upload.limits().field_name_size, None);
        assert_eq!(upload.prefix(), "upload");
        assert_eq!(upload.directory(), std::path::Path::new("/var/tmp"));

        let download = config.download_options().unwrap();
        assert_eq!(download.headers["cache-control"], "no-store");
        assert_eq!(download.chunk_size, 16 * 1024);
    }

    #[test]
    fn rejects_bad_values() {
        let config = AdapterConfig::from_json(r#"{ "body": { "limit": "lots" } }"#).unwrap();
        assert!(matches!(config.body_options(), Err(ConfigError::InvalidSize { key: "body.limit", .. })));

        let config = AdapterConfig::from_json(r#"{ "domain": { "trusted": ["/(/"] } }"#).unwrap();
        assert!(matches!(config.host_policy(), Err(ConfigError::InvalidPattern(_))));

        assert!(matches!(AdapterConfig::from_json(r#"{ "proxy": 1 }"#), Err(ConfigError::Json { .. })));
    }
}
