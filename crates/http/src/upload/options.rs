use std::path::{Path, PathBuf};

use crate::upload::ByteSize;

const DEFAULT_PREFIX: &str = "file";

/// Size limits applied while ingesting; `None` means unbounded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadLimits {
    pub field_size: Option<ByteSize>,
    pub field_name_size: Option<ByteSize>,
    pub file_size: Option<ByteSize>,
}

/// Where and how uploaded files are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    limits: UploadLimits,
    directory: PathBuf,
    prefix: String,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self { limits: UploadLimits::default(), directory: std::env::temp_dir(), prefix: DEFAULT_PREFIX.to_string() }
    }
}

impl UploadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_limits(mut self, limits: UploadLimits) -> Self {
        self.limits = limits;
        self
    }

    #[must_use]
    pub fn with_directory<P: Into<PathBuf>>(mut self, directory: P) -> Self {
        self.directory = directory.into();
        self
    }

    #[must_use]
    pub fn with_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn limits(&self) -> &UploadLimits {
        &self.limits
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}
