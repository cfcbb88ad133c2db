use serde::{Deserialize, Serialize};

/// Content name used for the synthetic upload when none is configured
pub const DEFAULT_UPLOAD_FILENAME: &str = "7";

/// Size of the synthetic upload in MiB
pub const DEFAULT_UPLOAD_SIZE_MB: usize = 7;

/// Listing pages ShareTask reads before giving up
pub const DEFAULT_SHARE_MAX_PAGES: usize = 10;

/// Settings for the synthetic upload
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadConfig {
    pub enabled: bool,

    /// Catalog the file is uploaded into
    pub directory_id: String,

    pub filename: String,

    pub size_mb: usize,
}

impl UploadConfig {
    pub fn new(enabled: bool, directory_id: impl Into<String>) -> Self {
        Self {
            enabled,
            directory_id: directory_id.into(),
            filename: DEFAULT_UPLOAD_FILENAME.to_string(),
            size_mb: DEFAULT_UPLOAD_SIZE_MB,
        }
    }

    pub fn disabled() -> Self {
        Self::new(false, "")
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    pub fn with_size_mb(mut self, size_mb: usize) -> Self {
        self.size_mb = size_mb;
        self
    }

    pub fn size_bytes(&self) -> usize {
        self.size_mb * 1024 * 1024
    }
}

/// Settings for the public share link
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareConfig {
    pub enabled: bool,

    /// Directory whose listing is searched
    pub directory_id: String,

    /// Substring the shared file's name must contain
    pub filename: String,

    pub max_pages: usize,
}

impl ShareConfig {
    pub fn new(
        enabled: bool,
        directory_id: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            enabled,
            directory_id: directory_id.into(),
            filename: filename.into(),
            max_pages: DEFAULT_SHARE_MAX_PAGES,
        }
    }

    pub fn disabled() -> Self {
        Self::new(false, "", "")
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }
}
