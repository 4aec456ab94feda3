//! Per-URL input and outcome values.

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::DownloadError;

/// One batch entry. Batches may contain the same URL more than once.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DownloadRequest {
    url: String,
}

impl DownloadRequest {
    /// Creates a request for `url`. Validation happens when the transfer runs.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// The requested URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl From<&str> for DownloadRequest {
    fn from(url: &str) -> Self {
        Self::new(url)
    }
}

impl From<String> for DownloadRequest {
    fn from(url: String) -> Self {
        Self::new(url)
    }
}

/// Outcome of one transfer. Exactly one is produced per [`DownloadRequest`].
#[derive(Debug)]
pub struct DownloadResult {
    url: String,
    file_name: String,
    path: Option<PathBuf>,
    size_bytes: u64,
    duration: Duration,
    error: Option<DownloadError>,
}

impl DownloadResult {
    pub(crate) fn succeeded(
        url: impl Into<String>,
        file_name: impl Into<String>,
        path: PathBuf,
        size_bytes: u64,
        duration: Duration,
    ) -> Self {
        Self {
            url: url.into(),
            file_name: file_name.into(),
            path: Some(path),
            size_bytes,
            duration,
            error: None,
        }
    }

    pub(crate) fn failed(url: impl Into<String>, error: DownloadError, duration: Duration) -> Self {
        Self {
            url: url.into(),
            file_name: String::new(),
            path: None,
            size_bytes: 0,
            duration,
            error: Some(error),
        }
    }

    /// The URL this result belongs to.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// File name inside the destination directory; empty on failure.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Full path of the written file, if the transfer succeeded.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Bytes actually streamed to disk (not the advertised Content-Length).
    #[must_use]
    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Wall time spent on this item.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// The failure, if any.
    #[must_use]
    pub fn error(&self) -> Option<&DownloadError> {
        self.error.as_ref()
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}
