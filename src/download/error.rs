//! Error types for the download module.
//!
//! Per-item failures are captured as [`DownloadError`] inside the item's
//! [`DownloadResult`](super::DownloadResult) and never abort sibling transfers.
//! Only [`BatchError`] surfaces from a batch run.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use super::cancel::CancelReason;
use super::report::{BatchSummary, FailedItem};

/// Errors that can occur while transferring a single URL.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The URL could not be turned into a request (malformed or not absolute).
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// Network-level error (DNS resolution, connection refused, TLS errors, body read).
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL that failed to download.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The client's connect or read timeout elapsed.
    #[error("timeout downloading {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Server answered with something other than 200 OK.
    #[error("server returned {status} {reason} for {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
        /// Canonical reason phrase for the status, empty when unknown.
        reason: String,
    },

    /// Local file system error while reserving or writing the destination.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The batch was cancelled before or during this transfer.
    #[error("download of {url} cancelled: {reason}")]
    Cancelled {
        /// The URL whose transfer was abandoned.
        url: String,
        /// Why the batch was cancelled.
        reason: CancelReason,
    },

    /// The task running this transfer ended without producing a result
    /// (panic, or the slot pool was closed underneath it).
    #[error("download task for {url} aborted: {message}")]
    Aborted {
        /// The URL the task was responsible for.
        url: String,
        /// What went wrong.
        message: String,
    },
}

/// Stable, serializable label for a [`DownloadError`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed URL.
    InvalidUrl,
    /// Connection or transport failure.
    Network,
    /// Client timeout.
    Timeout,
    /// Non-200 response.
    HttpStatus,
    /// Local write failure.
    Io,
    /// Batch cancellation.
    Cancelled,
    /// Task aborted.
    Aborted,
}

impl ErrorKind {
    /// Returns the label used in log fields.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidUrl => "invalid_url",
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::HttpStatus => "http_status",
            Self::Io => "io",
            Self::Cancelled => "cancelled",
            Self::Aborted => "aborted",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DownloadError {
    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a network error from a reqwest error, promoting timeouts.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            return Self::timeout(url);
        }
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an HTTP status error with the canonical reason phrase.
    pub fn http_status(url: impl Into<String>, status: reqwest::StatusCode) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a cancellation error.
    pub fn cancelled(url: impl Into<String>, reason: CancelReason) -> Self {
        Self::Cancelled {
            url: url.into(),
            reason,
        }
    }

    /// Creates an error for a task that ended without a result.
    pub fn aborted(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Aborted {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Returns the stable kind label for this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidUrl { .. } => ErrorKind::InvalidUrl,
            Self::Network { .. } => ErrorKind::Network,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::HttpStatus { .. } => ErrorKind::HttpStatus,
            Self::Io { .. } => ErrorKind::Io,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
            Self::Aborted { .. } => ErrorKind::Aborted,
        }
    }

    /// Returns true if this failure was caused by batch cancellation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Errors that end a whole batch.
#[derive(Debug, Error)]
pub enum BatchError {
    /// The destination directory could not be created. No transfer was started.
    #[error("failed to create destination directory {path}: {source}")]
    DirectoryCreation {
        /// Directory that could not be created.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// One or more items failed and the batch runs with
    /// [`FailurePolicy::FailOnAnyError`](crate::FailurePolicy::FailOnAnyError).
    #[error("{} of {} downloads failed: {}", failed_urls.len(), summary.total(), failed_urls.join(", "))]
    ItemsFailed {
        /// Every URL whose transfer failed.
        failed_urls: Vec<String>,
        /// The failed items, as they appear in [`BatchReport::failures`](crate::BatchReport::failures).
        failures: Vec<FailedItem>,
        /// Totals for the whole batch.
        summary: BatchSummary,
    },
}
