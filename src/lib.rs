//! Bounded-concurrency batch file downloader.
//!
//! Given a list of URLs, a destination directory, and a maximum parallelism,
//! fetches each URL over HTTP and streams its body to a local file, keeping
//! at most `max_concurrent` transfers in flight and folding every per-item
//! outcome into a [`BatchReport`].
//!
//! # Architecture
//!
//! - [`download`] - transfer unit, slot pool, cancellation, orchestration, aggregation
//! - [`config`] - batch settings and failure policy

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod download;
mod user_agent;

// Re-export commonly used types
pub use config::{BatchConfig, ConfigError, FailurePolicy};
pub use download::{
    BatchDownloader, BatchError, BatchReport, BatchSummary, CancelReason, CancellationContext,
    CancellationSource, DEFAULT_BATCH_DEADLINE, DEFAULT_MAX_CONCURRENT, DownloadError,
    DownloadRequest, DownloadResult, EngineError, ErrorKind, FailedItem, HttpClient,
};
