//! Bounded-concurrency HTTP batch downloads.
//!
//! This module fetches a list of URLs into a directory with a fixed number
//! of transfers in flight, a batch-wide cancellation latch, and per-item
//! outcomes folded into a single report.
//!
//! # Features
//!
//! - Streaming downloads (memory-efficient for large files)
//! - Semaphore slot pool bounding concurrent transfers
//! - Deadline and Ctrl-C / SIGTERM cancellation that aborts in-flight requests
//! - Collision-safe file naming (exclusive create, timestamp prefix on clash)
//! - Partial-file cleanup on any failure
//!
//! # Example
//!
//! ```no_run
//! use batch_fetch::download::{CancellationContext, HttpClient};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new()?;
//! let result = client
//!     .download(&CancellationContext::new(), "https://example.com/paper.pdf", Path::new("."))
//!     .await;
//! if let Some(error) = result.error() {
//!     eprintln!("failed: {error}");
//! }
//! # Ok(())
//! # }
//! ```

mod cancel;
mod client;
pub(crate) mod constants;
mod engine;
mod error;
mod filename;
mod item;
mod limiter;
mod report;

pub use cancel::{CancelReason, CancellationContext, CancellationSource};
pub use client::HttpClient;
pub use constants::{DEFAULT_BATCH_DEADLINE, DEFAULT_MAX_CONCURRENT};
pub use engine::{BatchDownloader, EngineError};
pub use error::{BatchError, DownloadError, ErrorKind};
pub use item::{DownloadRequest, DownloadResult};
pub use limiter::{ConcurrencyLimiter, LimiterError, LimiterSlot};
pub use report::{BatchReport, BatchSummary, FailedItem, ResultAggregator};
