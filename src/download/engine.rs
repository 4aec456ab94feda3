//! Batch orchestration: one task per URL, bounded by a slot pool.
//!
//! This module provides the [`BatchDownloader`] which fans a list of
//! [`DownloadRequest`]s out into Tokio tasks, gates their execution through a
//! [`ConcurrencyLimiter`], and funnels every outcome through a channel to a
//! single [`ResultAggregator`].
//!
//! # Example
//!
//! ```no_run
//! use batch_fetch::{BatchConfig, BatchDownloader, DownloadRequest};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = BatchDownloader::new(BatchConfig::default().with_max_concurrent(3))?;
//! let requests = ["https://go.dev/images/go-logo-blue.svg"].map(DownloadRequest::from);
//! let report = engine.run(requests, Path::new("./downloads")).await?;
//! println!(
//!     "ok: {}, failed: {}, bytes: {}",
//!     report.summary.success_count, report.summary.failure_count, report.summary.total_bytes
//! );
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use super::cancel::{CancelReason, CancellationContext, CancellationSource};
use super::limiter::ConcurrencyLimiter;
use super::report::{BatchReport, ResultAggregator};
use super::{BatchError, DownloadError, DownloadRequest, DownloadResult, HttpClient};
use crate::config::{BatchConfig, ConfigError, FailurePolicy};

/// Error type for download engine construction.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The supplied configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Download engine for bounded-concurrency batches.
///
/// # Concurrency Model
///
/// - Every request gets its own Tokio task, spawned unconditionally
/// - A task takes a limiter slot before doing any work and returns it after
/// - Cancellation is checked once the slot is won, and again throughout the
///   transfer itself
/// - Results flow over an unbounded MPSC channel; a closer task joins every
///   worker and then drops the last sender so the aggregator terminates
#[derive(Debug)]
pub struct BatchDownloader {
    config: BatchConfig,
    client: HttpClient,
    limiter: ConcurrencyLimiter,
}

impl BatchDownloader {
    /// Creates an engine with its own HTTP client built from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] for invalid settings and
    /// [`EngineError::HttpClient`] if the client cannot be built.
    #[instrument(level = "debug")]
    pub fn new(config: BatchConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let client = HttpClient::with_timeouts(config.connect_timeout, config.read_timeout)
            .map_err(EngineError::HttpClient)?;
        Self::with_client(config, client)
    }

    /// Creates an engine that shares an existing client.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] for invalid settings.
    pub fn with_client(config: BatchConfig, client: HttpClient) -> Result<Self, EngineError> {
        config.validate()?;
        let limiter = ConcurrencyLimiter::new(config.max_concurrent).map_err(|_| {
            ConfigError::InvalidConcurrency {
                value: config.max_concurrent,
            }
        })?;

        debug!(
            max_concurrent = config.max_concurrent,
            deadline_ms = config.deadline.map(|d| d.as_millis()),
            handle_signals = config.handle_signals,
            "creating batch downloader"
        );

        Ok(Self {
            config,
            client,
            limiter,
        })
    }

    /// Runs a batch with the configured deadline and signal handling.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::DirectoryCreation`] if `dest_dir` cannot be
    /// created, and [`BatchError::ItemsFailed`] if any item failed under
    /// [`FailurePolicy::FailOnAnyError`]. Individual failures never error
    /// under [`FailurePolicy::ReportOnly`].
    #[instrument(skip(self, requests), fields(dest_dir = %dest_dir.display()))]
    pub async fn run<I>(&self, requests: I, dest_dir: &Path) -> Result<BatchReport, BatchError>
    where
        I: IntoIterator<Item = DownloadRequest>,
    {
        prepare_destination(dest_dir).await?;

        let mut source = CancellationSource::new(CancellationContext::new());
        if let Some(deadline) = self.config.deadline {
            source = source.with_deadline(deadline);
        }
        if self.config.handle_signals {
            source = source.with_signal_handler();
        }

        // `source` outlives the batch; dropping it disarms its watchers.
        let report = self.execute(requests, dest_dir, source.context()).await;
        self.apply_failure_policy(report)
    }

    /// Runs a batch against a caller-owned cancellation context, without
    /// arming the configured deadline or signal handler.
    ///
    /// # Errors
    ///
    /// Same as [`run`](Self::run).
    #[instrument(skip(self, requests, cancel), fields(dest_dir = %dest_dir.display()))]
    pub async fn run_with_cancellation<I>(
        &self,
        requests: I,
        dest_dir: &Path,
        cancel: &CancellationContext,
    ) -> Result<BatchReport, BatchError>
    where
        I: IntoIterator<Item = DownloadRequest>,
    {
        prepare_destination(dest_dir).await?;
        let report = self.execute(requests, dest_dir, cancel).await;
        self.apply_failure_policy(report)
    }

    async fn execute<I>(
        &self,
        requests: I,
        dest_dir: &Path,
        cancel: &CancellationContext,
    ) -> BatchReport
    where
        I: IntoIterator<Item = DownloadRequest>,
    {
        let requests: Vec<DownloadRequest> = requests.into_iter().collect();
        let started = Instant::now();

        info!(
            total_files = requests.len(),
            max_concurrent = self.limiter.capacity(),
            dest_dir = %dest_dir.display(),
            "starting batch"
        );

        let (results_tx, results_rx) = mpsc::unbounded_channel();
        let mut handles = Vec::with_capacity(requests.len());

        for request in requests {
            let url = request.url().to_string();
            let handle = tokio::spawn(run_item(
                request,
                self.limiter.clone(),
                self.client.clone(),
                cancel.clone(),
                dest_dir.to_path_buf(),
                results_tx.clone(),
            ));
            handles.push((url, handle));
        }

        debug!(task_count = handles.len(), "waiting for downloads to complete");

        // Joins every worker, substitutes a result for any that panicked,
        // then drops the last sender so the aggregator sees the close.
        let closer = tokio::spawn(async move {
            for (url, handle) in handles {
                if let Err(join_error) = handle.await {
                    warn!(url = %url, error = %join_error, "download task panicked");
                    let result = DownloadResult::failed(
                        url.as_str(),
                        DownloadError::aborted(url.as_str(), join_error.to_string()),
                        Duration::ZERO,
                    );
                    if results_tx.send(result).is_err() {
                        debug!("result receiver dropped before close");
                    }
                }
            }
        });

        let report = ResultAggregator::new().drain(results_rx, started).await;

        if let Err(e) = closer.await {
            warn!(error = %e, "result closer task failed");
        }
        report
    }

    fn apply_failure_policy(&self, report: BatchReport) -> Result<BatchReport, BatchError> {
        match self.config.failure_policy {
            FailurePolicy::FailOnAnyError if report.summary.failure_count > 0 => {
                Err(BatchError::ItemsFailed {
                    failed_urls: report.failed_urls(),
                    failures: report.failures,
                    summary: report.summary,
                })
            }
            _ => Ok(report),
        }
    }
}

/// Creates `dest_dir` and its parents; failure is fatal to the batch.
async fn prepare_destination(dest_dir: &Path) -> Result<(), BatchError> {
    tokio::fs::create_dir_all(dest_dir)
        .await
        .map_err(|source| BatchError::DirectoryCreation {
            path: dest_dir.to_path_buf(),
            source,
        })
}

/// One task: slot, cancellation check, transfer, release, emit.
async fn run_item(
    request: DownloadRequest,
    limiter: ConcurrencyLimiter,
    client: HttpClient,
    cancel: CancellationContext,
    dest_dir: PathBuf,
    results: mpsc::UnboundedSender<DownloadResult>,
) {
    let url = request.url();

    let result = match limiter.acquire().await {
        Ok(slot) => {
            let result = if cancel.is_cancelled() {
                let reason = cancel.reason().unwrap_or(CancelReason::Manual);
                debug!(url = %url, %reason, "skipping download, batch cancelled");
                DownloadResult::failed(url, DownloadError::cancelled(url, reason), Duration::ZERO)
            } else {
                client.download(&cancel, url, &dest_dir).await
            };
            slot.release();
            result
        }
        Err(e) => DownloadResult::failed(url, DownloadError::aborted(url, e.to_string()), Duration::ZERO),
    };

    if results.send(result).is_err() {
        debug!(url = %url, "result receiver dropped");
    }
}
