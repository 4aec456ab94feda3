//! Result aggregation: folds per-item outcomes into batch totals.
//!
//! Totals are accumulated on a single task that drains the result channel,
//! so producers never touch shared counters.

use std::time::{Duration, Instant};

use serde::{Serialize, Serializer};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::DownloadResult;
use super::error::ErrorKind;

/// Totals for one batch. Derived from the results, never stored elsewhere.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Sum of byte sizes of successful items only.
    pub total_bytes: u64,
    /// Number of successful items.
    pub success_count: usize,
    /// Number of failed items.
    pub failure_count: usize,
    /// Wall time of the whole batch.
    #[serde(rename = "total_duration_ms", serialize_with = "serialize_millis")]
    pub total_duration: Duration,
}

impl BatchSummary {
    /// Number of items seen (successes plus failures).
    #[must_use]
    pub fn total(&self) -> usize {
        self.success_count + self.failure_count
    }
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}

/// A failed item as shown in logs and the JSON report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedItem {
    /// URL that failed.
    pub url: String,
    /// Error category.
    pub kind: ErrorKind,
    /// Rendered error message.
    pub error: String,
}

/// Everything a batch produced.
#[derive(Debug, Serialize)]
pub struct BatchReport {
    /// Folded totals.
    pub summary: BatchSummary,
    /// Failures in the order they were received.
    pub failures: Vec<FailedItem>,
    /// Every per-item result, in completion order.
    #[serde(skip)]
    pub results: Vec<DownloadResult>,
}

impl BatchReport {
    /// URLs of every failed item.
    #[must_use]
    pub fn failed_urls(&self) -> Vec<String> {
        self.failures.iter().map(|f| f.url.clone()).collect()
    }
}

/// Consumes results one at a time and keeps running totals.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    total_bytes: u64,
    success_count: usize,
    failure_count: usize,
    failures: Vec<FailedItem>,
    results: Vec<DownloadResult>,
}

impl ResultAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs one result and folds it into the totals.
    pub fn record(&mut self, result: DownloadResult) {
        match result.error() {
            None => {
                info!(
                    url = %result.url(),
                    file = %result.file_name(),
                    size_bytes = result.size_bytes(),
                    duration_ms = result.duration().as_millis(),
                    "download succeeded"
                );
                self.total_bytes += result.size_bytes();
                self.success_count += 1;
            }
            Some(error) => {
                warn!(
                    url = %result.url(),
                    kind = %error.kind(),
                    error = %error,
                    "download failed"
                );
                self.failure_count += 1;
                self.failures.push(FailedItem {
                    url: result.url().to_string(),
                    kind: error.kind(),
                    error: error.to_string(),
                });
            }
        }
        self.results.push(result);
    }

    /// Receives until every sender is gone, then finishes.
    pub async fn drain(
        mut self,
        mut results: mpsc::UnboundedReceiver<DownloadResult>,
        started: Instant,
    ) -> BatchReport {
        while let Some(result) = results.recv().await {
            self.record(result);
        }
        debug!("result stream closed");
        self.finish(started.elapsed())
    }

    /// Logs the summary line and returns the report.
    #[must_use]
    pub fn finish(self, total_duration: Duration) -> BatchReport {
        let summary = BatchSummary {
            total_bytes: self.total_bytes,
            success_count: self.success_count,
            failure_count: self.failure_count,
            total_duration,
        };
        info!(
            total_duration_ms = total_duration.as_millis(),
            total_bytes = summary.total_bytes,
            successful = summary.success_count,
            failed = summary.failure_count,
            "batch complete"
        );
        BatchReport {
            summary,
            failures: self.failures,
            results: self.results,
        }
    }
}
