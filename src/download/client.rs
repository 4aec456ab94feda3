//! HTTP client wrapper implementing the single-URL transfer.
//!
//! This module provides the `HttpClient` struct which streams one response
//! body to a collision-safe file, observing the batch cancellation token for
//! the whole request, and removing the file again on any failure.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use futures_util::{Stream, StreamExt};
use reqwest::{Client, StatusCode};
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tracing::{debug, instrument};
use url::Url;

use super::cancel::CancellationContext;
use super::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use super::error::DownloadError;
use super::filename::{ReservedFile, filename_from_url, reserve_destination};
use super::item::DownloadResult;
use crate::user_agent;

/// HTTP client for downloading files with streaming support.
///
/// Create once and clone freely; clones share the connection pool.
///
/// # Example
///
/// ```no_run
/// use batch_fetch::{CancellationContext, HttpClient};
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new()?;
/// let cancel = CancellationContext::new();
/// let result = client
///     .download(&cancel, "https://go.dev/images/go-logo-blue.svg", Path::new("./downloads"))
///     .await;
/// println!("{} -> {} ({} bytes)", result.url(), result.file_name(), result.size_bytes());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

/// Where a successful transfer landed.
#[derive(Debug)]
struct CompletedTransfer {
    path: PathBuf,
    file_name: String,
    bytes: u64,
}

impl HttpClient {
    /// Creates a client with default timeouts (30s connect, 5min read).
    ///
    /// # Errors
    ///
    /// Returns the reqwest error if the TLS backend or resolver cannot be
    /// initialized.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_timeouts(
            Duration::from_secs(CONNECT_TIMEOUT_SECS),
            Duration::from_secs(READ_TIMEOUT_SECS),
        )
    }

    /// Creates a client with explicit connect and read timeouts.
    ///
    /// The read timeout applies per read, so large bodies are not cut off
    /// as long as data keeps arriving.
    ///
    /// # Errors
    ///
    /// Returns the reqwest error if the client cannot be built.
    pub fn with_timeouts(
        connect_timeout: Duration,
        read_timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .read_timeout(read_timeout)
            .gzip(true)
            .user_agent(user_agent::default_download_user_agent())
            .build()?;
        Ok(Self { client })
    }

    /// Downloads `url` into `dest_dir`, which must already exist.
    ///
    /// Never returns an error directly: every failure (cancellation, bad URL,
    /// network, non-200 status, disk write) is captured in the returned
    /// [`DownloadResult`]. No file is left behind on failure.
    #[instrument(skip(self, cancel), fields(url = %url))]
    pub async fn download(
        &self,
        cancel: &CancellationContext,
        url: &str,
        dest_dir: &Path,
    ) -> DownloadResult {
        let started = Instant::now();
        match self.transfer(cancel, url, dest_dir).await {
            Ok(done) => DownloadResult::succeeded(
                url,
                done.file_name,
                done.path,
                done.bytes,
                started.elapsed(),
            ),
            Err(error) => DownloadResult::failed(url, error, started.elapsed()),
        }
    }

    async fn transfer(
        &self,
        cancel: &CancellationContext,
        url: &str,
        dest_dir: &Path,
    ) -> Result<CompletedTransfer, DownloadError> {
        if cancel.is_cancelled() {
            return Err(cancelled_error(cancel, url));
        }

        let parsed = parse_download_url(url)?;

        debug!("sending request");
        let response = tokio::select! {
            biased;
            reason = cancel.cancelled() => return Err(DownloadError::cancelled(url, reason)),
            response = self.client.get(parsed.clone()).send() => {
                response.map_err(|e| DownloadError::network(url, e))?
            }
        };

        if response.status() != StatusCode::OK {
            return Err(DownloadError::http_status(url, response.status()));
        }

        // Reserve the file only after a 200 so status failures never touch disk.
        let filename = filename_from_url(&parsed);
        let ReservedFile {
            path,
            file_name,
            file,
        } = reserve_destination(dest_dir, &filename)
            .await
            .map_err(|e| DownloadError::io(dest_dir.join(&filename), e))?;
        debug!(path = %path.display(), "reserved destination");

        let bytes = write_body_or_cleanup(file, response.bytes_stream(), url, &path, cancel).await?;

        debug!(path = %path.display(), bytes, "download complete");
        Ok(CompletedTransfer {
            path,
            file_name,
            bytes,
        })
    }
}

fn cancelled_error(cancel: &CancellationContext, url: &str) -> DownloadError {
    DownloadError::cancelled(
        url,
        cancel.reason().unwrap_or(super::cancel::CancelReason::Manual),
    )
}

/// Parses and checks that `url` is an absolute http(s) URL.
fn parse_download_url(url: &str) -> Result<Url, DownloadError> {
    let parsed = Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(DownloadError::invalid_url(url));
    }
    Ok(parsed)
}

/// Streams `body` into `writer`; on any error removes `path` (best effort)
/// and returns the original error.
async fn write_body_or_cleanup<S, B, W>(
    writer: W,
    body: S,
    url: &str,
    path: &Path,
    cancel: &CancellationContext,
) -> Result<u64, DownloadError>
where
    S: Stream<Item = Result<B, reqwest::Error>>,
    B: AsRef<[u8]>,
    W: AsyncWrite + Unpin,
{
    let outcome = stream_to_file(writer, body, url, path, cancel).await;
    if outcome.is_err() {
        debug!(path = %path.display(), "cleaning up partial file after error");
        if let Err(e) = tokio::fs::remove_file(path).await {
            debug!(path = %path.display(), error = %e, "partial file cleanup failed");
        }
    }
    outcome
}

/// Streams response body to the writer, returning bytes written.
///
/// Memory use is bounded by the write buffer regardless of body size.
async fn stream_to_file<S, B, W>(
    writer: W,
    body: S,
    url: &str,
    path: &Path,
    cancel: &CancellationContext,
) -> Result<u64, DownloadError>
where
    S: Stream<Item = Result<B, reqwest::Error>>,
    B: AsRef<[u8]>,
    W: AsyncWrite + Unpin,
{
    let mut writer = BufWriter::new(writer);
    let mut body = std::pin::pin!(body);
    let mut bytes_written: u64 = 0;

    loop {
        let next = tokio::select! {
            biased;
            reason = cancel.cancelled() => return Err(DownloadError::cancelled(url, reason)),
            next = body.next() => next,
        };
        let Some(chunk_result) = next else {
            break;
        };
        let chunk = chunk_result.map_err(|e| DownloadError::network(url, e))?;
        let chunk = chunk.as_ref();

        writer
            .write_all(chunk)
            .await
            .map_err(|e| DownloadError::io(path.to_path_buf(), e))?;

        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(path.to_path_buf(), e))?;

    Ok(bytes_written)
}
