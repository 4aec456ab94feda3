//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;
use std::time::Duration;

use batch_fetch::{BatchConfig, DEFAULT_BATCH_DEADLINE, DEFAULT_MAX_CONCURRENT, FailurePolicy};
use clap::Parser;

/// Download a batch of URLs into a directory with bounded concurrency.
///
/// URLs are taken from the command line, or one per line from stdin when
/// none are given. Blank lines and lines starting with `#` are ignored.
#[derive(Parser, Debug)]
#[command(name = "batch-fetch")]
#[command(author, version, about)]
pub struct Args {
    /// URLs to download (reads stdin when omitted)
    pub urls: Vec<String>,

    /// Destination directory (created with parents if missing)
    #[arg(short = 'o', long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Maximum concurrent downloads (1-100)
    #[arg(short = 'c', long, default_value_t = DEFAULT_MAX_CONCURRENT as u8, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub concurrency: u8,

    /// Cancel the whole batch after this many seconds (0 disables)
    #[arg(long, default_value_t = DEFAULT_BATCH_DEADLINE.as_secs())]
    pub deadline_secs: u64,

    /// Exit with failure and report every failed URL if any download fails
    #[arg(long)]
    pub fail_on_error: bool,

    /// HTTP connect timeout in seconds (1-3600)
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub connect_timeout_secs: u64,

    /// HTTP read timeout in seconds (1-3600)
    #[arg(long, default_value_t = 300, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub read_timeout_secs: u64,

    /// Print the batch report as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored log output
    #[arg(long)]
    pub no_color: bool,
}

impl Args {
    /// Log filter used when `RUST_LOG` is not set.
    #[must_use]
    pub fn default_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        }
    }

    /// Builds the library configuration from the parsed flags.
    #[must_use]
    pub fn batch_config(&self) -> BatchConfig {
        let deadline = (self.deadline_secs > 0).then(|| Duration::from_secs(self.deadline_secs));
        let failure_policy = if self.fail_on_error {
            FailurePolicy::FailOnAnyError
        } else {
            FailurePolicy::ReportOnly
        };
        BatchConfig::default()
            .with_max_concurrent(usize::from(self.concurrency))
            .with_deadline(deadline)
            .with_failure_policy(failure_policy)
            .with_signal_handling(true)
            .with_timeouts(
                Duration::from_secs(self.connect_timeout_secs),
                Duration::from_secs(self.read_timeout_secs),
            )
    }
}

/// Extracts URLs from newline-separated text, skipping blanks and `#` comments.
#[must_use]
pub fn collect_urls(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
