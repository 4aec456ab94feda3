//! CLI entry point for batch-fetch.

use std::io::{self, IsTerminal, Read};
use std::process::ExitCode;

use anyhow::{Context, Result};
use batch_fetch::{BatchDownloader, BatchError, BatchSummary, DownloadRequest, FailedItem};
use clap::Parser;
use serde::Serialize;
use tracing::{debug, error, info};

mod cli;

use cli::{Args, collect_urls};

/// Process outcome mapped to an exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProcessExit {
    Success,
    Partial,
    Failure,
}

impl From<ProcessExit> for ExitCode {
    fn from(outcome: ProcessExit) -> Self {
        match outcome {
            ProcessExit::Success => ExitCode::SUCCESS,
            ProcessExit::Failure => ExitCode::from(1),
            ProcessExit::Partial => ExitCode::from(2),
        }
    }
}

/// Determines the process exit outcome from succeeded and failed counts.
fn determine_exit_outcome(succeeded: usize, failed: usize) -> ProcessExit {
    if failed == 0 {
        ProcessExit::Success
    } else if succeeded > 0 {
        ProcessExit::Partial
    } else {
        ProcessExit::Failure
    }
}

/// JSON document printed by `--json`, whatever the failure policy.
#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    summary: &'a BatchSummary,
    failures: &'a [FailedItem],
}

fn render_json_report(summary: &BatchSummary, failures: &[FailedItem]) -> Result<String> {
    Ok(serde_json::to_string_pretty(&JsonReport { summary, failures })?)
}

fn init_tracing(default_level: &str, no_color: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let no_color_env = std::env::var_os("NO_COLOR").is_some_and(|value| !value.is_empty());
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(!no_color && !no_color_env)
        .with_env_filter(filter)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();
    init_tracing(args.default_log_level(), args.no_color);
    debug!(?args, "CLI arguments parsed");

    let urls = if !args.urls.is_empty() {
        args.urls.clone()
    } else if !io::stdin().is_terminal() {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read URLs from stdin")?;
        collect_urls(&buffer)
    } else {
        info!("No input provided. Pass URLs as arguments or pipe them via stdin.");
        info!("Example: echo 'https://example.com/file.pdf' | batch-fetch -o downloads");
        return Ok(ExitCode::SUCCESS);
    };

    if urls.is_empty() {
        info!("No URLs found in input");
        return Ok(ExitCode::SUCCESS);
    }

    let engine = BatchDownloader::new(args.batch_config())?;
    let requests = urls.into_iter().map(DownloadRequest::from);

    let outcome = match engine.run(requests, &args.output_dir).await {
        Ok(report) => {
            if args.json {
                println!("{}", render_json_report(&report.summary, &report.failures)?);
            }
            determine_exit_outcome(report.summary.success_count, report.summary.failure_count)
        }
        Err(BatchError::ItemsFailed {
            failed_urls,
            failures,
            summary,
        }) => {
            if args.json {
                println!("{}", render_json_report(&summary, &failures)?);
            }
            error!(failed = failed_urls.len(), urls = ?failed_urls, "batch failed");
            ProcessExit::Failure
        }
        Err(e) => return Err(e.into()),
    };

    Ok(outcome.into())
}
