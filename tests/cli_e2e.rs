//! End-to-end CLI tests for the batch-fetch binary.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

mod support;
use support::file_names;
use support::socket_guard::start_mock_server_or_skip;

fn unused_local_url() -> String {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    format!("http://127.0.0.1:{port}/a.svg")
}

/// Test that an empty stdin is a successful no-op.
#[test]
fn test_binary_empty_input_returns_zero() {
    let mut cmd = Command::cargo_bin("batch-fetch").unwrap();
    cmd.write_stdin("").assert().success();
}

/// Test that --help displays usage information and exits with code 0.
#[test]
fn test_binary_help_displays_usage() {
    let mut cmd = Command::cargo_bin("batch-fetch").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("bounded concurrency"))
        .stdout(predicate::str::contains("--concurrency"));
}

#[test]
fn test_binary_version_displays_version() {
    let mut cmd = Command::cargo_bin("batch-fetch").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("batch-fetch"));
}

#[test]
fn test_binary_invalid_flag_returns_error() {
    let mut cmd = Command::cargo_bin("batch-fetch").unwrap();
    cmd.arg("--invalid-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_binary_zero_concurrency_rejected() {
    let mut cmd = Command::cargo_bin("batch-fetch").unwrap();
    cmd.args(["-c", "0", "https://example.com/a.svg"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("0"));
}

/// Comment-only stdin yields no URLs and exits cleanly.
#[test]
fn test_binary_comment_only_stdin_returns_zero() {
    let mut cmd = Command::cargo_bin("batch-fetch").unwrap();
    cmd.write_stdin("# nothing here\n\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("No URLs found"));
}

/// All items failing maps to exit code 1 and a JSON report on stdout.
#[test]
fn test_binary_all_failed_exits_one_with_json_report() {
    let output_dir = TempDir::new().unwrap();
    let mut cmd = Command::cargo_bin("batch-fetch").unwrap();
    cmd.arg("--json")
        .arg("--no-color")
        .arg("-o")
        .arg(output_dir.path())
        .arg(unused_local_url())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"failure_count\": 1"))
        .stdout(predicate::str::contains("\"kind\": \"network\""));
}

/// --fail-on-error keeps the report schema and exits with code 1.
#[test]
fn test_binary_fail_on_error_lists_failed_urls() {
    let output_dir = TempDir::new().unwrap();
    let url = unused_local_url();
    let mut cmd = Command::cargo_bin("batch-fetch").unwrap();
    cmd.args(["--json", "--fail-on-error", "-o"])
        .arg(output_dir.path())
        .arg(&url)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"failures\""))
        .stdout(predicate::str::contains("\"kind\": \"network\""))
        .stdout(predicate::str::contains(url.as_str()))
        .stdout(predicate::str::contains("failed_urls").not());
}

/// Stdin input is read one URL per line.
#[test]
fn test_binary_reads_urls_from_stdin() {
    let output_dir = TempDir::new().unwrap();
    let mut cmd = Command::cargo_bin("batch-fetch").unwrap();
    cmd.arg("--json")
        .arg("-o")
        .arg(output_dir.path())
        .write_stdin(format!("# list\n{}\nnot a url\n", unused_local_url()))
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"failure_count\": 2"))
        .stdout(predicate::str::contains("invalid_url"));
}

/// One good and one missing URL is a partial success: exit code 2.
#[tokio::test]
async fn test_binary_partial_success_exits_two() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/ok.svg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"<svg/>".to_vec()))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gone.svg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let output_dir = TempDir::new().unwrap();
    let mut cmd = Command::cargo_bin("batch-fetch").unwrap();
    cmd.args(["-q", "--json", "-o"])
        .arg(output_dir.path())
        .arg(format!("{}/ok.svg", mock_server.uri()))
        .arg(format!("{}/gone.svg", mock_server.uri()))
        .assert()
        .code(2)
        .stdout(predicate::str::contains("\"success_count\": 1"))
        .stdout(predicate::str::contains("\"kind\": \"http_status\""));

    assert_eq!(file_names(output_dir.path()), vec!["ok.svg"]);
}
