// crates/subscription-cli/tests/cli_commands.rs
// ============================================================================
// Module: CLI Command Tests
// Description: Integration tests for the subscription-service binary.
// Purpose: Ensure config tooling and serve startup behave from the shell.
// Dependencies: subscription-service binary
// ============================================================================
//! ## Overview
//! Runs the compiled binary against temporary config files. Startup failures
//! must exit non-zero with a message naming the problem.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::net::TcpListener;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Output;
use std::process::Stdio;
use std::time::Duration;

use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

const ENV_KEYS: &[&str] = &[
    "SUBSCRIPTION_SERVICE_CONFIG",
    "APP_HTTP_PORT",
    "APP_HTTP_BIND",
    "APP_HTTP_BASE_PATH",
    "APP_HTTP_READ_TIMEOUT_MS",
    "APP_HTTP_WRITE_TIMEOUT_MS",
    "APP_HTTP_SHUTDOWN_GRACE_MS",
    "APP_LOG_LEVEL",
    "APP_LOG_FORMAT",
    "APP_STORE_BACKEND",
    "APP_STORE_DSN",
    "APP_STORE_MAX_CONNECTIONS",
];

fn service_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_subscription-service"))
}

fn command() -> Command {
    let mut command = Command::new(service_bin());
    for key in ENV_KEYS {
        command.env_remove(key);
    }
    command
}

fn run(args: &[&str]) -> Output {
    command().args(args).output().expect("run subscription-service")
}

fn write_config(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("subscription-service.toml");
    fs::write(&path, body).expect("write config");
    path
}

fn sqlite_config(dir: &Path, port: u16) -> String {
    let dsn = dir.join("subscriptions.sqlite");
    format!(
        "[http]\nbind = \"127.0.0.1\"\nport = {port}\n\n[log]\nformat = \"pretty\"\n\n[store]\nbackend = \"sqlite\"\ndsn = \"{}\"\n",
        dsn.display()
    )
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

#[test]
fn config_example_prints_a_valid_file() {
    let output = run(&["config", "example"]);
    assert!(output.status.success());
    let example = stdout(&output);
    assert!(example.contains("[http]"));
    assert!(example.contains("[store]"));

    let temp = TempDir::new().unwrap();
    let path = write_config(temp.path(), &example);
    let output = run(&["config", "validate", "--config", path.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("config is valid"));
    assert!(stdout(&output).contains("store=postgres"));
}

#[test]
fn config_validate_reports_missing_dsn() {
    let temp = TempDir::new().unwrap();
    let path = write_config(temp.path(), "[http]\nport = 8080\n");
    let output = run(&["config", "validate", "--config", path.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("store.dsn is required"));
}

#[test]
fn config_validate_reports_missing_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("absent.toml");
    let output = run(&["config", "validate", "--config", path.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("config io error"));
}

#[test]
fn config_validate_applies_environment_overrides() {
    let temp = TempDir::new().unwrap();
    let path = write_config(temp.path(), &sqlite_config(temp.path(), 8080));

    let output = command()
        .args(["config", "validate", "--config", path.to_str().unwrap()])
        .env("APP_HTTP_PORT", "0")
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(stderr(&output).contains("http.port must be non-zero"));

    let output = command()
        .args(["config", "validate"])
        .env("SUBSCRIPTION_SERVICE_CONFIG", &path)
        .env("APP_HTTP_PORT", "9191")
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("127.0.0.1:9191"));
    assert!(stdout(&output).contains("store=sqlite"));
}

// ============================================================================
// SECTION: Serve
// ============================================================================

#[test]
fn serve_fails_closed_on_invalid_config() {
    let temp = TempDir::new().unwrap();
    let path = write_config(temp.path(), "[http]\nbase_path = \"v1\"\n[store]\ndsn = \"x\"\n");
    let output = run(&["serve", "--config", path.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("http.base_path must start with '/'"));
}

#[tokio::test]
async fn serve_answers_health_checks() {
    let temp = TempDir::new().unwrap();
    let port = {
        let probe = TcpListener::bind("127.0.0.1:0").unwrap();
        probe.local_addr().unwrap().port()
    };
    let path = write_config(temp.path(), &sqlite_config(temp.path(), port));
    let mut child = command()
        .args(["serve", "--config", path.to_str().unwrap()])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    let client = reqwest::Client::new();
    let url = format!("http://127.0.0.1:{port}/healthz");
    let mut healthy = false;
    for _ in 0 .. 100 {
        if let Ok(response) = client.get(&url).send().await {
            healthy = response.status() == reqwest::StatusCode::OK;
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    let _ = child.kill();
    let _ = child.wait();
    assert!(healthy, "service did not answer on {url}");
}
