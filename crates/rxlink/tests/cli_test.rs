//! Integration tests for the `rxlink` CLI binary.
//!
//! These cover argument parsing, help output, shell completions, local
//! config commands and error exit codes, without any identity provider or
//! API server.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `rxlink` binary with env isolation.
///
/// Clears all `RXLINK_*` env vars and points config directories at `home`
/// so tests never touch the user's real configuration.
fn rxlink_cmd(home: &std::path::Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("rxlink");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("RXLINK_PROFILE")
        .env_remove("RXLINK_DOMAIN")
        .env_remove("RXLINK_CLIENT_ID")
        .env_remove("RXLINK_API_URL")
        .env_remove("RXLINK_OUTPUT")
        .env_remove("RXLINK_INSECURE")
        .env_remove("RXLINK_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

fn isolated() -> (tempfile::TempDir, assert_cmd::Command) {
    let home = tempfile::tempdir().unwrap();
    let cmd = rxlink_cmd(home.path());
    (home, cmd)
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let (_home, mut cmd) = isolated();
    let output = cmd.output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    let (_home, mut cmd) = isolated();
    cmd.arg("--help").assert().success().stdout(
        predicate::str::contains("login")
            .and(predicate::str::contains("patients"))
            .and(predicate::str::contains("prescriptions"))
            .and(predicate::str::contains("webhooks")),
    );
}

#[test]
fn test_version_flag() {
    let (_home, mut cmd) = isolated();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("rxlink"));
}

#[test]
fn test_mutation_help_lists_refetch_flags() {
    let (_home, mut cmd) = isolated();
    cmd.args(["webhooks", "delete", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--refetch").and(predicate::str::contains("--await-refetch")));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    let (_home, mut cmd) = isolated();
    cmd.args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    let (_home, mut cmd) = isolated();
    cmd.args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path() {
    let (_home, mut cmd) = isolated();
    cmd.args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_show_json_defaults() {
    let (_home, mut cmd) = isolated();
    let output = cmd.args(["config", "show", "-o", "json"]).output().unwrap();
    assert!(output.status.success());

    let shown: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(shown["default_profile"], "default");
    assert_eq!(shown["defaults"]["output"], "table");
}

#[test]
fn test_config_show_reads_environment() {
    let (_home, mut cmd) = isolated();
    let output = cmd
        .env("RXLINK_DEFAULTS__TIMEOUT", "7")
        .args(["config", "show", "-o", "json-compact"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let shown: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(shown["defaults"]["timeout"], 7);
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let (_home, mut cmd) = isolated();
    let output = cmd.arg("foobar").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_patients_list_without_profile() {
    let (_home, mut cmd) = isolated();
    let output = cmd.args(["patients", "list"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let text = combined_output(&output);
    assert!(
        text.contains("No profile configured"),
        "Expected no-config diagnostic:\n{text}"
    );
}

#[test]
fn test_unknown_profile_is_reported() {
    let (_home, mut cmd) = isolated();
    let output = cmd
        .args(["--profile", "prod", "whoami"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(combined_output(&output).contains("Profile 'prod' not found"));
}

#[test]
fn test_malformed_api_url_is_a_usage_error() {
    let (_home, mut cmd) = isolated();
    let output = cmd
        .args([
            "--domain",
            "https://auth.example.org",
            "--client-id",
            "cli",
            "--api-url",
            "not a url",
            "clients",
            "list",
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("api_url"));
}

#[test]
fn test_invalid_output_format() {
    let (_home, mut cmd) = isolated();
    cmd.args(["-o", "xml", "config", "path"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_create_patient_requires_fields() {
    let (_home, mut cmd) = isolated();
    cmd.args(["patients", "create", "--first", "Ada"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("--last"));
}
