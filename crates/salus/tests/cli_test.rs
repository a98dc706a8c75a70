//! Integration tests for the `salus` CLI binary.
//!
//! Argument parsing, help output, completions and config handling run
//! without a portal; the status/write tests run against a wiremock portal.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

const MISSING_CONFIG: &str = "/tmp/salus-cli-test-nonexistent/config.toml";

/// Build a [`Command`] for the `salus` binary with env isolation.
///
/// Clears all `SALUS_*` env vars and points the config file at a
/// nonexistent path so tests never touch the user's real configuration.
fn salus_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("salus");
    cmd.env("HOME", "/tmp/salus-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/salus-cli-test-nonexistent")
        .env("SALUS_CONFIG", MISSING_CONFIG)
        .env_remove("SALUS_USERNAME")
        .env_remove("SALUS_PASSWORD")
        .env_remove("SALUS_PORTAL_URL")
        .env_remove("SALUS_OUTPUT")
        .env_remove("SALUS_TIMEOUT")
        .env_remove("SALUS_POLL_INTERVAL")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

async fn mock_portal() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/public/login.php"))
        .respond_with(ResponseTemplate::new(302).insert_header("Set-Cookie", "PHPSESSID=s1"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/public/devices.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<input id="token" value="T1"><input name="devId" value="D1">"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/public/ajax_device_values.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "CH1currentRoomTemp": "20.5",
            "CH1currentSetPoint": "21.0",
            "CH1autoMode": "1",
            "CH1heatOnOffStatus": "0",
            "frost": "0"
        })))
        .mount(&server)
        .await;

    server
}

fn portal_cmd(server: &MockServer) -> assert_cmd::Command {
    let mut cmd = salus_cmd();
    cmd.env("SALUS_PASSWORD", "hunter2").args([
        "--username",
        "user@example.com",
        "--portal-url",
        &server.uri(),
    ]);
    cmd
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = salus_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_lists_commands() {
    salus_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("status")
            .and(predicate::str::contains("set-temp"))
            .and(predicate::str::contains("mode"))
            .and(predicate::str::contains("run")),
    );
}

#[test]
fn test_version_flag() {
    salus_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("salus"));
}

#[test]
fn test_completions_bash() {
    salus_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_invalid_subcommand() {
    salus_cmd().arg("defrost").assert().failure().code(2);
}

// ── Argument validation ─────────────────────────────────────────────

#[test]
fn test_invalid_mode_is_usage_error() {
    salus_cmd()
        .args(["mode", "eco"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("auto").and(predicate::str::contains("off")));
}

#[test]
fn test_set_temp_requires_number() {
    salus_cmd().args(["set-temp", "warm"]).assert().failure().code(2);
}

#[test]
fn test_status_without_credentials_exits_with_auth_code() {
    let output = salus_cmd().arg("status").output().unwrap();
    assert_eq!(output.status.code(), Some(3));
    let text = combined_output(&output);
    assert!(text.contains("username"), "Expected missing username:\n{text}");
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_honors_override() {
    salus_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(MISSING_CONFIG));
}

#[test]
fn test_config_show_without_file_uses_defaults() {
    salus_cmd()
        .args(["config", "show", "-o", "plain"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("poll_interval=60")
                .and(predicate::str::contains("portal_url=https://salus-it500.com")),
        );
}

#[test]
fn test_config_show_redacts_plaintext_password() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("config.toml");
    std::fs::write(
        &file,
        "username = \"user@example.com\"\npassword = \"hunter2\"\npoll_interval = 45\n",
    )
    .unwrap();

    salus_cmd()
        .env("SALUS_CONFIG", &file)
        .args(["config", "show", "-o", "json"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("\"poll_interval\": 45")
                .and(predicate::str::contains("hunter2").not()),
        );
}

// ── Portal round trips ──────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_status_json_against_mock_portal() {
    let server = mock_portal().await;

    let output = portal_cmd(&server)
        .args(["status", "-o", "json"])
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", combined_output(&output));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["device_id"], "D1");
    assert_eq!(json["current_temp"], 20.5);
    assert_eq!(json["mode"], "off");
    assert_eq!(json["heating"], false);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_set_temp_posts_command() {
    let server = mock_portal().await;
    Mock::given(method("POST"))
        .and(path("/includes/set.php"))
        .and(body_string_contains("current_tempZ1=22.5"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .expect(1)
        .mount(&server)
        .await;

    portal_cmd(&server)
        .args(["set-temp", "22.5"])
        .assert()
        .success()
        .stderr(predicate::str::contains("22.5"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_frost_protection_exits_with_device_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/public/login.php"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/public/devices.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<input id="token" value="T1"><input name="devId" value="D1">"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/public/ajax_device_values.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"frost": 32})))
        .mount(&server)
        .await;

    let output = portal_cmd(&server).arg("status").output().unwrap();
    assert_eq!(output.status.code(), Some(5));
    assert!(combined_output(&output).contains("frost"));
}
