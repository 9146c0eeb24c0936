#![cfg(unix)]

mod common;

use assert_cmd::cargo_bin_cmd;
use predicates::prelude::*;

use common::{ECHO_TOOL, Fixture};

#[test]
fn test_help_shows_usage() {
    cargo_bin_cmd!("tool-dispatch")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Registry and dispatcher"));
}

#[test]
fn test_version_shows_version() {
    cargo_bin_cmd!("tool-dispatch")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("tool-dispatch"));
}

#[test]
fn test_plugins_lists_builtin_catalog() {
    cargo_bin_cmd!("tool-dispatch")
        .arg("plugins")
        .assert()
        .success()
        .stdout(predicate::str::contains("greeting"))
        .stdout(predicate::str::contains("workspace"));
}

#[test]
fn test_invoke_builtin_prints_json_result() {
    let fixture = Fixture::new();
    let config = fixture.write_config(&fixture.config(&["greeting"], false));

    cargo_bin_cmd!("tool-dispatch")
        .arg("--config")
        .arg(&config)
        .args(["invoke", "say_hello", r#"{"name": "John"}"#])
        .assert()
        .success()
        .stdout(predicate::str::diff("\"Hello, John!\"\n"));
}

#[test]
fn test_invoke_unknown_tool_prints_error_envelope() {
    let fixture = Fixture::new();
    let config = fixture.write_config(&fixture.config(&[], false));

    cargo_bin_cmd!("tool-dispatch")
        .arg("--config")
        .arg(&config)
        .args(["invoke", "plurk"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"{"error":"Function plurk not found"}"#));
}

#[test]
fn test_list_and_source_include_external_tools() {
    let fixture = Fixture::new();
    fixture.install("echo_tool", ECHO_TOOL).list(&["echo_tool"]);
    let config = fixture.write_config(&fixture.config(&["greeting"], true));

    cargo_bin_cmd!("tool-dispatch")
        .arg("--config")
        .arg(&config)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"say_hello\""))
        .stdout(predicate::str::contains("\"echo\""));

    cargo_bin_cmd!("tool-dispatch")
        .arg("--config")
        .arg(&config)
        .args(["source", "echo"])
        .assert()
        .success()
        .stdout(predicate::str::diff("EchoSource\n"));

    cargo_bin_cmd!("tool-dispatch")
        .arg("--config")
        .arg(&config)
        .args(["cli", "echo", "hello there"])
        .assert()
        .success()
        .stdout(predicate::str::diff("\"hello there\"\n"));
}

#[test]
fn test_source_of_unknown_tool_fails() {
    let fixture = Fixture::new();
    let config = fixture.write_config(&fixture.config(&[], false));

    cargo_bin_cmd!("tool-dispatch")
        .arg("--config")
        .arg(&config)
        .args(["source", "plurk"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown tool"));
}

#[test]
fn test_missing_config_file_fails_gracefully() {
    cargo_bin_cmd!("tool-dispatch")
        .args(["--config", "/nonexistent/tool-dispatch.toml", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load configuration"));
}

#[test]
fn test_cli_help_prints_external_usage() {
    let fixture = Fixture::new();
    fixture.install("echo_tool", ECHO_TOOL).list(&["echo_tool"]);
    let config = fixture.write_config(&fixture.config(&[], true));

    cargo_bin_cmd!("tool-dispatch")
        .arg("--config")
        .arg(&config)
        .args(["cli-help", "echo"])
        .assert()
        .success()
        .stdout(predicate::str::diff("echo <text>\n"));

    cargo_bin_cmd!("tool-dispatch")
        .args(["help", "invoke"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Invoke a tool"));
}

#[test]
fn test_info_logs_go_to_stderr_by_default() {
    let fixture = Fixture::new();
    let config = fixture.write_config(&fixture.config(&["greeting"], false));

    cargo_bin_cmd!("tool-dispatch")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(&config)
        .args(["invoke", "say_hello", r#"{"name": "John"}"#])
        .assert()
        .success()
        .stdout(predicate::str::diff("\"Hello, John!\"\n"))
        .stderr(predicate::str::contains("invoking tool"));

    cargo_bin_cmd!("tool-dispatch")
        .env("RUST_LOG", "error")
        .arg("--config")
        .arg(&config)
        .args(["invoke", "say_hello", r#"{"name": "John"}"#])
        .assert()
        .success()
        .stderr(predicate::str::contains("invoking tool").not());
}
