#![allow(clippy::unwrap_used, clippy::expect_used)]

//! CLI smoke tests for sitekit-server binary
//!
//! These tests verify that the CLI commands work correctly, including
//! configuration validation, composition failures and help output.

use std::process::{Command, Stdio};
use tempfile::TempDir;

/// Helper to run the sitekit-server binary with given arguments
fn run_sitekit_server(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_sitekit-server"))
        .args(args)
        .env_remove("APP_TYPE")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .expect("Failed to execute sitekit-server")
}

fn write_config(dir: &TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write config file");
    path.to_str().unwrap().to_owned()
}

#[test]
fn test_cli_help_command() {
    let output = run_sitekit_server(&["--help"]);

    assert!(output.status.success(), "Help command should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("sitekit-server"), "Should contain binary name");
    assert!(
        stdout.contains("Usage:") || stdout.contains("USAGE:"),
        "Should contain usage information"
    );
    assert!(stdout.contains("run"), "Should contain 'run' subcommand");
    assert!(stdout.contains("check"), "Should contain 'check' subcommand");
    assert!(stdout.contains("routes"), "Should contain 'routes' subcommand");
    assert!(stdout.contains("--config"), "Should mention config option");
    assert!(stdout.contains("--preset"), "Should mention preset option");
}

#[test]
fn test_cli_invalid_command() {
    let output = run_sitekit_server(&["invalid-command"]);

    assert!(!output.status.success(), "Invalid command should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("error") || stderr.contains("unrecognized"),
        "Should contain error message about invalid command: {stderr}"
    );
}

#[test]
fn test_cli_check_default_preset() {
    let output = run_sitekit_server(&["check"]);

    assert!(output.status.success(), "Default preset should compose");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("Loading: database, auth, blog, dashboard"),
        "Should list the blog preset in resolution order: {stdout}"
    );
    assert!(stdout.contains("Composition is valid"));
}

#[test]
fn test_cli_check_with_preset_flag() {
    let output = run_sitekit_server(&["--preset", "gaming", "check"]);

    assert!(output.status.success(), "Gaming preset should compose");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Theme: cyberpunk-neon"), "{stdout}");
    assert!(stdout.contains("Site: Gaming Hub"), "{stdout}");
}

#[test]
fn test_cli_unknown_preset_fails() {
    let output = run_sitekit_server(&["--preset", "forum", "check"]);

    assert!(!output.status.success(), "Unknown preset should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown preset 'forum'"), "{stderr}");
}

#[test]
fn test_cli_unknown_module_fails() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(&temp_dir, "unknown.yaml", "modules: [blog, forum]\n");

    let output = run_sitekit_server(&["--config", &config_path, "check"]);

    assert!(!output.status.success(), "Unknown module should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("unknown module 'forum'"),
        "Should name the unknown module: {stderr}"
    );
}

#[test]
fn test_cli_route_collision_fails() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(&temp_dir, "collide.yaml", "modules: [main, dashboard]\n");

    let output = run_sitekit_server(&["--config", &config_path, "check"]);

    assert!(!output.status.success(), "Route collision should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("route collision on GET /"), "{stderr}");
}

#[test]
fn test_cli_config_validation_missing_file() {
    let output = run_sitekit_server(&["--config", "/nonexistent/config.yaml", "check"]);

    assert!(
        !output.status.success(),
        "Should fail when config file doesn't exist"
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("does not exist"),
        "Should indicate config file not found: {stderr}"
    );
}

#[test]
fn test_cli_config_validation_invalid_yaml() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(
        &temp_dir,
        "invalid.yaml",
        "invalid: yaml: content: [unclosed",
    );

    let output = run_sitekit_server(&["--config", &config_path, "check"]);

    assert!(!output.status.success(), "Should fail with invalid YAML");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("yaml") || stderr.contains("YAML") || stderr.contains("configuration"),
        "Should mention YAML parsing issue: {stderr}"
    );
}

#[test]
fn test_cli_routes_command() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(&temp_dir, "chat.yaml", "modules: [chat]\n");

    let output = run_sitekit_server(&["--config", &config_path, "routes"]);

    assert!(output.status.success(), "Routes command should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("/chat/room/{room_id}"), "{stdout}");
    assert!(stdout.contains("send_message"), "{stdout}");
    assert!(!stdout.contains("/blog"), "{stdout}");
}

#[test]
fn test_cli_print_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(
        &temp_dir,
        "site.yaml",
        "server:\n  site_name: Docs\nconfig:\n  THEME: dark-modern\n",
    );

    let output = run_sitekit_server(&["--config", &config_path, "--print-config"]);

    assert!(output.status.success(), "Print config should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    let value: serde_json::Value = serde_json::from_str(&stdout).expect("JSON output");
    assert_eq!(value["server"]["site_name"], "Docs");
    assert_eq!(value["config"]["THEME"], "dark-modern");
    assert_eq!(value["fallback_url"], "#");
}

#[test]
fn test_cli_run_invalid_bind_address() {
    let output = run_sitekit_server(&["--bind", "not-an-address", "run"]);

    assert!(
        !output.status.success(),
        "Should fail with invalid bind address"
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid bind address"), "{stderr}");
}
