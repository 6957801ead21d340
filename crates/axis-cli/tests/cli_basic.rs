//! Basic CLI E2E tests.
//!
//! Each test runs the `axis` binary against its own temporary home
//! directory and checks the JSON it prints.

use std::process::Command;

use tempfile::TempDir;

/// Run a CLI command with `home` as the home directory.
fn run_cli(home: &TempDir, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_axis"))
        .args(args)
        .env("HOME", home.path())
        .env_remove("AXIS_ENV")
        .env_remove("AXIS_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_json(home: &TempDir, args: &[&str]) -> serde_json::Value {
    let (stdout, stderr, code) = run_cli(home, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("Failed to parse JSON output")
}

fn signed_in_home() -> TempDir {
    let home = TempDir::new().unwrap();
    run_json(&home, &["auth", "sign-up", "ada@example.com", "--password", "hunter22"]);
    home
}

#[test]
fn test_session_requires_sign_in() {
    let home = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(&home, &["session", "start", "focus"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Not signed in"), "stderr: {stderr}");
}

#[test]
fn test_failures_are_logged() {
    let home = TempDir::new().unwrap();
    let _ = run_cli(&home, &["task", "list"]);
    let entries = run_json(&home, &["log", "list"]);
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert!(entries[0]["message"].as_str().unwrap().contains("Not signed in"));

    let (stdout, _, code) = run_cli(&home, &["log", "clear"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("cleared"));
    assert_eq!(run_json(&home, &["log", "list"]), serde_json::json!([]));
}

#[test]
fn test_auth_status_round_trip() {
    let home = signed_in_home();
    let status = run_json(&home, &["auth", "status"]);
    assert_eq!(status["signedIn"], true);
    assert_eq!(status["email"], "ada@example.com");

    run_json(&home, &["auth", "sign-out"]);
    assert_eq!(run_json(&home, &["auth", "status"])["signedIn"], false);

    let (_, stderr, code) = run_cli(
        &home,
        &["auth", "sign-in", "ada@example.com", "--password", "wrong-pass"],
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("Invalid email or password"));
}

#[test]
fn test_start_break_then_focus_then_undo() {
    let home = signed_in_home();
    let brk = run_json(&home, &["session", "start", "short_break"]);
    assert_eq!(brk["type"], "short_break");
    assert_eq!(brk["intendedMinutes"], 10);

    let focus = run_json(&home, &["session", "start", "focus"]);
    assert_eq!(focus["type"], "focus");

    let undo = run_json(&home, &["session", "undo"]);
    assert_eq!(undo["changed"], true);
    assert_eq!(undo["currentSession"]["id"], brk["id"]);

    let status = run_json(&home, &["session", "status"]);
    assert_eq!(status["running"]["session"]["id"], brk["id"]);
    assert_eq!(status["canUndo"], false);
}

#[test]
fn test_end_while_idle_is_noop() {
    let home = signed_in_home();
    let ended = run_json(&home, &["session", "end"]);
    assert_eq!(ended["changed"], false);
}

#[test]
fn test_task_add_and_list() {
    let home = signed_in_home();
    run_json(&home, &["task", "add", "First"]);
    let second = run_json(&home, &["task", "add", "Second", "--priority", "high"]);
    assert_eq!(second["priority"], "high");
    assert_eq!(second["mode"], "work");

    let tasks = run_json(&home, &["task", "list"]);
    assert_eq!(tasks[0]["title"], "Second");
    assert_eq!(tasks[1]["title"], "First");

    let id = second["id"].as_str().unwrap();
    run_json(&home, &["task", "delay", id]);
    assert_eq!(run_json(&home, &["task", "list"]).as_array().unwrap().len(), 1);
    assert_eq!(run_json(&home, &["task", "list", "--delayed"])[0]["id"], id);
}

#[test]
fn test_inverted_block_is_rejected() {
    let home = signed_in_home();
    let (_, stderr, code) = run_cli(
        &home,
        &[
            "block",
            "add",
            "Standup",
            "--start",
            "2024-01-01T10:00:00Z",
            "--end",
            "2024-01-01T09:00:00Z",
        ],
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("Invalid time range"), "stderr: {stderr}");
}

#[test]
fn test_schedule_suggest_for_monday() {
    let home = TempDir::new().unwrap();
    let plan = run_json(&home, &["schedule", "suggest", "--date", "2024-01-01"]);
    assert_eq!(plan["plannedMinutes"], 480);
    let suggestions = plan["suggestions"].as_array().unwrap();
    assert_eq!(suggestions.len(), 3);
    assert_eq!(suggestions[1]["type"], "lunch");
}

#[test]
fn test_schedule_day_off_has_no_suggestions() {
    let home = signed_in_home();
    run_json(&home, &["schedule", "set", "1", "--off"]);
    let plan = run_json(&home, &["schedule", "suggest", "--date", "2024-01-01"]);
    assert!(plan["window"].is_null());
    assert!(plan["suggestions"].as_array().unwrap().is_empty());
}

#[test]
fn test_config_get_and_set() {
    let home = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&home, &["config", "get", "reminders.lead_minutes"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "5");

    let (_, _, code) = run_cli(&home, &["config", "set", "reminders.lead_minutes", "10"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(&home, &["config", "get", "reminders.lead_minutes"]);
    assert_eq!(stdout.trim(), "10");

    let (_, stderr, code) = run_cli(&home, &["config", "get", "no.such.key"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("no.such.key"));
}
