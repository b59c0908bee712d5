// Integration tests for the tagcalc command-line contract: stdout shape and
// exit codes.
//
// Run with: cargo test -p tagcalc-cli --test cli_contract -- --nocapture

use std::io::Write;
use std::process::{Command, Stdio};

use httpmock::prelude::*;

fn tagcalc() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_tagcalc"));
    cmd.current_dir(env!("CARGO_MANIFEST_DIR"));
    cmd.env_remove("TAGCALC_SUGGEST_ENDPOINT");
    cmd
}

fn stdout_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Settings file in a temp dir so tests never touch the user's config.
fn temp_settings(dir: &tempfile::TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("settings.json");
    std::fs::write(&path, body).unwrap();
    path
}

// ===========================================================================
// tagcalc eval
// ===========================================================================

#[test]
fn eval_respects_precedence() {
    let output = tagcalc().args(["eval", "2", "*", "3", "+", "4"]).output().unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_of(&output), "10\n");

    let output = tagcalc().args(["eval", "2", "+", "3", "*", "4"]).output().unwrap();
    assert_eq!(stdout_of(&output), "14\n");
}

#[test]
fn eval_percentage_of_next() {
    let output = tagcalc().args(["eval", "50%", "200"]).output().unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_of(&output), "100\n");
}

#[test]
fn eval_fraction_has_two_decimals() {
    let output = tagcalc().args(["eval", "21", "/", "2"]).output().unwrap();
    assert_eq!(stdout_of(&output), "10.50\n");
}

#[test]
fn eval_negative_number_word() {
    let output = tagcalc().args(["eval", "-3", "-", "2"]).output().unwrap();
    assert!(output.status.success(), "{:?}", output);
    assert_eq!(stdout_of(&output), "-5\n");
}

#[test]
fn eval_division_by_zero_exits_1() {
    let output = tagcalc().args(["eval", "10", "/", "0"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout_of(&output), "Error: Division by zero\n");
    assert!(output.stderr.is_empty());
}

#[test]
fn eval_bad_word_is_usage_error() {
    let output = tagcalc().args(["eval", "2", "plus", "2"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unrecognized token: plus"), "{}", stderr);
}

#[test]
fn eval_json_shape() {
    let output = tagcalc().args(["eval", "--json", "10", "/", "4"]).output().unwrap();
    assert!(output.status.success());

    let val: serde_json::Value = serde_json::from_str(stdout_of(&output).trim()).unwrap();
    assert_eq!(val["result"], "2.50");
    assert_eq!(val["value"], 2.5);
    assert!(val["error"].is_null());
    let tokens = val["tokens"].as_array().unwrap();
    assert_eq!(tokens.len(), 3);
    assert_eq!(tokens[0]["kind"], "number");
    assert_eq!(tokens[1]["rawValue"], "/");
    assert_eq!(tokens[2]["id"], 3);
}

#[test]
fn eval_json_error() {
    let output = tagcalc().args(["eval", "--json", "+"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let val: serde_json::Value = serde_json::from_str(stdout_of(&output).trim()).unwrap();
    assert_eq!(val["result"], "Error: Invalid formula");
    assert_eq!(val["error"], "Invalid formula");
    assert!(val["value"].is_null());
}

// ===========================================================================
// tagcalc suggest
// ===========================================================================

#[test]
fn suggest_from_records_file() {
    let dir = tempfile::tempdir().unwrap();
    let records = dir.path().join("records.json");
    std::fs::write(&records, r#"[
        { "id": "1", "name": "Revenue", "value": 10 },
        { "id": "2", "name": "Rent" },
        { "id": "3", "name": "Payroll" }
    ]"#).unwrap();
    let settings = temp_settings(&dir, "{}");

    let output = tagcalc()
        .args(["suggest", "re", "--records", records.to_str().unwrap()])
        .args(["--config", settings.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success(), "{:?}", output);
    assert_eq!(stdout_of(&output), "Revenue\nRent\n");
}

#[test]
fn suggest_from_endpoint_json() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/autocomplete");
        then.status(200).json_body(serde_json::json!([
            { "id": "7", "name": "margin", "inputs": "revenue, cost" }
        ]));
    });

    let dir = tempfile::tempdir().unwrap();
    let settings = temp_settings(
        &dir,
        &format!(r#"{{ "suggest.endpoint": "{}/autocomplete" }}"#, server.base_url()),
    );

    let output = tagcalc()
        .args(["suggest", "cost", "--json", "--config", settings.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success(), "{:?}", output);

    let val: serde_json::Value = serde_json::from_str(stdout_of(&output).trim()).unwrap();
    assert_eq!(val[0]["name"], "margin");
    assert_eq!(val[0]["category"], "variable");
}

#[test]
fn suggest_http_failure_exits_3() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/autocomplete");
        then.status(500);
    });

    let dir = tempfile::tempdir().unwrap();
    let settings = temp_settings(&dir, "{}");
    let output = tagcalc()
        .args(["suggest", "x", "--endpoint", &format!("{}/autocomplete", server.base_url())])
        .args(["--config", settings.to_str().unwrap()])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
}

// ===========================================================================
// tagcalc repl
// ===========================================================================

#[test]
fn repl_offline_session() {
    let dir = tempfile::tempdir().unwrap();
    let settings = temp_settings(&dir, r#"{ "input.defaultNumberMode": "Value" }"#);

    let mut child = tagcalc()
        .args(["repl", "--offline", "--config", settings.to_str().unwrap()])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();

    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"2 \n*\n3 \n+\n4 \n:quit\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());

    let stdout = stdout_of(&output);
    assert!(stdout.contains("= 2 * 3 + 4 |"), "{}", stdout);
    assert!(stdout.trim_end().ends_with("-> 10"), "{}", stdout);
}

// ===========================================================================
// tagcalc config
// ===========================================================================

#[test]
fn config_show_merges_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let settings = temp_settings(&dir, "// comment\n{ \"input.maxLength\": 5 }");

    let output = tagcalc()
        .args(["config", "show", "--config", settings.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());

    let val: serde_json::Value = serde_json::from_str(stdout_of(&output).trim()).unwrap();
    assert_eq!(val["input.maxLength"], 5);
    assert_eq!(val["input.defaultNumberMode"], "Percentage");
    assert_eq!(val["input.strictOperators"], true);
}

#[test]
fn config_path_echoes_override() {
    let output = tagcalc()
        .args(["config", "path", "--config", "/tmp/elsewhere.json"])
        .output()
        .unwrap();
    assert_eq!(stdout_of(&output), "/tmp/elsewhere.json\n");
}
