use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use tempfile::TempDir;

const PISP: &str = r#"
workflows:
  - name: wise_openbanking_pisp
    description: Wise payment initiation
    mappings:
      - { from: amount, to: instructedAmount, transform: number }
      - { from: currency, to: currency, transform: upcase }
    steps:
      - check: "instructedAmount > 0"
        message: Amount must be > 0
      - name: Round amount
        round: { field: instructedAmount, places: 2 }
    branches:
      payment_status:
        - when: failed
          steps:
            - { name: Flag failure, set: { notified: true } }
    on_error:
      set: { error: true }
  - name: strict
    steps:
      - check: "amount > 0"
        message: Amount must be > 0
"#;

fn write_doc(dir: &TempDir, contents: &str) -> String {
    let path = dir.path().join("workflows.yaml");
    fs::write(&path, contents).unwrap();
    path.to_string_lossy().into_owned()
}

fn stdout_json(output: &std::process::Output) -> Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let last = stdout.lines().last().unwrap_or_default();
    serde_json::from_str(last).unwrap()
}

#[test]
fn test_validate_command() {
    let tmp_dir = TempDir::new().unwrap();
    let path = write_doc(&tmp_dir, PISP);

    Command::cargo_bin("payflow")
        .unwrap()
        .args(["validate", &path])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 workflows"));
}

#[test]
fn test_validate_unparsable_document() {
    let tmp_dir = TempDir::new().unwrap();
    let path = write_doc(&tmp_dir, "invalid: yaml: content");

    Command::cargo_bin("payflow")
        .unwrap()
        .args(["validate", &path])
        .assert()
        .failure()
        .code(2); // VALIDATION_FAILED
}

#[test]
fn test_workflows_command_json() {
    let tmp_dir = TempDir::new().unwrap();
    let path = write_doc(&tmp_dir, PISP);

    let assert = Command::cargo_bin("payflow")
        .unwrap()
        .args(["workflows", "--format", "json", &path])
        .assert()
        .success();

    let out = stdout_json(assert.get_output());
    assert_eq!(out["workflows"][0]["name"], json!("wise_openbanking_pisp"));
    assert_eq!(out["workflows"][0]["format"], json!("json"));
    assert_eq!(out["workflows"][0]["step_count"], json!(2));
    assert_eq!(out["workflows"][0]["branches"], json!(["payment_status"]));
    assert_eq!(out["workflows"][1]["handles_errors"], json!(false));
}

#[test]
fn test_run_handled_error() {
    let tmp_dir = TempDir::new().unwrap();
    let path = write_doc(&tmp_dir, PISP);

    let assert = Command::cargo_bin("payflow")
        .unwrap()
        .args([
            "run",
            &path,
            "--workflow",
            "wise_openbanking_pisp",
            "--set",
            "amount=-5",
            "--set",
            "currency=gbp",
            "--format",
            "json",
        ])
        .assert()
        .success();

    let out = stdout_json(assert.get_output());
    assert_eq!(out["status"], json!("handled"));
    assert_eq!(
        out["record"],
        json!({"amount": "-5", "currency": "GBP", "instructedAmount": -5, "error": true})
    );
}

#[test]
fn test_run_with_inputs_file_and_branch() {
    let tmp_dir = TempDir::new().unwrap();
    let path = write_doc(&tmp_dir, PISP);
    let inputs = tmp_dir.path().join("inputs.json");
    fs::write(
        &inputs,
        r#"{"amount": "10.456", "currency": "eur", "payment_status": "failed"}"#,
    )
    .unwrap();

    let assert = Command::cargo_bin("payflow")
        .unwrap()
        .args(["run", &path, "--workflow", "wise_openbanking_pisp", "--format", "json"])
        .arg("--inputs")
        .arg(&inputs)
        .assert()
        .success();

    let out = stdout_json(assert.get_output());
    assert_eq!(out["status"], json!("succeeded"));
    assert_eq!(out["steps_succeeded"], json!(2));
    assert_eq!(out["record"]["instructedAmount"], json!(10.46));
    assert_eq!(out["record"]["notified"], json!(true));
}

#[test]
fn test_run_unhandled_failure() {
    let tmp_dir = TempDir::new().unwrap();
    let path = write_doc(&tmp_dir, PISP);

    let assert = Command::cargo_bin("payflow")
        .unwrap()
        .args(["run", &path, "--workflow", "strict", "--format", "json"])
        .assert()
        .failure()
        .code(3); // RUN_FAILED

    let out = stdout_json(assert.get_output());
    assert_eq!(out["status"], json!("failed"));
    assert_eq!(out["error"], json!("validation failed: Amount must be > 0"));
    assert_eq!(out["record"], Value::Null);
}

#[test]
fn test_run_requires_workflow_for_multi_workflow_documents() {
    let tmp_dir = TempDir::new().unwrap();
    let path = write_doc(&tmp_dir, PISP);

    Command::cargo_bin("payflow")
        .unwrap()
        .args(["run", &path])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--workflow is required"));
}

#[test]
fn test_run_unknown_workflow() {
    let tmp_dir = TempDir::new().unwrap();
    let path = write_doc(&tmp_dir, PISP);

    Command::cargo_bin("payflow")
        .unwrap()
        .args(["run", &path, "--workflow", "missing"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("missing"));
}

#[test]
fn test_run_stdout_events() {
    let tmp_dir = TempDir::new().unwrap();
    let path = write_doc(
        &tmp_dir,
        r#"
workflows:
  - name: counter
    steps:
      - { increment: { field: counter } }
      - { increment: { field: counter } }
"#,
    );

    let assert = Command::cargo_bin("payflow")
        .unwrap()
        .args(["run", &path, "--events", "stdout", "--format", "json"])
        .assert()
        .success();

    let output = assert.get_output();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("run.started"));
    assert!(stdout.contains("run.finished"));
    let out = stdout_json(output);
    assert_eq!(out["record"], json!({"counter": 2}));
}
