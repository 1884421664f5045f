// crates/evidence-gate-cli/tests/gate_command.rs
// ============================================================================
// Module: CLI Gate Command Tests
// Description: Integration tests for gate, taxonomy, and config commands.
// Purpose: Validate report persistence, aggregate exit codes, and listings.
// Dependencies: evidence-gate-cli binary, serde_json, tempfile
// ============================================================================
//! ## Overview
//! Builds small corpora under temp roots and runs the gate pipeline through
//! the binary, asserting on printed lines and persisted report files.

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

mod common;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;

use common::run_in;
use common::stderr_of;
use common::stdout_of;
use common::write_config;
use common::write_file;
use serde_json::Value;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Writes a one-run registry whose stored evaluation uses `clause_code`.
fn write_reason_code_corpus(root: &Path, clause_code: &str) {
    write_file(root, "data/curated-runs/allowlist.yaml", "runs:\n  - run_id: run-a\n");
    let report = format!(
        concat!(
            r#"{{"report_version":"1.0","ruleset_version":"1.0","pack_id":"pack-a","#,
            r#""pack_root_hash":"{hash}","protocol_version":"1.0","topline_verdict":"FAIL","#,
            r#""reason_code":"CLAUSE_FAILED","clauses":[{{"clause_id":"C1","status":"FAIL","#,
            r#""reason_code":"{code}","message":"failed"}}]}}"#
        ),
        hash = "a".repeat(64),
        code = clause_code
    );
    write_file(root, "data/runs/run-a/evaluation.report.json", &report);
}

/// Reads a persisted JSON report.
fn read_json(path: &Path) -> Value {
    serde_json::from_slice(&fs::read(path).expect("read report")).expect("parse report")
}

// ============================================================================
// SECTION: Tests
// ============================================================================

/// Verifies `gate list` prints every gate id in execution order.
#[test]
fn gate_list_prints_ids() {
    let temp = TempDir::new().unwrap();
    let output = run_in(temp.path(), &["gate", "list"]);
    assert!(output.status.success());
    let lines: Vec<String> = stdout_of(&output).lines().map(ToString::to_string).collect();
    assert_eq!(
        lines,
        vec!["curated-immutability", "reason-codes", "cross-substrate", "pointer-coverage"]
    );
}

/// Verifies a known taxonomy code passes the reason-code gate.
#[test]
fn gate_run_reason_codes_pass() {
    let temp = TempDir::new().unwrap();
    write_reason_code_corpus(temp.path(), "REQ-FAIL-CONTEXT");

    let output = run_in(temp.path(), &["gate", "run", "--gate", "reason-codes"]);
    assert!(output.status.success(), "stderr: {}", stderr_of(&output));
    let stdout = stdout_of(&output);
    assert!(stdout.contains("reason-codes: PASS (0 issues)"));
    assert!(stdout.contains("aggregate: PASS (bootstrap=false)"));

    let report = read_json(&temp.path().join("reports/gates/reason-codes.report.json"));
    assert_eq!(report["status"], "PASS");
    assert_eq!(report["summary"]["runs_checked"], 1);
    assert_eq!(report["summary"]["enum_codes"], 1);
    assert_eq!(report["summary"]["pattern_codes"], 1);
    let summary = read_json(&temp.path().join("reports/gates/gates.summary.json"));
    assert_eq!(summary["status"], "PASS");
}

/// Verifies an unknown clause code fails the pipeline and names the clause.
#[test]
fn gate_run_reason_codes_fail_on_unknown_code() {
    let temp = TempDir::new().unwrap();
    write_reason_code_corpus(temp.path(), "MYSTERY_CODE");
    let out_dir = temp.path().join("out");

    let output = run_in(
        temp.path(),
        &["gate", "run", "--gate", "reason-codes", "--output-dir", out_dir.to_str().unwrap()],
    );
    assert_eq!(output.status.code(), Some(1));
    let stdout = stdout_of(&output);
    assert!(stdout.contains("reason-codes: FAIL (1 issues)"));
    assert!(stdout.contains("run-a/C1: UNKNOWN reason_code 'MYSTERY_CODE'"));
    assert!(stdout.contains("blocking: reason-codes"));
    assert!(out_dir.join("reason-codes.report.json").is_file());
    assert!(!temp.path().join("reports").exists());
}

/// Verifies configured taxonomy extensions admit otherwise unknown codes.
#[test]
fn gate_run_uses_configured_taxonomy() {
    let temp = TempDir::new().unwrap();
    write_reason_code_corpus(temp.path(), "MYSTERY_CODE");
    let config = write_config(temp.path(), "[taxonomy]\nextra_common = [\"MYSTERY_CODE\"]\n");

    let output = run_in(
        temp.path(),
        &["gate", "run", "--gate", "reason-codes", "--config", config.to_str().unwrap()],
    );
    assert!(output.status.success(), "stdout: {}", stdout_of(&output));
}

/// Verifies an empty corpus errors the pipeline on the matrix gates.
#[test]
fn gate_run_all_on_empty_corpus_reports_error() {
    let temp = TempDir::new().unwrap();
    let output = run_in(temp.path(), &["gate", "run"]);
    assert_eq!(output.status.code(), Some(1));
    let stdout = stdout_of(&output);
    assert!(stdout.contains("curated-immutability: PASS"));
    assert!(stdout.contains("reason-codes: PASS"));
    assert!(stdout.contains("cross-substrate: ERROR"));
    assert!(stdout.contains("pointer-coverage: ERROR"));
    assert!(stdout.contains("aggregate: ERROR"));

    let dir = temp.path().join("reports/gates");
    for id in ["curated-immutability", "reason-codes", "cross-substrate", "pointer-coverage"] {
        assert!(dir.join(format!("{id}.report.json")).is_file(), "missing report for {id}");
    }
    let summary = read_json(&dir.join("gates.summary.json"));
    assert_eq!(summary["status"], "ERROR");
    assert_eq!(summary["blocking"], serde_json::json!(["cross-substrate", "pointer-coverage"]));
}

/// Verifies unknown gate ids are rejected with the known list.
#[test]
fn gate_run_rejects_unknown_gate() {
    let temp = TempDir::new().unwrap();
    let output = run_in(temp.path(), &["gate", "run", "--gate", "speed"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = stderr_of(&output);
    assert!(stderr.contains("Unknown gate 'speed'"));
    assert!(stderr.contains("pointer-coverage"));
}

/// Verifies classification output is one canonical object per code.
#[test]
fn taxonomy_classify_prints_canonical_lines() {
    let temp = TempDir::new().unwrap();
    let output =
        run_in(temp.path(), &["taxonomy", "classify", "CLAUSE_FAILED", "GF-AUTH-FAILED", "NOPE"]);
    assert!(output.status.success(), "stderr: {}", stderr_of(&output));
    let lines: Vec<Value> = stdout_of(&output)
        .lines()
        .map(|line| serde_json::from_str(line).expect("classification json"))
        .collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0]["code"], "CLAUSE_FAILED");
    assert_eq!(lines[0]["allowed"], true);
    assert_eq!(lines[0]["kind"], "enum");
    assert_eq!(lines[1]["kind"], "pattern");
    assert_eq!(lines[1]["rule"], "GF_FAILED");
    assert_eq!(lines[2]["allowed"], false);
    assert_eq!(lines[2]["kind"], "unknown");
}

/// Verifies config validation reports defaults and explicit sources.
#[test]
fn config_validate_reports_source() {
    let temp = TempDir::new().unwrap();
    let defaults = run_in(temp.path(), &["config", "validate"]);
    assert!(defaults.status.success());
    assert!(stdout_of(&defaults).contains("built-in defaults"));

    let config = write_config(temp.path(), "[gates]\nbootstrap = true\n");
    let explicit = run_in(temp.path(), &["config", "validate", "--config", config.to_str().unwrap()]);
    assert!(explicit.status.success());
    let stdout = stdout_of(&explicit);
    assert!(stdout.contains("Config valid."));
    assert!(stdout.contains("evidence-gate.toml"));
}

/// Verifies invalid configuration fails every command that loads it.
#[test]
fn config_validate_rejects_invalid_config() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path(), "[gates]\nenabled = [\"speed\"]\n");
    let output = run_in(temp.path(), &["config", "validate", "--config", config.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr_of(&output).contains("Failed to load config"));

    let gate = run_in(temp.path(), &["gate", "run"]);
    assert_eq!(gate.status.code(), Some(1));
    assert!(stderr_of(&gate).contains("Failed to load config"));
}

/// Verifies the version flag prints the package version.
#[test]
fn version_flag_prints_version() {
    let temp = TempDir::new().unwrap();
    let output = run_in(temp.path(), &["--version"]);
    assert!(output.status.success());
    assert!(stdout_of(&output).starts_with("evidence-gate "));
}
