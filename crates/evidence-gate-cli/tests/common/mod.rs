// crates/evidence-gate-cli/tests/common/mod.rs
// ============================================================================
// Module: CLI Test Utilities
// Description: Shared helpers for evidence-gate binary tests.
// Purpose: Spawn the binary in an isolated directory and build pack fixtures.
// Dependencies: evidence-gate-cli binary, tempfile
// ============================================================================

//! ## Overview
//! Every invocation runs with its working directory set to a fresh temp root
//! and with the config environment variable removed, so a developer's local
//! `evidence-gate.toml` never leaks into assertions.

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
    dead_code,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Output;

// ============================================================================
// SECTION: Binary
// ============================================================================

/// Returns the path of the compiled binary.
pub fn evidence_gate_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_evidence-gate"))
}

/// Runs the binary inside `cwd` with the given arguments.
pub fn run_in(cwd: &Path, args: &[&str]) -> Output {
    Command::new(evidence_gate_bin())
        .args(args)
        .current_dir(cwd)
        .env_remove("EVIDENCE_GATE_CONFIG")
        .output()
        .expect("run evidence-gate")
}

/// Returns stdout as UTF-8.
pub fn stdout_of(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).expect("stdout utf8")
}

/// Returns stderr as UTF-8.
pub fn stderr_of(output: &Output) -> String {
    String::from_utf8(output.stderr.clone()).expect("stderr utf8")
}

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Writes a file, creating parent directories.
pub fn write_file(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, contents).expect("write fixture file");
}

/// Writes a pack that satisfies every required clause of ruleset 1.0 except
/// the integrity files.
pub fn write_pack(dir: &Path) {
    write_file(dir, "manifest.json", r#"{"pack_id":"pack-001","protocol_version":"1.0"}"#);
    write_file(
        dir,
        "timeline/events.ndjson",
        "{\"seq\":0,\"kind\":\"start\"}\n{\"seq\":1,\"kind\":\"end\"}\n",
    );
    write_file(dir, "artifacts/context.json", r#"{"scenario":"demo"}"#);
}

/// Writes a config file into `dir` and returns its path.
pub fn write_config(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("evidence-gate.toml");
    fs::write(&path, contents).expect("write config");
    path
}
