// crates/evidence-gate-core/tests/curated_gates.rs
// ============================================================================
// Module: Curated Registry Gate Tests
// Description: Verifies the curated-immutability and reason-code gates.
// ============================================================================
//! ## Overview
//! Builds curated registries on disk and checks schema findings, hash
//! recomputation, reproduced-claim rules, and taxonomy conformance.

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

use std::path::Path;

use common::Harness;
use common::clause;
use common::evaluation;
use common::write_evaluation;
use common::write_file;
use common::write_sealed_pack;
use evidence_gate_core::GateKind;
use evidence_gate_core::GateReport;
use evidence_gate_core::GateStatus;
use evidence_gate_core::PackRootHasher;
use evidence_gate_core::VerdictStatus;
use evidence_gate_core::compute_verdict_hash;
use evidence_gate_core::hash_file;
use tempfile::TempDir;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

const SCHEMA: &str = "\
required: [run_id, scenario_id, substrate_claim_level, pack_root_hash]
enums:
  substrate_claim_level: [single, reproduced]
reproduced_constraints:
  repro_readme_required_sections: [Prerequisites, Repro Steps]
";

fn write_schema(root: &Path) {
    write_file(root, "governance/schemas/curated-run.schema.yaml", SCHEMA);
    write_file(root, "data/scenarios/scn-1.yaml", "scenario_id: scn-1\n");
}

fn write_registry(root: &Path, body: &str) {
    write_file(root, "data/curated-runs/allowlist.yaml", body);
}

fn run_gate(root: &Path, kind: GateKind) -> GateReport {
    let harness = Harness::new(root);
    kind.run(&harness.ctx())
}

/// Writes a sealed run with a stored evaluation and returns its registry entry.
fn sealed_run_entry(root: &Path, run_id: &str) -> String {
    let run_dir = root.join("data/runs").join(run_id);
    write_sealed_pack(&run_dir.join("pack"));
    let result =
        evaluation(VerdictStatus::Pass, None, vec![clause("R01", VerdictStatus::Pass, None)]);
    write_evaluation(root, run_id, &result);
    let pack_hash = PackRootHasher::default().compute(&run_dir.join("pack")).unwrap().root_hash;
    let report_hash = hash_file(&run_dir.join("evaluation.report.json")).unwrap();
    format!(
        "  - run_id: {run_id}\n    scenario_id: scn-1\n    substrate_claim_level: single\n    \
         pack_root_hash: \"{pack_hash}\"\n    verdict_hash: \"{}\"\n    \
         evaluation_report_hash: \"{report_hash}\"\n",
        compute_verdict_hash(&result)
    )
}

// ============================================================================
// SECTION: Curated Immutability
// ============================================================================

#[test]
fn empty_registry_passes_without_schema() {
    let temp = TempDir::new().unwrap();
    let report = run_gate(temp.path(), GateKind::CuratedImmutability);
    assert_eq!(report.status(), GateStatus::Pass);
    assert_eq!(report.counter("entries_checked"), 0);
    assert!(report.issues().is_empty());
}

#[test]
fn registry_without_schema_is_an_error() {
    let temp = TempDir::new().unwrap();
    write_registry(temp.path(), "runs:\n  - run_id: run-a\n");
    let report = run_gate(temp.path(), GateKind::CuratedImmutability);
    assert_eq!(report.status(), GateStatus::Error);
    assert_eq!(report.issues().len(), 1);
}

#[test]
fn intact_entry_passes() {
    let temp = TempDir::new().unwrap();
    write_schema(temp.path());
    let entry = sealed_run_entry(temp.path(), "run-a");
    write_registry(temp.path(), &format!("runs:\n{entry}"));
    let report = run_gate(temp.path(), GateKind::CuratedImmutability);
    assert_eq!(report.status(), GateStatus::Pass, "issues: {:?}", report.issues());
    assert_eq!(report.counter("entries_checked"), 1);
    assert_eq!(report.counter("issues"), 0);
}

#[test]
fn schema_violations_are_attributed_to_entries() {
    let temp = TempDir::new().unwrap();
    write_schema(temp.path());
    write_registry(
        temp.path(),
        "runs:\n  - run_id: run-a\n    substrate_claim_level: bogus\n    scenario_id: missing\n  \
         - scenario_id: scn-1\n    substrate_claim_level: single\n    pack_root_hash: x\n",
    );
    let report = run_gate(temp.path(), GateKind::CuratedImmutability);
    assert_eq!(report.status(), GateStatus::Fail);
    let issues = report.issues();
    assert!(issues.contains(&"run-a: Missing required field 'pack_root_hash'".to_string()));
    assert!(issues.contains(&"run-a: Invalid substrate_claim_level 'bogus'".to_string()));
    assert!(
        issues.contains(&"run-a: scenario_id 'missing' not found in scenario registry".to_string())
    );
    assert!(issues.contains(&"entry_2: Missing required field 'run_id'".to_string()));
    assert_eq!(report.counter("entries_checked"), 2);
    assert_eq!(report.counter("issues"), u64::try_from(issues.len()).unwrap());
}

#[test]
fn tampered_pack_and_report_are_detected() {
    let temp = TempDir::new().unwrap();
    write_schema(temp.path());
    let entry = sealed_run_entry(temp.path(), "run-a");
    write_registry(temp.path(), &format!("runs:\n{entry}"));
    write_file(&temp.path().join("data/runs/run-a/pack"), "artifacts/context.json", "{}");
    let tampered = evaluation(VerdictStatus::Fail, Some("CLAUSE_FAILED"), Vec::new());
    write_evaluation(temp.path(), "run-a", &tampered);

    let report = run_gate(temp.path(), GateKind::CuratedImmutability);
    assert_eq!(report.status(), GateStatus::Fail);
    let issues = report.issues().join("\n");
    assert!(issues.contains("run-a: pack_root_hash mismatch (expected "));
    assert!(issues.contains("run-a: verdict_hash mismatch"));
    assert!(issues.contains("run-a: evaluation_report_hash mismatch"));
}

#[test]
fn malformed_verdict_hash_is_reported() {
    let temp = TempDir::new().unwrap();
    write_schema(temp.path());
    let entry = sealed_run_entry(temp.path(), "run-a");
    let (head, _) = entry.split_once("    verdict_hash:").unwrap();
    let rest = entry.split_once("    evaluation_report_hash:").unwrap().1;
    let broken = format!("{head}    verdict_hash: NOT-HEX\n    evaluation_report_hash:{rest}");
    write_registry(temp.path(), &format!("runs:\n{broken}"));
    let report = run_gate(temp.path(), GateKind::CuratedImmutability);
    assert!(
        report
            .issues()
            .contains(&"run-a: verdict_hash invalid format (must be 64-char hex)".to_string())
    );
}

#[test]
fn reproduced_claims_require_readme_sections() {
    let temp = TempDir::new().unwrap();
    write_schema(temp.path());
    write_file(temp.path(), "docs/repro/README.md", "# Prerequisites\nnone\n");
    write_registry(
        temp.path(),
        "runs:\n  - run_id: run-a\n    scenario_id: scn-1\n    substrate_claim_level: reproduced\n    \
         pack_root_hash: x\n    repro_ref: docs/repro/README.md\n",
    );
    let report = run_gate(temp.path(), GateKind::CuratedImmutability);
    let issues = report.issues();
    assert!(issues.contains(&"run-a: repro_ref must contain '#repro-steps' anchor".to_string()));
    assert!(issues.contains(&"run-a: repro_ref README missing section 'Repro Steps'".to_string()));
    assert!(!issues.iter().any(|issue| issue.contains("Prerequisites")));
}

#[test]
fn reproduced_claim_without_reference_skips_hash_checks() {
    let temp = TempDir::new().unwrap();
    write_schema(temp.path());
    write_registry(
        temp.path(),
        "runs:\n  - run_id: run-a\n    scenario_id: scn-1\n    substrate_claim_level: reproduced\n    \
         pack_root_hash: stale\n",
    );
    write_sealed_pack(&temp.path().join("data/runs/run-a/pack"));
    let report = run_gate(temp.path(), GateKind::CuratedImmutability);
    assert_eq!(
        report.issues(),
        ["run-a: repro_ref required for substrate_claim_level=reproduced".to_string()]
    );
}

#[test]
fn escaping_repro_reference_is_not_resolved() {
    let temp = TempDir::new().unwrap();
    write_schema(temp.path());
    write_registry(
        temp.path(),
        "runs:\n  - run_id: run-a\n    scenario_id: scn-1\n    substrate_claim_level: reproduced\n    \
         pack_root_hash: x\n    repro_ref: ../outside/README.md#repro-steps\n",
    );
    let report = run_gate(temp.path(), GateKind::CuratedImmutability);
    assert!(
        report
            .issues()
            .contains(&"run-a: repro_ref target '../outside/README.md' not found".to_string())
    );
}

// ============================================================================
// SECTION: Reason Codes
// ============================================================================

#[test]
fn known_codes_pass_and_are_counted() {
    let temp = TempDir::new().unwrap();
    write_registry(temp.path(), "runs:\n  - run_id: run-a\n  - run_id: run-b\n");
    write_evaluation(
        temp.path(),
        "run-a",
        &evaluation(
            VerdictStatus::Fail,
            Some("CLAUSE_FAILED"),
            vec![
                clause("C1", VerdictStatus::Fail, Some("REQ-FAIL-CONTEXT")),
                clause("C2", VerdictStatus::NotEvaluated, Some("D2_TERMINAL_EVENT_MISSING")),
                clause("C3", VerdictStatus::Pass, Some("IGNORED_FOR_PASS")),
            ],
        ),
    );
    write_evaluation(temp.path(), "run-b", &evaluation(VerdictStatus::Pass, None, Vec::new()));

    let report = run_gate(temp.path(), GateKind::ReasonCodes);
    assert_eq!(report.status(), GateStatus::Pass, "issues: {:?}", report.issues());
    assert_eq!(report.counter("runs_checked"), 2);
    assert_eq!(report.counter("total_reason_codes"), 3);
    assert_eq!(report.counter("enum_codes"), 2);
    assert_eq!(report.counter("pattern_codes"), 1);
    assert_eq!(report.counter("unknown_codes"), 0);
}

#[test]
fn unknown_and_missing_codes_fail() {
    let temp = TempDir::new().unwrap();
    write_registry(temp.path(), "runs:\n  - run_id: run-a\n  - run_id: run-b\n");
    write_evaluation(
        temp.path(),
        "run-a",
        &evaluation(
            VerdictStatus::Fail,
            Some("MADE_UP"),
            vec![clause("C1", VerdictStatus::Fail, Some("REQ-FAIL-CONTEXT"))],
        ),
    );
    write_evaluation(
        temp.path(),
        "run-b",
        &evaluation(VerdictStatus::Fail, None, vec![clause("C9", VerdictStatus::Fail, None)]),
    );

    let report = run_gate(temp.path(), GateKind::ReasonCodes);
    assert_eq!(report.status(), GateStatus::Fail);
    assert_eq!(
        report.issues(),
        [
            "run-a: UNKNOWN reason_code 'MADE_UP' (topline)".to_string(),
            "run-b: MISSING reason_code for FAIL topline".to_string(),
            "run-b/C9: MISSING reason_code for FAIL clause".to_string(),
        ]
    );
    assert_eq!(report.counter("unknown_codes"), 1);
    assert_eq!(report.counter("missing_codes"), 2);
    assert_eq!(report.counter("total_reason_codes"), 4);
}

#[test]
fn uncoded_topline_with_coded_clauses_adds_no_code() {
    let temp = TempDir::new().unwrap();
    write_registry(temp.path(), "runs:\n  - run_id: run-a\n");
    write_evaluation(
        temp.path(),
        "run-a",
        &evaluation(
            VerdictStatus::Fail,
            None,
            vec![clause("C1", VerdictStatus::Fail, Some("REQ-FAIL-CONTEXT"))],
        ),
    );

    let report = run_gate(temp.path(), GateKind::ReasonCodes);
    assert_eq!(report.status(), GateStatus::Pass, "issues: {:?}", report.issues());
    assert_eq!(report.counter("total_reason_codes"), 1);
    assert_eq!(report.counter("pattern_codes"), 1);
    assert_eq!(report.counter("missing_codes"), 0);
    let classified = report.counter("enum_codes")
        + report.counter("pattern_codes")
        + report.counter("unknown_codes")
        + report.counter("missing_codes");
    assert_eq!(report.counter("total_reason_codes"), classified);
}

#[test]
fn unavailable_evaluations_are_skipped_with_findings() {
    let temp = TempDir::new().unwrap();
    write_registry(temp.path(), "runs:\n  - run_id: ghost\n  - note: no id\n");
    let report = run_gate(temp.path(), GateKind::ReasonCodes);
    assert_eq!(report.status(), GateStatus::Pass);
    assert_eq!(report.counter("runs_checked"), 0);
    assert_eq!(report.counter("runs_skipped"), 2);
    assert!(report.issues()[0].starts_with("ghost: evaluation unavailable (run not found"));
    assert_eq!(report.issues()[1], "entry_2: evaluation unavailable (missing run_id)");
}
