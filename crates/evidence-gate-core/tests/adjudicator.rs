// crates/evidence-gate-core/tests/adjudicator.rs
// ============================================================================
// Module: Evaluation Source Tests
// Description: Verifies stored-report loading and the bundled ruleset 1.0.
// ============================================================================
//! ## Overview
//! Checks that ruleset 1.0 adjudication depends only on pack bytes, that its
//! clause outcomes follow artifact presence and shape, and that the stored
//! source surfaces missing and malformed reports as errors.

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

use std::fs;

use common::clause;
use common::evaluation;
use common::write_evaluation;
use common::write_file;
use common::write_pack;
use common::write_sealed_pack;
use evidence_gate_core::AdjudicationError;
use evidence_gate_core::BundledRulesetSource;
use evidence_gate_core::ClauseVerdict;
use evidence_gate_core::CorpusLayout;
use evidence_gate_core::EvaluationResult;
use evidence_gate_core::EvaluationSource;
use evidence_gate_core::PackRootHasher;
use evidence_gate_core::StoredEvaluationSource;
use evidence_gate_core::VerdictStatus;
use evidence_gate_core::adjudicate_ruleset_1_0;
use evidence_gate_core::compute_verdict_hash;
use tempfile::TempDir;

fn clause_of<'a>(result: &'a EvaluationResult, id: &str) -> &'a ClauseVerdict {
    result.clauses.iter().find(|clause| clause.clause_id == id).unwrap()
}

// ============================================================================
// SECTION: Ruleset 1.0
// ============================================================================

#[test]
fn sealed_pack_passes_with_self_consistent_hashes() {
    let temp = TempDir::new().unwrap();
    write_sealed_pack(temp.path());
    let hasher = PackRootHasher::default();
    let result = adjudicate_ruleset_1_0(temp.path(), &hasher).unwrap();

    assert_eq!(result.topline_verdict, VerdictStatus::Pass);
    assert_eq!(result.reason_code, None);
    assert_eq!(result.pack_id, "pack-001");
    assert_eq!(result.protocol_version, "1.0");
    assert_eq!(result.ruleset_version, "1.0");
    assert_eq!(result.clauses.len(), 7);
    assert!(result.clauses.iter().all(|clause| clause.status == VerdictStatus::Pass));
    assert_eq!(result.pack_root_hash, hasher.compute(temp.path()).unwrap().root_hash);
    assert_eq!(result.verdict_hash.as_deref(), Some(compute_verdict_hash(&result).as_str()));
    assert_eq!(result.evaluated_at, None);
    assert_eq!(result.host, None);
}

#[test]
fn adjudication_is_deterministic() {
    let temp = TempDir::new().unwrap();
    write_sealed_pack(temp.path());
    let hasher = PackRootHasher::default();
    let first = adjudicate_ruleset_1_0(temp.path(), &hasher).unwrap();
    let second = adjudicate_ruleset_1_0(temp.path(), &hasher).unwrap();
    assert_eq!(first, second);
}

#[test]
fn unsealed_pack_fails_integrity_clauses() {
    let temp = TempDir::new().unwrap();
    write_pack(temp.path());
    let result = adjudicate_ruleset_1_0(temp.path(), &PackRootHasher::default()).unwrap();
    assert_eq!(result.topline_verdict, VerdictStatus::Fail);
    assert_eq!(result.reason_code.as_deref(), Some("CLAUSE_FAILED"));
    for id in ["RS10-R04", "RS10-R05"] {
        let clause = clause_of(&result, id);
        assert_eq!(clause.status, VerdictStatus::Fail, "{id}");
        assert_eq!(clause.reason_code.as_deref(), Some("REQUIRED_ARTIFACT_MISSING"), "{id}");
        assert_eq!(clause.pointers[0].content_hash, "");
    }
    assert_eq!(clause_of(&result, "RS10-R01").status, VerdictStatus::Pass);
}

#[test]
fn missing_optional_context_is_not_evaluated() {
    let temp = TempDir::new().unwrap();
    write_pack(temp.path());
    fs::remove_file(temp.path().join("artifacts/context.json")).unwrap();
    let hasher = PackRootHasher::default();
    hasher.write(temp.path(), &hasher.compute(temp.path()).unwrap()).unwrap();

    let result = adjudicate_ruleset_1_0(temp.path(), &hasher).unwrap();
    assert_eq!(result.topline_verdict, VerdictStatus::Pass);
    let context = clause_of(&result, "RS10-R07");
    assert_eq!(context.status, VerdictStatus::NotEvaluated);
    assert_eq!(context.reason_code.as_deref(), Some("NOT_EVALUATED"));
    assert_eq!(context.message, "artifacts/context.json is missing");
}

#[test]
fn topline_is_never_not_evaluated() {
    let temp = TempDir::new().unwrap();
    write_sealed_pack(temp.path());
    fs::remove_file(temp.path().join("artifacts/context.json")).unwrap();
    fs::remove_file(temp.path().join("timeline/events.ndjson")).unwrap();
    write_file(temp.path(), "manifest.json", r#"{"pack_id":"pack-001"}"#);

    let result = adjudicate_ruleset_1_0(temp.path(), &PackRootHasher::default()).unwrap();
    assert_eq!(result.topline_verdict, VerdictStatus::Fail);
    assert_eq!(result.reason_code.as_deref(), Some("CLAUSE_FAILED"));
    for id in ["RS10-R03", "RS10-R06"] {
        let clause = clause_of(&result, id);
        assert_eq!(clause.status, VerdictStatus::Fail, "{id}");
        assert_eq!(clause.reason_code.as_deref(), Some("REQUIRED_ARTIFACT_MISSING"), "{id}");
    }
    let not_evaluated: Vec<&str> = result
        .clauses
        .iter()
        .filter(|clause| clause.status == VerdictStatus::NotEvaluated)
        .map(|clause| clause.clause_id.as_str())
        .collect();
    assert_eq!(not_evaluated, ["RS10-R07"]);
}

#[test]
fn malformed_artifacts_fail_schema_clauses() {
    let temp = TempDir::new().unwrap();
    write_pack(temp.path());
    write_file(temp.path(), "timeline/events.ndjson", "not json\n");
    write_file(temp.path(), "manifest.json", r#"{"protocol_version":"1.0"}"#);

    let result = adjudicate_ruleset_1_0(temp.path(), &PackRootHasher::default()).unwrap();
    let timeline = clause_of(&result, "RS10-R06");
    assert_eq!(timeline.reason_code.as_deref(), Some("SCHEMA_VALIDATION_FAILED"));
    assert_eq!(timeline.pointers[0].locator, "ndjson:timeline/events.ndjson#0");
    let pack_id = clause_of(&result, "RS10-R02");
    assert_eq!(pack_id.status, VerdictStatus::Fail);
    assert_eq!(pack_id.message, "manifest.json#/pack_id does not resolve");
    assert_eq!(result.pack_id, "unknown");
}

#[test]
fn messages_carry_only_pack_relative_paths() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    write_pack(first.path());
    write_pack(second.path());
    let hasher = PackRootHasher::default();
    let a = adjudicate_ruleset_1_0(first.path(), &hasher).unwrap();
    let b = adjudicate_ruleset_1_0(second.path(), &hasher).unwrap();
    assert_eq!(a.verdict_hash, b.verdict_hash);
    let root = first.path().to_string_lossy().to_string();
    assert!(a.clauses.iter().all(|clause| !clause.message.contains(&root)));
}

#[test]
fn missing_pack_is_an_error() {
    let temp = TempDir::new().unwrap();
    let err = adjudicate_ruleset_1_0(&temp.path().join("absent"), &PackRootHasher::default());
    assert!(matches!(err, Err(AdjudicationError::Pack(_))));
}

// ============================================================================
// SECTION: Sources
// ============================================================================

#[test]
fn bundled_source_adjudicates_run_pack() {
    let temp = TempDir::new().unwrap();
    write_sealed_pack(&temp.path().join("data/runs/run-a/pack"));
    let layout = CorpusLayout::new(temp.path());
    let source = BundledRulesetSource::default();
    assert_eq!(source.name(), "bundled");
    let result = source.evaluate(&layout.run("run-a").unwrap()).unwrap();
    assert_eq!(result.topline_verdict, VerdictStatus::Pass);

    let missing = source.evaluate(&layout.run("ghost").unwrap());
    assert!(matches!(missing, Err(AdjudicationError::RunNotFound(ref id)) if id == "ghost"));
}

#[test]
fn stored_source_reads_reports_and_reports_failures() {
    let temp = TempDir::new().unwrap();
    let stored = evaluation(
        VerdictStatus::Fail,
        Some("CLAUSE_FAILED"),
        vec![clause("C1", VerdictStatus::Fail, Some("REQ-FAIL-X"))],
    );
    write_evaluation(temp.path(), "run-a", &stored);
    write_file(temp.path(), "data/runs/run-b/evaluation.report.json", "{");
    write_file(temp.path(), "data/runs/run-c/pack/manifest.json", "{}");
    let layout = CorpusLayout::new(temp.path());
    let source = StoredEvaluationSource;
    assert_eq!(source.name(), "stored");

    assert_eq!(source.evaluate(&layout.run("run-a").unwrap()).unwrap(), stored);
    assert!(matches!(
        source.evaluate(&layout.run("run-b").unwrap()),
        Err(AdjudicationError::Parse { .. })
    ));
    assert!(matches!(
        source.evaluate(&layout.run("run-c").unwrap()),
        Err(AdjudicationError::MissingReport(_))
    ));
    assert!(matches!(
        source.evaluate(&layout.run("ghost").unwrap()),
        Err(AdjudicationError::RunNotFound(_))
    ));
}
