// crates/evidence-gate-core/tests/common/mod.rs
// ============================================================================
// Module: Common Test Utilities
// Description: Shared fixtures for evidence-gate-core integration tests.
// Purpose: Build packs, evaluation reports, and corpora on disk.
// Dependencies: evidence-gate-core, serde_json
// ============================================================================

//! ## Overview
//! Provides file writers and evaluation builders shared by the pack, verdict,
//! gate, and engine tests.

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

use std::fs;
use std::path::Path;

use evidence_gate_core::ClauseVerdict;
use evidence_gate_core::CorpusLayout;
use evidence_gate_core::EvaluationResult;
use evidence_gate_core::EvidencePointer;
use evidence_gate_core::GateSettings;
use evidence_gate_core::PackRootHasher;
use evidence_gate_core::StoredEvaluationSource;
use evidence_gate_core::Taxonomy;
use evidence_gate_core::TaxonomyClassifier;
use evidence_gate_core::VerdictStatus;
use evidence_gate_core::runtime::GateContext;

// ============================================================================
// SECTION: Files
// ============================================================================

/// Writes a file, creating parent directories.
pub fn write_file(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, contents).expect("write fixture file");
}

/// Writes a pack that passes ruleset 1.0 once sealed.
pub fn write_pack(dir: &Path) {
    write_file(dir, "manifest.json", r#"{"pack_id":"pack-001","protocol_version":"1.0"}"#);
    write_file(dir, "timeline/events.ndjson", "{\"seq\":0}\n{\"seq\":1}\n");
    write_file(dir, "artifacts/context.json", r#"{"scenario":"demo"}"#);
}

/// Writes a pack and persists its integrity files.
pub fn write_sealed_pack(dir: &Path) {
    write_pack(dir);
    let hasher = PackRootHasher::default();
    let digest = hasher.compute(dir).expect("compute digest");
    hasher.write(dir, &digest).expect("write integrity");
}

// ============================================================================
// SECTION: Evaluations
// ============================================================================

/// Builds a clause verdict without pointers.
pub fn clause(id: &str, status: VerdictStatus, reason_code: Option<&str>) -> ClauseVerdict {
    ClauseVerdict {
        clause_id: id.to_string(),
        requirement_id: None,
        status,
        reason_code: reason_code.map(ToString::to_string),
        message: format!("{id} {status}"),
        taxonomy: None,
        pointers: Vec::new(),
    }
}

/// Builds a pointer with a fixed content hash.
pub fn pointer(artifact_path: &str, locator: &str) -> EvidencePointer {
    EvidencePointer {
        artifact_path: artifact_path.to_string(),
        content_hash: "b".repeat(64),
        locator: locator.to_string(),
        note: None,
    }
}

/// Builds an evaluation result with fixed identity fields.
pub fn evaluation(
    topline: VerdictStatus,
    reason_code: Option<&str>,
    clauses: Vec<ClauseVerdict>,
) -> EvaluationResult {
    EvaluationResult {
        report_version: "1.0".to_string(),
        ruleset_version: "1.0".to_string(),
        pack_id: "pack-001".to_string(),
        pack_root_hash: "a".repeat(64),
        protocol_version: "1.0".to_string(),
        topline_verdict: topline,
        reason_code: reason_code.map(ToString::to_string),
        clauses,
        verdict_hash: None,
        evaluated_at: None,
        duration_ms: None,
        host: None,
        notes: None,
    }
}

/// Persists `data/runs/<run_id>/evaluation.report.json`.
pub fn write_evaluation(root: &Path, run_id: &str, result: &EvaluationResult) {
    let json = serde_json::to_string(result).expect("serialize evaluation");
    write_file(root, &format!("data/runs/{run_id}/evaluation.report.json"), &json);
}

// ============================================================================
// SECTION: Gate Context
// ============================================================================

/// Owned inputs for building a [`GateContext`].
pub struct Harness {
    /// Corpus layout.
    pub layout: CorpusLayout,
    /// Pack hasher.
    pub hasher: PackRootHasher,
    /// Classifier over the built-in taxonomy.
    pub classifier: TaxonomyClassifier,
    /// Stored evaluation source.
    pub evaluations: StoredEvaluationSource,
    /// Gate settings.
    pub settings: GateSettings,
}

impl Harness {
    /// Creates a harness rooted at `root` with default settings.
    pub fn new(root: &Path) -> Self {
        Self {
            layout: CorpusLayout::new(root),
            hasher: PackRootHasher::default(),
            classifier: TaxonomyClassifier::new(Taxonomy::builtin().expect("taxonomy")),
            evaluations: StoredEvaluationSource,
            settings: GateSettings::default(),
        }
    }

    /// Borrows the harness as a gate context.
    pub fn ctx(&self) -> GateContext<'_> {
        GateContext {
            layout: &self.layout,
            hasher: &self.hasher,
            classifier: &self.classifier,
            evaluations: &self.evaluations,
            settings: &self.settings,
        }
    }
}
