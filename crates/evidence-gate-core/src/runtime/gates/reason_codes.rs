// crates/evidence-gate-core/src/runtime/gates/reason_codes.rs
// ============================================================================
// Module: Reason-Code Taxonomy Gate
// Description: Conformance of curated verdict reason codes to the taxonomy.
// Purpose: Keep every non-PASS verdict explained by a governed reason code.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Every curated run is evaluated through the configured evaluation source.
//! A non-PASS topline must carry a reason code unless at least one clause
//! does, and every non-PASS clause must carry one. Each code found is
//! classified; unknown and missing codes fail the gate. Runs that cannot be
//! evaluated are reported and skipped.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::evaluation::EvaluationResult;
use crate::core::evaluation::VerdictStatus;
use crate::core::report::GateReport;
use crate::core::report::GateStatus;
use crate::core::report::RunningGate;
use crate::core::taxonomy::CodeKind;
use crate::core::taxonomy::TaxonomyClassifier;
use crate::runtime::gates::GateContext;
use crate::runtime::gates::GateError;
use crate::runtime::gates::GateKind;
use crate::runtime::gates::execute;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Counters reported by this gate.
const COUNTERS: &[&str] = &[
    "runs_checked",
    "runs_skipped",
    "total_reason_codes",
    "enum_codes",
    "pattern_codes",
    "unknown_codes",
    "missing_codes",
];

// ============================================================================
// SECTION: Gate
// ============================================================================

/// Runs the reason-code taxonomy gate.
#[must_use]
pub fn run(ctx: &GateContext<'_>) -> GateReport {
    execute(GateKind::ReasonCodes, |gate| scan(ctx, gate))
}

/// Scans every curated run.
fn scan(ctx: &GateContext<'_>, gate: &mut RunningGate) -> Result<GateStatus, GateError> {
    let registry = ctx.layout.load_registry()?;
    for counter in COUNTERS {
        gate.set(counter, 0);
    }
    for (index, entry) in registry.entries.iter().enumerate() {
        let label = entry.label(index + 1);
        let evaluated = entry
            .run_id()
            .ok_or_else(|| "missing run_id".to_string())
            .and_then(|run_id| ctx.layout.run(run_id).map_err(|err| err.to_string()))
            .and_then(|run| ctx.evaluations.evaluate(&run).map_err(|err| err.to_string()));
        match evaluated {
            Ok(result) => {
                gate.increment("runs_checked");
                check_result(ctx.classifier, &label, &result, gate);
            }
            Err(cause) => {
                gate.increment("runs_skipped");
                gate.issue(format!("{label}: evaluation unavailable ({cause})"));
            }
        }
    }
    let failed = gate.counter("unknown_codes") > 0 || gate.counter("missing_codes") > 0;
    Ok(if failed { GateStatus::Fail } else { GateStatus::Pass })
}

/// Checks the topline and clause codes of one evaluation.
fn check_result(
    classifier: &TaxonomyClassifier,
    run_label: &str,
    result: &EvaluationResult,
    gate: &mut RunningGate,
) {
    // total_reason_codes always equals enum + pattern + unknown + missing.
    if result.topline_verdict != VerdictStatus::Pass {
        match result.reason_code.as_deref() {
            Some(code) => {
                gate.increment("total_reason_codes");
                if !classify(classifier, code, gate) {
                    gate.issue(format!("{run_label}: UNKNOWN reason_code '{code}' (topline)"));
                }
            }
            None if result.clauses.iter().all(|clause| clause.reason_code.is_none()) => {
                gate.increment("total_reason_codes");
                gate.increment("missing_codes");
                gate.issue(format!(
                    "{run_label}: MISSING reason_code for {} topline",
                    result.topline_verdict
                ));
            }
            None => {}
        }
    }

    for clause in &result.clauses {
        if clause.status == VerdictStatus::Pass {
            continue;
        }
        gate.increment("total_reason_codes");
        let clause_label = format!("{run_label}/{}", clause.clause_id);
        match clause.reason_code.as_deref() {
            Some(code) => {
                if !classify(classifier, code, gate) {
                    gate.issue(format!("{clause_label}: UNKNOWN reason_code '{code}'"));
                }
            }
            None => {
                gate.increment("missing_codes");
                gate.issue(format!(
                    "{clause_label}: MISSING reason_code for {} clause",
                    clause.status
                ));
            }
        }
    }
}

/// Classifies a code and bumps the matching counter; returns false when unknown.
fn classify(classifier: &TaxonomyClassifier, code: &str, gate: &mut RunningGate) -> bool {
    match classifier.classify(code).kind {
        CodeKind::Enum => gate.increment("enum_codes"),
        CodeKind::Pattern => gate.increment("pattern_codes"),
        CodeKind::Unknown => {
            gate.increment("unknown_codes");
            return false;
        }
    }
    true
}
