// crates/evidence-gate-core/src/runtime/gates/parity.rs
// ============================================================================
// Module: Cross-Substrate Reproduction Gate
// Description: Clause-vector parity of one scenario across substrates.
// Purpose: Detect substrates that adjudicate the same scenario differently.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! For every scenario of the substrate matrix, each substrate is expected to
//! have produced a run. Found runs are evaluated and reduced to a parity key
//! (see [`parity_key`]); a scenario passes parity only when every substrate
//! produced the same key. Missing runs are reported apart from mismatches,
//! and parity is not judged for a scenario unless every substrate produced a
//! key.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::corpus::MatrixScenario;
use crate::core::evaluation::EvaluationResult;
use crate::core::evaluation::VerdictStatus;
use crate::core::report::GateReport;
use crate::core::report::GateStatus;
use crate::core::report::RunningGate;
use crate::runtime::gates::GateContext;
use crate::runtime::gates::GateError;
use crate::runtime::gates::GateKind;
use crate::runtime::gates::execute;

// ============================================================================
// SECTION: Parity Key
// ============================================================================

/// Builds the clause-vector parity key of an evaluation.
///
/// The key is `topline:reason::vector`, where `reason` is `none` when absent
/// and `vector` is the byte-sorted list of `clause_id:status:reason_code`
/// (empty reason when absent) joined by `|`.
#[must_use]
pub fn parity_key(result: &EvaluationResult) -> String {
    let mut vector: Vec<String> = result
        .clauses
        .iter()
        .map(|clause| {
            format!(
                "{}:{}:{}",
                clause.clause_id,
                clause.status,
                clause.reason_code.as_deref().unwrap_or_default()
            )
        })
        .collect();
    vector.sort_by(|a, b| a.as_bytes().cmp(b.as_bytes()));
    format!(
        "{}:{}::{}",
        result.topline_verdict,
        result.reason_code.as_deref().unwrap_or("none"),
        vector.join("|")
    )
}

// ============================================================================
// SECTION: Gate
// ============================================================================

/// Substrate outcome within one scenario.
struct SubstrateKey {
    /// Substrate name.
    substrate: String,
    /// Topline verdict.
    topline: VerdictStatus,
    /// Parity key.
    key: String,
}

/// Runs the cross-substrate reproduction gate.
#[must_use]
pub fn run(ctx: &GateContext<'_>) -> GateReport {
    execute(GateKind::CrossSubstrate, |gate| scan(ctx, gate))
}

/// Scans the matrix.
fn scan(ctx: &GateContext<'_>, gate: &mut RunningGate) -> Result<GateStatus, GateError> {
    let matrix = ctx.layout.load_matrix()?;
    let substrates = as_counter(matrix.substrates.len());
    let scenarios = as_counter(matrix.scenarios.len());
    let runs_expected = substrates.saturating_mul(scenarios);
    gate.set("substrates", substrates);
    gate.set("scenarios", scenarios);
    gate.set("runs_expected", runs_expected);
    for key in ["runs_found", "verdict_matches", "verdict_mismatches", "expectation_mismatches"] {
        gate.set(key, 0);
    }

    let mut unevaluated = 0_u64;
    for scenario in &matrix.scenarios {
        let (keys, found, failed) = collect_keys(ctx, &matrix.substrates, scenario, gate);
        unevaluated += failed;
        if keys.len() == matrix.substrates.len() && !keys.is_empty() {
            if keys.iter().all(|entry| entry.key == keys[0].key) {
                gate.increment("verdict_matches");
            } else {
                gate.increment("verdict_mismatches");
                let toplines = keys
                    .iter()
                    .map(|entry| format!("{}:{}", entry.substrate, entry.topline))
                    .collect::<Vec<_>>()
                    .join(", ");
                let scenario_id = &scenario.scenario_id;
                gate.issue(format!("{scenario_id}: clause-vector mismatch ({toplines})"));
            }
        }
        if let Some(min) = matrix.coverage.min_substrates
            && found < min
        {
            gate.issue(format!(
                "{}: only {found}/{min} substrates produced runs",
                scenario.scenario_id
            ));
        }
    }

    let runs_found = gate.counter("runs_found");
    let missing = runs_expected.saturating_sub(runs_found);
    let status = if ratio_exceeded(missing, runs_expected, ctx.settings.fail_missing_ratio)
        || gate.counter("verdict_mismatches") > 0
        || gate.counter("expectation_mismatches") > 0
    {
        GateStatus::Fail
    } else if runs_found == runs_expected && unevaluated == 0 {
        GateStatus::Pass
    } else {
        GateStatus::Partial
    };
    Ok(status)
}

/// Evaluates every substrate run of one scenario.
///
/// Returns the produced keys, the number of found runs, and the number of
/// found runs that could not be evaluated.
fn collect_keys(
    ctx: &GateContext<'_>,
    substrates: &[String],
    scenario: &MatrixScenario,
    gate: &mut RunningGate,
) -> (Vec<SubstrateKey>, usize, u64) {
    let scenario_id = &scenario.scenario_id;
    let mut keys = Vec::with_capacity(substrates.len());
    let mut found = 0_usize;
    let mut failed = 0_u64;
    for substrate in substrates {
        let Some(run_id) = scenario.runs.get(substrate).filter(|id| !id.is_empty()) else {
            gate.issue(format!("{scenario_id}/{substrate}: run_id not defined in matrix"));
            continue;
        };
        let run = match ctx.layout.run(run_id) {
            Ok(run) if run.exists() => run,
            Ok(_) => {
                gate.issue(format!(
                    "{scenario_id}/{substrate}: run pack not found at {}/{run_id}",
                    ctx.layout.runs_label()
                ));
                continue;
            }
            Err(err) => {
                gate.issue(format!("{scenario_id}/{substrate}: {err}"));
                continue;
            }
        };
        found += 1;
        gate.increment("runs_found");
        match ctx.evaluations.evaluate(&run) {
            Ok(result) => {
                if let Some(expected) = scenario.expected_verdict
                    && expected != result.topline_verdict
                {
                    gate.increment("expectation_mismatches");
                    gate.issue(format!(
                        "{scenario_id}/{substrate}: expected {expected} topline, got {}",
                        result.topline_verdict
                    ));
                }
                keys.push(SubstrateKey {
                    substrate: substrate.clone(),
                    topline: result.topline_verdict,
                    key: parity_key(&result),
                });
            }
            Err(err) => {
                failed += 1;
                gate.issue(format!("{scenario_id}/{substrate}: evaluation failed ({err})"));
            }
        }
    }
    (keys, found, failed)
}

/// Converts a length to a counter value.
fn as_counter(len: usize) -> u64 {
    u64::try_from(len).unwrap_or(u64::MAX)
}

/// Returns true when `part / whole` exceeds `ratio`; an empty whole never does.
#[allow(clippy::cast_precision_loss, reason = "Counters are far below 2^52.")]
pub(crate) fn ratio_exceeded(part: u64, whole: u64, ratio: f64) -> bool {
    whole > 0 && (part as f64) > (whole as f64) * ratio
}
