// crates/evidence-gate-core/src/runtime/gates/coverage.rs
// ============================================================================
// Module: Evidence Pointer Coverage Gate
// Description: Canonical pointer coverage over matrix runs.
// Purpose: Track adoption of canonical evidence pointers by producers.
// Dependencies: serde, serde_json, crate::core
// ============================================================================

//! ## Overview
//! Pointers of a run come from `evidence_pointers.json` when present and are
//! otherwise extracted from the pack trace. [`measure_coverage`] only counts;
//! the pass criteria live in a [`CoveragePolicy`] chosen by configuration,
//! so a corpus can move from a per-run minimum to a percentage threshold
//! without code changes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::canonptr::extract_from_trace;
use crate::core::canonptr::is_canonical;
use crate::core::corpus::CorpusLayout;
use crate::core::report::GateReport;
use crate::core::report::GateStatus;
use crate::core::report::RunningGate;
use crate::runtime::gates::GateContext;
use crate::runtime::gates::GateError;
use crate::runtime::gates::GateKind;
use crate::runtime::gates::execute;
use crate::runtime::gates::parity::ratio_exceeded;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default minimum canonical pointers per run.
pub const DEFAULT_MIN_PER_RUN: u64 = 1;
/// Default share of short runs above which coverage is not supported.
pub const DEFAULT_NOT_SUPPORTED_RATIO: f64 = 0.5;

// ============================================================================
// SECTION: Policy
// ============================================================================

/// Pass criteria applied to a coverage measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CoveragePolicy {
    /// Every error-free run needs at least `min_per_run` canonical pointers.
    MinPerRun {
        /// Minimum canonical pointers per run.
        min_per_run: u64,
        /// Share of short runs above which the gate is `NOT_SUPPORTED`.
        not_supported_ratio: f64,
    },
    /// Corpus-wide canonical share must reach `min_percent`.
    MinPercent {
        /// Minimum coverage percentage.
        min_percent: u64,
    },
}

impl Default for CoveragePolicy {
    fn default() -> Self {
        Self::MinPerRun {
            min_per_run: DEFAULT_MIN_PER_RUN,
            not_supported_ratio: DEFAULT_NOT_SUPPORTED_RATIO,
        }
    }
}

// ============================================================================
// SECTION: Measurement
// ============================================================================

/// Reason a run could not be measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunPointerError {
    /// Run directory is absent or the identifier is invalid.
    RunNotFound,
    /// Pointer listing is unreadable.
    ParseError,
    /// Trace is unreadable.
    TraceParseError,
    /// Neither a pointer listing nor a trace exists.
    NoEvidenceOrTrace,
}

impl RunPointerError {
    /// Returns the wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RunNotFound => "RUN_NOT_FOUND",
            Self::ParseError => "PARSE_ERROR",
            Self::TraceParseError => "TRACE_PARSE_ERROR",
            Self::NoEvidenceOrTrace => "NO_EVIDENCE_OR_TRACE",
        }
    }
}

/// Pointer counts of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCoverage {
    /// Run identifier.
    pub run_id: String,
    /// Canonical pointers.
    pub canonptr_count: u64,
    /// All pointers.
    pub total_pointers: u64,
    /// Whether pointers were extracted from the trace.
    pub extracted_from_trace: bool,
    /// Measurement failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RunPointerError>,
}

impl RunCoverage {
    /// Creates an errored measurement.
    fn errored(run_id: &str, error: RunPointerError) -> Self {
        Self {
            run_id: run_id.to_string(),
            canonptr_count: 0,
            total_pointers: 0,
            extracted_from_trace: false,
            error: Some(error),
        }
    }
}

/// Corpus-wide pointer counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageMeasurement {
    /// Runs measured.
    pub total_runs: u64,
    /// Error-free runs with at least one canonical pointer.
    pub runs_with_canonptr: u64,
    /// Error-free runs without canonical pointers.
    pub runs_without_canonptr: u64,
    /// Runs that could not be measured.
    pub runs_errored: u64,
    /// All pointers.
    pub total_pointers: u64,
    /// Canonical pointers.
    pub canonptr_pointers: u64,
    /// Rounded canonical share in percent; zero without pointers.
    pub coverage_pct: u64,
}

/// Measures the pointers of one run.
#[must_use]
pub fn measure_run(layout: &CorpusLayout, run_id: &str) -> RunCoverage {
    let run = match layout.run(run_id) {
        Ok(run) if run.exists() => run,
        _ => return RunCoverage::errored(run_id, RunPointerError::RunNotFound),
    };
    let listing = run.evidence_pointers_path();
    if listing.is_file() {
        return read_listing(&listing).map_or_else(
            || RunCoverage::errored(run_id, RunPointerError::ParseError),
            |(canonptr_count, total_pointers)| RunCoverage {
                run_id: run_id.to_string(),
                canonptr_count,
                total_pointers,
                extracted_from_trace: false,
                error: None,
            },
        );
    }
    let trace = run.trace_events_path();
    if trace.is_file() {
        return read_trace(&trace).map_or_else(
            || RunCoverage::errored(run_id, RunPointerError::TraceParseError),
            |count| RunCoverage {
                run_id: run_id.to_string(),
                canonptr_count: count,
                total_pointers: count,
                extracted_from_trace: true,
                error: None,
            },
        );
    }
    RunCoverage::errored(run_id, RunPointerError::NoEvidenceOrTrace)
}

/// Counts `(canonical, total)` pointers of `{pointers: [{locator|pointer}]}`.
fn read_listing(path: &Path) -> Option<(u64, u64)> {
    let bytes = fs::read(path).ok()?;
    let document: Value = serde_json::from_slice(&bytes).ok()?;
    let pointers = match document.get("pointers") {
        None | Some(Value::Null) => return Some((0, 0)),
        Some(value) => value.as_array()?,
    };
    let canonical = pointers
        .iter()
        .filter(|pointer| {
            ["locator", "pointer"]
                .iter()
                .filter_map(|key| pointer.get(*key).and_then(Value::as_str))
                .find(|text| !text.is_empty())
                .is_some_and(is_canonical)
        })
        .count();
    Some((to_counter(canonical), to_counter(pointers.len())))
}

/// Counts canonical pointers extracted from an NDJSON trace.
fn read_trace(path: &Path) -> Option<u64> {
    let text = fs::read_to_string(path).ok()?;
    let events = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(serde_json::from_str::<Value>)
        .collect::<Result<Vec<_>, _>>()
        .ok()?;
    Some(to_counter(extract_from_trace(&events).len()))
}

/// Folds per-run counts into corpus totals.
#[must_use]
pub fn measure_coverage(runs: &[RunCoverage]) -> CoverageMeasurement {
    let mut measurement = CoverageMeasurement {
        total_runs: to_counter(runs.len()),
        ..CoverageMeasurement::default()
    };
    for run in runs {
        if run.error.is_some() {
            measurement.runs_errored += 1;
            continue;
        }
        measurement.total_pointers += run.total_pointers;
        measurement.canonptr_pointers += run.canonptr_count;
        if run.canonptr_count > 0 {
            measurement.runs_with_canonptr += 1;
        } else {
            measurement.runs_without_canonptr += 1;
        }
    }
    measurement.coverage_pct =
        rounded_percent(measurement.canonptr_pointers, measurement.total_pointers);
    measurement
}

/// Rounds `part / whole * 100` half up; zero when `whole` is zero.
const fn rounded_percent(part: u64, whole: u64) -> u64 {
    if whole == 0 {
        return 0;
    }
    (part.saturating_mul(200) + whole) / (whole * 2)
}

/// Converts a length to a counter value.
fn to_counter(len: usize) -> u64 {
    u64::try_from(len).unwrap_or(u64::MAX)
}

// ============================================================================
// SECTION: Gate
// ============================================================================

/// Runs the pointer coverage gate.
#[must_use]
pub fn run(ctx: &GateContext<'_>) -> GateReport {
    execute(GateKind::PointerCoverage, |gate| scan(ctx, gate))
}

/// Measures every matrix run and applies the policy.
fn scan(ctx: &GateContext<'_>, gate: &mut RunningGate) -> Result<GateStatus, GateError> {
    let matrix = ctx.layout.load_matrix()?;
    let runs: Vec<RunCoverage> =
        matrix.run_ids().iter().map(|run_id| measure_run(ctx.layout, run_id)).collect();
    let measurement = measure_coverage(&runs);
    gate.set("total_runs", measurement.total_runs);
    gate.set("runs_with_canonptr", measurement.runs_with_canonptr);
    gate.set("runs_without_canonptr", measurement.runs_without_canonptr);
    gate.set("runs_errored", measurement.runs_errored);
    gate.set("total_pointers", measurement.total_pointers);
    gate.set("canonptr_pointers", measurement.canonptr_pointers);
    gate.set("coverage_pct", measurement.coverage_pct);

    for run in &runs {
        if let Some(error) = run.error {
            gate.issue(format!("{}: {}", run.run_id, error.as_str()));
        }
    }

    let phase = &ctx.settings.coverage_phase;
    let status = match ctx.settings.coverage_policy {
        CoveragePolicy::MinPerRun {
            min_per_run,
            not_supported_ratio,
        } => {
            // Errored runs yield no pointers and are already reported above.
            let mut short = measurement.runs_errored;
            for run in runs.iter().filter(|run| run.error.is_none()) {
                if run.canonptr_count < min_per_run {
                    short += 1;
                    gate.issue(format!(
                        "{}: {} canonptr (phase {phase} requires >= {min_per_run})",
                        run.run_id, run.canonptr_count
                    ));
                }
            }
            if ratio_exceeded(short, measurement.total_runs, not_supported_ratio) {
                GateStatus::NotSupported
            } else if short > 0 {
                GateStatus::Partial
            } else {
                GateStatus::Pass
            }
        }
        CoveragePolicy::MinPercent {
            min_percent,
        } => {
            if measurement.coverage_pct < min_percent {
                gate.issue(format!(
                    "coverage {}% < required {min_percent}% (phase {phase})",
                    measurement.coverage_pct
                ));
                GateStatus::Fail
            } else {
                GateStatus::Pass
            }
        }
    };
    Ok(status)
}
