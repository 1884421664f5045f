// crates/evidence-gate-core/src/runtime/gates/mod.rs
// ============================================================================
// Module: Consistency Gates
// Description: Gate identifiers, shared inputs, and per-gate entry points.
// Purpose: Run independent corpus checks that each yield one gate report.
// Dependencies: thiserror, crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Every gate reads the corpus through a shared [`GateContext`] and returns a
//! finalized [`GateReport`]. Gates never share mutable state, so the engine
//! may run them concurrently. Per-run problems become attributed issues and
//! the scan continues; only a condition that prevents the gate from running
//! at all (for example a missing schema) yields `ERROR`.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod coverage;
pub mod immutability;
pub mod parity;
pub mod reason_codes;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use thiserror::Error;

use crate::core::corpus::CorpusError;
use crate::core::corpus::CorpusLayout;
use crate::core::pack::PackRootHasher;
use crate::core::report::GateReport;
use crate::core::report::GateStatus;
use crate::core::report::PendingGate;
use crate::core::report::RunningGate;
use crate::core::taxonomy::TaxonomyClassifier;
use crate::interfaces::EvaluationSource;
use crate::runtime::gates::coverage::CoveragePolicy;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default share of missing matrix runs above which parity fails.
pub const DEFAULT_FAIL_MISSING_RATIO: f64 = 0.9;
/// Default coverage phase label.
pub const DEFAULT_COVERAGE_PHASE: &str = "A";

// ============================================================================
// SECTION: Gate Identifiers
// ============================================================================

/// Known gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GateKind {
    /// Curated registry schema and hash recomputation.
    CuratedImmutability,
    /// Reason-code taxonomy conformance.
    ReasonCodes,
    /// Clause-vector parity across substrates.
    CrossSubstrate,
    /// Canonical pointer coverage.
    PointerCoverage,
}

impl GateKind {
    /// Every gate in default execution order.
    pub const ALL: [Self; 4] =
        [Self::CuratedImmutability, Self::ReasonCodes, Self::CrossSubstrate, Self::PointerCoverage];

    /// Returns the stable gate identifier.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::CuratedImmutability => "curated-immutability",
            Self::ReasonCodes => "reason-codes",
            Self::CrossSubstrate => "cross-substrate",
            Self::PointerCoverage => "pointer-coverage",
        }
    }

    /// Parses a gate identifier.
    #[must_use]
    pub fn parse(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.id() == id)
    }

    /// Runs the gate against the shared context.
    #[must_use]
    pub fn run(self, ctx: &GateContext<'_>) -> GateReport {
        match self {
            Self::CuratedImmutability => immutability::run(ctx),
            Self::ReasonCodes => reason_codes::run(ctx),
            Self::CrossSubstrate => parity::run(ctx),
            Self::PointerCoverage => coverage::run(ctx),
        }
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

// ============================================================================
// SECTION: Shared Inputs
// ============================================================================

/// Gate thresholds and labels.
#[derive(Debug, Clone, PartialEq)]
pub struct GateSettings {
    /// Coverage phase label reported in findings.
    pub coverage_phase: String,
    /// Coverage policy.
    pub coverage_policy: CoveragePolicy,
    /// Share of missing matrix runs above which parity fails.
    pub fail_missing_ratio: f64,
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            coverage_phase: DEFAULT_COVERAGE_PHASE.to_string(),
            coverage_policy: CoveragePolicy::default(),
            fail_missing_ratio: DEFAULT_FAIL_MISSING_RATIO,
        }
    }
}

/// Read-only inputs shared by all gates of one invocation.
#[derive(Clone, Copy)]
pub struct GateContext<'a> {
    /// Corpus layout.
    pub layout: &'a CorpusLayout,
    /// Pack hasher.
    pub hasher: &'a PackRootHasher,
    /// Reason-code classifier.
    pub classifier: &'a TaxonomyClassifier,
    /// Evaluation source.
    pub evaluations: &'a dyn EvaluationSource,
    /// Thresholds.
    pub settings: &'a GateSettings,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Conditions that prevent a gate from running.
#[derive(Debug, Error)]
pub enum GateError {
    /// Corpus input is missing or malformed.
    #[error(transparent)]
    Corpus(#[from] CorpusError),
}

/// Starts a gate, runs `scan`, and finalizes the report.
///
/// `scan` returns the terminal status; an error finalizes the gate as `ERROR`
/// with the cause appended to its issues.
pub(crate) fn execute<F>(kind: GateKind, scan: F) -> GateReport
where
    F: FnOnce(&mut RunningGate) -> Result<GateStatus, GateError>,
{
    let mut gate = PendingGate::new(kind.id()).start();
    match scan(&mut gate) {
        Ok(status) => gate.finish(status),
        Err(err) => gate.error(err.to_string()),
    }
}
