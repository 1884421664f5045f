// crates/evidence-gate-core/src/interfaces/mod.rs
// ============================================================================
// Module: Evidence Gate Interfaces
// Description: Adjudication seam between gates and ruleset evaluators.
// Purpose: Let gates obtain evaluation results without knowing their origin.
// Dependencies: thiserror, crate::core
// ============================================================================

//! ## Overview
//! Gates that need an [`EvaluationResult`] obtain it through an
//! [`EvaluationSource`]. Implementations may read a stored report or run a
//! bundled ruleset; either way they must be deterministic for identical
//! evidence and fail closed on missing or malformed inputs.
//!
//! Security posture: run contents are untrusted; implementations must not
//! follow paths outside the run directory.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;

use thiserror::Error;

use crate::core::corpus::RunHandle;
use crate::core::evaluation::EvaluationResult;
use crate::core::pack::PackError;

// ============================================================================
// SECTION: Evaluation Source
// ============================================================================

/// Errors raised while obtaining an evaluation result.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum AdjudicationError {
    /// Run directory does not exist.
    #[error("run not found: {0}")]
    RunNotFound(String),
    /// Stored report is absent.
    #[error("evaluation report not found: {0}")]
    MissingReport(PathBuf),
    /// Input file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// File path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Input file is malformed.
    #[error("failed to parse {path}: {reason}")]
    Parse {
        /// File path.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },
    /// Pack hashing failed.
    #[error(transparent)]
    Pack(#[from] PackError),
}

/// Source of evaluation results for corpus runs.
pub trait EvaluationSource: Send + Sync {
    /// Returns the label recorded in audit events.
    fn name(&self) -> &'static str;

    /// Produces the evaluation result for a run.
    ///
    /// # Errors
    ///
    /// Returns [`AdjudicationError`] when the run cannot be evaluated.
    fn evaluate(&self, run: &RunHandle) -> Result<EvaluationResult, AdjudicationError>;
}
