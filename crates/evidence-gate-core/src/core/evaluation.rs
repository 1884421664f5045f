// crates/evidence-gate-core/src/core/evaluation.rs
// ============================================================================
// Module: Evaluation Result Model
// Description: Structured verdicts produced by ruleset adjudicators.
// Purpose: Define the input shape consumed by verdict hashing and gates.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! An [`EvaluationResult`] carries the identifiers of an adjudication, the
//! topline verdict, and one [`ClauseVerdict`] per evaluated clause. Fields such
//! as `evaluated_at` and `host` are carried for display only and never reach
//! the verdict hash.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Status
// ============================================================================

/// Verdict status of a clause or of the whole evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerdictStatus {
    /// Requirement satisfied.
    Pass,
    /// Requirement violated.
    Fail,
    /// Requirement could not be evaluated.
    NotEvaluated,
}

impl VerdictStatus {
    /// Returns the wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::NotEvaluated => "NOT_EVALUATED",
        }
    }
}

impl fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Evaluation Result
// ============================================================================

/// Locator of the evidence backing a clause verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidencePointer {
    /// Pack-relative path of the artifact.
    pub artifact_path: String,
    /// SHA-256 of the artifact bytes (empty when the artifact is absent).
    #[serde(default)]
    pub content_hash: String,
    /// Locator within the artifact.
    pub locator: String,
    /// Free-form note; never hashed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Verdict of a single clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClauseVerdict {
    /// Clause identifier.
    pub clause_id: String,
    /// Requirement identifier the clause belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirement_id: Option<String>,
    /// Clause status.
    pub status: VerdictStatus,
    /// Reason code for non-PASS outcomes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason_code: Option<String>,
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
    /// Failure taxonomy tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxonomy: Option<String>,
    /// Evidence pointers in producer order.
    #[serde(default)]
    pub pointers: Vec<EvidencePointer>,
}

/// Structured result of adjudicating one evidence pack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Report format version.
    pub report_version: String,
    /// Ruleset version used.
    pub ruleset_version: String,
    /// Evidence pack identifier.
    pub pack_id: String,
    /// Root hash of the adjudicated pack.
    pub pack_root_hash: String,
    /// Protocol version declared by the pack.
    pub protocol_version: String,
    /// Topline verdict.
    pub topline_verdict: VerdictStatus,
    /// Topline reason code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason_code: Option<String>,
    /// Clause verdicts.
    #[serde(default)]
    pub clauses: Vec<ClauseVerdict>,
    /// Stored verdict hash, compared against recomputation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verdict_hash: Option<String>,
    /// Wall-clock evaluation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluated_at: Option<String>,
    /// Evaluation duration in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Host that produced the evaluation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Free-form notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}
