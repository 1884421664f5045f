// crates/evidence-gate-core/src/core/verdict.rs
// ============================================================================
// Module: Verdict Hashing
// Description: Fixed projection of evaluation results and its SHA-256 hash.
// Purpose: Make re-adjudication of identical evidence hash-identical.
// Dependencies: regex, crate::core::canonical, crate::core::evaluation
// ============================================================================

//! ## Overview
//! [`verdict_projection`] keeps only the frozen contract fields of an
//! [`EvaluationResult`]. Clauses are ordered by `clause_id`, pointers by
//! `(artifact_path, locator, content_hash)`, and messages are sanitized so
//! host paths and stack traces cannot leak into the hash. Timestamps, host
//! names, durations, notes, and pointer notes are never projected.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::core::canonical::CanonicalValue;
use crate::core::canonical::hash_canonical;
use crate::core::evaluation::ClauseVerdict;
use crate::core::evaluation::EvaluationResult;
use crate::core::evaluation::EvidencePointer;

// ============================================================================
// SECTION: Message Sanitization
// ============================================================================

/// Compiled sanitization patterns, applied in declaration order.
struct SanitizePatterns {
    /// Unix absolute paths.
    unix_path: Regex,
    /// Windows drive paths.
    windows_path: Regex,
    /// Stack trace frames (`at fn (file:line)`).
    stack_frame: Regex,
    /// Error headline followed by a newline.
    error_block: Regex,
    /// Whitespace runs.
    whitespace: Regex,
}

/// Sanitization patterns, compiled on first use.
#[allow(clippy::expect_used, reason = "The patterns are constant and compile on every target.")]
static PATTERNS: LazyLock<SanitizePatterns> = LazyLock::new(|| SanitizePatterns {
    unix_path: Regex::new(r"/[^\s:]+/[^\s:]*").expect("unix path regex is valid"),
    windows_path: Regex::new(r"[A-Za-z]:\\[^\s:]+\\[^\s:]*").expect("windows path regex is valid"),
    stack_frame: Regex::new(r"\s+at\s+[^\n]+").expect("stack frame regex is valid"),
    error_block: Regex::new(r"Error:.*\n(\s+at\s+.*\n)*").expect("error block regex is valid"),
    whitespace: Regex::new(r"\s+").expect("whitespace regex is valid"),
});

/// Removes host-specific content from a verdict message.
///
/// Absolute paths become `<path>`, stack frames are dropped, error blocks
/// collapse to `Error: <sanitized>`, and whitespace runs become one space.
#[must_use]
pub fn sanitize_message(message: &str) -> String {
    let patterns = &*PATTERNS;
    let text = patterns.unix_path.replace_all(message, "<path>");
    let text = patterns.windows_path.replace_all(&text, "<path>");
    let text = patterns.stack_frame.replace_all(&text, "");
    let text = patterns.error_block.replace_all(&text, "Error: <sanitized>");
    patterns.whitespace.replace_all(&text, " ").trim().to_string()
}

// ============================================================================
// SECTION: Projection
// ============================================================================

/// Builds the canonical projection hashed into the verdict hash.
#[must_use]
pub fn verdict_projection(result: &EvaluationResult) -> CanonicalValue {
    let mut clauses: Vec<&ClauseVerdict> = result.clauses.iter().collect();
    clauses.sort_by(|a, b| a.clause_id.as_bytes().cmp(b.clause_id.as_bytes()));

    let mut map = BTreeMap::new();
    map.insert("report_version".to_string(), result.report_version.as_str().into());
    map.insert("ruleset_version".to_string(), result.ruleset_version.as_str().into());
    map.insert("pack_id".to_string(), result.pack_id.as_str().into());
    map.insert("pack_root_hash".to_string(), result.pack_root_hash.as_str().into());
    map.insert("protocol_version".to_string(), result.protocol_version.as_str().into());
    map.insert("topline_verdict".to_string(), result.topline_verdict.as_str().into());
    if let Some(code) = &result.reason_code {
        map.insert("reason_code".to_string(), code.as_str().into());
    }
    map.insert(
        "clauses".to_string(),
        CanonicalValue::Array(clauses.into_iter().map(project_clause).collect()),
    );
    CanonicalValue::Map(map)
}

/// Projects one clause.
fn project_clause(clause: &ClauseVerdict) -> CanonicalValue {
    let mut pointers: Vec<&EvidencePointer> = clause.pointers.iter().collect();
    pointers.sort_by(|a, b| {
        a.artifact_path
            .as_bytes()
            .cmp(b.artifact_path.as_bytes())
            .then_with(|| a.locator.as_bytes().cmp(b.locator.as_bytes()))
            .then_with(|| a.content_hash.as_bytes().cmp(b.content_hash.as_bytes()))
    });

    let mut map = BTreeMap::new();
    map.insert("clause_id".to_string(), clause.clause_id.as_str().into());
    map.insert("status".to_string(), clause.status.as_str().into());
    map.insert("message".to_string(), sanitize_message(&clause.message).into());
    if let Some(requirement) = &clause.requirement_id {
        map.insert("requirement_id".to_string(), requirement.as_str().into());
    }
    if let Some(code) = &clause.reason_code {
        map.insert("reason_code".to_string(), code.as_str().into());
    }
    if let Some(taxonomy) = &clause.taxonomy {
        map.insert("taxonomy".to_string(), taxonomy.as_str().into());
    }
    map.insert(
        "pointers".to_string(),
        CanonicalValue::Array(pointers.into_iter().map(project_pointer).collect()),
    );
    CanonicalValue::Map(map)
}

/// Projects one evidence pointer; the note is dropped.
fn project_pointer(pointer: &EvidencePointer) -> CanonicalValue {
    let mut map = BTreeMap::new();
    map.insert("artifact_path".to_string(), pointer.artifact_path.as_str().into());
    map.insert("content_hash".to_string(), pointer.content_hash.as_str().into());
    map.insert("locator".to_string(), pointer.locator.as_str().into());
    CanonicalValue::Map(map)
}

// ============================================================================
// SECTION: Hashing
// ============================================================================

/// Computes the verdict hash of an evaluation result.
#[must_use]
pub fn compute_verdict_hash(result: &EvaluationResult) -> String {
    hash_canonical(&verdict_projection(result))
}
