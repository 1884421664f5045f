// crates/evidence-gate-core/src/runtime/adjudicator.rs
// ============================================================================
// Module: Evaluation Sources
// Description: Stored-report reader and the bundled offline ruleset 1.0.
// Purpose: Produce evaluation results for gates and third-party verification.
// Dependencies: serde_json, crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! [`StoredEvaluationSource`] trusts the `evaluation.report.json` a producer
//! wrote next to the pack. [`BundledRulesetSource`] re-adjudicates the pack
//! itself with ruleset 1.0, a fixed table of artifact requirements that needs
//! no network access and no external ruleset registry.
//!
//! Ruleset 1.0 output is fully determined by pack bytes: messages carry only
//! pack-relative paths and the non-deterministic fields are left empty.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io;
use std::path::Path;

use serde_json::Value;

use crate::core::corpus::RunHandle;
use crate::core::evaluation::ClauseVerdict;
use crate::core::evaluation::EvaluationResult;
use crate::core::evaluation::EvidencePointer;
use crate::core::evaluation::VerdictStatus;
use crate::core::hashing::hash_bytes;
use crate::core::pack::PackRootHasher;
use crate::core::verdict::compute_verdict_hash;
use crate::interfaces::AdjudicationError;
use crate::interfaces::EvaluationSource;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Version label of the bundled ruleset.
pub const BUNDLED_RULESET_VERSION: &str = "1.0";
/// Report format version emitted by the bundled ruleset.
pub const BUNDLED_REPORT_VERSION: &str = "1.0";
/// Pack manifest file.
pub const MANIFEST_FILE: &str = "manifest.json";
/// Fallback for identifiers absent from the manifest.
const UNKNOWN: &str = "unknown";

/// Reason code for missing or empty artifacts.
const REQUIRED_ARTIFACT_MISSING: &str = "REQUIRED_ARTIFACT_MISSING";
/// Reason code for unparseable artifacts.
const SCHEMA_VALIDATION_FAILED: &str = "SCHEMA_VALIDATION_FAILED";
/// Reason code for optional artifacts that are absent.
const NOT_EVALUATED: &str = "NOT_EVALUATED";
/// Topline reason code when a clause fails.
const CLAUSE_FAILED: &str = "CLAUSE_FAILED";

// ============================================================================
// SECTION: Stored Source
// ============================================================================

/// Reads the producer's stored `evaluation.report.json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoredEvaluationSource;

impl EvaluationSource for StoredEvaluationSource {
    fn name(&self) -> &'static str {
        "stored"
    }

    fn evaluate(&self, run: &RunHandle) -> Result<EvaluationResult, AdjudicationError> {
        if !run.exists() {
            return Err(AdjudicationError::RunNotFound(run.run_id().to_string()));
        }
        let path = run.evaluation_report_path();
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(AdjudicationError::MissingReport(path));
            }
            Err(source) => {
                return Err(AdjudicationError::Read {
                    path,
                    source,
                });
            }
        };
        serde_json::from_slice(&bytes).map_err(|err| AdjudicationError::Parse {
            path,
            reason: err.to_string(),
        })
    }
}

// ============================================================================
// SECTION: Bundled Source
// ============================================================================

/// Re-adjudicates each run's pack with the bundled ruleset 1.0.
#[derive(Debug, Clone, Default)]
pub struct BundledRulesetSource {
    /// Hasher used for the pack root hash.
    hasher: PackRootHasher,
}

impl BundledRulesetSource {
    /// Creates a source with an explicit pack hasher.
    #[must_use]
    pub const fn new(hasher: PackRootHasher) -> Self {
        Self {
            hasher,
        }
    }
}

impl EvaluationSource for BundledRulesetSource {
    fn name(&self) -> &'static str {
        "bundled"
    }

    fn evaluate(&self, run: &RunHandle) -> Result<EvaluationResult, AdjudicationError> {
        if !run.exists() {
            return Err(AdjudicationError::RunNotFound(run.run_id().to_string()));
        }
        adjudicate_ruleset_1_0(&run.pack_dir(), &self.hasher)
    }
}

// ============================================================================
// SECTION: Ruleset 1.0
// ============================================================================

/// How a requirement is checked.
#[derive(Debug, Clone, Copy)]
enum RequirementKind {
    /// File exists and is non-empty.
    File,
    /// JSON file resolves an RFC 6901 pointer.
    JsonPointer(&'static str),
    /// NDJSON file has a parseable line at the index.
    NdjsonLine(usize),
}

/// Whether a missing artifact fails the clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Severity {
    /// Missing fails.
    Required,
    /// Missing is not evaluated.
    Optional,
}

/// One row of the ruleset table.
struct Requirement {
    /// Requirement identifier, also used as clause identifier.
    id: &'static str,
    /// Pack-relative artifact path.
    path: &'static str,
    /// Check kind.
    kind: RequirementKind,
    /// Severity.
    severity: Severity,
}

/// Ruleset 1.0 requirement table.
const RULESET_1_0: &[Requirement] = &[
    Requirement {
        id: "RS10-R01",
        path: MANIFEST_FILE,
        kind: RequirementKind::File,
        severity: Severity::Required,
    },
    Requirement {
        id: "RS10-R02",
        path: MANIFEST_FILE,
        kind: RequirementKind::JsonPointer("/pack_id"),
        severity: Severity::Required,
    },
    Requirement {
        id: "RS10-R03",
        path: MANIFEST_FILE,
        kind: RequirementKind::JsonPointer("/protocol_version"),
        severity: Severity::Required,
    },
    Requirement {
        id: "RS10-R04",
        path: "integrity/sha256sums.txt",
        kind: RequirementKind::File,
        severity: Severity::Required,
    },
    Requirement {
        id: "RS10-R05",
        path: "integrity/pack.sha256",
        kind: RequirementKind::File,
        severity: Severity::Required,
    },
    Requirement {
        id: "RS10-R06",
        path: "timeline/events.ndjson",
        kind: RequirementKind::NdjsonLine(0),
        severity: Severity::Required,
    },
    Requirement {
        id: "RS10-R07",
        path: "artifacts/context.json",
        kind: RequirementKind::File,
        severity: Severity::Optional,
    },
];

/// Outcome of one requirement check before it becomes a clause.
struct CheckOutcome {
    /// Clause status.
    status: VerdictStatus,
    /// Reason code for non-PASS outcomes.
    reason_code: Option<&'static str>,
    /// Deterministic message.
    message: String,
}

impl CheckOutcome {
    /// Passing outcome.
    const fn pass(message: String) -> Self {
        Self {
            status: VerdictStatus::Pass,
            reason_code: None,
            message,
        }
    }

    /// Failing outcome.
    const fn fail(reason_code: &'static str, message: String) -> Self {
        Self {
            status: VerdictStatus::Fail,
            reason_code: Some(reason_code),
            message,
        }
    }

    /// Outcome for an absent artifact at the given severity.
    fn missing(severity: Severity, message: String) -> Self {
        match severity {
            Severity::Required => Self::fail(REQUIRED_ARTIFACT_MISSING, message),
            Severity::Optional => Self {
                status: VerdictStatus::NotEvaluated,
                reason_code: Some(NOT_EVALUATED),
                message,
            },
        }
    }
}

/// Reads a pack artifact; `None` when absent.
fn read_artifact(pack_dir: &Path, relative: &str) -> Result<Option<Vec<u8>>, AdjudicationError> {
    let path = pack_dir.join(relative);
    if !path.is_file() {
        return Ok(None);
    }
    fs::read(&path).map(Some).map_err(|source| AdjudicationError::Read {
        path,
        source,
    })
}

/// Checks one requirement against the artifact bytes.
fn check(requirement: &Requirement, bytes: Option<&[u8]>) -> CheckOutcome {
    let path = requirement.path;
    let Some(bytes) = bytes else {
        return CheckOutcome::missing(requirement.severity, format!("{path} is missing"));
    };
    if bytes.is_empty() {
        return CheckOutcome::fail(REQUIRED_ARTIFACT_MISSING, format!("{path} is empty"));
    }
    match requirement.kind {
        RequirementKind::File => CheckOutcome::pass(format!("{path} is present")),
        RequirementKind::JsonPointer(pointer) => match serde_json::from_slice::<Value>(bytes) {
            Err(_) => {
                CheckOutcome::fail(SCHEMA_VALIDATION_FAILED, format!("{path} is not valid JSON"))
            }
            Ok(document) if document.pointer(pointer).is_some() => {
                CheckOutcome::pass(format!("{path}#{pointer} resolves"))
            }
            Ok(_) => CheckOutcome::missing(
                requirement.severity,
                format!("{path}#{pointer} does not resolve"),
            ),
        },
        RequirementKind::NdjsonLine(index) => {
            let line =
                bytes.split(|byte| *byte == b'\n').nth(index).filter(|line| !line.is_empty());
            match line {
                None => CheckOutcome::missing(
                    requirement.severity,
                    format!("{path} has no line {index}"),
                ),
                Some(line) if serde_json::from_slice::<Value>(line).is_ok() => {
                    CheckOutcome::pass(format!("{path} line {index} parses"))
                }
                Some(_) => CheckOutcome::fail(
                    SCHEMA_VALIDATION_FAILED,
                    format!("{path} line {index} is not valid JSON"),
                ),
            }
        }
    }
}

/// Returns the locator string of a requirement.
fn locator(requirement: &Requirement) -> String {
    match requirement.kind {
        RequirementKind::File => format!("file:{}", requirement.path),
        RequirementKind::JsonPointer(pointer) => format!("json:{}#{pointer}", requirement.path),
        RequirementKind::NdjsonLine(index) => format!("ndjson:{}#{index}", requirement.path),
    }
}

/// Reads a string field from the manifest, if the manifest parses.
fn manifest_field(manifest: Option<&Value>, field: &str) -> String {
    manifest
        .and_then(|document| document.get(field))
        .and_then(Value::as_str)
        .unwrap_or(UNKNOWN)
        .to_string()
}

/// Adjudicates a pack directory with ruleset 1.0.
///
/// The result carries a freshly computed pack root hash and its own verdict
/// hash.
///
/// # Errors
///
/// Returns [`AdjudicationError`] when the pack cannot be hashed or an
/// artifact exists but cannot be read.
pub fn adjudicate_ruleset_1_0(
    pack_dir: &Path,
    hasher: &PackRootHasher,
) -> Result<EvaluationResult, AdjudicationError> {
    let digest = hasher.compute(pack_dir)?;

    let mut clauses = Vec::with_capacity(RULESET_1_0.len());
    let mut manifest: Option<Value> = None;
    let mut any_fail = false;
    for requirement in RULESET_1_0 {
        let bytes = read_artifact(pack_dir, requirement.path)?;
        if requirement.path == MANIFEST_FILE && manifest.is_none() {
            manifest = bytes.as_deref().and_then(|raw| serde_json::from_slice(raw).ok());
        }
        let outcome = check(requirement, bytes.as_deref());
        any_fail |= outcome.status == VerdictStatus::Fail;
        clauses.push(ClauseVerdict {
            clause_id: requirement.id.to_string(),
            requirement_id: Some(requirement.id.to_string()),
            status: outcome.status,
            reason_code: outcome.reason_code.map(ToString::to_string),
            message: outcome.message,
            taxonomy: outcome.reason_code.map(ToString::to_string),
            pointers: vec![EvidencePointer {
                artifact_path: requirement.path.to_string(),
                content_hash: bytes.as_deref().map(hash_bytes).unwrap_or_default(),
                locator: locator(requirement),
                note: None,
            }],
        });
    }

    // Only optional clauses can be NOT_EVALUATED, so they never move the topline.
    let (topline_verdict, reason_code) = if any_fail {
        (VerdictStatus::Fail, Some(CLAUSE_FAILED.to_string()))
    } else {
        (VerdictStatus::Pass, None)
    };

    let mut result = EvaluationResult {
        report_version: BUNDLED_REPORT_VERSION.to_string(),
        ruleset_version: BUNDLED_RULESET_VERSION.to_string(),
        pack_id: manifest_field(manifest.as_ref(), "pack_id"),
        pack_root_hash: digest.root_hash,
        protocol_version: manifest_field(manifest.as_ref(), "protocol_version"),
        topline_verdict,
        reason_code,
        clauses,
        verdict_hash: None,
        evaluated_at: None,
        duration_ms: None,
        host: None,
        notes: None,
    };
    result.verdict_hash = Some(compute_verdict_hash(&result));
    Ok(result)
}
