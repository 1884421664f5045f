// crates/evidence-gate-core/src/runtime/gates/immutability.rs
// ============================================================================
// Module: Curated Immutability Gate
// Description: Schema and hash recomputation checks for curated runs.
// Purpose: Prove that published curated runs still match their evidence.
// Dependencies: regex, serde_json, crate::core
// ============================================================================

//! ## Overview
//! Each registry entry is checked against the curated schema (required
//! fields, enum values, scenario existence), reproduced claims must point at
//! a README with the required sections, and every recorded hash is
//! recomputed from the run directory: the pack root hash over `pack/`, the
//! verdict hash over `evaluation.report.json`, and the file hashes of both
//! stored reports.
//!
//! An empty or absent registry passes without reading the schema.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;

use regex::Regex;

use crate::core::corpus::CuratedEntry;
use crate::core::corpus::CuratedSchema;
use crate::core::corpus::RunHandle;
use crate::core::evaluation::EvaluationResult;
use crate::core::hashing::hash_file;
use crate::core::hashing::is_sha256_hex;
use crate::core::hashing::short_hash;
use crate::core::report::GateReport;
use crate::core::report::GateStatus;
use crate::core::report::RunningGate;
use crate::core::verdict::compute_verdict_hash;
use crate::runtime::gates::GateContext;
use crate::runtime::gates::GateError;
use crate::runtime::gates::GateKind;
use crate::runtime::gates::execute;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Claim level that requires a reproduction reference.
const REPRODUCED: &str = "reproduced";
/// Anchor a reproduction reference must carry.
const REPRO_ANCHOR: &str = "#repro-steps";

// ============================================================================
// SECTION: Gate
// ============================================================================

/// Runs the curated immutability gate.
#[must_use]
pub fn run(ctx: &GateContext<'_>) -> GateReport {
    execute(GateKind::CuratedImmutability, |gate| scan(ctx, gate))
}

/// Scans every registry entry.
fn scan(ctx: &GateContext<'_>, gate: &mut RunningGate) -> Result<GateStatus, GateError> {
    let registry = ctx.layout.load_registry()?;
    gate.set("entries_checked", 0);
    if registry.is_empty() {
        gate.set("issues", 0);
        return Ok(GateStatus::Pass);
    }
    let schema = ctx.layout.load_schema()?;
    for (index, entry) in registry.entries.iter().enumerate() {
        gate.increment("entries_checked");
        check_entry(ctx, &schema, entry, &entry.label(index + 1), gate);
    }
    let issues = u64::try_from(gate.issues().len()).unwrap_or(u64::MAX);
    gate.set("issues", issues);
    Ok(if issues == 0 { GateStatus::Pass } else { GateStatus::Fail })
}

/// Checks one entry; findings are appended to the gate.
fn check_entry(
    ctx: &GateContext<'_>,
    schema: &CuratedSchema,
    entry: &CuratedEntry,
    label: &str,
    gate: &mut RunningGate,
) {
    check_schema(ctx, schema, entry, label, gate);
    if entry.str_field("substrate_claim_level") == Some(REPRODUCED)
        && !check_reproduced(ctx, schema, entry, label, gate)
    {
        return;
    }
    let Some(run_id) = entry.run_id() else {
        return;
    };
    match ctx.layout.run(run_id) {
        Ok(run) if run.exists() => check_hashes(ctx, entry, &run, label, gate),
        Ok(_) => {}
        Err(err) => gate.issue(format!("{label}: {err}")),
    }
}

/// Required fields, enum values, and scenario existence.
fn check_schema(
    ctx: &GateContext<'_>,
    schema: &CuratedSchema,
    entry: &CuratedEntry,
    label: &str,
    gate: &mut RunningGate,
) {
    for field in &schema.required {
        if !entry.has_field(field) {
            gate.issue(format!("{label}: Missing required field '{field}'"));
        }
    }
    for constraint in &schema.enums {
        if let Some(value) = entry.scalar_field(&constraint.field)
            && !value.is_empty()
            && !constraint.allowed.contains(&value)
        {
            gate.issue(format!("{label}: Invalid {} '{value}'", constraint.field));
        }
    }
    let scenario_id = entry.scalar_field("scenario_id").unwrap_or_default();
    if !ctx.layout.scenario_exists(&scenario_id) {
        gate.issue(format!("{label}: scenario_id '{scenario_id}' not found in scenario registry"));
    }
}

/// Reproduction reference checks; returns false when hash checks must be skipped.
fn check_reproduced(
    ctx: &GateContext<'_>,
    schema: &CuratedSchema,
    entry: &CuratedEntry,
    label: &str,
    gate: &mut RunningGate,
) -> bool {
    let repro_ref = entry.str_field("repro_ref").map(str::trim).unwrap_or_default();
    if repro_ref.is_empty() {
        gate.issue(format!("{label}: repro_ref required for substrate_claim_level=reproduced"));
        return false;
    }
    if !repro_ref.contains(REPRO_ANCHOR) {
        gate.issue(format!("{label}: repro_ref must contain '{REPRO_ANCHOR}' anchor"));
    }
    let target = repro_ref.split('#').next().unwrap_or_default();
    let Some(path) = ctx.layout.resolve_relative(target).filter(|path| path.is_file()) else {
        gate.issue(format!("{label}: repro_ref target '{target}' not found"));
        return false;
    };
    let readme = match fs::read_to_string(&path) {
        Ok(readme) => readme,
        Err(err) => {
            gate.issue(format!("{label}: repro_ref target '{target}' unreadable ({err})"));
            return false;
        }
    };
    for section in &schema.readme_sections {
        let pattern = format!(r"(?i)#+\s*{}", regex::escape(section));
        if !Regex::new(&pattern).is_ok_and(|regex| regex.is_match(&readme)) {
            gate.issue(format!("{label}: repro_ref README missing section '{section}'"));
        }
    }
    true
}

/// Recomputes every recorded hash of a run.
fn check_hashes(
    ctx: &GateContext<'_>,
    entry: &CuratedEntry,
    run: &RunHandle,
    label: &str,
    gate: &mut RunningGate,
) {
    let expected_pack = entry.str_field("pack_root_hash").unwrap_or_default();
    if run.pack_dir().is_dir() {
        match ctx.hasher.compute(&run.pack_dir()) {
            Ok(digest) if digest.root_hash == expected_pack => {}
            Ok(digest) => gate.issue(format!(
                "{label}: pack_root_hash mismatch (expected {}..., computed {}...)",
                short_hash(expected_pack),
                short_hash(&digest.root_hash)
            )),
            Err(err) => {
                gate.issue(format!("{label}: pack_root_hash recomputation failed ({err})"));
            }
        }
    }

    let evaluation_path = run.evaluation_report_path();
    if evaluation_path.is_file() {
        let expected_verdict = entry.str_field("verdict_hash").unwrap_or_default();
        if is_sha256_hex(expected_verdict) {
            match read_evaluation(&evaluation_path) {
                Ok(result) => {
                    let computed = compute_verdict_hash(&result);
                    if computed != expected_verdict {
                        gate.issue(format!(
                            "{label}: verdict_hash mismatch (expected {}..., computed {}...)",
                            short_hash(expected_verdict),
                            short_hash(&computed)
                        ));
                    }
                }
                Err(reason) => {
                    gate.issue(format!("{label}: evaluation report unreadable ({reason})"));
                }
            }
        } else {
            gate.issue(format!("{label}: verdict_hash invalid format (must be 64-char hex)"));
        }
    }

    for (field, path) in [
        ("verify_report_hash", run.verify_report_path()),
        ("evaluation_report_hash", evaluation_path),
    ] {
        if !path.is_file() {
            continue;
        }
        match hash_file(&path) {
            Ok(computed) if Some(computed.as_str()) == entry.str_field(field) => {}
            Ok(_) => gate.issue(format!("{label}: {field} mismatch")),
            Err(err) => gate.issue(format!("{label}: {field} recomputation failed ({err})")),
        }
    }
}

/// Reads and parses a stored evaluation report.
fn read_evaluation(path: &Path) -> Result<EvaluationResult, String> {
    let bytes = fs::read(path).map_err(|err| err.to_string())?;
    serde_json::from_slice(&bytes).map_err(|err| err.to_string())
}
