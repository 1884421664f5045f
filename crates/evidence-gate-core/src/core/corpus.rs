// crates/evidence-gate-core/src/core/corpus.rs
// ============================================================================
// Module: Evidence Corpus Layout
// Description: Paths, run handles, and registries of an evidence corpus.
// Purpose: Resolve corpus inputs without letting identifiers escape the root.
// Dependencies: serde, serde_yaml, thiserror
// ============================================================================

//! ## Overview
//! A corpus is a directory tree holding evidence runs, the curated run
//! registry, its schema, scenario definitions, and the substrate matrix.
//! Every location is relative to the corpus root and configurable.
//!
//! Security posture: run identifiers and registry references are untrusted.
//! Run identifiers are validated before any path is joined, and relative
//! references containing `..` or absolute components are rejected.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use serde_yaml::Mapping;
use serde_yaml::Value as YamlValue;
use thiserror::Error;

use crate::core::evaluation::VerdictStatus;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default runs directory.
pub const DEFAULT_RUNS_DIR: &str = "data/runs";
/// Default curated registry file.
pub const DEFAULT_CURATED_REGISTRY: &str = "data/curated-runs/allowlist.yaml";
/// Default curated schema file.
pub const DEFAULT_CURATED_SCHEMA: &str = "governance/schemas/curated-run.schema.yaml";
/// Default scenario registry directory.
pub const DEFAULT_SCENARIOS_DIR: &str = "data/scenarios";
/// Default substrate matrix file.
pub const DEFAULT_SUBSTRATE_MATRIX: &str = "producers/contract/matrix.yaml";

/// Pack directory inside a run.
pub const RUN_PACK_DIR: &str = "pack";
/// Stored evaluation report inside a run.
pub const EVALUATION_REPORT_FILE: &str = "evaluation.report.json";
/// Stored verification report inside a run.
pub const VERIFY_REPORT_FILE: &str = "verify.report.json";
/// Evidence pointer listing inside a run.
pub const EVIDENCE_POINTERS_FILE: &str = "evidence_pointers.json";
/// Trace events inside a run pack.
pub const TRACE_EVENTS_FILE: &str = "trace/events.ndjson";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while resolving corpus inputs.
#[derive(Debug, Error)]
pub enum CorpusError {
    /// Run identifier failed validation.
    #[error("invalid run id '{0}'")]
    InvalidRunId(String),
    /// Required corpus file is absent.
    #[error("corpus file not found: {0}")]
    Missing(PathBuf),
    /// Corpus file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// File path.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// Corpus file is malformed.
    #[error("failed to parse {path}: {reason}")]
    Parse {
        /// File path.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },
}

// ============================================================================
// SECTION: Run Identifiers
// ============================================================================

/// Validates a run identifier.
///
/// Accepted identifiers are non-empty, use only `[A-Za-z0-9._-]`, and never
/// contain `..`.
///
/// # Errors
///
/// Returns [`CorpusError::InvalidRunId`] when the identifier is rejected.
pub fn validate_run_id(run_id: &str) -> Result<(), CorpusError> {
    let charset_ok = !run_id.is_empty()
        && run_id.bytes().all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'));
    if !charset_ok || run_id.contains("..") {
        return Err(CorpusError::InvalidRunId(run_id.to_string()));
    }
    Ok(())
}

/// Handle to one validated run directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunHandle {
    /// Run identifier.
    run_id: String,
    /// Run directory.
    dir: PathBuf,
}

impl RunHandle {
    /// Creates a handle for `run_id` under `runs_root`.
    ///
    /// # Errors
    ///
    /// Returns [`CorpusError::InvalidRunId`] when the identifier is rejected.
    pub fn new(runs_root: &Path, run_id: &str) -> Result<Self, CorpusError> {
        validate_run_id(run_id)?;
        Ok(Self {
            run_id: run_id.to_string(),
            dir: runs_root.join(run_id),
        })
    }

    /// Returns the run identifier.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Returns the run directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns true when the run directory exists.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.dir.is_dir()
    }

    /// Returns the evidence pack directory.
    #[must_use]
    pub fn pack_dir(&self) -> PathBuf {
        self.dir.join(RUN_PACK_DIR)
    }

    /// Returns the stored evaluation report path.
    #[must_use]
    pub fn evaluation_report_path(&self) -> PathBuf {
        self.dir.join(EVALUATION_REPORT_FILE)
    }

    /// Returns the stored verification report path.
    #[must_use]
    pub fn verify_report_path(&self) -> PathBuf {
        self.dir.join(VERIFY_REPORT_FILE)
    }

    /// Returns the evidence pointer listing path.
    #[must_use]
    pub fn evidence_pointers_path(&self) -> PathBuf {
        self.dir.join(EVIDENCE_POINTERS_FILE)
    }

    /// Returns the trace events path.
    #[must_use]
    pub fn trace_events_path(&self) -> PathBuf {
        self.pack_dir().join(TRACE_EVENTS_FILE)
    }
}

// ============================================================================
// SECTION: Layout
// ============================================================================

/// Locations of corpus inputs, relative to `root`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusLayout {
    /// Corpus root directory.
    pub root: PathBuf,
    /// Runs directory.
    pub runs_dir: PathBuf,
    /// Curated registry file.
    pub curated_registry: PathBuf,
    /// Curated schema file.
    pub curated_schema: PathBuf,
    /// Scenario registry directory.
    pub scenarios_dir: PathBuf,
    /// Substrate matrix file.
    pub substrate_matrix: PathBuf,
}

impl CorpusLayout {
    /// Creates a layout with default locations under `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            runs_dir: PathBuf::from(DEFAULT_RUNS_DIR),
            curated_registry: PathBuf::from(DEFAULT_CURATED_REGISTRY),
            curated_schema: PathBuf::from(DEFAULT_CURATED_SCHEMA),
            scenarios_dir: PathBuf::from(DEFAULT_SCENARIOS_DIR),
            substrate_matrix: PathBuf::from(DEFAULT_SUBSTRATE_MATRIX),
        }
    }

    /// Returns the absolute runs directory.
    #[must_use]
    pub fn runs_path(&self) -> PathBuf {
        self.root.join(&self.runs_dir)
    }

    /// Returns the display form of the runs directory used in findings.
    #[must_use]
    pub fn runs_label(&self) -> String {
        self.runs_dir.to_string_lossy().replace('\\', "/")
    }

    /// Returns the absolute curated registry path.
    #[must_use]
    pub fn curated_registry_path(&self) -> PathBuf {
        self.root.join(&self.curated_registry)
    }

    /// Returns the absolute curated schema path.
    #[must_use]
    pub fn curated_schema_path(&self) -> PathBuf {
        self.root.join(&self.curated_schema)
    }

    /// Returns the absolute substrate matrix path.
    #[must_use]
    pub fn substrate_matrix_path(&self) -> PathBuf {
        self.root.join(&self.substrate_matrix)
    }

    /// Returns a handle for `run_id`.
    ///
    /// # Errors
    ///
    /// Returns [`CorpusError::InvalidRunId`] when the identifier is rejected.
    pub fn run(&self, run_id: &str) -> Result<RunHandle, CorpusError> {
        RunHandle::new(&self.runs_path(), run_id)
    }

    /// Returns true when `data/scenarios/<scenario_id>.yaml` exists.
    #[must_use]
    pub fn scenario_exists(&self, scenario_id: &str) -> bool {
        validate_run_id(scenario_id).is_ok()
            && self.root.join(&self.scenarios_dir).join(format!("{scenario_id}.yaml")).is_file()
    }

    /// Resolves a corpus-relative reference; absolute or escaping paths yield `None`.
    #[must_use]
    pub fn resolve_relative(&self, reference: &str) -> Option<PathBuf> {
        let relative = Path::new(reference);
        let contained = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
        (!reference.is_empty() && contained).then(|| self.root.join(relative))
    }

    /// Loads the curated registry; an absent file yields an empty registry.
    ///
    /// # Errors
    ///
    /// Returns [`CorpusError`] when the file cannot be read or parsed.
    pub fn load_registry(&self) -> Result<CuratedRegistry, CorpusError> {
        let path = self.curated_registry_path();
        if !path.exists() {
            return Ok(CuratedRegistry::default());
        }
        let text = read_text(&path)?;
        if text.trim().is_empty() {
            return Ok(CuratedRegistry::default());
        }
        let raw: RawRegistry = parse_yaml(&text, &path)?;
        Ok(CuratedRegistry {
            entries: raw.runs.unwrap_or_default().into_iter().map(CuratedEntry::new).collect(),
        })
    }

    /// Loads the curated schema.
    ///
    /// # Errors
    ///
    /// Returns [`CorpusError::Missing`] when the schema is absent and other
    /// [`CorpusError`] variants when it cannot be read or parsed.
    pub fn load_schema(&self) -> Result<CuratedSchema, CorpusError> {
        let path = self.curated_schema_path();
        if !path.is_file() {
            return Err(CorpusError::Missing(path));
        }
        let text = read_text(&path)?;
        let raw: RawSchema = parse_yaml(&text, &path)?;
        CuratedSchema::from_raw(raw, &path)
    }

    /// Loads the substrate matrix.
    ///
    /// # Errors
    ///
    /// Returns [`CorpusError::Missing`] when the matrix is absent and other
    /// [`CorpusError`] variants when it cannot be read or parsed.
    pub fn load_matrix(&self) -> Result<SubstrateMatrix, CorpusError> {
        let path = self.substrate_matrix_path();
        if !path.is_file() {
            return Err(CorpusError::Missing(path));
        }
        let text = read_text(&path)?;
        parse_yaml(&text, &path)
    }
}

/// Reads a UTF-8 corpus file.
fn read_text(path: &Path) -> Result<String, CorpusError> {
    fs::read_to_string(path).map_err(|source| CorpusError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses YAML text and attaches the source path to failures.
fn parse_yaml<T: for<'de> Deserialize<'de>>(text: &str, path: &Path) -> Result<T, CorpusError> {
    serde_yaml::from_str(text).map_err(|err| CorpusError::Parse {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })
}

// ============================================================================
// SECTION: Curated Registry
// ============================================================================

/// On-disk registry shape.
#[derive(Debug, Deserialize)]
struct RawRegistry {
    /// Registered runs.
    #[serde(default)]
    runs: Option<Vec<Mapping>>,
}

/// Registered curated runs in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CuratedRegistry {
    /// Registry entries.
    pub entries: Vec<CuratedEntry>,
}

impl CuratedRegistry {
    /// Returns true when no runs are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One curated run entry, kept as raw fields so schema checks see what was written.
#[derive(Debug, Clone, PartialEq)]
pub struct CuratedEntry {
    /// Entry fields.
    fields: Mapping,
}

impl CuratedEntry {
    /// Wraps raw entry fields.
    #[must_use]
    pub const fn new(fields: Mapping) -> Self {
        Self {
            fields,
        }
    }

    /// Returns true when the entry declares `name`, even with a null value.
    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Returns a string field.
    #[must_use]
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(YamlValue::as_str)
    }

    /// Renders a scalar field as text; sequences, maps, and null yield `None`.
    #[must_use]
    pub fn scalar_field(&self, name: &str) -> Option<String> {
        match self.fields.get(name)? {
            YamlValue::String(text) => Some(text.clone()),
            YamlValue::Bool(flag) => Some(flag.to_string()),
            YamlValue::Number(number) => Some(number.to_string()),
            _ => None,
        }
    }

    /// Returns the declared run identifier.
    #[must_use]
    pub fn run_id(&self) -> Option<&str> {
        self.str_field("run_id").filter(|id| !id.is_empty())
    }

    /// Returns the label used in findings; `position` is one-based.
    #[must_use]
    pub fn label(&self, position: usize) -> String {
        self.run_id().map_or_else(|| format!("entry_{position}"), ToString::to_string)
    }
}

// ============================================================================
// SECTION: Curated Schema
// ============================================================================

/// On-disk schema shape.
#[derive(Debug, Deserialize)]
struct RawSchema {
    /// Required field names.
    #[serde(default)]
    required: Vec<String>,
    /// Enum constraints by field.
    #[serde(default)]
    enums: Mapping,
    /// Constraints for reproduced claims.
    #[serde(default)]
    reproduced_constraints: Option<RawReproduced>,
}

/// On-disk reproduced-claim constraints.
#[derive(Debug, Deserialize)]
struct RawReproduced {
    /// README headings required by `repro_ref` targets.
    #[serde(default)]
    repro_readme_required_sections: Vec<String>,
}

/// Allowed values for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumConstraint {
    /// Constrained field.
    pub field: String,
    /// Allowed values.
    pub allowed: Vec<String>,
}

/// Schema applied to curated registry entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CuratedSchema {
    /// Fields every entry must declare.
    pub required: Vec<String>,
    /// Enum constraints in declaration order.
    pub enums: Vec<EnumConstraint>,
    /// README sections required for reproduced claims.
    pub readme_sections: Vec<String>,
}

impl CuratedSchema {
    /// Converts the raw schema, keeping enum declaration order.
    fn from_raw(raw: RawSchema, path: &Path) -> Result<Self, CorpusError> {
        let mut enums = Vec::with_capacity(raw.enums.len());
        for (key, value) in raw.enums {
            let field = key.as_str().ok_or_else(|| CorpusError::Parse {
                path: path.to_path_buf(),
                reason: "enum keys must be strings".to_string(),
            })?;
            let allowed: Vec<String> =
                serde_yaml::from_value(value).map_err(|err| CorpusError::Parse {
                    path: path.to_path_buf(),
                    reason: format!("enum '{field}': {err}"),
                })?;
            enums.push(EnumConstraint {
                field: field.to_string(),
                allowed,
            });
        }
        Ok(Self {
            required: raw.required,
            enums,
            readme_sections: raw
                .reproduced_constraints
                .map(|constraints| constraints.repro_readme_required_sections)
                .unwrap_or_default(),
        })
    }
}

// ============================================================================
// SECTION: Substrate Matrix
// ============================================================================

/// Scenario row of the substrate matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixScenario {
    /// Scenario identifier.
    pub scenario_id: String,
    /// Evidence domain label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Topline every substrate is expected to reach.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_verdict: Option<VerdictStatus>,
    /// Run identifier per substrate.
    #[serde(default)]
    pub runs: BTreeMap<String, String>,
}

/// Coverage requirements of the matrix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixCoverage {
    /// Minimum substrates that must produce a run per scenario.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_substrates: Option<usize>,
}

/// Scenario by substrate matrix of expected runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstrateMatrix {
    /// Substrate names in declaration order.
    pub substrates: Vec<String>,
    /// Scenario rows.
    #[serde(default)]
    pub scenarios: Vec<MatrixScenario>,
    /// Coverage requirements.
    #[serde(default)]
    pub coverage: MatrixCoverage,
}

impl SubstrateMatrix {
    /// Returns every referenced run, deduplicated and sorted.
    #[must_use]
    pub fn run_ids(&self) -> Vec<String> {
        let ids: BTreeSet<&str> = self
            .scenarios
            .iter()
            .flat_map(|scenario| scenario.runs.values())
            .map(String::as_str)
            .filter(|id| !id.is_empty())
            .collect();
        ids.into_iter().map(ToString::to_string).collect()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
