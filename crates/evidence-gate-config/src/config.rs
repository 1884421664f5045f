// crates/evidence-gate-config/src/config.rs
// ============================================================================
// Module: Evidence Gate Configuration
// Description: Configuration loading and validation for the gate pipeline.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: evidence-gate-core, regex, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Every section has defaults, so an empty file is a valid configuration.
//! Invalid values fail closed: the pipeline never runs on a configuration
//! that did not pass [`EvidenceGateConfig::validate`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use evidence_gate_core::BundledRulesetSource;
use evidence_gate_core::CorpusLayout;
use evidence_gate_core::CoveragePolicy;
use evidence_gate_core::EvaluationSource;
use evidence_gate_core::FileAuditSink;
use evidence_gate_core::GateAuditSink;
use evidence_gate_core::GateEngineConfig;
use evidence_gate_core::GateKind;
use evidence_gate_core::GateSettings;
use evidence_gate_core::NoopAuditSink;
use evidence_gate_core::PackExclusions;
use evidence_gate_core::PackIndexer;
use evidence_gate_core::PackRootHasher;
use evidence_gate_core::StderrAuditSink;
use evidence_gate_core::StoredEvaluationSource;
use evidence_gate_core::Taxonomy;
use evidence_gate_core::corpus::DEFAULT_CURATED_REGISTRY;
use evidence_gate_core::corpus::DEFAULT_CURATED_SCHEMA;
use evidence_gate_core::corpus::DEFAULT_RUNS_DIR;
use evidence_gate_core::corpus::DEFAULT_SCENARIOS_DIR;
use evidence_gate_core::corpus::DEFAULT_SUBSTRATE_MATRIX;
use evidence_gate_core::pack::DEFAULT_MAX_PARALLEL_READS;
use evidence_gate_core::runtime::gates::DEFAULT_COVERAGE_PHASE;
use evidence_gate_core::runtime::gates::DEFAULT_FAIL_MISSING_RATIO;
use evidence_gate_core::runtime::gates::coverage::DEFAULT_MIN_PER_RUN;
use evidence_gate_core::runtime::gates::coverage::DEFAULT_NOT_SUPPORTED_RATIO;
use regex::Regex;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "evidence-gate.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "EVIDENCE_GATE_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Upper bound for concurrent pack file reads.
pub(crate) const MAX_PARALLEL_READS: usize = 64;
/// Maximum number of extra exclusion names per list.
pub(crate) const MAX_EXTRA_EXCLUSIONS: usize = 256;
/// Maximum number of extra taxonomy entries per list.
pub(crate) const MAX_EXTRA_TAXONOMY_ENTRIES: usize = 256;
/// Default directory for gate reports.
pub const DEFAULT_OUTPUT_DIR: &str = "reports/gates";

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Evidence gate configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EvidenceGateConfig {
    /// Corpus layout.
    #[serde(default)]
    pub corpus: CorpusConfig,
    /// Pack hashing configuration.
    #[serde(default)]
    pub pack: PackConfig,
    /// Reason-code taxonomy extensions.
    #[serde(default)]
    pub taxonomy: TaxonomyConfig,
    /// Gate selection and thresholds.
    #[serde(default)]
    pub gates: GatesConfig,
    /// Audit sink selection.
    #[serde(default)]
    pub audit: AuditConfig,
    /// Resolved source path (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl EvidenceGateConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// An explicit path or `EVIDENCE_GATE_CONFIG` must name a readable file.
    /// When neither is given and `evidence-gate.toml` is absent from the
    /// current directory, the defaults are used.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (resolved, explicit) = resolve_path(path)?;
        validate_path(&resolved)?;
        if !explicit && !resolved.exists() {
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        }
        let bytes = fs::read(&resolved).map_err(|err| {
            ConfigError::Io(format!("{}: {err}", resolved.display()))
        })?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let mut config = Self::from_toml(content)?;
        config.source_path = Some(resolved);
        Ok(config)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.corpus.validate()?;
        self.pack.validate()?;
        self.taxonomy.validate()?;
        self.gates.validate()?;
        self.audit.validate()?;
        Ok(())
    }

    /// Returns the corpus layout.
    #[must_use]
    pub fn corpus_layout(&self) -> CorpusLayout {
        self.corpus.layout()
    }

    /// Returns the pack hasher with configured exclusions and concurrency.
    #[must_use]
    pub fn pack_hasher(&self) -> PackRootHasher {
        self.pack.hasher()
    }

    /// Builds the taxonomy with configured extensions.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a pattern fails to compile.
    pub fn build_taxonomy(&self) -> Result<Taxonomy, ConfigError> {
        self.taxonomy.build()
    }

    /// Returns the gate thresholds.
    #[must_use]
    pub fn gate_settings(&self) -> GateSettings {
        self.gates.settings()
    }

    /// Returns the enabled gates in configured order; all gates when unset.
    #[must_use]
    pub fn enabled_gates(&self) -> Vec<GateKind> {
        self.gates.enabled_kinds()
    }

    /// Returns the configured evaluation source.
    #[must_use]
    pub fn evaluation_source(&self) -> Box<dyn EvaluationSource> {
        match self.gates.evaluation_source {
            EvaluationSourceKind::Stored => Box::new(StoredEvaluationSource),
            EvaluationSourceKind::Bundled => {
                Box::new(BundledRulesetSource::new(self.pack_hasher()))
            }
        }
    }

    /// Opens the configured audit sink.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the audit file cannot be opened.
    pub fn audit_sink(&self) -> Result<Box<dyn GateAuditSink>, ConfigError> {
        match self.audit.sink {
            AuditSinkKind::Stderr => Ok(Box::new(StderrAuditSink)),
            AuditSinkKind::None => Ok(Box::new(NoopAuditSink)),
            AuditSinkKind::File => {
                let path = self.audit.path.as_deref().ok_or_else(|| {
                    ConfigError::Invalid("audit.path is required for sink=file".to_string())
                })?;
                let sink = FileAuditSink::new(Path::new(path))
                    .map_err(|err| ConfigError::Io(format!("audit log {path}: {err}")))?;
                Ok(Box::new(sink))
            }
        }
    }

    /// Assembles the gate engine inputs.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the taxonomy cannot be built.
    pub fn engine_config(&self) -> Result<GateEngineConfig, ConfigError> {
        Ok(GateEngineConfig {
            layout: self.corpus_layout(),
            hasher: self.pack_hasher(),
            taxonomy: self.build_taxonomy()?,
            settings: self.gate_settings(),
            bootstrap: self.gates.bootstrap,
        })
    }
}

/// Corpus location configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CorpusConfig {
    /// Corpus root directory.
    #[serde(default = "default_corpus_root")]
    pub root: String,
    /// Runs directory, relative to the root.
    #[serde(default = "default_runs_dir")]
    pub runs_dir: String,
    /// Curated registry file, relative to the root.
    #[serde(default = "default_curated_registry")]
    pub curated_registry: String,
    /// Curated schema file, relative to the root.
    #[serde(default = "default_curated_schema")]
    pub curated_schema: String,
    /// Scenario registry directory, relative to the root.
    #[serde(default = "default_scenarios_dir")]
    pub scenarios_dir: String,
    /// Substrate matrix file, relative to the root.
    #[serde(default = "default_substrate_matrix")]
    pub substrate_matrix: String,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            root: default_corpus_root(),
            runs_dir: default_runs_dir(),
            curated_registry: default_curated_registry(),
            curated_schema: default_curated_schema(),
            scenarios_dir: default_scenarios_dir(),
            substrate_matrix: default_substrate_matrix(),
        }
    }
}

impl CorpusConfig {
    /// Validates corpus paths.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("corpus.root", &self.root)?;
        validate_relative_path("corpus.runs_dir", &self.runs_dir)?;
        validate_relative_path("corpus.curated_registry", &self.curated_registry)?;
        validate_relative_path("corpus.curated_schema", &self.curated_schema)?;
        validate_relative_path("corpus.scenarios_dir", &self.scenarios_dir)?;
        validate_relative_path("corpus.substrate_matrix", &self.substrate_matrix)?;
        Ok(())
    }

    /// Converts into a core layout.
    fn layout(&self) -> CorpusLayout {
        CorpusLayout {
            root: PathBuf::from(self.root.trim()),
            runs_dir: PathBuf::from(self.runs_dir.trim()),
            curated_registry: PathBuf::from(self.curated_registry.trim()),
            curated_schema: PathBuf::from(self.curated_schema.trim()),
            scenarios_dir: PathBuf::from(self.scenarios_dir.trim()),
            substrate_matrix: PathBuf::from(self.substrate_matrix.trim()),
        }
    }
}

/// Pack hashing configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PackConfig {
    /// Directory names excluded in addition to the defaults.
    #[serde(default)]
    pub excluded_dirs: Vec<String>,
    /// File names excluded in addition to the defaults.
    #[serde(default)]
    pub excluded_files: Vec<String>,
    /// Maximum concurrent file reads.
    #[serde(default = "default_max_parallel_reads")]
    pub max_parallel_reads: usize,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            excluded_dirs: Vec::new(),
            excluded_files: Vec::new(),
            max_parallel_reads: default_max_parallel_reads(),
        }
    }
}

impl PackConfig {
    /// Validates exclusion names and concurrency bounds.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(1 ..= MAX_PARALLEL_READS).contains(&self.max_parallel_reads) {
            return Err(ConfigError::Invalid(format!(
                "pack.max_parallel_reads must be between 1 and {MAX_PARALLEL_READS}"
            )));
        }
        validate_exclusions("pack.excluded_dirs", &self.excluded_dirs)?;
        validate_exclusions("pack.excluded_files", &self.excluded_files)?;
        Ok(())
    }

    /// Builds the pack hasher.
    fn hasher(&self) -> PackRootHasher {
        let exclusions = PackExclusions::with_extra(
            self.excluded_dirs.iter().map(|name| name.trim().to_string()),
            self.excluded_files.iter().map(|name| name.trim().to_string()),
        );
        PackRootHasher::new(PackIndexer::new(exclusions), self.max_parallel_reads)
    }
}

/// Taxonomy extension configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaxonomyConfig {
    /// Extra common codes.
    #[serde(default)]
    pub extra_common: Vec<String>,
    /// Extra named patterns.
    #[serde(default)]
    pub extra_patterns: Vec<TaxonomyPatternConfig>,
}

/// Named reason-code pattern.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TaxonomyPatternConfig {
    /// Rule name reported by the classifier.
    pub name: String,
    /// Regular expression matched against the whole code.
    pub regex: String,
}

impl TaxonomyConfig {
    /// Validates codes and patterns.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.extra_common.len() > MAX_EXTRA_TAXONOMY_ENTRIES
            || self.extra_patterns.len() > MAX_EXTRA_TAXONOMY_ENTRIES
        {
            return Err(ConfigError::Invalid(format!(
                "taxonomy extensions exceed {MAX_EXTRA_TAXONOMY_ENTRIES} entries"
            )));
        }
        for code in &self.extra_common {
            if code.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "taxonomy.extra_common entries must be non-empty".to_string(),
                ));
            }
        }
        let mut names = BTreeSet::new();
        for pattern in &self.extra_patterns {
            let name = pattern.name.trim();
            if name.is_empty() {
                return Err(ConfigError::Invalid(
                    "taxonomy.extra_patterns.name must be non-empty".to_string(),
                ));
            }
            if !names.insert(name) {
                return Err(ConfigError::Invalid(format!(
                    "taxonomy.extra_patterns has duplicate name '{name}'"
                )));
            }
            Regex::new(&pattern.regex).map_err(|err| {
                ConfigError::Invalid(format!(
                    "taxonomy.extra_patterns '{name}' regex does not compile: {err}"
                ))
            })?;
        }
        Ok(())
    }

    /// Builds the builtin taxonomy plus extensions.
    fn build(&self) -> Result<Taxonomy, ConfigError> {
        let mut taxonomy = Taxonomy::builtin()
            .map_err(|err| ConfigError::Invalid(err.to_string()))?
            .with_common_codes(self.extra_common.iter().map(|code| code.trim().to_string()));
        for pattern in &self.extra_patterns {
            taxonomy = taxonomy
                .with_pattern(pattern.name.trim(), &pattern.regex)
                .map_err(|err| ConfigError::Invalid(err.to_string()))?;
        }
        Ok(taxonomy)
    }
}

/// Evaluation source selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationSourceKind {
    /// Read each run's stored `evaluation.report.json`.
    #[default]
    Stored,
    /// Re-adjudicate each run's pack with the bundled ruleset.
    Bundled,
}

/// Gate selection and threshold configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GatesConfig {
    /// Enabled gate ids in run order; all gates when empty.
    #[serde(default)]
    pub enabled: Vec<String>,
    /// Whether `PARTIAL` and `NOT_SUPPORTED` stop blocking.
    #[serde(default)]
    pub bootstrap: bool,
    /// Report output directory.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    /// Evaluation source used by evaluating gates.
    #[serde(default)]
    pub evaluation_source: EvaluationSourceKind,
    /// Pointer coverage thresholds.
    #[serde(default)]
    pub pointer_coverage: PointerCoverageConfig,
    /// Cross-substrate thresholds.
    #[serde(default)]
    pub cross_substrate: CrossSubstrateConfig,
}

impl Default for GatesConfig {
    fn default() -> Self {
        Self {
            enabled: Vec::new(),
            bootstrap: false,
            output_dir: default_output_dir(),
            evaluation_source: EvaluationSourceKind::default(),
            pointer_coverage: PointerCoverageConfig::default(),
            cross_substrate: CrossSubstrateConfig::default(),
        }
    }
}

impl GatesConfig {
    /// Validates gate selection and thresholds.
    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = BTreeSet::new();
        for id in &self.enabled {
            if GateKind::parse(id).is_none() {
                return Err(ConfigError::Invalid(format!("gates.enabled has unknown gate '{id}'")));
            }
            if !seen.insert(id.as_str()) {
                return Err(ConfigError::Invalid(format!("gates.enabled lists '{id}' twice")));
            }
        }
        validate_path_string("gates.output_dir", &self.output_dir)?;
        self.pointer_coverage.validate()?;
        self.cross_substrate.validate()?;
        Ok(())
    }

    /// Resolves the enabled gate kinds.
    fn enabled_kinds(&self) -> Vec<GateKind> {
        if self.enabled.is_empty() {
            return GateKind::ALL.to_vec();
        }
        self.enabled.iter().filter_map(|id| GateKind::parse(id)).collect()
    }

    /// Builds core gate settings.
    fn settings(&self) -> GateSettings {
        GateSettings {
            coverage_phase: self.pointer_coverage.phase.clone(),
            coverage_policy: self.pointer_coverage.policy(),
            fail_missing_ratio: self.cross_substrate.fail_missing_ratio,
        }
    }
}

/// Coverage policy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CoveragePolicyKind {
    /// Per-run minimum of canonical pointers.
    #[default]
    MinPerRun,
    /// Corpus-wide percentage threshold.
    MinPercent,
}

/// Pointer coverage gate configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PointerCoverageConfig {
    /// Phase label reported in findings.
    #[serde(default = "default_coverage_phase")]
    pub phase: String,
    /// Policy selection.
    #[serde(default)]
    pub policy: CoveragePolicyKind,
    /// Minimum canonical pointers per run.
    #[serde(default = "default_min_per_run")]
    pub min_per_run: u64,
    /// Minimum corpus coverage percentage.
    #[serde(default)]
    pub min_percent: u64,
    /// Share of short runs above which the gate is `NOT_SUPPORTED`.
    #[serde(default = "default_not_supported_ratio")]
    pub not_supported_ratio: f64,
}

impl Default for PointerCoverageConfig {
    fn default() -> Self {
        Self {
            phase: default_coverage_phase(),
            policy: CoveragePolicyKind::default(),
            min_per_run: default_min_per_run(),
            min_percent: 0,
            not_supported_ratio: default_not_supported_ratio(),
        }
    }
}

impl PointerCoverageConfig {
    /// Validates coverage thresholds.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.phase.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "gates.pointer_coverage.phase must be non-empty".to_string(),
            ));
        }
        if self.min_per_run == 0 {
            return Err(ConfigError::Invalid(
                "gates.pointer_coverage.min_per_run must be at least 1".to_string(),
            ));
        }
        if self.min_percent > 100 {
            return Err(ConfigError::Invalid(
                "gates.pointer_coverage.min_percent must be between 0 and 100".to_string(),
            ));
        }
        validate_ratio("gates.pointer_coverage.not_supported_ratio", self.not_supported_ratio)
    }

    /// Builds the core coverage policy.
    const fn policy(&self) -> CoveragePolicy {
        match self.policy {
            CoveragePolicyKind::MinPerRun => CoveragePolicy::MinPerRun {
                min_per_run: self.min_per_run,
                not_supported_ratio: self.not_supported_ratio,
            },
            CoveragePolicyKind::MinPercent => CoveragePolicy::MinPercent {
                min_percent: self.min_percent,
            },
        }
    }
}

/// Cross-substrate gate configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CrossSubstrateConfig {
    /// Share of missing matrix runs above which the gate fails.
    #[serde(default = "default_fail_missing_ratio")]
    pub fail_missing_ratio: f64,
}

impl Default for CrossSubstrateConfig {
    fn default() -> Self {
        Self {
            fail_missing_ratio: default_fail_missing_ratio(),
        }
    }
}

impl CrossSubstrateConfig {
    /// Validates the missing-run ratio.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_ratio("gates.cross_substrate.fail_missing_ratio", self.fail_missing_ratio)
    }
}

/// Audit sink selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkKind {
    /// JSON lines on stderr.
    Stderr,
    /// JSON lines appended to `audit.path`.
    File,
    /// Audit disabled.
    #[default]
    None,
}

/// Audit logging configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditConfig {
    /// Sink selection.
    #[serde(default)]
    pub sink: AuditSinkKind,
    /// Audit log path (JSON lines) for the file sink.
    #[serde(default)]
    pub path: Option<String>,
}

impl AuditConfig {
    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match (&self.sink, &self.path) {
            (AuditSinkKind::File, None) => Err(ConfigError::Invalid(
                "audit.path is required for sink=file".to_string(),
            )),
            (_, Some(path)) => validate_path_string("audit.path", path),
            (_, None) => Ok(()),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default corpus root.
fn default_corpus_root() -> String {
    ".".to_string()
}

/// Default runs directory.
fn default_runs_dir() -> String {
    DEFAULT_RUNS_DIR.to_string()
}

/// Default curated registry.
fn default_curated_registry() -> String {
    DEFAULT_CURATED_REGISTRY.to_string()
}

/// Default curated schema.
fn default_curated_schema() -> String {
    DEFAULT_CURATED_SCHEMA.to_string()
}

/// Default scenario registry.
fn default_scenarios_dir() -> String {
    DEFAULT_SCENARIOS_DIR.to_string()
}

/// Default substrate matrix.
fn default_substrate_matrix() -> String {
    DEFAULT_SUBSTRATE_MATRIX.to_string()
}

/// Default pack read concurrency.
const fn default_max_parallel_reads() -> usize {
    DEFAULT_MAX_PARALLEL_READS
}

/// Default report directory.
fn default_output_dir() -> String {
    DEFAULT_OUTPUT_DIR.to_string()
}

/// Default coverage phase label.
fn default_coverage_phase() -> String {
    DEFAULT_COVERAGE_PHASE.to_string()
}

/// Default per-run pointer minimum.
const fn default_min_per_run() -> u64 {
    DEFAULT_MIN_PER_RUN
}

/// Default short-run ratio.
const fn default_not_supported_ratio() -> f64 {
    DEFAULT_NOT_SUPPORTED_RATIO
}

/// Default missing-run ratio.
const fn default_fail_missing_ratio() -> f64 {
    DEFAULT_FAIL_MISSING_RATIO
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
///
/// The flag reports whether the path was named explicitly.
fn resolve_path(path: Option<&Path>) -> Result<(PathBuf, bool), ConfigError> {
    if let Some(path) = path {
        return Ok((path.to_path_buf(), true));
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok((PathBuf::from(env_path), true));
    }
    Ok((PathBuf::from(DEFAULT_CONFIG_NAME), false))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates a corpus-relative path: no root, prefix, or parent components.
fn validate_relative_path(field: &str, value: &str) -> Result<(), ConfigError> {
    validate_path_string(field, value)?;
    for component in Path::new(value.trim()).components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ConfigError::Invalid(format!(
                    "{field} must be relative to corpus.root without '..'"
                )));
            }
        }
    }
    Ok(())
}

/// Validates an exclusion list: bare names only, bounded count.
fn validate_exclusions(field: &str, names: &[String]) -> Result<(), ConfigError> {
    if names.len() > MAX_EXTRA_EXCLUSIONS {
        return Err(ConfigError::Invalid(format!(
            "{field} exceeds {MAX_EXTRA_EXCLUSIONS} entries"
        )));
    }
    for name in names {
        let trimmed = name.trim();
        if trimmed.is_empty() || trimmed.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} entries must be 1-255 bytes")));
        }
        if trimmed.contains('/') || trimmed.contains('\\') || trimmed == "." || trimmed == ".." {
            return Err(ConfigError::Invalid(format!(
                "{field} entries must be bare names, got '{trimmed}'"
            )));
        }
    }
    Ok(())
}

/// Validates a ratio in `0.0..=1.0`.
fn validate_ratio(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0 ..= 1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{field} must be between 0.0 and 1.0")))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions are permitted."
    )]

    use super::MAX_PATH_COMPONENT_LENGTH;
    use super::MAX_TOTAL_PATH_LENGTH;
    use super::validate_exclusions;
    use super::validate_path_string;
    use super::validate_ratio;
    use super::validate_relative_path;

    #[test]
    fn validate_path_string_accepts_valid_path() {
        let result = validate_path_string("test_path", "./reports/gates");
        assert!(result.is_ok(), "valid path should pass");
    }

    #[test]
    fn validate_path_string_rejects_empty_string() {
        let result = validate_path_string("test_path", "   ");
        assert!(result.unwrap_err().to_string().contains("non-empty"));
    }

    #[test]
    fn validate_path_string_rejects_exceeds_max_length() {
        let long_path = "a".repeat(MAX_TOTAL_PATH_LENGTH + 1);
        let result = validate_path_string("test_path", &long_path);
        assert!(result.unwrap_err().to_string().contains("max length"));
    }

    #[test]
    fn validate_path_string_rejects_long_component() {
        let component = "a".repeat(MAX_PATH_COMPONENT_LENGTH + 1);
        let result = validate_path_string("test_path", &format!("dir/{component}"));
        assert!(result.unwrap_err().to_string().contains("component too long"));
    }

    #[test]
    fn validate_relative_path_rejects_parent_and_root() {
        assert!(validate_relative_path("corpus.runs_dir", "data/runs").is_ok());
        assert!(validate_relative_path("corpus.runs_dir", "../runs").is_err());
        assert!(validate_relative_path("corpus.runs_dir", "/abs/runs").is_err());
    }

    #[test]
    fn validate_exclusions_rejects_paths() {
        assert!(validate_exclusions("pack.excluded_dirs", &["node_modules".to_string()]).is_ok());
        assert!(validate_exclusions("pack.excluded_dirs", &["a/b".to_string()]).is_err());
        assert!(validate_exclusions("pack.excluded_dirs", &["..".to_string()]).is_err());
    }

    #[test]
    fn validate_ratio_bounds() {
        assert!(validate_ratio("r", 0.0).is_ok());
        assert!(validate_ratio("r", 1.0).is_ok());
        assert!(validate_ratio("r", 1.01).is_err());
        assert!(validate_ratio("r", f64::NAN).is_err());
    }
}
