// crates/evidence-gate-core/src/runtime/engine.rs
// ============================================================================
// Module: Gate Engine
// Description: Concurrent gate execution, report persistence, and aggregation.
// Purpose: Run a selection of gates and fold them into one pipeline outcome.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! The engine is the single execution path for gates: the CLI and tests call
//! [`GateEngine::run`], never the gate functions directly. Each selected gate
//! runs on its own scoped thread over read-only shared inputs; reports come
//! back in selection order. A gate whose thread panics is reported as
//! `ERROR`, so the aggregate always covers every selected gate.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::thread;

use thiserror::Error;

use crate::core::corpus::CorpusLayout;
use crate::core::pack::PackRootHasher;
use crate::core::report::AggregateReport;
use crate::core::report::GateReport;
use crate::core::report::PendingGate;
use crate::core::report::ReportError;
use crate::core::report::aggregate_status;
use crate::core::taxonomy::Taxonomy;
use crate::core::taxonomy::TaxonomyClassifier;
use crate::interfaces::EvaluationSource;
use crate::runtime::audit::GateAuditEvent;
use crate::runtime::audit::GateAuditEventParams;
use crate::runtime::audit::GateAuditSink;
use crate::runtime::gates::GateContext;
use crate::runtime::gates::GateKind;
use crate::runtime::gates::GateSettings;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// File name of the aggregate summary.
pub const SUMMARY_FILE: &str = "gates.summary.json";
/// Suffix of per-gate report files.
pub const REPORT_SUFFIX: &str = ".report.json";

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Inputs of a gate engine.
#[derive(Debug, Clone)]
pub struct GateEngineConfig {
    /// Corpus layout.
    pub layout: CorpusLayout,
    /// Pack hasher.
    pub hasher: PackRootHasher,
    /// Reason-code taxonomy.
    pub taxonomy: Taxonomy,
    /// Gate thresholds.
    pub settings: GateSettings,
    /// Whether `PARTIAL` and `NOT_SUPPORTED` stop blocking.
    pub bootstrap: bool,
}

/// Errors raised while persisting gate reports.
#[derive(Debug, Error)]
pub enum GateEngineError {
    /// Report rendering failed.
    #[error(transparent)]
    Render(#[from] ReportError),
    /// Report file could not be written.
    #[error("failed to write {path}: {source}")]
    Write {
        /// Target path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Reports of one engine run plus their aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateRunOutcome {
    /// Gate reports in selection order.
    pub reports: Vec<GateReport>,
    /// Pipeline outcome.
    pub aggregate: AggregateReport,
}

// ============================================================================
// SECTION: Engine
// ============================================================================

/// Runs gates over one corpus.
pub struct GateEngine {
    /// Corpus layout.
    layout: CorpusLayout,
    /// Pack hasher.
    hasher: PackRootHasher,
    /// Reason-code classifier.
    classifier: TaxonomyClassifier,
    /// Gate thresholds.
    settings: GateSettings,
    /// Bootstrap leniency.
    bootstrap: bool,
    /// Evaluation source.
    evaluations: Box<dyn EvaluationSource>,
    /// Audit sink.
    audit: Box<dyn GateAuditSink>,
}

impl GateEngine {
    /// Creates an engine.
    #[must_use]
    pub fn new(
        config: GateEngineConfig,
        evaluations: Box<dyn EvaluationSource>,
        audit: Box<dyn GateAuditSink>,
    ) -> Self {
        Self {
            layout: config.layout,
            hasher: config.hasher,
            classifier: TaxonomyClassifier::new(config.taxonomy),
            settings: config.settings,
            bootstrap: config.bootstrap,
            evaluations,
            audit,
        }
    }

    /// Returns the corpus layout.
    #[must_use]
    pub const fn layout(&self) -> &CorpusLayout {
        &self.layout
    }

    /// Runs the selected gates concurrently; duplicates run once.
    #[must_use]
    pub fn run(&self, selection: &[GateKind]) -> GateRunOutcome {
        let mut gates: Vec<GateKind> = Vec::with_capacity(selection.len());
        for kind in selection {
            if !gates.contains(kind) {
                gates.push(*kind);
            }
        }
        let ctx = GateContext {
            layout: &self.layout,
            hasher: &self.hasher,
            classifier: &self.classifier,
            evaluations: self.evaluations.as_ref(),
            settings: &self.settings,
        };
        let reports: Vec<GateReport> = thread::scope(|scope| {
            let handles: Vec<_> = gates
                .iter()
                .map(|kind| {
                    let kind = *kind;
                    (kind, scope.spawn(move || self.run_one(kind, &ctx)))
                })
                .collect();
            handles
                .into_iter()
                .map(|(kind, handle)| {
                    handle.join().unwrap_or_else(|_| {
                        PendingGate::new(kind.id()).start().error("gate worker panicked")
                    })
                })
                .collect()
        });
        let aggregate = aggregate_status(&reports, self.bootstrap);
        GateRunOutcome {
            reports,
            aggregate,
        }
    }

    /// Runs one gate between start and finish audit events.
    fn run_one(&self, kind: GateKind, ctx: &GateContext<'_>) -> GateReport {
        self.audit.record_gate(&GateAuditEvent::new(GateAuditEventParams {
            gate_id: kind.id().to_string(),
            status: None,
            issues: 0,
            duration_ms: None,
        }));
        let report = kind.run(ctx);
        self.audit.record_gate(&GateAuditEvent::new(GateAuditEventParams {
            gate_id: report.gate_id().to_string(),
            status: Some(report.status()),
            issues: report.issues().len(),
            duration_ms: Some(report.duration_ms()),
        }));
        report
    }
}

// ============================================================================
// SECTION: Persistence
// ============================================================================

/// Writes `<gate_id>.report.json` per gate and `gates.summary.json`.
///
/// Returns the written paths in write order.
///
/// # Errors
///
/// Returns [`GateEngineError`] when rendering or writing fails.
pub fn write_reports(
    output_dir: &Path,
    outcome: &GateRunOutcome,
) -> Result<Vec<PathBuf>, GateEngineError> {
    fs::create_dir_all(output_dir).map_err(|source| GateEngineError::Write {
        path: output_dir.to_path_buf(),
        source,
    })?;
    let mut written = Vec::with_capacity(outcome.reports.len() + 1);
    for report in &outcome.reports {
        let path = output_dir.join(format!("{}{REPORT_SUFFIX}", report.gate_id()));
        write_file(&path, &report.to_canonical_json()?)?;
        written.push(path);
    }
    let summary = output_dir.join(SUMMARY_FILE);
    write_file(&summary, &outcome.aggregate.to_canonical_json()?)?;
    written.push(summary);
    Ok(written)
}

/// Writes bytes to a path.
fn write_file(path: &Path, bytes: &[u8]) -> Result<(), GateEngineError> {
    fs::write(path, bytes).map_err(|source| GateEngineError::Write {
        path: path.to_path_buf(),
        source,
    })
}
