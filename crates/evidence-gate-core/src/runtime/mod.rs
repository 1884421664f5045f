// crates/evidence-gate-core/src/runtime/mod.rs
// ============================================================================
// Module: Evidence Gate Runtime
// Description: Gate engine, consistency gates, adjudicators, and audit sinks.
// Purpose: Execute gates over an evidence corpus and record the outcome.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime modules implement the gate engine and the four consistency gates,
//! the evaluation sources the gates adjudicate through, and the audit sinks
//! that record gate and pack events. All entry points call into
//! [`engine::GateEngine`] so every surface reports identically.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod adjudicator;
pub mod audit;
pub mod engine;
pub mod gates;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use adjudicator::BUNDLED_RULESET_VERSION;
pub use adjudicator::BundledRulesetSource;
pub use adjudicator::MANIFEST_FILE;
pub use adjudicator::StoredEvaluationSource;
pub use adjudicator::adjudicate_ruleset_1_0;
pub use audit::FileAuditSink;
pub use audit::GateAuditEvent;
pub use audit::GateAuditSink;
pub use audit::NoopAuditSink;
pub use audit::PackAuditEvent;
pub use audit::PackAuditEventParams;
pub use audit::StderrAuditSink;
pub use audit::VerifyAuditEvent;
pub use audit::VerifyAuditEventParams;
pub use engine::GateEngine;
pub use engine::GateEngineConfig;
pub use engine::GateEngineError;
pub use engine::GateRunOutcome;
pub use engine::write_reports;
pub use gates::GateContext;
pub use gates::GateError;
pub use gates::GateKind;
pub use gates::GateSettings;
pub use gates::coverage::CoveragePolicy;
pub use gates::coverage::measure_coverage;
pub use gates::parity::parity_key;
