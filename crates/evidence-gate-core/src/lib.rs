// crates/evidence-gate-core/src/lib.rs
// ============================================================================
// Module: Evidence Gate Core Library
// Description: Public API surface for the Evidence Gate core.
// Purpose: Expose hashing primitives, interfaces, and the gate runtime.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Evidence Gate core turns directories of evidence into reproducible pack
//! root hashes, evaluation results into reproducible verdict hashes, and runs
//! independent consistency gates over a corpus of evidence runs. Nothing here
//! depends on filesystem iteration order, float formatting, or map ordering.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;

pub use interfaces::AdjudicationError;
pub use interfaces::EvaluationSource;
pub use runtime::BUNDLED_RULESET_VERSION;
pub use runtime::BundledRulesetSource;
pub use runtime::CoveragePolicy;
pub use runtime::FileAuditSink;
pub use runtime::GateAuditEvent;
pub use runtime::GateAuditSink;
pub use runtime::GateEngine;
pub use runtime::GateEngineConfig;
pub use runtime::GateEngineError;
pub use runtime::GateKind;
pub use runtime::GateRunOutcome;
pub use runtime::GateSettings;
pub use runtime::MANIFEST_FILE;
pub use runtime::NoopAuditSink;
pub use runtime::PackAuditEvent;
pub use runtime::PackAuditEventParams;
pub use runtime::StderrAuditSink;
pub use runtime::StoredEvaluationSource;
pub use runtime::VerifyAuditEvent;
pub use runtime::VerifyAuditEventParams;
pub use runtime::adjudicate_ruleset_1_0;
pub use runtime::write_reports;
