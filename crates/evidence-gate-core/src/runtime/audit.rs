// crates/evidence-gate-core/src/runtime/audit.rs
// ============================================================================
// Module: Gate Audit Logging
// Description: Structured audit events for gate runs and pack operations.
// Purpose: Emit JSON-line audit records without a logging framework.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Audit events are flat JSON objects tagged with an `event` name and a
//! millisecond timestamp. Sinks are `Send + Sync` so gates running on scoped
//! threads can share one sink. Write failures are swallowed; auditing never
//! changes a gate outcome.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::core::evaluation::VerdictStatus;
use crate::core::pack::PackVerificationStatus;
use crate::core::report::GateStatus;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Gate lifecycle audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct GateAuditEvent {
    /// Event identifier (`gate_started` or `gate_finished`).
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Gate identifier.
    pub gate_id: String,
    /// Terminal status once finished.
    pub status: Option<GateStatus>,
    /// Number of findings once finished.
    pub issues: usize,
    /// Duration once finished.
    pub duration_ms: Option<u64>,
}

/// Pack recomputation audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct PackAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Pack directory as given by the caller.
    pub pack_dir: String,
    /// Recomputed root hash.
    pub root_hash: String,
    /// Number of hashed files.
    pub file_count: usize,
    /// Comparison with the stored hash.
    pub comparison: PackVerificationStatus,
    /// Whether integrity artifacts were written.
    pub written: bool,
}

/// Offline verification audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Pack identifier.
    pub pack_id: String,
    /// Ruleset version.
    pub ruleset_version: String,
    /// Pack root hash.
    pub pack_root_hash: String,
    /// Verdict hash.
    pub verdict_hash: String,
    /// Topline verdict.
    pub topline_verdict: VerdictStatus,
    /// Result of an expected-hash comparison, when requested.
    pub expected_match: Option<bool>,
}

/// Inputs required to construct a gate audit event.
pub struct GateAuditEventParams {
    /// Gate identifier.
    pub gate_id: String,
    /// Terminal status; `None` marks the start event.
    pub status: Option<GateStatus>,
    /// Number of findings.
    pub issues: usize,
    /// Duration in milliseconds.
    pub duration_ms: Option<u64>,
}

/// Inputs required to construct a pack audit event.
pub struct PackAuditEventParams {
    /// Pack directory.
    pub pack_dir: String,
    /// Recomputed root hash.
    pub root_hash: String,
    /// Number of hashed files.
    pub file_count: usize,
    /// Comparison with the stored hash.
    pub comparison: PackVerificationStatus,
    /// Whether integrity artifacts were written.
    pub written: bool,
}

/// Inputs required to construct a verification audit event.
pub struct VerifyAuditEventParams {
    /// Pack identifier.
    pub pack_id: String,
    /// Ruleset version.
    pub ruleset_version: String,
    /// Pack root hash.
    pub pack_root_hash: String,
    /// Verdict hash.
    pub verdict_hash: String,
    /// Topline verdict.
    pub topline_verdict: VerdictStatus,
    /// Result of an expected-hash comparison.
    pub expected_match: Option<bool>,
}

/// Returns the current time in milliseconds since the epoch.
fn now_ms() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

impl GateAuditEvent {
    /// Creates a gate event; the name follows from whether a status is set.
    #[must_use]
    pub fn new(params: GateAuditEventParams) -> Self {
        let event = if params.status.is_some() { "gate_finished" } else { "gate_started" };
        Self {
            event,
            timestamp_ms: now_ms(),
            gate_id: params.gate_id,
            status: params.status,
            issues: params.issues,
            duration_ms: params.duration_ms,
        }
    }
}

impl PackAuditEvent {
    /// Creates a pack recomputation event with a consistent timestamp.
    #[must_use]
    pub fn new(params: PackAuditEventParams) -> Self {
        Self {
            event: "pack_recomputed",
            timestamp_ms: now_ms(),
            pack_dir: params.pack_dir,
            root_hash: params.root_hash,
            file_count: params.file_count,
            comparison: params.comparison,
            written: params.written,
        }
    }
}

impl VerifyAuditEvent {
    /// Creates a verification event with a consistent timestamp.
    #[must_use]
    pub fn new(params: VerifyAuditEventParams) -> Self {
        Self {
            event: "verify_completed",
            timestamp_ms: now_ms(),
            pack_id: params.pack_id,
            ruleset_version: params.ruleset_version,
            pack_root_hash: params.pack_root_hash,
            verdict_hash: params.verdict_hash,
            topline_verdict: params.topline_verdict,
            expected_match: params.expected_match,
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for gate and pack events.
pub trait GateAuditSink: Send + Sync {
    /// Record a gate lifecycle event.
    fn record_gate(&self, event: &GateAuditEvent);

    /// Record a pack recomputation event.
    fn record_pack(&self, _event: &PackAuditEvent) {}

    /// Record an offline verification event.
    fn record_verify(&self, _event: &VerifyAuditEvent) {}
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl StderrAuditSink {
    /// Writes one event line to stderr.
    fn emit<T: Serialize>(event: &T) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

impl GateAuditSink for StderrAuditSink {
    fn record_gate(&self, event: &GateAuditEvent) {
        Self::emit(event);
    }

    fn record_pack(&self, event: &PackAuditEvent) {
        Self::emit(event);
    }

    fn record_verify(&self, event: &VerifyAuditEvent) {
        Self::emit(event);
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Appends one event line and flushes.
    fn emit<T: Serialize>(&self, event: &T) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

impl GateAuditSink for FileAuditSink {
    fn record_gate(&self, event: &GateAuditEvent) {
        self.emit(event);
    }

    fn record_pack(&self, event: &PackAuditEvent) {
        self.emit(event);
    }

    fn record_verify(&self, event: &VerifyAuditEvent) {
        self.emit(event);
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl GateAuditSink for NoopAuditSink {
    fn record_gate(&self, _event: &GateAuditEvent) {}

    fn record_pack(&self, _event: &PackAuditEvent) {}

    fn record_verify(&self, _event: &VerifyAuditEvent) {}
}
