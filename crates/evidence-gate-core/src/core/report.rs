// crates/evidence-gate-core/src/core/report.rs
// ============================================================================
// Module: Gate Reports
// Description: Gate status, lifecycle tracking, and aggregate outcomes.
// Purpose: Produce immutable, attributable reports for every gate run.
// Dependencies: serde, serde_jcs, thiserror, time
// ============================================================================

//! ## Overview
//! A gate invocation moves `PENDING -> RUNNING -> terminal`. The lifecycle is
//! encoded in types: [`PendingGate::start`] yields a [`RunningGate`], and
//! [`RunningGate::finish`] consumes it into a [`GateReport`]. A finished report
//! exposes read-only accessors, so findings cannot be appended after the
//! status is decided.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Status
// ============================================================================

/// Terminal status of a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GateStatus {
    /// Check ran and found no problems.
    Pass,
    /// Check ran and found problems.
    Fail,
    /// Check ran with incomplete inputs.
    Partial,
    /// Inputs for the check are not produced yet.
    NotSupported,
    /// Check could not run.
    Error,
}

impl GateStatus {
    /// Returns the wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::Partial => "PARTIAL",
            Self::NotSupported => "NOT_SUPPORTED",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for GateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Report
// ============================================================================

/// Errors raised while rendering reports.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Canonical JSON rendering failed.
    #[error("failed to render report: {0}")]
    Render(String),
}

/// Finalized result of one gate invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateReport {
    /// Gate identifier.
    gate_id: String,
    /// RFC 3339 start time.
    executed_at: String,
    /// Terminal status.
    status: GateStatus,
    /// Gate-specific counters.
    summary: BTreeMap<String, u64>,
    /// Attributed findings in discovery order.
    issues: Vec<String>,
    /// Wall-clock duration.
    duration_ms: u64,
}

impl GateReport {
    /// Returns the gate identifier.
    #[must_use]
    pub fn gate_id(&self) -> &str {
        &self.gate_id
    }

    /// Returns the start time.
    #[must_use]
    pub fn executed_at(&self) -> &str {
        &self.executed_at
    }

    /// Returns the terminal status.
    #[must_use]
    pub const fn status(&self) -> GateStatus {
        self.status
    }

    /// Returns the counters.
    #[must_use]
    pub const fn summary(&self) -> &BTreeMap<String, u64> {
        &self.summary
    }

    /// Returns a single counter, zero when absent.
    #[must_use]
    pub fn counter(&self, key: &str) -> u64 {
        self.summary.get(key).copied().unwrap_or(0)
    }

    /// Returns the findings.
    #[must_use]
    pub fn issues(&self) -> &[String] {
        &self.issues
    }

    /// Returns the duration in milliseconds.
    #[must_use]
    pub const fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    /// Renders the report as RFC 8785 canonical JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Render`] when serialization fails.
    pub fn to_canonical_json(&self) -> Result<Vec<u8>, ReportError> {
        serde_jcs::to_vec(self).map_err(|err| ReportError::Render(err.to_string()))
    }
}

// ============================================================================
// SECTION: Lifecycle
// ============================================================================

/// Gate that has not started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingGate {
    /// Gate identifier.
    gate_id: String,
}

impl PendingGate {
    /// Creates a pending gate.
    #[must_use]
    pub fn new(gate_id: impl Into<String>) -> Self {
        Self {
            gate_id: gate_id.into(),
        }
    }

    /// Returns the gate identifier.
    #[must_use]
    pub fn gate_id(&self) -> &str {
        &self.gate_id
    }

    /// Transitions to running and starts the clock.
    #[must_use]
    pub fn start(self) -> RunningGate {
        RunningGate {
            gate_id: self.gate_id,
            executed_at: now_rfc3339(),
            started: Instant::now(),
            summary: BTreeMap::new(),
            issues: Vec::new(),
        }
    }
}

/// Gate that is collecting counters and findings.
#[derive(Debug)]
pub struct RunningGate {
    /// Gate identifier.
    gate_id: String,
    /// RFC 3339 start time.
    executed_at: String,
    /// Monotonic start instant.
    started: Instant,
    /// Counters.
    summary: BTreeMap<String, u64>,
    /// Findings.
    issues: Vec<String>,
}

impl RunningGate {
    /// Returns the gate identifier.
    #[must_use]
    pub fn gate_id(&self) -> &str {
        &self.gate_id
    }

    /// Sets a counter.
    pub fn set(&mut self, key: &str, value: u64) {
        self.summary.insert(key.to_string(), value);
    }

    /// Adds to a counter.
    pub fn add(&mut self, key: &str, delta: u64) {
        let entry = self.summary.entry(key.to_string()).or_insert(0);
        *entry = entry.saturating_add(delta);
    }

    /// Increments a counter by one.
    pub fn increment(&mut self, key: &str) {
        self.add(key, 1);
    }

    /// Returns a counter, zero when absent.
    #[must_use]
    pub fn counter(&self, key: &str) -> u64 {
        self.summary.get(key).copied().unwrap_or(0)
    }

    /// Appends a finding.
    pub fn issue(&mut self, issue: impl Into<String>) {
        self.issues.push(issue.into());
    }

    /// Returns the findings collected so far.
    #[must_use]
    pub fn issues(&self) -> &[String] {
        &self.issues
    }

    /// Finalizes the gate with a terminal status.
    #[must_use]
    pub fn finish(self, status: GateStatus) -> GateReport {
        let duration_ms = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);
        GateReport {
            gate_id: self.gate_id,
            executed_at: self.executed_at,
            status,
            summary: self.summary,
            issues: self.issues,
            duration_ms,
        }
    }

    /// Finalizes the gate as `ERROR` with the causing condition attached.
    #[must_use]
    pub fn error(mut self, cause: impl Into<String>) -> GateReport {
        self.issues.push(cause.into());
        self.finish(GateStatus::Error)
    }
}

/// Returns the current UTC time in RFC 3339 form.
fn now_rfc3339() -> String {
    OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_else(|_| {
        let secs = SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| d.as_secs());
        format!("@{secs}")
    })
}

// ============================================================================
// SECTION: Aggregate
// ============================================================================

/// Combined outcome of a gate pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateReport {
    /// Overall status: `PASS`, `FAIL`, or `ERROR`.
    pub status: GateStatus,
    /// Whether bootstrap leniency was configured.
    pub bootstrap: bool,
    /// Status per gate.
    pub gates: BTreeMap<String, GateStatus>,
    /// Gates that block the pipeline.
    pub blocking: Vec<String>,
}

impl AggregateReport {
    /// Returns true when the pipeline passes.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.status == GateStatus::Pass
    }

    /// Renders the aggregate as RFC 8785 canonical JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Render`] when serialization fails.
    pub fn to_canonical_json(&self) -> Result<Vec<u8>, ReportError> {
        serde_jcs::to_vec(self).map_err(|err| ReportError::Render(err.to_string()))
    }
}

/// Folds gate statuses into the pipeline outcome.
///
/// `FAIL` anywhere fails the pipeline, then `ERROR` anywhere errors it.
/// `PARTIAL` and `NOT_SUPPORTED` block unless `bootstrap` is set.
#[must_use]
pub fn aggregate_status(reports: &[GateReport], bootstrap: bool) -> AggregateReport {
    let mut gates = BTreeMap::new();
    let mut blocking = Vec::new();
    let mut any_fail = false;
    let mut any_error = false;
    for report in reports {
        gates.insert(report.gate_id.clone(), report.status);
        let blocks = match report.status {
            GateStatus::Pass => false,
            GateStatus::Fail => {
                any_fail = true;
                true
            }
            GateStatus::Error => {
                any_error = true;
                true
            }
            GateStatus::Partial | GateStatus::NotSupported => !bootstrap,
        };
        if blocks {
            blocking.push(report.gate_id.clone());
        }
    }
    let status = if any_fail || (!any_error && !blocking.is_empty()) {
        GateStatus::Fail
    } else if any_error {
        GateStatus::Error
    } else {
        GateStatus::Pass
    };
    AggregateReport {
        status,
        bootstrap,
        gates,
        blocking,
    }
}
