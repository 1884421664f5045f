// crates/evidence-gate-core/src/core/taxonomy.rs
// ============================================================================
// Module: Reason Code Taxonomy
// Description: Enumerated and pattern-based reason-code classification.
// Purpose: Classify reason codes as enum, pattern, or unknown per domain.
// Dependencies: regex, serde, thiserror
// ============================================================================

//! ## Overview
//! A [`Taxonomy`] is immutable data: a common enumerated set, four domain
//! sets (D1 budget, D2 lifecycle, D3 authorization, D4 termination), and an
//! ordered list of regex families. [`TaxonomyClassifier::classify`] checks
//! them in exactly that order and the first match wins.
//!
//! ## Invariants
//! - Classification is a pure function of the code string.
//! - A code listed both in the common set and a domain set classifies as
//!   common, without a domain.
//! - `unknown` is a classification outcome, never an error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;

use regex::Regex;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Built-in Sets
// ============================================================================

/// Reason codes shared by every domain.
pub const COMMON_CODES: &[&str] = &[
    "ADMISSION_FAILED",
    "VERDICT_MISSING",
    "CLAUSE_FAILED",
    "CLAUSES_NOT_EVALUATED",
    "CROSS_REFERENCE_MISMATCH",
    "GOLDENFLOW_EVAL_FAILED",
    "INTEGRITY_HASH_MISMATCH",
    "INVARIANT_VIOLATION",
    "MANIFEST_INVALID_OR_INCOMPLETE",
    "MANIFEST_PARSE_FAILED",
    "MISSING_EVIDENCE_CONTEXT",
    "MISSING_EVIDENCE_PLAN",
    "MISSING_EVIDENCE_TRACE",
    "MISSING_EVIDENCE_CONFIRM_GATE",
    "MISSING_EVIDENCE_SNAPSHOT_DIFF",
    "NOT_ADMISSIBLE",
    "NOT_EVALUATED",
    "PACK_TOO_LARGE",
    "PARTIALLY_ADMISSIBLE",
    "PATH_TRAVERSAL_DETECTED",
    "POINTER_UNRESOLVABLE",
    "REQUIRED_ARTIFACT_MISSING",
    "SCHEMA_VALIDATION_FAILED",
    "TIMELINE_INCOMPLETE_OR_INVALID",
    "TIMELINE_NOT_TOTALLY_ORDERED",
    "TIMELINE_PARSE_FAILED",
    "VERSION_BINDING_FAILED",
    "VERSION_INCOMPATIBLE",
    "EVIDENCE_PACK_INVALID_FILE_TYPE",
    "EVIDENCE_PACK_PATH_TRAVERSAL",
    "EVIDENCE_PACK_PROHIBITED_CONTENT",
    "EVIDENCE_PACK_SECURITY_REJECTED",
    "EVIDENCE_PACK_SIZE_EXCEEDED",
    "BUNDLE-MISSING-B1",
    "BUNDLE-MISSING-B2",
    "BUNDLE-MISSING-B3",
    "BUNDLE-MISSING-B4",
    "BUNDLE-INVALID-B1",
    "BUNDLE-INVALID-B2",
    "BUNDLE-INVALID-B3",
    "BUNDLE-INVALID-B4",
    "PACK-MISSING",
    "PACK-PARTIAL",
    "REASON-CODE-REQUIRED-MISSING",
    "ADM-GATE-PIN-FAIL",
    "ADM-GATE-CONTRACT-FAIL",
];

/// D1 budget and resource codes.
pub const D1_BUDGET_CODES: &[&str] = &[
    "D1_BUDGET_DENY_WITHOUT_GATE",
    "D1_DECISION_EVENT_MISSING",
    "D1_DECISION_OUTCOME_MISSING",
    "D1_OUTCOME_INVALID",
    "D1_OUTCOME_NOT_LOCATABLE",
];

/// D2 lifecycle and state codes.
pub const D2_LIFECYCLE_CODES: &[&str] = &[
    "D2_POST_TERMINAL_EXECUTION_DETECTED",
    "D2_TERMINAL_EVENT_MISSING",
    "D2_TERMINAL_STATE_MISSING",
    "D2_TERMINAL_STATE_NOT_IN_ALLOWED_SET",
];

/// D3 authorization codes.
pub const D3_AUTHZ_CODES: &[&str] = &[
    "D3_ACTION_MISSING",
    "D3_DECISION_EVENT_MISSING",
    "D3_DECISION_OUTCOME_MISSING",
    "D3_DENY_WITHOUT_CONFIRM_GATE",
    "D3_RESOURCE_MISSING",
    "D3_SUBJECT_MISSING",
    "D3_SUBJECT_RESOURCE_ACTION_INCOMPLETE",
];

/// D4 termination codes.
pub const D4_TERMINATION_CODES: &[&str] = &[
    "D4_POST_TERMINATION_EXECUTION_DETECTED",
    "D4_TERMINATION_EVENT_MISSING",
    "D4_TERMINATION_REASON_MISSING",
    "D4_TERMINATION_REASON_NOT_IN_ALLOWED_SET",
];

/// Pattern families in match order: `(name, regex)`.
pub const BUILTIN_PATTERNS: &[(&str, &str)] = &[
    ("BUNDLE_POINTER_MISSING", r"^BUNDLE-POINTER-MISSING-[A-Z0-9-]+$"),
    ("REQ_FAIL", r"^REQ-FAIL-[A-Z0-9-]+$"),
    ("EVAL_NOT_APPLICABLE", r"^EVAL-NOT-APPLICABLE-[A-Z0-9-]+$"),
    ("GF_FAILED", r"^GF-[A-Z0-9-]+-FAILED$"),
    ("GF_NOT_EVALUATED", r"^GF-[A-Z0-9-]+-NOT-EVALUATED$"),
    ("GF_NOT_ADMISSIBLE", r"^GF-[A-Z0-9-]+-NOT-ADMISSIBLE$"),
];

// ============================================================================
// SECTION: Types
// ============================================================================

/// Evidence domain owning a set of reason codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TaxonomyDomain {
    /// Budget and resource decisions.
    D1,
    /// Lifecycle and state transitions.
    D2,
    /// Authorization decisions.
    D3,
    /// Termination decisions.
    D4,
}

impl TaxonomyDomain {
    /// All domains in precedence order.
    pub const ALL: [Self; 4] = [Self::D1, Self::D2, Self::D3, Self::D4];

    /// Returns the wire label (`D1`..`D4`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::D1 => "D1",
            Self::D2 => "D2",
            Self::D3 => "D3",
            Self::D4 => "D4",
        }
    }
}

impl fmt::Display for TaxonomyDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of taxonomy match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeKind {
    /// Listed in an enumerated set.
    Enum,
    /// Matched a pattern family.
    Pattern,
    /// Not recognized.
    Unknown,
}

/// Result of classifying a reason code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    /// True for enum and pattern matches.
    pub allowed: bool,
    /// Match kind.
    pub kind: CodeKind,
    /// Owning domain for domain enum matches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<TaxonomyDomain>,
    /// Name of the matching pattern family.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
}

impl Classification {
    /// Builds an unknown classification.
    const fn unknown() -> Self {
        Self {
            allowed: false,
            kind: CodeKind::Unknown,
            domain: None,
            rule: None,
        }
    }
}

/// Sizes of the taxonomy sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyStats {
    /// Common enum size.
    pub common: usize,
    /// D1 enum size.
    pub d1: usize,
    /// D2 enum size.
    pub d2: usize,
    /// D3 enum size.
    pub d3: usize,
    /// D4 enum size.
    pub d4: usize,
    /// Sum of all enum sizes.
    pub total_enum: usize,
    /// Number of pattern families.
    pub patterns: usize,
}

/// Errors raised while building a taxonomy.
#[derive(Debug, Error)]
pub enum TaxonomyError {
    /// Pattern failed to compile.
    #[error("invalid reason-code pattern {name}: {error}")]
    InvalidPattern {
        /// Pattern family name.
        name: String,
        /// Compiler error.
        error: String,
    },
}

/// Named pattern family.
#[derive(Debug, Clone)]
struct PatternRule {
    /// Family name reported in classifications.
    name: String,
    /// Compiled expression.
    regex: Regex,
}

// ============================================================================
// SECTION: Taxonomy
// ============================================================================

/// Immutable reason-code taxonomy.
#[derive(Debug, Clone)]
pub struct Taxonomy {
    /// Codes shared by all domains.
    common: BTreeSet<String>,
    /// Domain-specific codes.
    domains: BTreeMap<TaxonomyDomain, BTreeSet<String>>,
    /// Pattern families in match order.
    patterns: Vec<PatternRule>,
}

impl Taxonomy {
    /// Builds the frozen built-in taxonomy.
    ///
    /// # Errors
    ///
    /// Returns [`TaxonomyError::InvalidPattern`] if a built-in pattern fails
    /// to compile.
    pub fn builtin() -> Result<Self, TaxonomyError> {
        let mut domains = BTreeMap::new();
        domains.insert(TaxonomyDomain::D1, to_set(D1_BUDGET_CODES));
        domains.insert(TaxonomyDomain::D2, to_set(D2_LIFECYCLE_CODES));
        domains.insert(TaxonomyDomain::D3, to_set(D3_AUTHZ_CODES));
        domains.insert(TaxonomyDomain::D4, to_set(D4_TERMINATION_CODES));
        let mut taxonomy = Self {
            common: to_set(COMMON_CODES),
            domains,
            patterns: Vec::new(),
        };
        for (name, pattern) in BUILTIN_PATTERNS {
            taxonomy = taxonomy.with_pattern(name, pattern)?;
        }
        Ok(taxonomy)
    }

    /// Adds codes to the common set.
    #[must_use]
    pub fn with_common_codes<I>(mut self, codes: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.common.extend(codes.into_iter().map(Into::into));
        self
    }

    /// Appends a pattern family after the existing ones.
    ///
    /// # Errors
    ///
    /// Returns [`TaxonomyError::InvalidPattern`] when the regex is invalid.
    pub fn with_pattern(mut self, name: &str, pattern: &str) -> Result<Self, TaxonomyError> {
        let regex = Regex::new(pattern).map_err(|err| TaxonomyError::InvalidPattern {
            name: name.to_string(),
            error: err.to_string(),
        })?;
        self.patterns.push(PatternRule {
            name: name.to_string(),
            regex,
        });
        Ok(self)
    }

    /// Returns the set sizes.
    #[must_use]
    pub fn stats(&self) -> TaxonomyStats {
        let domain_len =
            |domain: TaxonomyDomain| self.domains.get(&domain).map_or(0, BTreeSet::len);
        let d1 = domain_len(TaxonomyDomain::D1);
        let d2 = domain_len(TaxonomyDomain::D2);
        let d3 = domain_len(TaxonomyDomain::D3);
        let d4 = domain_len(TaxonomyDomain::D4);
        TaxonomyStats {
            common: self.common.len(),
            d1,
            d2,
            d3,
            d4,
            total_enum: self.common.len() + d1 + d2 + d3 + d4,
            patterns: self.patterns.len(),
        }
    }
}

/// Collects a constant list into an owned set.
fn to_set(codes: &[&str]) -> BTreeSet<String> {
    codes.iter().map(ToString::to_string).collect()
}

// ============================================================================
// SECTION: Classifier
// ============================================================================

/// Pure reason-code classifier over an immutable taxonomy.
#[derive(Debug, Clone)]
pub struct TaxonomyClassifier {
    /// Taxonomy data.
    taxonomy: Taxonomy,
}

impl TaxonomyClassifier {
    /// Wraps a taxonomy.
    #[must_use]
    pub const fn new(taxonomy: Taxonomy) -> Self {
        Self {
            taxonomy,
        }
    }

    /// Returns the underlying taxonomy.
    #[must_use]
    pub const fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    /// Classifies a reason code; first match wins.
    #[must_use]
    pub fn classify(&self, code: &str) -> Classification {
        if self.taxonomy.common.contains(code) {
            return Classification {
                allowed: true,
                kind: CodeKind::Enum,
                domain: None,
                rule: None,
            };
        }
        for domain in TaxonomyDomain::ALL {
            if self.taxonomy.domains.get(&domain).is_some_and(|codes| codes.contains(code)) {
                return Classification {
                    allowed: true,
                    kind: CodeKind::Enum,
                    domain: Some(domain),
                    rule: None,
                };
            }
        }
        for rule in &self.taxonomy.patterns {
            if rule.regex.is_match(code) {
                return Classification {
                    allowed: true,
                    kind: CodeKind::Pattern,
                    domain: None,
                    rule: Some(rule.name.clone()),
                };
            }
        }
        Classification::unknown()
    }

    /// Returns true when a code is enum- or pattern-classified.
    #[must_use]
    pub fn is_allowed(&self, code: &str) -> bool {
        self.classify(code).allowed
    }
}
