// crates/evidence-gate-core/tests/taxonomy.rs
// ============================================================================
// Module: Reason-Code Taxonomy Tests
// Description: Verifies classification precedence and taxonomy extension.
// ============================================================================
//! ## Overview
//! Ensures enum sets win over patterns, domain codes report their domain,
//! pattern families report their name, and unknown codes are never allowed.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use evidence_gate_core::CodeKind;
use evidence_gate_core::Taxonomy;
use evidence_gate_core::TaxonomyClassifier;
use evidence_gate_core::TaxonomyDomain;
use evidence_gate_core::TaxonomyError;
use evidence_gate_core::taxonomy::BUILTIN_PATTERNS;
use evidence_gate_core::taxonomy::COMMON_CODES;

fn classifier() -> TaxonomyClassifier {
    TaxonomyClassifier::new(Taxonomy::builtin().unwrap())
}

#[test]
fn common_codes_are_enum_without_domain() {
    let classification = classifier().classify("CLAUSE_FAILED");
    assert!(classification.allowed);
    assert_eq!(classification.kind, CodeKind::Enum);
    assert_eq!(classification.domain, None);
    assert_eq!(classification.rule, None);
}

#[test]
fn domain_codes_report_their_domain() {
    let classifier = classifier();
    let cases = [
        ("D1_OUTCOME_INVALID", TaxonomyDomain::D1),
        ("D2_TERMINAL_STATE_MISSING", TaxonomyDomain::D2),
        ("D3_SUBJECT_MISSING", TaxonomyDomain::D3),
        ("D4_TERMINATION_REASON_MISSING", TaxonomyDomain::D4),
    ];
    for (code, domain) in cases {
        let classification = classifier.classify(code);
        assert_eq!(classification.kind, CodeKind::Enum, "{code}");
        assert_eq!(classification.domain, Some(domain), "{code}");
    }
}

#[test]
fn pattern_codes_report_family_name() {
    let classifier = classifier();
    let cases = [
        ("BUNDLE-POINTER-MISSING-B1", "BUNDLE_POINTER_MISSING"),
        ("REQ-FAIL-CONTEXT", "REQ_FAIL"),
        ("EVAL-NOT-APPLICABLE-D2", "EVAL_NOT_APPLICABLE"),
        ("GF-AUTHZ-FAILED", "GF_FAILED"),
        ("GF-AUTHZ-NOT-EVALUATED", "GF_NOT_EVALUATED"),
        ("GF-AUTHZ-NOT-ADMISSIBLE", "GF_NOT_ADMISSIBLE"),
    ];
    for (code, family) in cases {
        let classification = classifier.classify(code);
        assert_eq!(classification.kind, CodeKind::Pattern, "{code}");
        assert_eq!(classification.rule.as_deref(), Some(family), "{code}");
        assert!(classification.allowed);
    }
}

#[test]
fn enum_membership_wins_over_patterns() {
    let taxonomy = Taxonomy::builtin()
        .unwrap()
        .with_common_codes(["REQ-FAIL-LISTED"])
        .with_pattern("CATCH_ALL", "^.*$")
        .unwrap();
    let classifier = TaxonomyClassifier::new(taxonomy);
    assert_eq!(classifier.classify("REQ-FAIL-LISTED").kind, CodeKind::Enum);
    assert_eq!(classifier.classify("REQ-FAIL-OTHER").rule.as_deref(), Some("REQ_FAIL"));
    assert_eq!(classifier.classify("anything").rule.as_deref(), Some("CATCH_ALL"));
}

#[test]
fn unknown_and_malformed_codes_are_rejected() {
    let classifier = classifier();
    for code in ["", "clause_failed", "REQ-FAIL-", "req-fail-x", "GF--FAILED-X", "NOPE"] {
        let classification = classifier.classify(code);
        assert_eq!(classification.kind, CodeKind::Unknown, "{code}");
        assert!(!classifier.is_allowed(code), "{code}");
    }
}

#[test]
fn stats_count_every_set() {
    let stats = Taxonomy::builtin().unwrap().stats();
    assert_eq!(stats.common, COMMON_CODES.len());
    assert_eq!(stats.d1, 5);
    assert_eq!(stats.d2, 4);
    assert_eq!(stats.d3, 7);
    assert_eq!(stats.d4, 4);
    assert_eq!(stats.total_enum, stats.common + 20);
    assert_eq!(stats.patterns, BUILTIN_PATTERNS.len());
}

#[test]
fn invalid_pattern_is_reported() {
    let err = Taxonomy::builtin().unwrap().with_pattern("BROKEN", "(").unwrap_err();
    assert!(matches!(err, TaxonomyError::InvalidPattern { ref name, .. } if name == "BROKEN"));
}

#[test]
fn classification_serializes_snake_case_kind() {
    let value = serde_json::to_value(classifier().classify("D3_ACTION_MISSING")).unwrap();
    assert_eq!(value, serde_json::json!({"allowed": true, "kind": "enum", "domain": "D3"}));
}
