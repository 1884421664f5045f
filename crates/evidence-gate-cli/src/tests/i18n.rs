// crates/evidence-gate-cli/src/tests/i18n.rs
// ============================================================================
// Module: CLI i18n Tests
// Description: Unit tests for catalog lookup and placeholder substitution.
// Purpose: Ensure CLI messages resolve deterministically.
// Dependencies: evidence-gate-cli i18n module
// ============================================================================

//! ## Overview
//! Verifies catalog lookups, key fallback, and placeholder substitution.

use crate::i18n::MessageArg;
use crate::i18n::has_key;
use crate::i18n::translate;

#[test]
fn translate_substitutes_placeholders() {
    let output = translate(
        "gate.run.line",
        vec![
            MessageArg::new("gate", "reason-codes"),
            MessageArg::new("status", "PASS"),
            MessageArg::new("issues", "0"),
        ],
    );
    assert_eq!(output, "reason-codes: PASS (0 issues)");
}

#[test]
fn translate_missing_key_falls_back_to_key() {
    assert!(!has_key("no.such.key"));
    assert_eq!(translate("no.such.key", Vec::new()), "no.such.key");
}

#[test]
fn translate_missing_placeholder_keeps_template_marker() {
    let output = translate("verify.expect_mismatch", vec![MessageArg::new("expected", "aa")]);
    assert!(output.contains("aa"));
    assert!(output.contains("{computed}"));
}

#[test]
fn macro_formats_display_values() {
    let output = crate::t!("pack.recompute.files", count = 3_usize);
    assert_eq!(output, "files: 3");
}
