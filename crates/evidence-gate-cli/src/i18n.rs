// crates/evidence-gate-cli/src/i18n.rs
// ============================================================================
// Module: CLI Internationalization Helpers
// Description: Provides message catalog and translation utilities for the CLI.
// Purpose: Centralize user-facing strings for future localization support.
// Dependencies: Standard library collections and formatting utilities.
// ============================================================================

//! ## Overview
//! The evidence gate CLI stores user-facing strings in a small translation
//! catalog to keep messaging consistent. All runtime output should be routed
//! through the [`t!`](crate::t) macro.
//!
//! ## Invariants
//! - The catalog is initialized once and read-only thereafter.
//! - Missing keys fall back to the key itself to avoid panics.
//! - Placeholder substitutions preserve deterministic order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// SECTION: Types
// ============================================================================

/// A formatted message argument captured by the [`macro@crate::t`] macro.
#[derive(Clone)]
pub struct MessageArg {
    /// The placeholder name used in message templates (e.g., `"path"`).
    pub key: &'static str,
    /// The formatted string value to substitute for this placeholder.
    pub value: String,
}

impl MessageArg {
    /// Constructs a new [`MessageArg`] from a key and displayable value.
    pub fn new(key: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Static catalog entries loaded into the message bundle.
const CATALOG_ITEMS: &[(&str, &str)] = &[
    ("main.version", "evidence-gate {version}"),
    ("output.stream.stdout", "stdout"),
    ("output.stream.stderr", "stderr"),
    ("output.stream.unknown", "output"),
    ("output.write_failed", "Failed to write to {stream}: {error}"),
    ("output.render_failed", "Failed to render {kind} output: {error}"),
    ("config.load_failed", "Failed to load config: {error}"),
    ("config.validate.ok", "Config valid."),
    ("config.validate.source", "Source: {path}"),
    ("config.validate.defaults", "Source: built-in defaults"),
    ("audit.open_failed", "Failed to open audit sink: {error}"),
    ("pack.missing", "Pack path is not a directory: {path}"),
    ("pack.recompute.failed", "Failed to recompute pack hash for {path}: {error}"),
    ("pack.recompute.files", "files: {count}"),
    ("pack.recompute.root_hash", "root_hash: {hash}"),
    ("pack.recompute.match", "stored: MATCH"),
    (
        "pack.recompute.mismatch",
        "stored: MISMATCH (stored {stored}..., computed {computed}...)",
    ),
    ("pack.recompute.no_stored", "stored: no stored hash"),
    ("pack.recompute.added", "added: {path}"),
    ("pack.recompute.removed", "removed: {path}"),
    ("pack.recompute.changed", "changed: {path}"),
    ("pack.recompute.sums_unreadable", "Stored sums unreadable: {error}"),
    ("pack.recompute.write_failed", "Failed to write integrity files: {error}"),
    ("pack.recompute.written", "written: {sums}, {root}"),
    ("pack.recompute.dry_run", "Dry run; pass --write to persist integrity files."),
    (
        "verify.ruleset_unsupported",
        "Only ruleset version {supported} is supported (got: {version}).",
    ),
    ("verify.manifest_missing", "manifest.json not found in pack: {path}"),
    ("verify.failed", "Verification failed: {error}"),
    (
        "verify.expect_invalid",
        "--expect-verdict-hash must be a 64-character lowercase hex digest (got: {value}).",
    ),
    (
        "verify.expect_mismatch",
        "verdict_hash mismatch: expected {expected}, computed {computed}",
    ),
    ("gate.unknown", "Unknown gate '{gate}'. Known gates: {known}"),
    ("gate.engine_failed", "Failed to prepare gate engine: {error}"),
    ("gate.run.line", "{gate}: {status} ({issues} issues)"),
    ("gate.run.issue", "  - {issue}"),
    ("gate.run.aggregate", "aggregate: {status} (bootstrap={bootstrap})"),
    ("gate.run.blocking", "blocking: {gates}"),
    ("gate.run.write_failed", "Failed to write gate reports: {error}"),
    ("gate.run.reports", "reports: {path}"),
    ("taxonomy.build_failed", "Failed to build taxonomy: {error}"),
];

// ============================================================================
// SECTION: Translation
// ============================================================================

/// Translates `key` using the English catalog while substituting `args`.
#[must_use]
pub fn translate(key: &str, args: Vec<MessageArg>) -> String {
    let template = catalog().get(key).copied().unwrap_or(key);
    if args.is_empty() {
        return template.to_string();
    }

    let mut result = template.to_string();
    for arg in args {
        let placeholder = format!("{{{}}}", arg.key);
        result = result.replace(&placeholder, &arg.value);
    }
    result
}

/// Returns true when `key` exists in the catalog.
#[must_use]
pub fn has_key(key: &str) -> bool {
    catalog().contains_key(key)
}

/// Returns the static English catalog used by the CLI.
fn catalog() -> &'static HashMap<&'static str, &'static str> {
    static CATALOG: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();

    CATALOG.get_or_init(|| CATALOG_ITEMS.iter().copied().collect())
}

// ============================================================================
// SECTION: Macro
// ============================================================================

/// Formats a localized message from a key and named arguments.
///
/// # Arguments
///
/// - `$key` must match a catalog entry.
/// - Named arguments are substituted into `{placeholder}` positions.
///
/// # Returns
///
/// A localized [`String`] with placeholders substituted.
#[macro_export]
macro_rules! t {
    ($key:literal $(, $name:ident = $value:expr )* $(,)?) => {{
        let args = ::std::vec![
            $(
                $crate::i18n::MessageArg::new(stringify!($name), $value.to_string()),
            )*
        ];
        $crate::i18n::translate($key, args)
    }};
}
