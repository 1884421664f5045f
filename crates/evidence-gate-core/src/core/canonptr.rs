// crates/evidence-gate-core/src/core/canonptr.rs
// ============================================================================
// Module: Canonical Evidence Pointers
// Description: Versioned locator grammar for decision evidence.
// Purpose: Give coverage checks a fixed pointer grammar to measure against.
// Dependencies: serde, serde_json, crate::core::hashing, crate::core::taxonomy
// ============================================================================

//! ## Overview
//! A canonical pointer has the form
//! `canonptr:v1:<domain>:<decision_kind>:<seq>:<digest>` where the domain is
//! `D1`..`D4`, the decision kind is `[a-z_]+`, the sequence is exactly three
//! digits, and the digest is the first eight hex characters of the SHA-256 of
//! the decision's semantic fields rendered as sorted `key:value` pairs joined
//! by `|`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Number;
use serde_json::Value;

use crate::core::canonical::CanonicalNumber;
use crate::core::hashing::hash_bytes;
use crate::core::taxonomy::TaxonomyDomain;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Scheme prefix of every v1 pointer.
pub const CANONPTR_V1_PREFIX: &str = "canonptr:v1:";
/// Length of the semantic digest.
const DIGEST_LEN: usize = 8;
/// Width of the sequence field.
const SEQ_WIDTH: usize = 3;

// ============================================================================
// SECTION: Pointer
// ============================================================================

/// Parsed canonical pointer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalPointer {
    /// Evidence domain.
    pub domain: TaxonomyDomain,
    /// Decision kind (`[a-z_]+`).
    pub decision_kind: String,
    /// Three-digit sequence within the trace.
    pub seq: String,
    /// Eight-character semantic digest.
    pub digest: String,
}

impl CanonicalPointer {
    /// Parses a v1 pointer; returns `None` when the grammar does not match.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let rest = value.strip_prefix(CANONPTR_V1_PREFIX)?;
        let mut parts = rest.split(':');
        let domain = parse_domain(parts.next()?)?;
        let decision_kind = parts.next()?;
        let seq = parts.next()?;
        let digest = parts.next()?;
        if parts.next().is_some() {
            return None;
        }
        let kind_ok = !decision_kind.is_empty()
            && decision_kind.bytes().all(|b| b.is_ascii_lowercase() || b == b'_');
        let seq_ok = seq.len() == SEQ_WIDTH && seq.bytes().all(|b| b.is_ascii_digit());
        let digest_ok = digest.len() == DIGEST_LEN
            && digest.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        (kind_ok && seq_ok && digest_ok).then(|| Self {
            domain,
            decision_kind: decision_kind.to_string(),
            seq: seq.to_string(),
            digest: digest.to_string(),
        })
    }
}

impl fmt::Display for CanonicalPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{CANONPTR_V1_PREFIX}{}:{}:{}:{}",
            self.domain, self.decision_kind, self.seq, self.digest
        )
    }
}

/// Returns true when `value` matches the v1 grammar.
#[must_use]
pub fn is_canonical(value: &str) -> bool {
    CanonicalPointer::parse(value).is_some()
}

/// Parses a `D1`..`D4` label.
fn parse_domain(label: &str) -> Option<TaxonomyDomain> {
    TaxonomyDomain::ALL.into_iter().find(|domain| domain.as_str() == label)
}

// ============================================================================
// SECTION: Semantic Digest
// ============================================================================

/// Maps a decision kind to its domain.
#[must_use]
pub fn domain_for_decision_kind(kind: &str) -> Option<TaxonomyDomain> {
    match kind {
        "budget" => Some(TaxonomyDomain::D1),
        "lifecycle" => Some(TaxonomyDomain::D2),
        "authz" => Some(TaxonomyDomain::D3),
        "terminate" | "termination" => Some(TaxonomyDomain::D4),
        _ => None,
    }
}

/// Hashes sorted `key:value` pairs joined by `|` and keeps eight hex chars.
#[must_use]
pub fn semantic_digest(fields: &BTreeMap<String, String>) -> String {
    let joined =
        fields.iter().map(|(key, value)| format!("{key}:{value}")).collect::<Vec<_>>().join("|");
    let mut digest = hash_bytes(joined.as_bytes());
    digest.truncate(DIGEST_LEN);
    digest
}

/// Formats a v1 pointer; the sequence is zero-padded to three digits.
#[must_use]
pub fn format_v1(
    domain: TaxonomyDomain,
    decision_kind: &str,
    seq: usize,
    fields: &BTreeMap<String, String>,
) -> String {
    format!(
        "{CANONPTR_V1_PREFIX}{domain}:{decision_kind}:{seq:0width$}:{}",
        semantic_digest(fields),
        width = SEQ_WIDTH
    )
}

// ============================================================================
// SECTION: Trace Extraction
// ============================================================================

/// Pointer extracted from a trace event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TracePointer {
    /// Formatted canonical pointer.
    pub pointer: String,
    /// Source event identifier, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
}

/// Semantic field names projected per domain.
const fn semantic_keys(domain: TaxonomyDomain) -> &'static [&'static str] {
    match domain {
        TaxonomyDomain::D1 => &["outcome", "resource", "amount"],
        TaxonomyDomain::D2 => &["to_state"],
        TaxonomyDomain::D3 => &["outcome", "subject", "resource", "action"],
        TaxonomyDomain::D4 => &["termination_reason"],
    }
}

/// Semantic field kept whenever its key is present, even when null or zero.
const PRESENCE_KEYED_FIELD: &str = "amount";

/// Renders a number with the canonical number rule.
fn number_text(number: &Number) -> Option<String> {
    let canonical = number
        .as_i64()
        .map(CanonicalNumber::from_i64)
        .or_else(|| number.as_u64().map(CanonicalNumber::from_u64))
        .or_else(|| number.as_f64().and_then(|f| CanonicalNumber::from_f64(f).ok()))?;
    Some(canonical.render())
}

/// Renders a semantic event field, or `None` when it counts as absent.
///
/// Most fields must be truthy: `null`, `false`, `0` and `""` are absent.
/// The presence-keyed field keeps those values and renders them literally.
/// Arrays and objects are always absent.
fn field_text(key: &str, value: &Value) -> Option<String> {
    let keep_falsy = key == PRESENCE_KEYED_FIELD;
    match value {
        Value::Null => keep_falsy.then(|| "null".to_string()),
        Value::Bool(flag) => (*flag || keep_falsy).then(|| flag.to_string()),
        Value::String(text) => (keep_falsy || !text.is_empty()).then(|| text.clone()),
        Value::Number(number) => {
            number_text(number).filter(|text| keep_falsy || text.as_str() != "0")
        }
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Builds a pointer from a decision event; returns `None` for other events.
#[must_use]
pub fn pointer_from_event(event: &Value, seq: usize) -> Option<String> {
    let decision_kind = event.get("decision_kind")?.as_str()?;
    let domain = domain_for_decision_kind(decision_kind)?;
    let mut fields = BTreeMap::new();
    fields.insert("decision_kind".to_string(), decision_kind.to_string());
    for key in semantic_keys(domain) {
        if let Some(text) = event.get(*key).and_then(|value| field_text(key, value)) {
            fields.insert((*key).to_string(), text);
        }
    }
    Some(format_v1(domain, decision_kind, seq, &fields))
}

/// Extracts pointers from trace events in order.
///
/// The sequence counter advances only for events that produced a pointer.
#[must_use]
pub fn extract_from_trace(events: &[Value]) -> Vec<TracePointer> {
    let mut pointers = Vec::new();
    for event in events {
        if let Some(pointer) = pointer_from_event(event, pointers.len()) {
            pointers.push(TracePointer {
                pointer,
                event_id: event.get("event_id").and_then(Value::as_str).map(ToString::to_string),
            });
        }
    }
    pointers
}
