// crates/evidence-gate-core/tests/canonical.rs
// ============================================================================
// Module: Canonical Serialization Tests
// Description: Verifies key ordering, number rendering, and string escaping.
// ============================================================================
//! ## Overview
//! Ensures canonical serialization is independent of insertion order, renders
//! numbers with the fixed rule, and rejects non-finite floats.

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

use std::collections::BTreeMap;

use evidence_gate_core::CanonicalError;
use evidence_gate_core::CanonicalNumber;
use evidence_gate_core::CanonicalValue;
use evidence_gate_core::hash_bytes;
use evidence_gate_core::hash_canonical;
use evidence_gate_core::serialize;
use proptest::prelude::*;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;

fn canonical(value: &Value) -> String {
    serialize(&CanonicalValue::try_from(value).unwrap())
}

#[test]
fn maps_serialize_in_key_order_without_whitespace() {
    let value = json!({"b": 1, "a": [true, null], "c": {"z": "x", "y": false}});
    assert_eq!(canonical(&value), r#"{"a":[true,null],"b":1,"c":{"y":false,"z":"x"}}"#);
}

#[test]
fn arrays_keep_their_order() {
    assert_eq!(canonical(&json!([3, 1, 2])), "[3,1,2]");
}

#[test]
fn numbers_follow_fixed_rendering() {
    assert_eq!(CanonicalNumber::from_i64(-7).render(), "-7");
    assert_eq!(CanonicalNumber::from_u64(u64::MAX).render(), u64::MAX.to_string());
    assert_eq!(CanonicalNumber::from_f64(1.0).unwrap().render(), "1");
    assert_eq!(CanonicalNumber::from_f64(-0.0).unwrap().render(), "0");
    assert_eq!(CanonicalNumber::from_f64(0.1).unwrap().render(), "0.1");
    assert_eq!(CanonicalNumber::from_f64(2.5).unwrap().render(), "2.5");
    assert_eq!(canonical(&json!(1.0)), canonical(&json!(1)));
}

#[test]
fn non_finite_numbers_are_rejected() {
    assert_eq!(CanonicalNumber::from_f64(f64::NAN), Err(CanonicalError::NonFiniteNumber));
    assert_eq!(CanonicalNumber::from_f64(f64::INFINITY), Err(CanonicalError::NonFiniteNumber));

    #[derive(Serialize)]
    struct FloatWrapper {
        value: f64,
    }
    let err = CanonicalValue::from_serialize(&FloatWrapper {
        value: f64::NAN,
    })
    .unwrap_err();
    assert!(matches!(err, CanonicalError::Conversion(_) | CanonicalError::NonFiniteNumber));
}

#[test]
fn strings_escape_control_characters() {
    let value = CanonicalValue::string("quote\" slash\\ nl\n tab\t bell\u{07} é");
    assert_eq!(serialize(&value), "\"quote\\\" slash\\\\ nl\\n tab\\t bell\\u0007 é\"");
}

#[test]
fn hash_is_sha256_of_serialization() {
    let mut map = BTreeMap::new();
    map.insert("k".to_string(), CanonicalValue::from("v"));
    let value = CanonicalValue::Map(map);
    assert_eq!(hash_canonical(&value), hash_bytes(br#"{"k":"v"}"#));
}

#[test]
fn from_serialize_matches_value_conversion() {
    #[derive(Serialize)]
    struct Sample {
        name: &'static str,
        count: u32,
        ratio: f64,
    }
    let sample = Sample {
        name: "demo",
        count: 3,
        ratio: 0.5,
    };
    let via_serde = CanonicalValue::from_serialize(&sample).unwrap();
    let via_json =
        CanonicalValue::try_from(&json!({"name": "demo", "count": 3, "ratio": 0.5})).unwrap();
    assert_eq!(serialize(&via_serde), serialize(&via_json));
}

proptest! {
    #[test]
    fn insertion_order_never_changes_output(
        entries in prop::collection::btree_map("[a-zA-Z0-9_]{1,8}", any::<i64>(), 0 .. 12)
    ) {
        let mut forward = Map::new();
        for (key, value) in &entries {
            forward.insert(key.clone(), json!(value));
        }
        let mut reverse = Map::new();
        for (key, value) in entries.iter().rev() {
            reverse.insert(key.clone(), json!(value));
        }
        prop_assert_eq!(
            canonical(&Value::Object(forward)),
            canonical(&Value::Object(reverse))
        );
    }

    #[test]
    fn finite_floats_round_trip_through_rendering(
        value in any::<f64>().prop_filter("finite", |v| v.is_finite())
    ) {
        let rendered = CanonicalNumber::from_f64(value).unwrap().render();
        let parsed: f64 = rendered.parse().unwrap();
        prop_assert!(parsed == value || (parsed == 0.0 && value == 0.0));
        prop_assert!(!rendered.contains('e') && !rendered.contains('E'));
    }
}
