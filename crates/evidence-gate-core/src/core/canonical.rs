// crates/evidence-gate-core/src/core/canonical.rs
// ============================================================================
// Module: Evidence Gate Canonical Serialization
// Description: Deterministic byte serialization for JSON-like values.
// Purpose: Remove key-order and number-format drift before hashing.
// Dependencies: serde, serde_jcs, serde_json, thiserror
// ============================================================================

//! ## Overview
//! [`CanonicalValue`] is a closed recursive sum type over the JSON data model.
//! [`serialize`] renders it with no whitespace, map keys in ascending code-point
//! order, and arrays in their original order.
//!
//! ## Number rule
//! - Integers in the `i64`/`u64` range are printed in plain decimal.
//! - Finite floats are printed as the shortest decimal that round-trips to the
//!   same `f64`, never in exponent notation. Integral floats drop the fraction
//!   (`1.0` is printed as `1`) and negative zero is printed as `0`.
//! - NaN and infinities cannot be represented; constructors reject them.
//!
//! ## String rule
//! `"` and `\` are escaped, `\b \f \n \r \t` use short escapes, other control
//! characters below U+0020 use `\u00xx` with lowercase hex, and all other
//! characters are emitted as raw UTF-8.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::hashing::hash_bytes;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while building canonical values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CanonicalError {
    /// Float value is NaN or infinite.
    #[error("non-finite number cannot be canonicalized")]
    NonFiniteNumber,
    /// Source value could not be converted into the JSON data model.
    #[error("failed to convert value: {0}")]
    Conversion(String),
}

// ============================================================================
// SECTION: Numbers
// ============================================================================

/// A finite JSON number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanonicalNumber(NumberRepr);

/// Internal storage for [`CanonicalNumber`].
#[derive(Debug, Clone, Copy, PartialEq)]
enum NumberRepr {
    /// Signed integer.
    Int(i64),
    /// Unsigned integer above `i64::MAX`.
    UInt(u64),
    /// Finite float.
    Float(f64),
}

impl CanonicalNumber {
    /// Builds a number from a signed integer.
    #[must_use]
    pub const fn from_i64(value: i64) -> Self {
        Self(NumberRepr::Int(value))
    }

    /// Builds a number from an unsigned integer.
    #[must_use]
    pub const fn from_u64(value: u64) -> Self {
        Self(NumberRepr::UInt(value))
    }

    /// Builds a number from a float.
    ///
    /// # Errors
    ///
    /// Returns [`CanonicalError::NonFiniteNumber`] for NaN or infinities.
    pub fn from_f64(value: f64) -> Result<Self, CanonicalError> {
        if value.is_finite() {
            Ok(Self(NumberRepr::Float(value)))
        } else {
            Err(CanonicalError::NonFiniteNumber)
        }
    }

    /// Renders the number using the fixed canonical rule.
    #[must_use]
    pub fn render(&self) -> String {
        match self.0 {
            NumberRepr::Int(value) => value.to_string(),
            NumberRepr::UInt(value) => value.to_string(),
            NumberRepr::Float(value) if value == 0.0 => "0".to_string(),
            // f64 Display is shortest round-trip and never uses exponents.
            NumberRepr::Float(value) => format!("{value}"),
        }
    }
}

// ============================================================================
// SECTION: Values
// ============================================================================

/// Closed JSON-like value accepted by the canonical serializer.
#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalValue {
    /// JSON null.
    Null,
    /// JSON boolean.
    Bool(bool),
    /// Finite JSON number.
    Number(CanonicalNumber),
    /// JSON string.
    String(String),
    /// Ordered array.
    Array(Vec<Self>),
    /// Mapping with keys kept in code-point order.
    Map(BTreeMap<String, Self>),
}

impl CanonicalValue {
    /// Builds a string value.
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    /// Converts any serializable value into a canonical value.
    ///
    /// Serialization goes through RFC 8785 first so non-finite floats are
    /// rejected instead of silently becoming `null`.
    ///
    /// # Errors
    ///
    /// Returns [`CanonicalError`] when serialization fails.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, CanonicalError> {
        let bytes =
            serde_jcs::to_vec(value).map_err(|err| CanonicalError::Conversion(err.to_string()))?;
        let json: Value = serde_json::from_slice(&bytes)
            .map_err(|err| CanonicalError::Conversion(err.to_string()))?;
        Self::try_from(&json)
    }
}

impl TryFrom<&Value> for CanonicalValue {
    type Error = CanonicalError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        Ok(match value {
            Value::Null => Self::Null,
            Value::Bool(flag) => Self::Bool(*flag),
            Value::Number(number) => {
                if let Some(int) = number.as_i64() {
                    Self::Number(CanonicalNumber::from_i64(int))
                } else if let Some(uint) = number.as_u64() {
                    Self::Number(CanonicalNumber::from_u64(uint))
                } else {
                    let float = number.as_f64().ok_or(CanonicalError::NonFiniteNumber)?;
                    Self::Number(CanonicalNumber::from_f64(float)?)
                }
            }
            Value::String(text) => Self::String(text.clone()),
            Value::Array(items) => {
                Self::Array(items.iter().map(Self::try_from).collect::<Result<Vec<_>, _>>()?)
            }
            Value::Object(map) => {
                let mut out = BTreeMap::new();
                for (key, item) in map {
                    out.insert(key.clone(), Self::try_from(item)?);
                }
                Self::Map(out)
            }
        })
    }
}

impl From<&str> for CanonicalValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for CanonicalValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

// ============================================================================
// SECTION: Serialization
// ============================================================================

/// Serializes a canonical value into its canonical text form.
#[must_use]
pub fn serialize(value: &CanonicalValue) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

/// Serializes a canonical value and hashes the UTF-8 bytes with SHA-256.
#[must_use]
pub fn hash_canonical(value: &CanonicalValue) -> String {
    hash_bytes(serialize(value).as_bytes())
}

/// Appends a value to the output buffer.
fn write_value(out: &mut String, value: &CanonicalValue) {
    match value {
        CanonicalValue::Null => out.push_str("null"),
        CanonicalValue::Bool(true) => out.push_str("true"),
        CanonicalValue::Bool(false) => out.push_str("false"),
        CanonicalValue::Number(number) => out.push_str(&number.render()),
        CanonicalValue::String(text) => write_string(out, text),
        CanonicalValue::Array(items) => {
            out.push('[');
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                write_value(out, item);
            }
            out.push(']');
        }
        CanonicalValue::Map(map) => {
            out.push('{');
            for (index, (key, item)) in map.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                write_string(out, key);
                out.push(':');
                write_value(out, item);
            }
            out.push('}');
        }
    }
}

/// Appends a quoted, escaped string literal.
fn write_string(out: &mut String, text: &str) {
    out.push('"');
    for ch in text.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            ch if u32::from(ch) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", u32::from(ch));
            }
            ch => out.push(ch),
        }
    }
    out.push('"');
}
