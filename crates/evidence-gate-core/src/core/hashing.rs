// crates/evidence-gate-core/src/core/hashing.rs
// ============================================================================
// Module: Evidence Gate Content Hashing
// Description: SHA-256 digests over exact file bytes.
// Purpose: Provide the leaf content hasher used by pack and report checks.
// Dependencies: sha2, thiserror
// ============================================================================

//! ## Overview
//! Every digest in Evidence Gate is SHA-256 rendered as 64 lowercase hex
//! characters. File contents are hashed exactly as stored: no newline
//! normalization and no encoding transformation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Length of a hex-encoded SHA-256 digest.
pub const SHA256_HEX_LEN: usize = 64;

/// Number of hex characters shown when a digest is abbreviated in issues.
pub const SHORT_HASH_LEN: usize = 16;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised when hashing file contents.
#[derive(Debug, Error)]
pub enum HashError {
    /// File could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

// ============================================================================
// SECTION: Hashing Helpers
// ============================================================================

/// Hashes raw bytes and returns the lowercase hex digest.
#[must_use]
pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex_encode(&hasher.finalize())
}

/// Hashes the exact byte content of a file.
///
/// # Errors
///
/// Returns [`HashError::Read`] when the file cannot be read.
pub fn hash_file(path: &Path) -> Result<String, HashError> {
    let bytes = fs::read(path).map_err(|source| HashError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(hash_bytes(&bytes))
}

/// Returns true when `value` is a 64-character lowercase hex digest.
#[must_use]
pub fn is_sha256_hex(value: &str) -> bool {
    value.len() == SHA256_HEX_LEN && value.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Abbreviates a digest for human-readable issue strings.
#[must_use]
pub fn short_hash(value: &str) -> &str {
    value.get(..SHORT_HASH_LEN).unwrap_or(value)
}

// ============================================================================
// SECTION: Hex Encoding
// ============================================================================

/// Encodes bytes as a lowercase hex string.
pub(crate) fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}

// ============================================================================
// SECTION: Tests
// ============================================================================
