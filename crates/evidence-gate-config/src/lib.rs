// crates/evidence-gate-config/src/lib.rs
// ============================================================================
// Module: Evidence Gate Config Library
// Description: Canonical config model and validation.
// Purpose: Single source of truth for evidence-gate.toml semantics.
// Dependencies: evidence-gate-core, regex, serde, toml
// ============================================================================

//! ## Overview
//! `evidence-gate-config` defines the configuration model for the evidence
//! gate pipeline. It validates fail-closed and converts the validated model
//! into the core inputs: corpus layout, pack hasher, taxonomy, gate
//! settings, evaluation source, and audit sink.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
