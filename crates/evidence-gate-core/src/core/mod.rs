// crates/evidence-gate-core/src/core/mod.rs
// ============================================================================
// Module: Evidence Gate Core Types
// Description: Deterministic hashing primitives and evidence data models.
// Purpose: Provide the pure building blocks consumed by gates and the CLI.
// Dependencies: regex, serde, serde_jcs, serde_json, serde_yaml, sha2, time
// ============================================================================

//! ## Overview
//! Core types turn evidence directories into pack root hashes, evaluation
//! results into verdict hashes, and reason codes into classifications. Every
//! function here is pure apart from explicit filesystem reads and the atomic
//! integrity write in [`pack::PackRootHasher::write`].

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod canonical;
pub mod canonptr;
pub mod corpus;
pub mod evaluation;
pub mod hashing;
pub mod pack;
pub mod report;
pub mod taxonomy;
pub mod verdict;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use canonical::CanonicalError;
pub use canonical::CanonicalNumber;
pub use canonical::CanonicalValue;
pub use canonical::hash_canonical;
pub use canonical::serialize;
pub use canonptr::CANONPTR_V1_PREFIX;
pub use canonptr::CanonicalPointer;
pub use canonptr::TracePointer;
pub use canonptr::extract_from_trace;
pub use canonptr::is_canonical;
pub use corpus::CorpusError;
pub use corpus::CorpusLayout;
pub use corpus::CuratedEntry;
pub use corpus::CuratedRegistry;
pub use corpus::CuratedSchema;
pub use corpus::MatrixScenario;
pub use corpus::RunHandle;
pub use corpus::SubstrateMatrix;
pub use evaluation::ClauseVerdict;
pub use evaluation::EvaluationResult;
pub use evaluation::EvidencePointer;
pub use evaluation::VerdictStatus;
pub use hashing::HashError;
pub use hashing::hash_bytes;
pub use hashing::hash_file;
pub use pack::FileEntry;
pub use pack::PackDigest;
pub use pack::PackError;
pub use pack::PackExclusions;
pub use pack::PackIndexer;
pub use pack::PackRootHasher;
pub use pack::PackVerification;
pub use pack::PackVerificationStatus;
pub use pack::SumsDiff;
pub use pack::SumsDocument;
pub use pack::diff_sums;
pub use report::AggregateReport;
pub use report::GateReport;
pub use report::GateStatus;
pub use report::PendingGate;
pub use report::ReportError;
pub use report::RunningGate;
pub use report::aggregate_status;
pub use taxonomy::Classification;
pub use taxonomy::CodeKind;
pub use taxonomy::Taxonomy;
pub use taxonomy::TaxonomyClassifier;
pub use taxonomy::TaxonomyDomain;
pub use taxonomy::TaxonomyError;
pub use taxonomy::TaxonomyStats;
pub use verdict::compute_verdict_hash;
pub use verdict::sanitize_message;
pub use verdict::verdict_projection;
