//! Solventa Domain Layer
//!
//! This crate contains the core domain model for the Solventa remediation
//! proposal pipeline: the record types that flow between extraction,
//! validation and persistence, the content fingerprint used as the primary
//! duplicate key, and the trait interfaces that infrastructure crates
//! implement.
//!
//! ## Key Concepts
//!
//! - **Proposal**: an observation/remediation-response pair extracted from
//!   an audit document, owned by an (entity, funding source) pair
//! - **Fingerprint**: deterministic SHA-256 over the pair's plain text,
//!   scoped per (entity, funding source)
//! - **DedupDecision**: the exhaustive classification of an incoming
//!   proposal (new, exact duplicate, semantic duplicate, new version)
//!
//! ## Architecture
//!
//! This crate keeps only fundamental primitives as dependencies. Document
//! parsing, LLM calls and SQLite persistence live in the infrastructure
//! crates and reach the domain through the traits in [`traits`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod decision;
pub mod fingerprint;
pub mod metadata;
pub mod normalize;
pub mod proposal;
pub mod traits;

// Re-exports for convenience
pub use decision::{DedupDecision, ProposalPair, SimilarityVerdict};
pub use fingerprint::Fingerprint;
pub use metadata::{DocumentMetadata, FileKind};
pub use normalize::normalize;
pub use metadata::{GENERIC_DOC_TYPE, UNKNOWN_ENTITY, UNSPECIFIED_SOURCE};
pub use proposal::{
    CandidateDetails, ExtractionMethod, ProcessingStats, ProposalCandidate, ProposalVersion,
    StoredProposal, NO_OBSERVATION, NO_OBSERVATION_HTML,
};
pub use traits::{LlmProvider, SimilarityJudge};
