//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and
//! infrastructure. Implementations live in other crates: `solventa-llm`
//! provides the text-generation and similarity-judgment capabilities.

use crate::decision::{ProposalPair, SimilarityVerdict};

/// Trait for text-generation operations
///
/// Implemented by the infrastructure layer (solventa-llm). The fallback
/// extractor uses it for constrained-output proposal extraction.
pub trait LlmProvider {
    /// Error type for LLM operations
    type Error;

    /// Generate a text completion for the given prompt
    fn generate(&self, prompt: &str) -> Result<String, Self::Error>;
}

/// Trait for the pairwise similarity judgment the dedup engine consults
/// when an incoming proposal has no exact fingerprint match.
///
/// Implementations must be safe to call for every stored row in a scope;
/// the engine treats any `Err` as "not similar" and keeps going.
pub trait SimilarityJudge {
    /// Error type for judge operations
    type Error;

    /// Compare an existing stored pair against an incoming pair.
    fn judge(
        &self,
        existing: &ProposalPair,
        incoming: &ProposalPair,
    ) -> Result<SimilarityVerdict, Self::Error>;
}
