//! Deduplication decisions and similarity verdicts

use serde::{Deserialize, Serialize};

/// An observation/proposal plain-text pair, as handed to the similarity
/// judge.
#[derive(Debug, Clone, PartialEq)]
pub struct ProposalPair {
    /// Observation plain text
    pub observation: String,
    /// Proposal plain text
    pub proposal: String,
}

impl ProposalPair {
    /// Build a pair from borrowed text.
    pub fn new(observation: impl Into<String>, proposal: impl Into<String>) -> Self {
        Self {
            observation: observation.into(),
            proposal: proposal.into(),
        }
    }
}

/// The external similarity judgment over two proposal pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityVerdict {
    /// Similarity score, 0-100
    pub score: u8,
    /// The two pairs are practically identical
    pub is_duplicate: bool,
    /// The second pair is a revised version of the first
    pub is_version: bool,
    /// Free-text rationale from the judge
    pub rationale: String,
    /// Main changes the judge detected
    #[serde(default)]
    pub changes: Vec<String>,
}

impl SimilarityVerdict {
    /// The degraded verdict used when no judge is configured or a judge
    /// call fails: score 0, nothing matches.
    pub fn not_similar(rationale: impl Into<String>) -> Self {
        Self {
            score: 0,
            is_duplicate: false,
            is_version: false,
            rationale: rationale.into(),
            changes: Vec::new(),
        }
    }
}

/// Classification of an incoming proposal against the store, evaluated in
/// fixed order: exact fingerprint match, then semantic judgment, then new.
///
/// Each variant carries only the fields relevant to that case so consumers
/// can match exhaustively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum DedupDecision {
    /// First sighting within its (entity, funding source) scope; a fresh
    /// row was inserted with version 1.
    New {
        /// Id of the inserted row
        proposal_id: i64,
    },
    /// Identical fingerprint already stored in the same scope; nothing
    /// inserted.
    ExactDuplicate {
        /// Id of the canonical row
        original_id: i64,
    },
    /// The judge found a near-identical proposal in the same scope;
    /// nothing inserted.
    SemanticDuplicate {
        /// Id of the canonical row
        original_id: i64,
        /// Best similarity score
        similarity: u8,
        /// Judge rationale
        rationale: String,
    },
    /// The judge classified the incoming pair as a revision; the existing
    /// row was updated in place and a version snapshot appended.
    NewVersion {
        /// Id of the updated row
        proposal_id: i64,
        /// The row's version after the update
        version: u32,
        /// Best similarity score
        similarity: u8,
        /// Judge rationale, stored as the version's change reason
        rationale: String,
    },
}

impl DedupDecision {
    /// True for both duplicate variants.
    pub fn is_duplicate(&self) -> bool {
        matches!(
            self,
            Self::ExactDuplicate { .. } | Self::SemanticDuplicate { .. }
        )
    }
}
