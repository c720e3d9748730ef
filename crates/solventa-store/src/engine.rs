//! Deduplication and versioning engine
//!
//! Classifies each incoming candidate against its (entity, funding
//! source) scope in fixed order: exact fingerprint match first, then the
//! semantic judgment over every stored row, then insertion as new. The
//! semantic path is only a refinement for non-identical text; it can
//! never contradict a fingerprint match because it is never reached when
//! one exists.

use crate::{SqliteStore, StoreError};
use serde::{Deserialize, Serialize};
use solventa_domain::traits::SimilarityJudge;
use solventa_domain::{DedupDecision, ProposalCandidate, ProposalPair, SimilarityVerdict};
use tracing::{debug, info, warn};

/// Thresholds of the classification state machine. The defaults are
/// normative; changing them changes what counts as a duplicate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum score for a semantic duplicate (with the judge's
    /// `is_duplicate` flag)
    pub duplicate_threshold: u8,
    /// Minimum score for a version update (with the judge's `is_version`
    /// flag)
    pub version_threshold: u8,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            duplicate_threshold: 95,
            version_threshold: 70,
        }
    }
}

impl EngineConfig {
    /// Validate the thresholds.
    pub fn validate(&self) -> Result<(), String> {
        if self.duplicate_threshold > 100 || self.version_threshold > 100 {
            return Err("thresholds are scores in 0-100".to_string());
        }
        if self.version_threshold > self.duplicate_threshold {
            return Err("version_threshold cannot exceed duplicate_threshold".to_string());
        }
        Ok(())
    }
}

/// The identity a candidate is classified under.
#[derive(Debug, Clone)]
pub struct Scope {
    /// Entity code
    pub entity: String,
    /// Funding-source code
    pub source: String,
    /// Source filename, stored with inserted rows
    pub source_file: String,
    /// Source file kind label, stored with inserted rows
    pub file_kind: String,
}

/// Dedup engine owning the store and a similarity judge.
pub struct DedupEngine<J> {
    store: SqliteStore,
    judge: J,
    config: EngineConfig,
}

impl<J> DedupEngine<J>
where
    J: SimilarityJudge,
    J::Error: std::fmt::Display,
{
    /// Build an engine with the normative thresholds.
    pub fn new(store: SqliteStore, judge: J) -> Self {
        Self::with_config(store, judge, EngineConfig::default())
    }

    /// Build an engine with explicit thresholds.
    pub fn with_config(store: SqliteStore, judge: J, config: EngineConfig) -> Self {
        Self {
            store,
            judge,
            config,
        }
    }

    /// Borrow the underlying store.
    pub fn store(&self) -> &SqliteStore {
        &self.store
    }

    /// Take the store back out of the engine.
    pub fn into_store(self) -> SqliteStore {
        self.store
    }

    /// Classify one candidate within its scope and persist the outcome.
    ///
    /// State machine, in order:
    /// 1. exact fingerprint match in scope → `ExactDuplicate`, no write
    /// 2. judge every stored row in scope, tracking the best score; a
    ///    failed comparison degrades to score 0
    /// 3. best ≥ duplicate threshold and flagged duplicate →
    ///    `SemanticDuplicate`, no write
    /// 4. best ≥ version threshold and flagged version → `NewVersion`,
    ///    in-place update plus snapshot
    /// 5. otherwise `New`, insert plus initial snapshot
    pub fn submit(
        &mut self,
        scope: &Scope,
        candidate: &ProposalCandidate,
    ) -> Result<DedupDecision, StoreError> {
        let ente_id = self.store.get_or_create_ente(&scope.entity, None)?;
        let fuente_id = self.store.get_or_create_fuente(&scope.source, None)?;

        let fingerprint = candidate.fingerprint();
        if let Some(existing) = self
            .store
            .find_by_fingerprint(&fingerprint, ente_id, fuente_id)?
        {
            info!(
                original_id = existing.id,
                entity = %scope.entity,
                source = %scope.source,
                "exact duplicate"
            );
            return Ok(DedupDecision::ExactDuplicate {
                original_id: existing.id,
            });
        }

        let incoming = ProposalPair::new(&candidate.observation_text, &candidate.proposal_text);
        let mut best: Option<(i64, SimilarityVerdict)> = None;

        for stored in self.store.proposals_for_scope(ente_id, fuente_id)? {
            let existing_pair =
                ProposalPair::new(&stored.observation_text, &stored.proposal_text);
            let verdict = match self.judge.judge(&existing_pair, &incoming) {
                Ok(v) => v,
                Err(e) => {
                    warn!(proposal_id = stored.id, error = %e, "similarity judgment failed");
                    SimilarityVerdict::not_similar(format!("error al analizar: {}", e))
                }
            };
            debug!(proposal_id = stored.id, score = verdict.score, "compared");
            let better = match &best {
                Some((_, current)) => verdict.score > current.score,
                None => true,
            };
            if better {
                best = Some((stored.id, verdict));
            }
        }

        if let Some((original_id, verdict)) = best {
            if verdict.score >= self.config.duplicate_threshold && verdict.is_duplicate {
                info!(original_id, score = verdict.score, "semantic duplicate");
                return Ok(DedupDecision::SemanticDuplicate {
                    original_id,
                    similarity: verdict.score,
                    rationale: verdict.rationale,
                });
            }
            if verdict.score >= self.config.version_threshold && verdict.is_version {
                let version =
                    self.store
                        .update_with_version(original_id, candidate, &verdict.rationale)?;
                info!(proposal_id = original_id, version, "new version applied");
                return Ok(DedupDecision::NewVersion {
                    proposal_id: original_id,
                    version,
                    similarity: verdict.score,
                    rationale: verdict.rationale,
                });
            }
        }

        let proposal_id = self.store.insert_proposal(
            ente_id,
            fuente_id,
            candidate,
            &scope.source_file,
            &scope.file_kind,
        )?;
        debug!(proposal_id, "new proposal inserted");
        Ok(DedupDecision::New { proposal_id })
    }
}
