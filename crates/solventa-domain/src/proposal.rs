//! Proposal records - the central data of the pipeline

use crate::fingerprint::Fingerprint;
use crate::metadata::FileKind;
use serde::{Deserialize, Serialize};

/// Plain-text sentinel used when a proposal has no observation.
pub const NO_OBSERVATION: &str = "Sin observación";

/// Markup sentinel used when a proposal has no observation.
pub const NO_OBSERVATION_HTML: &str = "<p>Sin observación</p>";

/// Which path produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Keyword/table-position scan of the parsed document
    Structured,
    /// Generative model over a bounded document excerpt
    Fallback,
}

/// Supplementary details mined from a candidate's combined text.
///
/// Informational only; never consulted by the dedup engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateDetails {
    /// Leading reference number from the row (e.g. "3.1.2"), spreadsheets only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Leading classification token from the row, spreadsheets only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<String>,
    /// Date-like strings found in the text
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub dates: Vec<String>,
    /// Fragments naming a responsible party
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub responsible_parties: Vec<String>,
    /// Numeric reference tokens ("ref: 123/4")
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub numeric_references: Vec<String>,
    /// Significant audit keywords present in the text
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub keywords: Vec<String>,
}

impl CandidateDetails {
    /// True when nothing was mined.
    pub fn is_empty(&self) -> bool {
        self.reference.is_none()
            && self.classification.is_none()
            && self.dates.is_empty()
            && self.responsible_parties.is_empty()
            && self.numeric_references.is_empty()
            && self.keywords.is_empty()
    }
}

/// An observation/proposal pair surfaced by an extractor, before
/// classification and persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalCandidate {
    /// 1-based discovery order within the source document
    pub number: u32,
    /// Observation plain text ([`NO_OBSERVATION`] when absent)
    pub observation_text: String,
    /// Observation styled markup
    pub observation_html: String,
    /// Proposal plain text; always non-empty for a valid candidate
    pub proposal_text: String,
    /// Proposal styled markup
    pub proposal_html: String,
    /// Source sheet name, spreadsheets only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,
    /// 1-based source row, spreadsheets only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<u32>,
    /// Which extraction path produced this candidate
    pub method: ExtractionMethod,
    /// Supplementary mined details
    #[serde(skip_serializing_if = "CandidateDetails::is_empty", default)]
    pub details: CandidateDetails,
}

impl ProposalCandidate {
    /// Fingerprint over the candidate's plain text pair.
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::compute(&self.observation_text, &self.proposal_text)
    }
}

/// A persisted proposal row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredProposal {
    /// Row id
    pub id: i64,
    /// Owning entity row id
    pub ente_id: i64,
    /// Owning funding-source row id
    pub fuente_id: i64,
    /// Sequence number within the source document
    pub number: u32,
    /// Observation plain text
    pub observation_text: String,
    /// Proposal plain text
    pub proposal_text: String,
    /// Observation styled markup
    pub observation_html: String,
    /// Proposal styled markup
    pub proposal_html: String,
    /// Source filename
    pub source_file: String,
    /// Source file kind label
    pub file_kind: String,
    /// Source sheet, when applicable
    pub sheet: Option<String>,
    /// Current content fingerprint
    pub fingerprint: String,
    /// Current version number, starting at 1
    pub current_version: u32,
    /// Whether this row was flagged as a duplicate of another
    pub is_duplicate: bool,
    /// Canonical row id when flagged as duplicate
    pub original_id: Option<i64>,
}

/// An immutable snapshot of a proposal at one version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalVersion {
    /// Row id
    pub id: i64,
    /// Owning proposal row id
    pub proposal_id: i64,
    /// Version number, unique per proposal, gapless from 1
    pub version: u32,
    /// Observation plain text at this version
    pub observation_text: String,
    /// Proposal plain text at this version
    pub proposal_text: String,
    /// Observation markup at this version
    pub observation_html: String,
    /// Proposal markup at this version
    pub proposal_html: String,
    /// Free-text reason for the change
    pub change_reason: String,
    /// Fingerprint at this version
    pub fingerprint: String,
}

/// Per-file processing audit record, for observability only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingStats {
    /// Source file kind label
    pub file_kind: String,
    /// Source filename
    pub filename: String,
    /// Proposals submitted from the file
    pub total_proposals: u32,
    /// Exact + semantic duplicates detected
    pub duplicates_detected: u32,
    /// New-version updates applied
    pub versions_created: u32,
}

impl ProcessingStats {
    /// A zeroed record for a file.
    pub fn new(kind: FileKind, filename: impl Into<String>) -> Self {
        Self {
            file_kind: kind.label().to_string(),
            filename: filename.into(),
            total_proposals: 0,
            duplicates_detected: 0,
            versions_created: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(obs: &str, prop: &str) -> ProposalCandidate {
        ProposalCandidate {
            number: 1,
            observation_text: obs.to_string(),
            observation_html: format!("<p>{obs}</p>"),
            proposal_text: prop.to_string(),
            proposal_html: format!("<p>{prop}</p>"),
            sheet: None,
            row: None,
            method: ExtractionMethod::Structured,
            details: CandidateDetails::default(),
        }
    }

    #[test]
    fn test_candidate_fingerprint_matches_direct_compute() {
        let c = candidate("obs", "prop");
        assert_eq!(c.fingerprint(), Fingerprint::compute("obs", "prop"));
    }

    #[test]
    fn test_details_is_empty() {
        let mut d = CandidateDetails::default();
        assert!(d.is_empty());
        d.keywords.push("pendiente".to_string());
        assert!(!d.is_empty());
    }

    #[test]
    fn test_candidate_serializes_without_empty_optionals() {
        let c = candidate("obs", "prop");
        let json = serde_json::to_string(&c).unwrap();
        assert!(!json.contains("sheet"));
        assert!(!json.contains("details"));
        assert!(json.contains("\"method\":\"structured\""));
    }
}
