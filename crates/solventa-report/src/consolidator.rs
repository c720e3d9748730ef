//! Consolidation of extracted proposals across files
//!
//! Every proposal becomes one consolidated row per funding source of its
//! file, so a file tagged with two sources contributes each proposal
//! twice, once under each. Files without proposals still leave a
//! placeholder row per source so the roster of processed files stays
//! complete.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use solventa_domain::{DocumentMetadata, ProposalCandidate};
use std::collections::BTreeMap;
use tracing::debug;

/// Placeholder observation for files without detected proposals.
pub const NO_PROPOSALS_OBSERVATION: &str = "Sin propuestas detectadas";

/// Placeholder proposal text for files without detected proposals.
pub const NO_PROPOSALS_TEXT: &str = "Sin propuestas detectadas en el archivo";

// Spreadsheet cells cap out at 32767 characters.
const MAX_CELL_CHARS: usize = 32_000;

/// One consolidated row: a proposal (or placeholder) under one funding
/// source of its file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedRow {
    /// Entity code
    pub entity: String,
    /// Funding-source code
    pub funding_source: String,
    /// Reporting period token
    pub period: String,
    /// Document-type token
    pub doc_type: String,
    /// Source filename
    pub source_file: String,
    /// Proposal number; absent for placeholder rows
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub proposal_number: Option<u32>,
    /// Observation text, whitespace-collapsed and length-capped
    pub observation: String,
    /// Proposal text, whitespace-collapsed and length-capped
    pub proposal: String,
    /// Sheet name, spreadsheets only
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sheet: Option<String>,
    /// 1-based grid row, spreadsheets only
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub row: Option<u32>,
    /// When the row was consolidated
    pub processed_at: DateTime<Utc>,
}

/// One line of the per-source summary: how many rows an entity holds
/// under a funding source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSummary {
    /// Funding-source code
    pub funding_source: String,
    /// Entity code
    pub entity: String,
    /// Consolidated rows under the pair
    pub total: usize,
}

/// Aggregate statistics over the consolidated rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidatorStatistics {
    /// Total consolidated rows (placeholders included)
    pub total_rows: usize,
    /// Distinct source files
    pub total_files: usize,
    /// Distinct entities
    pub total_entities: usize,
    /// Distinct funding sources
    pub total_sources: usize,
    /// Entity codes, sorted
    pub entities: Vec<String>,
    /// Funding-source codes, sorted
    pub sources: Vec<String>,
    /// Row count per entity
    pub by_entity: BTreeMap<String, usize>,
    /// Row count per funding source
    pub by_source: BTreeMap<String, usize>,
}

/// Accumulates per-file extraction results into one flat row set.
#[derive(Debug, Default)]
pub struct Consolidator {
    rows: Vec<ConsolidatedRow>,
}

impl Consolidator {
    /// Create an empty consolidator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one processed file. Each candidate fans out once per funding
    /// source; an empty candidate list leaves a placeholder row per
    /// source.
    pub fn add_file(&mut self, metadata: &DocumentMetadata, candidates: &[ProposalCandidate]) {
        let period = metadata
            .period
            .clone()
            .unwrap_or_else(|| "NO_ESPECIFICADO".to_string());
        let now = Utc::now();

        if candidates.is_empty() {
            for source in &metadata.funding_sources {
                self.rows.push(ConsolidatedRow {
                    entity: metadata.entity.clone(),
                    funding_source: source.clone(),
                    period: period.clone(),
                    doc_type: metadata.doc_type.clone(),
                    source_file: metadata.filename.clone(),
                    proposal_number: None,
                    observation: NO_PROPOSALS_OBSERVATION.to_string(),
                    proposal: NO_PROPOSALS_TEXT.to_string(),
                    sheet: None,
                    row: None,
                    processed_at: now,
                });
            }
            debug!(file = %metadata.filename, "consolidated without proposals");
            return;
        }

        for candidate in candidates {
            for source in &metadata.funding_sources {
                self.rows.push(ConsolidatedRow {
                    entity: metadata.entity.clone(),
                    funding_source: source.clone(),
                    period: period.clone(),
                    doc_type: metadata.doc_type.clone(),
                    source_file: metadata.filename.clone(),
                    proposal_number: Some(candidate.number),
                    observation: clean_cell_text(&candidate.observation_text),
                    proposal: clean_cell_text(&candidate.proposal_text),
                    sheet: candidate.sheet.clone(),
                    row: candidate.row,
                    processed_at: now,
                });
            }
        }
        debug!(
            file = %metadata.filename,
            proposals = candidates.len(),
            sources = metadata.funding_sources.len(),
            "file consolidated"
        );
    }

    /// All consolidated rows, in insertion order.
    pub fn rows(&self) -> &[ConsolidatedRow] {
        &self.rows
    }

    /// Whether nothing has been consolidated yet.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows grouped by entity, entities sorted.
    pub fn by_entity(&self) -> BTreeMap<String, Vec<&ConsolidatedRow>> {
        let mut grouped: BTreeMap<String, Vec<&ConsolidatedRow>> = BTreeMap::new();
        for row in &self.rows {
            grouped.entry(row.entity.clone()).or_default().push(row);
        }
        grouped
    }

    /// Row counts per (funding source, entity), sorted by source then
    /// entity.
    pub fn by_source_summary(&self) -> Vec<SourceSummary> {
        let mut counts: BTreeMap<(String, String), usize> = BTreeMap::new();
        for row in &self.rows {
            *counts
                .entry((row.funding_source.clone(), row.entity.clone()))
                .or_default() += 1;
        }
        counts
            .into_iter()
            .map(|((funding_source, entity), total)| SourceSummary {
                funding_source,
                entity,
                total,
            })
            .collect()
    }

    /// Aggregate statistics over everything consolidated so far.
    pub fn statistics(&self) -> ConsolidatorStatistics {
        let mut files = std::collections::BTreeSet::new();
        let mut by_entity: BTreeMap<String, usize> = BTreeMap::new();
        let mut by_source: BTreeMap<String, usize> = BTreeMap::new();
        for row in &self.rows {
            files.insert(row.source_file.clone());
            *by_entity.entry(row.entity.clone()).or_default() += 1;
            *by_source.entry(row.funding_source.clone()).or_default() += 1;
        }
        ConsolidatorStatistics {
            total_rows: self.rows.len(),
            total_files: files.len(),
            total_entities: by_entity.len(),
            total_sources: by_source.len(),
            entities: by_entity.keys().cloned().collect(),
            sources: by_source.keys().cloned().collect(),
            by_entity,
            by_source,
        }
    }

    /// Discard all consolidated rows.
    pub fn clear(&mut self) {
        self.rows.clear();
    }
}

// Collapse whitespace and cap length so the text fits one spreadsheet
// cell.
fn clean_cell_text(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() > MAX_CELL_CHARS {
        let mut capped: String = collapsed.chars().take(MAX_CELL_CHARS).collect();
        capped.push_str("... [TRUNCADO]");
        capped
    } else {
        collapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solventa_domain::{CandidateDetails, ExtractionMethod, FileKind};

    fn metadata(entity: &str, sources: &[&str], filename: &str) -> DocumentMetadata {
        DocumentMetadata {
            filename: filename.to_string(),
            kind: FileKind::Docx,
            entity: entity.to_string(),
            funding_sources: sources.iter().map(|s| s.to_string()).collect(),
            period: Some("ENE_JUN".to_string()),
            doc_type: "RRyPE".to_string(),
        }
    }

    fn candidate(number: u32) -> ProposalCandidate {
        ProposalCandidate {
            number,
            observation_text: format!("Observación {number}"),
            observation_html: format!("<p>Observación {number}</p>"),
            proposal_text: format!("Propuesta {number}"),
            proposal_html: format!("<p>Propuesta {number}</p>"),
            sheet: None,
            row: None,
            method: ExtractionMethod::Structured,
            details: CandidateDetails::default(),
        }
    }

    #[test]
    fn test_proposals_fan_out_per_funding_source() {
        let mut consolidator = Consolidator::new();
        consolidator.add_file(
            &metadata("FIDECIX", &["SA", "PEFCF"], "a.docx"),
            &[candidate(1), candidate(2)],
        );

        let rows = consolidator.rows();
        assert_eq!(rows.len(), 4);
        let sources: Vec<&str> = rows.iter().map(|r| r.funding_source.as_str()).collect();
        assert_eq!(sources, vec!["SA", "PEFCF", "SA", "PEFCF"]);
        assert!(rows.iter().all(|r| r.entity == "FIDECIX"));
    }

    #[test]
    fn test_empty_file_leaves_placeholder_per_source() {
        let mut consolidator = Consolidator::new();
        consolidator.add_file(&metadata("CEA", &["SA", "R"], "vacio.docx"), &[]);

        let rows = consolidator.rows();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.proposal_number.is_none()));
        assert!(rows.iter().all(|r| r.observation == NO_PROPOSALS_OBSERVATION));
        assert!(rows.iter().all(|r| r.proposal == NO_PROPOSALS_TEXT));
    }

    #[test]
    fn test_missing_period_gets_sentinel() {
        let mut consolidator = Consolidator::new();
        let mut meta = metadata("CEA", &["SA"], "a.docx");
        meta.period = None;
        consolidator.add_file(&meta, &[candidate(1)]);
        assert_eq!(consolidator.rows()[0].period, "NO_ESPECIFICADO");
    }

    #[test]
    fn test_cell_text_is_collapsed_and_capped() {
        let mut consolidator = Consolidator::new();
        let mut long = candidate(1);
        long.proposal_text = format!("a  b\n\nc {}", "x".repeat(40_000));
        consolidator.add_file(&metadata("CEA", &["SA"], "a.docx"), &[long]);

        let text = &consolidator.rows()[0].proposal;
        assert!(text.starts_with("a b c "));
        assert!(text.ends_with("... [TRUNCADO]"));
        assert_eq!(text.chars().count(), 32_000 + "... [TRUNCADO]".chars().count());
    }

    #[test]
    fn test_by_entity_groups_and_sorts() {
        let mut consolidator = Consolidator::new();
        consolidator.add_file(&metadata("ITE", &["SA"], "b.docx"), &[candidate(1)]);
        consolidator.add_file(&metadata("CEA", &["SA"], "a.docx"), &[candidate(1)]);

        let grouped = consolidator.by_entity();
        let entities: Vec<&String> = grouped.keys().collect();
        assert_eq!(entities, vec!["CEA", "ITE"]);
        assert_eq!(grouped["CEA"].len(), 1);
    }

    #[test]
    fn test_source_summary_counts_pairs() {
        let mut consolidator = Consolidator::new();
        consolidator.add_file(
            &metadata("FIDECIX", &["SA"], "a.docx"),
            &[candidate(1), candidate(2)],
        );
        consolidator.add_file(&metadata("CEA", &["SA"], "b.docx"), &[candidate(1)]);
        consolidator.add_file(&metadata("CEA", &["R"], "c.docx"), &[candidate(1)]);

        let summary = consolidator.by_source_summary();
        assert_eq!(
            summary,
            vec![
                SourceSummary {
                    funding_source: "R".to_string(),
                    entity: "CEA".to_string(),
                    total: 1
                },
                SourceSummary {
                    funding_source: "SA".to_string(),
                    entity: "CEA".to_string(),
                    total: 1
                },
                SourceSummary {
                    funding_source: "SA".to_string(),
                    entity: "FIDECIX".to_string(),
                    total: 2
                },
            ]
        );
    }

    #[test]
    fn test_statistics_and_clear() {
        let mut consolidator = Consolidator::new();
        consolidator.add_file(
            &metadata("FIDECIX", &["SA", "PEFCF"], "a.docx"),
            &[candidate(1)],
        );
        consolidator.add_file(&metadata("CEA", &["SA"], "b.docx"), &[]);

        let stats = consolidator.statistics();
        assert_eq!(stats.total_rows, 3);
        assert_eq!(stats.total_files, 2);
        assert_eq!(stats.total_entities, 2);
        assert_eq!(stats.total_sources, 2);
        assert_eq!(stats.entities, vec!["CEA", "FIDECIX"]);
        assert_eq!(stats.by_source["SA"], 2);

        consolidator.clear();
        assert!(consolidator.is_empty());
        assert_eq!(consolidator.statistics().total_rows, 0);
    }
}
