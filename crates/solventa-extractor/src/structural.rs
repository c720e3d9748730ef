//! Structural keyword extraction
//!
//! The primary extraction path: a document-order scan that recognizes the
//! observation / remediation-proposal pattern by keyword position. A cell
//! whose accent-folded text contains `OBSERVACION` announces the
//! observation in the next cell; a cell containing both `PROPUESTA` and
//! `SOLVENTACION` announces the proposal in the next cell. Only rows with
//! a non-empty proposal produce a candidate.

use crate::document::{DocxDocument, ParsedDocument, Sheet, TableCell, XlsxDocument};
use crate::enrich::TextMiner;
use crate::markup;
use regex::Regex;
use solventa_domain::{
    normalize, ExtractionMethod, ProposalCandidate, NO_OBSERVATION, NO_OBSERVATION_HTML,
};
use tracing::debug;

/// Result of a structural scan.
#[derive(Debug, Clone, Default)]
pub struct StructuralExtraction {
    /// Accepted candidates, numbered in discovery order
    pub candidates: Vec<ProposalCandidate>,
    /// Advisory count of proposal-keyword hits in free paragraphs outside
    /// tables. Never a candidate source; informs the fallback decision.
    pub paragraph_hits: usize,
}

/// Keyword/position scanner over parsed documents.
pub struct StructuralExtractor {
    miner: TextMiner,
    reference: Regex,
    classification: Regex,
}

impl Default for StructuralExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl StructuralExtractor {
    /// Create a scanner with its compiled row-prefix patterns.
    pub fn new() -> Self {
        // The patterns are literals; compilation cannot fail.
        Self {
            miner: TextMiner::new(),
            reference: Regex::new(r"^\d+(\.\d+)*$").unwrap_or_else(|_| unreachable!()),
            classification: Regex::new(r"^[A-Z\d\-_/]+$").unwrap_or_else(|_| unreachable!()),
        }
    }

    /// Scan a document. Total: malformed content yields an empty result,
    /// never an error.
    pub fn extract(&self, doc: &ParsedDocument) -> StructuralExtraction {
        match doc {
            ParsedDocument::Docx(d) => self.extract_docx(d),
            ParsedDocument::Xlsx(d) => self.extract_xlsx(d),
        }
    }

    fn extract_docx(&self, doc: &DocxDocument) -> StructuralExtraction {
        let mut result = StructuralExtraction::default();
        let mut number: u32 = 1;

        for table in doc.tables() {
            for row in &table.rows {
                let mut observation: Option<(String, String)> = None;
                let mut proposal: Option<(String, String)> = None;

                for (idx, cell) in row.cells.iter().enumerate() {
                    let folded = normalize(cell.text().trim());

                    if folded.contains("OBSERVACION") {
                        if let Some(next) = row.cells.get(idx + 1) {
                            observation =
                                Some((clean_text(&next.text()), markup::cell_html(next)));
                        }
                    }

                    if folded.contains("PROPUESTA") && folded.contains("SOLVENTACION") {
                        // Keyword in the last cell of the row has nothing
                        // to capture; skipped silently.
                        proposal = row.cells.get(idx + 1).map(proposal_cell_content);
                    }
                }

                if let Some((text, html)) = proposal {
                    if !text.is_empty() {
                        result
                            .candidates
                            .push(self.build_candidate(number, observation, text, html, None, None));
                        number += 1;
                    }
                }
            }
        }

        for paragraph in doc.paragraphs() {
            let folded = normalize(paragraph.text().trim());
            if folded.contains("PROPUESTA") && folded.contains("SOLVENTACION") {
                result.paragraph_hits += 1;
            }
        }
        if result.paragraph_hits > 0 {
            debug!(
                hits = result.paragraph_hits,
                "proposal keywords found in free paragraphs"
            );
        }

        result
    }

    fn extract_xlsx(&self, doc: &XlsxDocument) -> StructuralExtraction {
        let mut result = StructuralExtraction::default();
        let mut number: u32 = 1;

        for sheet in &doc.sheets {
            self.scan_sheet(sheet, &mut number, &mut result.candidates);
        }
        result
    }

    fn scan_sheet(&self, sheet: &Sheet, number: &mut u32, out: &mut Vec<ProposalCandidate>) {
        for (row_idx, row) in sheet.rows.iter().enumerate() {
            if row.len() < 2 {
                continue;
            }
            for idx in 0..row.len() - 1 {
                let folded = normalize(row[idx].text());
                if !(folded.contains("PROPUESTA") && folded.contains("SOLVENTACION")) {
                    continue;
                }

                let (reference, classification) = if idx > 0 {
                    self.row_prefix(row[0].text())
                } else {
                    (None, None)
                };

                // The observation keyword sits in one of the three cells
                // before the proposal keyword.
                let mut observation: Option<(String, String)> = None;
                for obs_idx in idx.saturating_sub(3)..=idx {
                    if normalize(row[obs_idx].text()).contains("OBSERVACION") {
                        if let Some(next) = row.get(obs_idx + 1) {
                            observation = Some((
                                clean_text(next.text()),
                                markup::sheet_cell_html(next),
                            ));
                        }
                        break;
                    }
                }

                let prop_cell = &row[idx + 1];
                let proposal_text = clean_text(prop_cell.text());
                if !proposal_text.is_empty() {
                    let mut candidate = self.build_candidate(
                        *number,
                        observation,
                        proposal_text,
                        markup::sheet_cell_html(prop_cell),
                        Some(sheet.name.clone()),
                        Some(row_idx as u32 + 1),
                    );
                    candidate.details.reference = reference;
                    candidate.details.classification = classification;
                    out.push(candidate);
                    *number += 1;
                }
                // One proposal per row
                break;
            }
        }
    }

    fn row_prefix(&self, first_cell: &str) -> (Option<String>, Option<String>) {
        let value = first_cell.trim();
        if value.is_empty() {
            (None, None)
        } else if self.reference.is_match(value) {
            (Some(value.to_string()), None)
        } else if self.classification.is_match(value) {
            (None, Some(value.to_string()))
        } else {
            (None, None)
        }
    }

    fn build_candidate(
        &self,
        number: u32,
        observation: Option<(String, String)>,
        proposal_text: String,
        proposal_html: String,
        sheet: Option<String>,
        row: Option<u32>,
    ) -> ProposalCandidate {
        let (observation_text, observation_html) = match observation {
            Some((text, html)) if !text.is_empty() => (text, html),
            _ => (NO_OBSERVATION.to_string(), NO_OBSERVATION_HTML.to_string()),
        };
        let combined = format!("{} {}", observation_text, proposal_text);
        let details = self.miner.mine(&combined);
        ProposalCandidate {
            number,
            observation_text,
            observation_html,
            proposal_text,
            proposal_html,
            sheet,
            row,
            method: ExtractionMethod::Structured,
            details,
        }
    }
}

/// Content of a captured proposal cell: all paragraphs plus recursively
/// rendered nested tables.
fn proposal_cell_content(cell: &TableCell) -> (String, String) {
    let mut html: String = cell.paragraphs.iter().map(markup::paragraph_html).collect();
    let mut text: String = cell
        .paragraphs
        .iter()
        .map(|p| p.text())
        .collect::<Vec<_>>()
        .join(" ");

    for table in &cell.tables {
        html.push_str(&markup::table_html(table));
        for row in &table.rows {
            for nested in &row.cells {
                text.push(' ');
                text.push_str(&nested.text());
            }
        }
    }
    (clean_text(&text), html)
}

/// Collapse runs of whitespace and trim.
fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Block, Paragraph, SheetCell, Table, TableRow};

    fn table(rows: Vec<Vec<&str>>) -> Table {
        Table {
            rows: rows
                .into_iter()
                .map(|cells| TableRow {
                    cells: cells.into_iter().map(TableCell::plain).collect(),
                })
                .collect(),
        }
    }

    fn docx(blocks: Vec<Block>) -> ParsedDocument {
        ParsedDocument::Docx(DocxDocument {
            blocks,
            images: Vec::new(),
        })
    }

    fn xlsx_sheet(name: &str, rows: Vec<Vec<&str>>) -> ParsedDocument {
        ParsedDocument::Xlsx(XlsxDocument {
            sheets: vec![Sheet {
                name: name.to_string(),
                rows: rows
                    .into_iter()
                    .map(|r| r.into_iter().map(SheetCell::plain).collect())
                    .collect(),
                images: Vec::new(),
            }],
        })
    }

    #[test]
    fn test_docx_observation_proposal_row() {
        let doc = docx(vec![Block::Table(table(vec![
            vec![
                "Observación",
                "Falta documentación comprobatoria",
                "Propuesta de Solventación",
                "Se integró el expediente con las facturas",
            ],
        ]))]);
        let result = StructuralExtractor::new().extract(&doc);
        assert_eq!(result.candidates.len(), 1);
        let c = &result.candidates[0];
        assert_eq!(c.number, 1);
        assert_eq!(c.observation_text, "Falta documentación comprobatoria");
        assert_eq!(c.proposal_text, "Se integró el expediente con las facturas");
        assert_eq!(c.method, ExtractionMethod::Structured);
        assert!(c.sheet.is_none());
    }

    #[test]
    fn test_docx_accent_folding_matches_keywords() {
        // Uppercase unaccented keywords in the source cell still match
        let doc = docx(vec![Block::Table(table(vec![vec![
            "PROPUESTA DE SOLVENTACION",
            "Respuesta",
        ]]))]);
        let result = StructuralExtractor::new().extract(&doc);
        assert_eq!(result.candidates.len(), 1);
        assert_eq!(result.candidates[0].observation_text, NO_OBSERVATION);
        assert_eq!(result.candidates[0].observation_html, NO_OBSERVATION_HTML);
    }

    #[test]
    fn test_docx_keyword_in_last_cell_is_skipped() {
        let doc = docx(vec![Block::Table(table(vec![vec![
            "Observación",
            "obs",
            "Propuesta de Solventación",
        ]]))]);
        let result = StructuralExtractor::new().extract(&doc);
        assert!(result.candidates.is_empty());
    }

    #[test]
    fn test_docx_empty_proposal_cell_emits_nothing() {
        let doc = docx(vec![Block::Table(table(vec![vec![
            "Propuesta de Solventación",
            "   ",
        ]]))]);
        let result = StructuralExtractor::new().extract(&doc);
        assert!(result.candidates.is_empty());
    }

    #[test]
    fn test_docx_counter_runs_across_tables() {
        let doc = docx(vec![
            Block::Table(table(vec![vec!["Propuesta de Solventación", "primera"]])),
            Block::Table(table(vec![vec!["Propuesta de Solventación", "segunda"]])),
        ]);
        let result = StructuralExtractor::new().extract(&doc);
        let numbers: Vec<u32> = result.candidates.iter().map(|c| c.number).collect();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[test]
    fn test_docx_nested_table_feeds_proposal() {
        let inner = table(vec![vec!["detalle anidado"]]);
        let cell = TableCell {
            paragraphs: vec![Paragraph::plain("Respuesta principal.")],
            tables: vec![inner],
        };
        let doc = docx(vec![Block::Table(Table {
            rows: vec![TableRow {
                cells: vec![TableCell::plain("Propuesta de Solventación"), cell],
            }],
        })]);
        let result = StructuralExtractor::new().extract(&doc);
        let c = &result.candidates[0];
        assert_eq!(c.proposal_text, "Respuesta principal. detalle anidado");
        assert!(c.proposal_html.contains("<table border=\"1\">"));
    }

    #[test]
    fn test_docx_nested_table_feeds_observation_html() {
        let inner = table(vec![vec!["detalle de la observación"]]);
        let obs_cell = TableCell {
            paragraphs: vec![Paragraph::plain("Falta evidencia.")],
            tables: vec![inner],
        };
        let doc = docx(vec![Block::Table(Table {
            rows: vec![TableRow {
                cells: vec![
                    TableCell::plain("Observación"),
                    obs_cell,
                    TableCell::plain("Propuesta de Solventación"),
                    TableCell::plain("Se anexa"),
                ],
            }],
        })]);
        let result = StructuralExtractor::new().extract(&doc);
        let c = &result.candidates[0];
        assert!(c.observation_html.contains("<table border=\"1\">"));
        assert!(c.observation_html.contains("detalle de la observación"));
    }

    #[test]
    fn test_docx_paragraph_hits_are_advisory_only() {
        let doc = docx(vec![Block::Paragraph(Paragraph::plain(
            "La propuesta de solventación se detalla a continuación",
        ))]);
        let result = StructuralExtractor::new().extract(&doc);
        assert!(result.candidates.is_empty());
        assert_eq!(result.paragraph_hits, 1);
    }

    #[test]
    fn test_xlsx_row_scan_with_observation_window() {
        let doc = xlsx_sheet(
            "SA",
            vec![
                vec!["No.", "Observación", "", "Propuesta de Solventación", ""],
                vec![
                    "3.1",
                    "Observación",
                    "Falta evidencia",
                    "Propuesta de Solventación",
                    "Se anexa la evidencia",
                ],
            ],
        );
        let result = StructuralExtractor::new().extract(&doc);
        // Header row has an empty cell after the keyword, so only the data
        // row produces a candidate
        assert_eq!(result.candidates.len(), 1);
        let c = &result.candidates[0];
        assert_eq!(c.observation_text, "Falta evidencia");
        assert_eq!(c.proposal_text, "Se anexa la evidencia");
        assert_eq!(c.sheet.as_deref(), Some("SA"));
        assert_eq!(c.row, Some(2));
        assert_eq!(c.details.reference.as_deref(), Some("3.1"));
        assert!(c.details.classification.is_none());
    }

    #[test]
    fn test_xlsx_classification_prefix() {
        let doc = xlsx_sheet(
            "R",
            vec![vec![
                "AUD-2024/1",
                "Propuesta de Solventación",
                "Respuesta",
            ]],
        );
        let result = StructuralExtractor::new().extract(&doc);
        let c = &result.candidates[0];
        assert!(c.details.reference.is_none());
        assert_eq!(c.details.classification.as_deref(), Some("AUD-2024/1"));
    }

    #[test]
    fn test_xlsx_every_occurrence_processed() {
        // No first-occurrence skipping: both rows yield candidates
        let doc = xlsx_sheet(
            "SA",
            vec![
                vec!["Propuesta de Solventación", "uno"],
                vec!["Propuesta de Solventación", "dos"],
            ],
        );
        let result = StructuralExtractor::new().extract(&doc);
        assert_eq!(result.candidates.len(), 2);
        assert_eq!(result.candidates[0].row, Some(1));
        assert_eq!(result.candidates[1].row, Some(2));
    }

    #[test]
    fn test_xlsx_counter_runs_across_sheets() {
        let doc = ParsedDocument::Xlsx(XlsxDocument {
            sheets: vec![
                Sheet {
                    name: "SA".to_string(),
                    rows: vec![vec![
                        SheetCell::plain("Propuesta de Solventación"),
                        SheetCell::plain("uno"),
                    ]],
                    images: Vec::new(),
                },
                Sheet {
                    name: "R".to_string(),
                    rows: vec![vec![
                        SheetCell::plain("Propuesta de Solventación"),
                        SheetCell::plain("dos"),
                    ]],
                    images: Vec::new(),
                },
            ],
        });
        let result = StructuralExtractor::new().extract(&doc);
        assert_eq!(result.candidates.len(), 2);
        assert_eq!(result.candidates[1].number, 2);
        assert_eq!(result.candidates[1].sheet.as_deref(), Some("R"));
    }

    #[test]
    fn test_whitespace_collapsed_in_captured_text() {
        let doc = xlsx_sheet(
            "SA",
            vec![vec![
                "Propuesta de Solventación",
                "Se  entregó\n   la documentación",
            ]],
        );
        let result = StructuralExtractor::new().extract(&doc);
        assert_eq!(
            result.candidates[0].proposal_text,
            "Se entregó la documentación"
        );
    }

    #[test]
    fn test_details_mined_from_combined_text() {
        let doc = xlsx_sheet(
            "SA",
            vec![vec![
                "Propuesta de Solventación",
                "Pendiente de evidencia, responsable: Tesorería, entrega 15/08/2024",
            ]],
        );
        let result = StructuralExtractor::new().extract(&doc);
        let d = &result.candidates[0].details;
        assert!(d.keywords.contains(&"pendiente".to_string()));
        assert!(d.dates.contains(&"15/08/2024".to_string()));
        assert_eq!(d.responsible_parties.len(), 1);
    }
}
