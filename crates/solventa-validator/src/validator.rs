//! Image-adjacency validation
//!
//! Flags proposals whose surrounding document carries embedded images,
//! since those images may hold evidence the text extraction cannot see.
//! Word-processor documents are flagged coarsely at document level;
//! spreadsheets are flagged per sheet, with a supplementary count of
//! images anchored near the proposal row.

use crate::ValidatorConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use solventa_domain::ProposalCandidate;
use solventa_extractor::document::{DocxDocument, ParsedDocument, Sheet};
use tracing::{debug, info, warn};

/// Outcome of validating one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationStatus {
    /// No images near any proposal
    #[serde(rename = "VÁLIDO")]
    Valid,
    /// At least one proposal needs manual review
    #[serde(rename = "ADVERTENCIA")]
    Warning,
    /// The file could not be validated
    #[serde(rename = "ERROR")]
    Error,
}

/// One embedded image, as reported per file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDescriptor {
    /// 1-based index within its container
    pub index: u32,
    /// Image format ("png", "jpeg", ...)
    pub format: String,
    /// Sheet the image is anchored to, spreadsheets only
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sheet: Option<String>,
    /// 1-based anchor row, when known
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub row: Option<u32>,
    /// 1-based anchor column, when known
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub column: Option<u32>,
    /// Blob size in bytes, when known
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub size_bytes: Option<u64>,
}

/// A proposal flagged for manual review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlaggedProposal {
    /// Proposal sequence number
    pub number: u32,
    /// Sheet the proposal came from, spreadsheets only
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sheet: Option<String>,
    /// 1-based grid row, spreadsheets only
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub row: Option<u32>,
    /// Leading characters of the observation, for the reviewer
    pub observation_excerpt: String,
    /// Human-readable reason in Spanish
    pub warning: String,
    /// Images anchored within the configured row distance
    pub nearby_images: u32,
}

/// Validation report for one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileImageReport {
    /// Source filename
    pub filename: String,
    /// File kind label ("DOCX" / "XLSX")
    pub kind: String,
    /// When the validation ran
    pub validated_at: DateTime<Utc>,
    /// Total embedded images in the file
    pub total_images: usize,
    /// Every detected image
    pub images: Vec<ImageDescriptor>,
    /// Proposals that need manual review
    pub flagged: Vec<FlaggedProposal>,
    /// Whether any proposal shares space with an image
    pub has_images_near_proposals: bool,
    /// Overall file status
    pub status: ValidationStatus,
}

/// Aggregate over every file validated so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedImageReport {
    /// When the aggregate was built
    pub generated_at: DateTime<Utc>,
    /// Files validated
    pub total_files: usize,
    /// Files with no image findings
    pub valid_files: usize,
    /// Files with flagged proposals
    pub warning_files: usize,
    /// Files that could not be validated
    pub error_files: usize,
    /// Images across all files
    pub total_images: usize,
    /// Filenames that need manual review
    pub files_needing_review: Vec<String>,
    /// "VÁLIDO" when nothing was flagged, else "ADVERTENCIAS_ENCONTRADAS"
    pub overall_state: String,
}

/// Validates extracted proposals against the image inventory of their
/// source documents, accumulating per-file reports.
pub struct ImageValidator {
    config: ValidatorConfig,
    reports: Vec<FileImageReport>,
}

impl ImageValidator {
    /// Build a validator with the given configuration.
    pub fn new(config: ValidatorConfig) -> Self {
        Self {
            config,
            reports: Vec::new(),
        }
    }

    /// Validate one parsed file and record its report.
    pub fn validate_file(
        &mut self,
        filename: &str,
        doc: &ParsedDocument,
        candidates: &[ProposalCandidate],
    ) -> FileImageReport {
        let (images, flagged) = match doc {
            ParsedDocument::Docx(d) => Self::check_docx(d, candidates),
            ParsedDocument::Xlsx(x) => self.check_sheets(&x.sheets, candidates),
        };

        let status = if flagged.is_empty() {
            ValidationStatus::Valid
        } else {
            ValidationStatus::Warning
        };
        if status == ValidationStatus::Warning {
            warn!(
                filename,
                flagged = flagged.len(),
                images = images.len(),
                "proposals need manual image review"
            );
        } else {
            debug!(filename, images = images.len(), "no image findings");
        }

        let report = FileImageReport {
            filename: filename.to_string(),
            kind: doc.kind().label().to_string(),
            validated_at: Utc::now(),
            total_images: images.len(),
            has_images_near_proposals: !flagged.is_empty(),
            images,
            flagged,
            status,
        };
        self.reports.push(report.clone());
        report
    }

    /// Record a file whose kind is not recognized. The file is reported,
    /// never a failure.
    pub fn record_unsupported(&mut self, filename: &str) -> FileImageReport {
        warn!(filename, "unsupported file kind, skipping image validation");
        let report = FileImageReport {
            filename: filename.to_string(),
            kind: "DESCONOCIDO".to_string(),
            validated_at: Utc::now(),
            total_images: 0,
            images: Vec::new(),
            flagged: Vec::new(),
            has_images_near_proposals: false,
            status: ValidationStatus::Error,
        };
        self.reports.push(report.clone());
        report
    }

    /// Reports accumulated so far, in validation order.
    pub fn reports(&self) -> &[FileImageReport] {
        &self.reports
    }

    /// Discard all accumulated reports.
    pub fn clear(&mut self) {
        self.reports.clear();
    }

    /// Build the aggregate over every report recorded so far.
    pub fn consolidated(&self) -> ConsolidatedImageReport {
        let valid_files = self.count_status(ValidationStatus::Valid);
        let warning_files = self.count_status(ValidationStatus::Warning);
        let error_files = self.count_status(ValidationStatus::Error);
        let files_needing_review: Vec<String> = self
            .reports
            .iter()
            .filter(|r| r.status != ValidationStatus::Valid)
            .map(|r| r.filename.clone())
            .collect();
        let overall_state = if files_needing_review.is_empty() {
            "VÁLIDO".to_string()
        } else {
            "ADVERTENCIAS_ENCONTRADAS".to_string()
        };
        info!(
            total = self.reports.len(),
            warnings = warning_files,
            "consolidated image report built"
        );
        ConsolidatedImageReport {
            generated_at: Utc::now(),
            total_files: self.reports.len(),
            valid_files,
            warning_files,
            error_files,
            total_images: self.reports.iter().map(|r| r.total_images).sum(),
            files_needing_review,
            overall_state,
        }
    }

    fn count_status(&self, status: ValidationStatus) -> usize {
        self.reports.iter().filter(|r| r.status == status).count()
    }

    // Word-processor image placement is not resolved to cells, so any
    // image in a document with proposals flags every proposal.
    fn check_docx(
        doc: &DocxDocument,
        candidates: &[ProposalCandidate],
    ) -> (Vec<ImageDescriptor>, Vec<FlaggedProposal>) {
        let images: Vec<ImageDescriptor> = doc
            .images
            .iter()
            .map(|img| ImageDescriptor {
                index: img.index,
                format: img.format.clone(),
                sheet: None,
                row: None,
                column: None,
                size_bytes: img.size_bytes,
            })
            .collect();

        let mut flagged = Vec::new();
        if !images.is_empty() && !candidates.is_empty() {
            let warning = format!(
                "El documento contiene {} imagen(es). Revisar manualmente.",
                images.len()
            );
            for candidate in candidates {
                flagged.push(FlaggedProposal {
                    number: candidate.number,
                    sheet: None,
                    row: None,
                    observation_excerpt: excerpt(&candidate.observation_text),
                    warning: warning.clone(),
                    nearby_images: 0,
                });
            }
        }
        (images, flagged)
    }

    // A spreadsheet proposal is flagged as soon as its sheet holds any
    // image; the nearby count is supplementary review metadata.
    fn check_sheets(
        &self,
        sheets: &[Sheet],
        candidates: &[ProposalCandidate],
    ) -> (Vec<ImageDescriptor>, Vec<FlaggedProposal>) {
        let mut images = Vec::new();
        for sheet in sheets {
            for img in &sheet.images {
                images.push(ImageDescriptor {
                    index: img.index,
                    format: img.format.clone(),
                    sheet: Some(sheet.name.clone()),
                    row: img.anchor.map(|a| a.row),
                    column: img.anchor.map(|a| a.column),
                    size_bytes: img.size_bytes,
                });
            }
        }

        let mut flagged = Vec::new();
        for candidate in candidates {
            let Some(sheet_name) = candidate.sheet.as_deref() else {
                continue;
            };
            let Some(sheet) = sheets.iter().find(|s| s.name == sheet_name) else {
                continue;
            };
            if sheet.images.is_empty() {
                continue;
            }
            let nearby_images = match candidate.row {
                Some(row) => sheet
                    .images
                    .iter()
                    .filter_map(|img| img.anchor)
                    .filter(|a| a.row.abs_diff(row) <= self.config.nearby_rows)
                    .count() as u32,
                None => 0,
            };
            flagged.push(FlaggedProposal {
                number: candidate.number,
                sheet: Some(sheet_name.to_string()),
                row: candidate.row,
                observation_excerpt: excerpt(&candidate.observation_text),
                warning: format!(
                    "Hoja \"{}\" contiene {} imagen(es)",
                    sheet_name,
                    sheet.images.len()
                ),
                nearby_images,
            });
        }
        (images, flagged)
    }
}

impl Default for ImageValidator {
    fn default() -> Self {
        Self::new(ValidatorConfig::default())
    }
}

fn excerpt(text: &str) -> String {
    text.chars().take(100).collect()
}
