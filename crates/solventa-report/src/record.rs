//! Per-file processing records

use crate::ReportError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use solventa_domain::{DedupDecision, DocumentMetadata, ProcessingStats, ProposalCandidate};
use solventa_validator::FileImageReport;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Everything produced for one input file, serialized as its individual
/// JSON result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Source filename
    pub filename: String,
    /// Whether the file was processed end to end
    pub success: bool,
    /// Failure description, when processing did not finish
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
    /// Filename-derived metadata
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub metadata: Option<DocumentMetadata>,
    /// Dedup counters for the file
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub statistics: Option<ProcessingStats>,
    /// Extracted proposal candidates
    #[serde(default)]
    pub proposals: Vec<ProposalCandidate>,
    /// Engine decisions in submission order (candidate-major, one per
    /// funding source)
    #[serde(default)]
    pub decisions: Vec<DedupDecision>,
    /// Image-adjacency report
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub validation: Option<FileImageReport>,
    /// When the record was built
    pub processed_at: DateTime<Utc>,
}

impl FileRecord {
    /// Record for a file processed end to end.
    pub fn success(
        metadata: DocumentMetadata,
        statistics: ProcessingStats,
        proposals: Vec<ProposalCandidate>,
        decisions: Vec<DedupDecision>,
        validation: FileImageReport,
    ) -> Self {
        Self {
            filename: metadata.filename.clone(),
            success: true,
            error: None,
            metadata: Some(metadata),
            statistics: Some(statistics),
            proposals,
            decisions,
            validation: Some(validation),
            processed_at: Utc::now(),
        }
    }

    /// Record for a file that failed before producing results.
    pub fn failure(filename: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            success: false,
            error: Some(error.into()),
            metadata: None,
            statistics: None,
            proposals: Vec::new(),
            decisions: Vec::new(),
            validation: None,
            processed_at: Utc::now(),
        }
    }

    /// Write the record as `{stem}_resultado.json` under `dir` and
    /// return the written path.
    pub fn save(&self, dir: &Path) -> Result<PathBuf, ReportError> {
        let stem = Path::new(&self.filename)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.filename.clone());
        let path = dir.join(format!("{stem}_resultado.json"));
        fs::write(&path, serde_json::to_string_pretty(self)?)?;
        debug!(path = %path.display(), "file record saved");
        Ok(path)
    }
}
