//! File-level metadata derived from filenames and document structure

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Sentinel entity code when no known acronym or pattern matches.
pub const UNKNOWN_ENTITY: &str = "DESCONOCIDO";

/// Sentinel funding-source code when no known code matches.
pub const UNSPECIFIED_SOURCE: &str = "NO_ESPECIFICADA";

/// Sentinel document type.
pub const GENERIC_DOC_TYPE: &str = "GENERAL";

/// The two supported source document kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileKind {
    /// Word-processor document
    Docx,
    /// Spreadsheet workbook
    Xlsx,
}

impl FileKind {
    /// Derive the kind from a file path's extension, case-insensitively.
    ///
    /// Returns `None` for unrecognized extensions; callers reject those
    /// files before parsing.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "docx" => Some(Self::Docx),
            "xlsx" => Some(Self::Xlsx),
            _ => None,
        }
    }

    /// The label stored in `propuestas.tipo_archivo` and reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Docx => "DOCX",
            Self::Xlsx => "XLSX",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Metadata extracted from a source document's filename and structure.
///
/// Every field has a deterministic fallback; extraction never fails on a
/// malformed filename.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Base filename (no directory components)
    pub filename: String,
    /// Source document kind
    pub kind: FileKind,
    /// Owning institutional entity code, or [`UNKNOWN_ENTITY`]
    pub entity: String,
    /// Funding-source codes in first-discovery order; never empty
    /// ([`UNSPECIFIED_SOURCE`] when nothing matched)
    pub funding_sources: Vec<String>,
    /// Reporting period token (e.g. "ENE_JUN" or "2024"), when present
    pub period: Option<String>,
    /// Document-type token, or [`GENERIC_DOC_TYPE`]
    pub doc_type: String,
}
