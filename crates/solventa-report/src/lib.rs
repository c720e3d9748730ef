//! Solventa Report
//!
//! Consolidation of per-file extraction results into one flat row set,
//! workbook rendering behind a writer seam, and the per-file JSON
//! processing records.

#![warn(missing_docs)]

pub mod consolidator;
mod error;
mod record;
pub mod workbook;

pub use consolidator::{
    ConsolidatedRow, Consolidator, ConsolidatorStatistics, SourceSummary,
};
pub use error::ReportError;
pub use record::FileRecord;
pub use workbook::{render_workbook, JsonWorkbookWriter, WorkbookSheet, WorkbookWriter};
