//! Workbook rendering of the consolidated rows
//!
//! The consolidated output is a four-part workbook: the full row set,
//! one sheet per entity, the per-source summary and the statistics
//! sheet. Actual spreadsheet writing is an external capability behind
//! [`WorkbookWriter`]; [`JsonWorkbookWriter`] serializes the same model
//! to JSON.

use crate::consolidator::{ConsolidatedRow, Consolidator};
use crate::ReportError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Column headers of the consolidated row sheets.
pub const ROW_HEADERS: [&str; 11] = [
    "Ente",
    "Fuente de Financiamiento",
    "Periodo",
    "Tipo Documento",
    "Archivo Origen",
    "Número Propuesta",
    "Observación",
    "Propuesta de Solventación",
    "Hoja",
    "Fila",
    "Fecha Procesamiento",
];

// Spreadsheet backends cap sheet names at 31 characters.
const MAX_SHEET_NAME_CHARS: usize = 31;

/// Receives rendered sheets. Implementations decide the storage format.
pub trait WorkbookWriter {
    /// Failure reported by the backend
    type Error;

    /// Append one sheet with its header row and data rows.
    fn add_sheet(
        &mut self,
        name: &str,
        header: &[&str],
        rows: Vec<Vec<String>>,
    ) -> Result<(), Self::Error>;
}

/// One rendered sheet of the JSON workbook model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkbookSheet {
    /// Sheet name
    pub name: String,
    /// Column headers
    pub header: Vec<String>,
    /// Data rows, one cell vector per row
    pub rows: Vec<Vec<String>>,
}

/// Writer that keeps the workbook in memory and saves it as JSON.
#[derive(Debug, Default)]
pub struct JsonWorkbookWriter {
    sheets: Vec<WorkbookSheet>,
}

impl JsonWorkbookWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sheets rendered so far.
    pub fn sheets(&self) -> &[WorkbookSheet] {
        &self.sheets
    }

    /// Serialize the workbook model to a pretty-printed JSON file.
    pub fn save(&self, path: &Path) -> Result<(), ReportError> {
        let json = serde_json::to_string_pretty(&self.sheets)?;
        fs::write(path, json)?;
        info!(path = %path.display(), sheets = self.sheets.len(), "workbook saved");
        Ok(())
    }
}

impl WorkbookWriter for JsonWorkbookWriter {
    type Error = ReportError;

    fn add_sheet(
        &mut self,
        name: &str,
        header: &[&str],
        rows: Vec<Vec<String>>,
    ) -> Result<(), Self::Error> {
        self.sheets.push(WorkbookSheet {
            name: name.to_string(),
            header: header.iter().map(|h| h.to_string()).collect(),
            rows,
        });
        Ok(())
    }
}

/// Render the full consolidated workbook into a writer: the complete
/// row set, one sheet per entity, the per-source summary and the
/// statistics sheet.
pub fn render_workbook<W: WorkbookWriter>(
    consolidator: &Consolidator,
    writer: &mut W,
) -> Result<(), W::Error> {
    let all_rows: Vec<Vec<String>> = consolidator.rows().iter().map(row_cells).collect();
    writer.add_sheet("Base de Datos Completa", &ROW_HEADERS, all_rows)?;

    for (entity, rows) in consolidator.by_entity() {
        let name = sheet_name(&format!("Ente_{entity}"));
        let cells: Vec<Vec<String>> = rows.iter().copied().map(row_cells).collect();
        writer.add_sheet(&name, &ROW_HEADERS, cells)?;
    }

    let summary_rows: Vec<Vec<String>> = consolidator
        .by_source_summary()
        .into_iter()
        .map(|s| vec![s.funding_source, s.entity, s.total.to_string()])
        .collect();
    writer.add_sheet(
        "Por Fuente Financiamiento",
        &["Fuente de Financiamiento", "Ente", "Total Propuestas"],
        summary_rows,
    )?;

    writer.add_sheet(
        "Resumen Estadístico",
        &["Concepto", "Valor"],
        statistics_rows(consolidator),
    )?;
    Ok(())
}

fn statistics_rows(consolidator: &Consolidator) -> Vec<Vec<String>> {
    let stats = consolidator.statistics();
    let mut rows = vec![
        vec![
            "Total de Archivos Procesados".to_string(),
            stats.total_files.to_string(),
        ],
        vec!["Total de Entes".to_string(), stats.total_entities.to_string()],
        vec![
            "Total de Fuentes de Financiamiento".to_string(),
            stats.total_sources.to_string(),
        ],
        vec!["Total de Propuestas".to_string(), stats.total_rows.to_string()],
        vec![String::new(), String::new()],
        vec!["Distribución por Ente".to_string(), String::new()],
    ];
    for (entity, count) in &stats.by_entity {
        rows.push(vec![format!("  {entity}"), count.to_string()]);
    }
    rows.push(vec![String::new(), String::new()]);
    rows.push(vec!["Distribución por Fuente".to_string(), String::new()]);
    for (source, count) in &stats.by_source {
        rows.push(vec![format!("  {source}"), count.to_string()]);
    }
    rows
}

fn row_cells(row: &ConsolidatedRow) -> Vec<String> {
    vec![
        row.entity.clone(),
        row.funding_source.clone(),
        row.period.clone(),
        row.doc_type.clone(),
        row.source_file.clone(),
        row.proposal_number
            .map_or_else(|| "N/A".to_string(), |n| n.to_string()),
        row.observation.clone(),
        row.proposal.clone(),
        row.sheet.clone().unwrap_or_else(|| "N/A".to_string()),
        row.row.map_or_else(|| "N/A".to_string(), |r| r.to_string()),
        row.processed_at.format("%Y-%m-%d %H:%M:%S").to_string(),
    ]
}

fn sheet_name(name: &str) -> String {
    name.chars().take(MAX_SHEET_NAME_CHARS).collect()
}
