//! Console summary output.

use crate::pipeline::ProcessingSummary;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Concepto")]
    label: &'static str,
    #[tabled(rename = "Valor")]
    value: String,
}

/// Render the batch summary as a console table.
pub fn summary_table(summary: &ProcessingSummary) -> String {
    let elapsed = summary.finished_at - summary.started_at;
    let rows = vec![
        SummaryRow {
            label: "Archivos encontrados",
            value: summary.total_files.to_string(),
        },
        SummaryRow {
            label: "Archivos procesados",
            value: summary.processed_files.to_string(),
        },
        SummaryRow {
            label: "Archivos con error",
            value: summary.failed_files.to_string(),
        },
        SummaryRow {
            label: "Propuestas extraídas",
            value: summary.total_proposals.to_string(),
        },
        SummaryRow {
            label: "Propuestas nuevas",
            value: summary.new_proposals.to_string(),
        },
        SummaryRow {
            label: "Duplicados exactos",
            value: summary.exact_duplicates.to_string(),
        },
        SummaryRow {
            label: "Duplicados semánticos",
            value: summary.semantic_duplicates.to_string(),
        },
        SummaryRow {
            label: "Versiones aplicadas",
            value: summary.versions_created.to_string(),
        },
        SummaryRow {
            label: "Archivos con advertencias de imagen",
            value: summary.files_with_image_warnings.to_string(),
        },
        SummaryRow {
            label: "Duración (s)",
            value: elapsed.num_seconds().to_string(),
        },
    ];
    let mut table = Table::new(rows);
    table.with(Style::sharp());
    table.to_string()
}
