//! Filename-pattern metadata extraction
//!
//! Derives entity, funding sources, period and document type from a
//! filename (plus sheet names for workbooks) using fixed pattern tables.
//! Every lookup has a sentinel fallback; extraction is total and never
//! errors on a malformed name.

use regex::Regex;
use solventa_domain::{
    DocumentMetadata, FileKind, GENERIC_DOC_TYPE, UNKNOWN_ENTITY, UNSPECIFIED_SOURCE,
};
use std::path::Path;

/// Known institutional entity acronyms, checked in order. Longer acronyms
/// precede their prefixes (FIDECIX before FIDE) so substring matching
/// picks the most specific one.
const KNOWN_ENTITIES: &[&str] = &[
    "FIDECIX", "SEPUEDE", "FIDEGAR", "FIDEAPECH", "FIDE", "COEPRIST", "DIF", "SEPE", "CEA", "ITE",
];

/// Known funding-source codes with their descriptions. Matching against
/// the uppercased filename is case-sensitive, so a mixed-case code only
/// matches where it appears verbatim.
pub const FUNDING_SOURCES: &[(&str, &str)] = &[
    ("SA", "Subsidio para la Asistencia"),
    ("PEFCF", "Programa Especial de Fondos y Contingencias Fiscales"),
    ("R", "Recursos Propios"),
    ("PRAS", "Programa de Recursos de Alta Seguridad"),
    ("PDP", "Programa de Desarrollo Profesional"),
    ("REA", "Recursos Extraordinarios Adicionales"),
    ("RRyPE", "Resultados de Revisión y Propuestas de Entrega"),
];

/// Spanish month abbreviations, calendar order.
const MONTHS: &[&str] = &[
    "ENE", "FEB", "MAR", "ABR", "MAY", "JUN", "JUL", "AGO", "SEP", "OCT", "NOV", "DIC",
];

/// Known document-type tokens, checked in order.
const DOC_TYPES: &[&str] = &["RRyPE", "REA", "INFORME", "REPORTE", "PROPUESTA"];

/// Extracts structured metadata from filenames and sheet names.
pub struct MetadataExtractor {
    numbered_entity: Regex,
    leading_entity: Regex,
    year: Regex,
}

impl Default for MetadataExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataExtractor {
    /// Create an extractor with its compiled filename patterns.
    pub fn new() -> Self {
        // The patterns are literals; compilation cannot fail.
        Self {
            numbered_entity: Regex::new(r"\d+\.([A-Z]+)_").unwrap_or_else(|_| unreachable!()),
            leading_entity: Regex::new(r"^([A-Z]+)_").unwrap_or_else(|_| unreachable!()),
            year: Regex::new(r"20\d{2}").unwrap_or_else(|_| unreachable!()),
        }
    }

    /// Full metadata for one file. `sheet_names` feeds the funding-source
    /// lookup for workbooks and is ignored for word-processor documents.
    pub fn analyze(&self, filename: &str, kind: FileKind, sheet_names: &[String]) -> DocumentMetadata {
        let base = base_name(filename);
        let sheets = match kind {
            FileKind::Xlsx => sheet_names,
            FileKind::Docx => &[],
        };
        DocumentMetadata {
            filename: base.to_string(),
            kind,
            entity: self.entity(filename),
            funding_sources: self.funding_sources(filename, sheets),
            period: self.period(filename),
            doc_type: self.doc_type(filename),
        }
    }

    /// Entity code: known acronym substring first, then the
    /// `N.ACRONYM_` and leading `ACRONYM_` patterns, else the sentinel.
    pub fn entity(&self, filename: &str) -> String {
        let upper = base_name(filename).to_uppercase();

        for entity in KNOWN_ENTITIES {
            if upper.contains(entity) {
                return (*entity).to_string();
            }
        }
        if let Some(caps) = self.numbered_entity.captures(&upper) {
            return caps[1].to_string();
        }
        if let Some(caps) = self.leading_entity.captures(&upper) {
            return caps[1].to_string();
        }
        UNKNOWN_ENTITY.to_string()
    }

    /// Funding-source codes, in first-discovery order. Filename matches
    /// require the code delimiter-bounded (`_CODE.`, `_CODE_`, or a
    /// trailing `_CODE`); sheet names match on equality or a bounded
    /// substring. Falls back to the single-element sentinel list.
    pub fn funding_sources(&self, filename: &str, sheet_names: &[String]) -> Vec<String> {
        let upper = base_name(filename).to_uppercase();
        let mut found: Vec<String> = Vec::new();

        for (code, _) in FUNDING_SOURCES {
            let bounded_dot = format!("_{}.", code);
            let bounded = format!("_{}_", code);
            let trailing = format!("_{}", code);
            if upper.contains(&bounded_dot) || upper.contains(&bounded) || upper.ends_with(&trailing)
            {
                if !found.iter().any(|f| f == code) {
                    found.push((*code).to_string());
                }
            }
        }

        for sheet in sheet_names {
            let sheet_upper = sheet.to_uppercase();
            for (code, _) in FUNDING_SOURCES {
                let suffixed = format!("_{}", code);
                let prefixed = format!("{}_", code);
                if sheet_upper == *code
                    || sheet_upper.contains(&suffixed)
                    || sheet_upper.contains(&prefixed)
                {
                    if !found.iter().any(|f| f == code) {
                        found.push((*code).to_string());
                    }
                }
            }
        }

        if found.is_empty() {
            vec![UNSPECIFIED_SOURCE.to_string()]
        } else {
            found
        }
    }

    /// Period token: the first `MES_MES` month-abbreviation pair, else a
    /// bare `20xx` year, else none.
    pub fn period(&self, filename: &str) -> Option<String> {
        let upper = base_name(filename).to_uppercase();

        for first in MONTHS {
            for second in MONTHS {
                let pair = format!("{}_{}", first, second);
                if upper.contains(&pair) {
                    return Some(pair);
                }
            }
        }
        self.year.find(&upper).map(|m| m.as_str().to_string())
    }

    /// Document-type token. When both `REA` and `RRyPE` appear, the
    /// composite `REA_RRyPE` wins over either alone.
    pub fn doc_type(&self, filename: &str) -> String {
        let upper = base_name(filename).to_uppercase();

        for doc_type in DOC_TYPES {
            if upper.contains(&doc_type.to_uppercase()) {
                if upper.contains("REA") && upper.contains("RRYPE") {
                    return "REA_RRyPE".to_string();
                }
                return (*doc_type).to_string();
            }
        }
        GENERIC_DOC_TYPE.to_string()
    }
}

fn base_name(filename: &str) -> &str {
    Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_scenario_docx() {
        let extractor = MetadataExtractor::new();
        let meta = extractor.analyze("12.FIDECIX_RRyPE_ENE_JUN_SA.docx", FileKind::Docx, &[]);
        assert_eq!(meta.entity, "FIDECIX");
        assert_eq!(meta.funding_sources, vec!["SA".to_string()]);
        assert_eq!(meta.period.as_deref(), Some("ENE_JUN"));
        assert_eq!(meta.doc_type, "RRyPE");
        assert_eq!(meta.filename, "12.FIDECIX_RRyPE_ENE_JUN_SA.docx");
    }

    #[test]
    fn test_entity_known_acronym() {
        let extractor = MetadataExtractor::new();
        assert_eq!(extractor.entity("SEPUEDE_informe.xlsx"), "SEPUEDE");
        // FIDECIX wins over its prefix FIDE
        assert_eq!(extractor.entity("3.FIDECIX_SA.docx"), "FIDECIX");
    }

    #[test]
    fn test_entity_pattern_fallbacks() {
        let extractor = MetadataExtractor::new();
        assert_eq!(extractor.entity("7.ACME_informe.docx"), "ACME");
        assert_eq!(extractor.entity("ACME_reporte.xlsx"), "ACME");
        assert_eq!(extractor.entity("sin patron.docx"), UNKNOWN_ENTITY);
    }

    #[test]
    fn test_entity_ignores_directory() {
        let extractor = MetadataExtractor::new();
        assert_eq!(extractor.entity("/datos/entrada/FIDEGAR_R.docx"), "FIDEGAR");
    }

    #[test]
    fn test_funding_from_filename_bounded_only() {
        let extractor = MetadataExtractor::new();
        // SA bounded by _ and the extension dot
        assert_eq!(
            extractor.funding_sources("12.FIDECIX_ENE_JUN_SA.docx", &[]),
            vec!["SA".to_string()]
        );
        // SALDO contains SA but not delimiter-bounded
        assert_eq!(
            extractor.funding_sources("FIDECIX_SALDOS.docx", &[]),
            vec![UNSPECIFIED_SOURCE.to_string()]
        );
    }

    #[test]
    fn test_funding_from_sheet_names() {
        let extractor = MetadataExtractor::new();
        let sheets = vec![
            "SA".to_string(),
            "PEFCF".to_string(),
            "R".to_string(),
            "Resumen".to_string(),
        ];
        assert_eq!(
            extractor.funding_sources("informe.xlsx", &sheets),
            vec!["SA".to_string(), "PEFCF".to_string(), "R".to_string()]
        );
    }

    #[test]
    fn test_funding_dedupes_across_name_and_sheets() {
        let extractor = MetadataExtractor::new();
        let sheets = vec!["SA".to_string()];
        assert_eq!(
            extractor.funding_sources("FIDE_SA_2024.xlsx", &sheets),
            vec!["SA".to_string()]
        );
    }

    #[test]
    fn test_period_month_pair_and_year() {
        let extractor = MetadataExtractor::new();
        assert_eq!(
            extractor.period("informe_ENE_JUN.docx").as_deref(),
            Some("ENE_JUN")
        );
        assert_eq!(
            extractor.period("informe_ENE_ENE.xlsx").as_deref(),
            Some("ENE_ENE")
        );
        assert_eq!(extractor.period("corte_2024.xlsx").as_deref(), Some("2024"));
        assert_eq!(extractor.period("sin_periodo.docx"), None);
    }

    #[test]
    fn test_doc_type_composite() {
        let extractor = MetadataExtractor::new();
        assert_eq!(extractor.doc_type("12.FIDECIX_RRyPE_SA.docx"), "RRyPE");
        assert_eq!(
            extractor.doc_type("12.FIDECIX_REA_RRyPE_SA.docx"),
            "REA_RRyPE"
        );
        assert_eq!(extractor.doc_type("FIDE_INFORME_2023.docx"), "INFORME");
        assert_eq!(extractor.doc_type("otro.docx"), GENERIC_DOC_TYPE);
    }

    #[test]
    fn test_docx_ignores_sheet_names() {
        let extractor = MetadataExtractor::new();
        let sheets = vec!["SA".to_string()];
        let meta = extractor.analyze("informe.docx", FileKind::Docx, &sheets);
        assert_eq!(meta.funding_sources, vec![UNSPECIFIED_SOURCE.to_string()]);
    }
}
