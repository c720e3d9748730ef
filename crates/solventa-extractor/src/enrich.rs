//! Supplementary text mining
//!
//! Mines a candidate's combined observation + proposal text for dates,
//! responsible-party mentions, numeric references and significant audit
//! keywords. Purely informational; the dedup engine never reads these.

use regex::Regex;
use solventa_domain::CandidateDetails;

/// Marker phrases that introduce a responsible party.
const RESPONSIBLE_MARKERS: &[&str] = &[
    "responsable:",
    "encargado:",
    "titular:",
    "director:",
    "coordinador:",
    "jefe:",
];

/// Audit keywords worth surfacing in reports.
const SIGNIFICANT_KEYWORDS: &[&str] = &[
    "cumplimiento",
    "incumplimiento",
    "pendiente",
    "realizado",
    "en proceso",
    "evidencia",
    "documentación",
    "plazo",
    "vencimiento",
    "urgente",
    "prioritario",
];

/// Mines supplementary details out of free-form proposal text.
pub struct TextMiner {
    date_patterns: Vec<Regex>,
    responsible_marker: Regex,
    numeric_reference: Regex,
}

impl Default for TextMiner {
    fn default() -> Self {
        Self::new()
    }
}

impl TextMiner {
    /// Compile the mining patterns.
    pub fn new() -> Self {
        let date_sources = [
            r"\b\d{1,2}[/-]\d{1,2}[/-]\d{2,4}\b",
            r"\b\d{4}[/-]\d{1,2}[/-]\d{1,2}\b",
            r"(?i)\b(?:enero|febrero|marzo|abril|mayo|junio|julio|agosto|septiembre|octubre|noviembre|diciembre)\s+(?:de\s+)?\d{4}\b",
            r"(?i)\b(?:ene|feb|mar|abr|may|jun|jul|ago|sep|oct|nov|dic)[a-z]*\.?\s+\d{4}\b",
        ];
        // All patterns are literals; compilation cannot fail.
        Self {
            date_patterns: date_sources
                .iter()
                .map(|p| Regex::new(p).unwrap_or_else(|_| unreachable!()))
                .collect(),
            responsible_marker: Regex::new(&format!(
                r"(?i)\b(?:{})",
                RESPONSIBLE_MARKERS.join("|")
            ))
            .unwrap_or_else(|_| unreachable!()),
            numeric_reference: Regex::new(
                r"(?i)\b(?:ref|referencia|no|número|num)\.?\s*:?\s*(\d+(?:[/-]\d+)*)\b",
            )
            .unwrap_or_else(|_| unreachable!()),
        }
    }

    /// Mine one text. Reference and classification stay unset; the
    /// structural scan fills those from row positions.
    pub fn mine(&self, text: &str) -> CandidateDetails {
        let lower = text.to_lowercase();
        let mut details = CandidateDetails::default();

        for pattern in &self.date_patterns {
            for m in pattern.find_iter(text) {
                details.dates.push(m.as_str().to_string());
            }
        }

        // Matched against the original text so the offsets stay valid;
        // lowercasing can change byte lengths.
        for m in self.responsible_marker.find_iter(text) {
            let fragment: String = text[m.start()..].chars().take(100).collect();
            details.responsible_parties.push(fragment);
        }

        for caps in self.numeric_reference.captures_iter(text) {
            details.numeric_references.push(caps[1].to_string());
        }

        for keyword in SIGNIFICANT_KEYWORDS {
            if lower.contains(keyword) {
                details.keywords.push((*keyword).to_string());
            }
        }

        details
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mines_slash_dates() {
        let miner = TextMiner::new();
        let d = miner.mine("Se entregó el 15/03/2024 y se revisó el 2024-04-01.");
        assert_eq!(d.dates, vec!["15/03/2024", "2024-04-01"]);
    }

    #[test]
    fn test_mines_spanish_month_dates() {
        let miner = TextMiner::new();
        let d = miner.mine("Compromiso para marzo de 2024, prórroga a Abr. 2025.");
        assert!(d.dates.contains(&"marzo de 2024".to_string()));
        assert!(d.dates.contains(&"Abr. 2025".to_string()));
    }

    #[test]
    fn test_mines_responsible_fragment() {
        let miner = TextMiner::new();
        let d = miner.mine("Responsable: Dirección de Finanzas, área de egresos");
        assert_eq!(d.responsible_parties.len(), 1);
        assert!(d.responsible_parties[0].starts_with("Responsable: Dirección"));
    }

    #[test]
    fn test_mines_numeric_references() {
        let miner = TextMiner::new();
        let d = miner.mine("Véase referencia: 123/45 y el oficio num 789");
        assert_eq!(d.numeric_references, vec!["123/45", "789"]);
    }

    #[test]
    fn test_mines_keywords_case_insensitive() {
        let miner = TextMiner::new();
        let d = miner.mine("Estatus: PENDIENTE de entrega de evidencia en el plazo fijado");
        assert_eq!(d.keywords, vec!["pendiente", "evidencia", "plazo"]);
    }

    #[test]
    fn test_empty_text_mines_nothing() {
        let miner = TextMiner::new();
        assert!(miner.mine("").is_empty());
    }

    #[test]
    fn test_responsible_fragment_respects_char_boundaries() {
        let miner = TextMiner::new();
        let long = format!("responsable: {}", "á".repeat(200));
        let d = miner.mine(&long);
        assert_eq!(d.responsible_parties[0].chars().count(), 100);
    }

    #[test]
    fn test_responsible_marker_after_length_changing_lowercase() {
        // U+212A and U+0130 lowercase to fewer bytes than they occupy, so
        // positions in the lowercased text do not line up with the source.
        let miner = TextMiner::new();

        let d = miner.mine("\u{212A} responsable: Finanzas");
        assert_eq!(d.responsible_parties, vec!["responsable: Finanzas"]);

        let d = miner.mine("\u{130} Responsable: Finanzas");
        assert_eq!(d.responsible_parties, vec!["Responsable: Finanzas"]);
    }

    #[test]
    fn test_every_responsible_occurrence_is_captured() {
        let miner = TextMiner::new();
        let d = miner.mine("Responsable: Tesorería. Encargado: Obras. Responsable: Egresos");
        assert_eq!(d.responsible_parties.len(), 3);
        assert!(d.responsible_parties[1].starts_with("Encargado: Obras"));
    }
}
