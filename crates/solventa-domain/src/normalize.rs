//! Text normalization for keyword comparison
//!
//! Audit documents write the marker cells with inconsistent casing and
//! accents ("Observación", "OBSERVACION", "Propuesta de Solventación").
//! Keyword matching therefore runs on a folded form: NFD decomposition,
//! combining marks stripped, uppercased. The folded form is never stored
//! or displayed.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Fold text for keyword comparison: remove diacritics and uppercase.
///
/// Total and idempotent; empty input yields an empty string.
///
/// # Examples
///
/// ```
/// use solventa_domain::normalize;
///
/// assert_eq!(normalize("Observación"), "OBSERVACION");
/// assert_eq!(normalize("Propuesta de Solventación"), "PROPUESTA DE SOLVENTACION");
/// assert_eq!(normalize(""), "");
/// ```
pub fn normalize(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_uppercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_accents_and_uppercases() {
        assert_eq!(normalize("Solventación"), "SOLVENTACION");
        assert_eq!(normalize("número de auditoría"), "NUMERO DE AUDITORIA");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_plain_ascii_passthrough() {
        assert_eq!(normalize("PROPUESTA"), "PROPUESTA");
        assert_eq!(normalize("propuesta"), "PROPUESTA");
    }

    #[test]
    fn test_idempotent() {
        let once = normalize("Versión ñ Ü");
        let twice = normalize(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_preserves_non_letter_content() {
        assert_eq!(normalize("12.FIDECIX_ENE_JUN"), "12.FIDECIX_ENE_JUN");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: normalization is idempotent for arbitrary input
        #[test]
        fn test_normalize_idempotent(s in "\\PC*") {
            let once = normalize(&s);
            prop_assert_eq!(normalize(&once), once.clone());
        }

        /// Property: normalization never panics and never yields combining marks
        #[test]
        fn test_normalize_total(s in "\\PC*") {
            let folded = normalize(&s);
            prop_assert!(!folded.chars().any(unicode_normalization::char::is_combining_mark));
        }
    }
}
