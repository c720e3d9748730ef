//! Semantic similarity judging
//!
//! Pairwise comparison of proposal pairs through a text-generation
//! provider. The judge asks for a constrained JSON verdict and maps it
//! into [`SimilarityVerdict`]; the dedup engine applies its thresholds on
//! top. [`NullJudge`] keeps the pipeline fully functional without a
//! configured credential.

use crate::LlmError;
use serde::Deserialize;
use solventa_domain::traits::{LlmProvider, SimilarityJudge};
use solventa_domain::{ProposalPair, SimilarityVerdict};
use std::collections::VecDeque;
use std::sync::Mutex;
use tracing::debug;

/// Raw verdict shape returned by the model.
#[derive(Debug, Deserialize)]
struct RawVerdict {
    #[serde(default)]
    es_duplicado: bool,
    #[serde(default)]
    es_version: bool,
    #[serde(default)]
    similitud: f64,
    #[serde(default)]
    explicacion: String,
    #[serde(default)]
    cambios_detectados: Vec<String>,
}

/// Similarity judge backed by a text-generation provider.
pub struct LlmJudge<P> {
    provider: P,
}

impl<P> LlmJudge<P> {
    /// Wrap a provider.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

impl<P> SimilarityJudge for LlmJudge<P>
where
    P: LlmProvider,
    P::Error: std::fmt::Display,
{
    type Error = LlmError;

    fn judge(
        &self,
        existing: &ProposalPair,
        incoming: &ProposalPair,
    ) -> Result<SimilarityVerdict, Self::Error> {
        let prompt = comparison_prompt(existing, incoming);
        let response = self
            .provider
            .generate(&prompt)
            .map_err(|e| LlmError::Communication(e.to_string()))?;
        let verdict = parse_verdict(&response)?;
        debug!(
            score = verdict.score,
            is_duplicate = verdict.is_duplicate,
            is_version = verdict.is_version,
            "similarity verdict"
        );
        Ok(verdict)
    }
}

fn comparison_prompt(existing: &ProposalPair, incoming: &ProposalPair) -> String {
    format!(
        r#"Eres un experto en análisis de documentos de auditoría y solventación.

Analiza estas dos propuestas de solventación y determina:
1. ¿Son DUPLICADOS? (mismo contenido, posiblemente con pequeñas diferencias de formato)
2. ¿Es la segunda una NUEVA VERSIÓN de la primera? (misma observación pero propuesta mejorada/corregida)
3. ¿Qué porcentaje de similitud tienen? (0-100)
4. ¿Cuáles son los cambios principales?

PROPUESTA EXISTENTE:
Observación: {}
Propuesta: {}

PROPUESTA NUEVA:
Observación: {}
Propuesta: {}

Responde ÚNICAMENTE en formato JSON:
{{
    "es_duplicado": true/false,
    "es_version": true/false,
    "similitud": 0-100,
    "explicacion": "explicación breve",
    "cambios_detectados": ["cambio1", "cambio2"]
}}

IMPORTANTE:
- es_duplicado = true si son prácticamente idénticas (>95% similitud)
- es_version = true si la observación es similar pero la propuesta cambió significativamente
- Si es_version = true, entonces es_duplicado = false"#,
        clean_text(&existing.observation),
        clean_text(&existing.proposal),
        clean_text(&incoming.observation),
        clean_text(&incoming.proposal),
    )
}

/// Strip any markup tags and collapse whitespace before the text goes
/// into the prompt.
fn clean_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_verdict(response: &str) -> Result<SimilarityVerdict, LlmError> {
    let cleaned = strip_code_fence(response.trim());
    let raw: RawVerdict = serde_json::from_str(cleaned)
        .map_err(|e| LlmError::InvalidResponse(format!("verdict is not valid JSON: {}", e)))?;
    Ok(SimilarityVerdict {
        score: raw.similitud.clamp(0.0, 100.0).round() as u8,
        is_duplicate: raw.es_duplicado,
        is_version: raw.es_version,
        rationale: raw.explicacion,
        changes: raw.cambios_detectados,
    })
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    match rest.find("```") {
        Some(end) => rest[..end].trim(),
        None => rest.trim(),
    }
}

/// Judge used when no provider is configured: every comparison scores 0,
/// so nothing is ever classified as a semantic duplicate or version.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullJudge;

impl SimilarityJudge for NullJudge {
    type Error = LlmError;

    fn judge(
        &self,
        _existing: &ProposalPair,
        _incoming: &ProposalPair,
    ) -> Result<SimilarityVerdict, Self::Error> {
        Ok(SimilarityVerdict::not_similar(
            "comparación semántica no configurada",
        ))
    }
}

/// Scripted judge for deterministic tests: returns queued verdicts in
/// order, then falls back to the not-similar verdict.
#[derive(Debug, Default)]
pub struct MockJudge {
    verdicts: Mutex<VecDeque<Result<SimilarityVerdict, String>>>,
}

impl MockJudge {
    /// Create an empty scripted judge.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a verdict for the next comparison.
    pub fn push_verdict(&self, verdict: SimilarityVerdict) {
        self.verdicts.lock().unwrap().push_back(Ok(verdict));
    }

    /// Queue a failure for the next comparison.
    pub fn push_error(&self, message: impl Into<String>) {
        self.verdicts.lock().unwrap().push_back(Err(message.into()));
    }
}

impl SimilarityJudge for MockJudge {
    type Error = LlmError;

    fn judge(
        &self,
        _existing: &ProposalPair,
        _incoming: &ProposalPair,
    ) -> Result<SimilarityVerdict, Self::Error> {
        match self.verdicts.lock().unwrap().pop_front() {
            Some(Ok(verdict)) => Ok(verdict),
            Some(Err(message)) => Err(LlmError::Other(message)),
            None => Ok(SimilarityVerdict::not_similar("sin veredicto programado")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockProvider;

    fn pair(obs: &str, prop: &str) -> ProposalPair {
        ProposalPair::new(obs, prop)
    }

    #[test]
    fn test_parse_verdict_full() {
        let v = parse_verdict(
            r#"{"es_duplicado": false, "es_version": true, "similitud": 82, "explicacion": "propuesta corregida", "cambios_detectados": ["fecha actualizada"]}"#,
        )
        .unwrap();
        assert_eq!(v.score, 82);
        assert!(!v.is_duplicate);
        assert!(v.is_version);
        assert_eq!(v.rationale, "propuesta corregida");
        assert_eq!(v.changes, vec!["fecha actualizada".to_string()]);
    }

    #[test]
    fn test_parse_verdict_with_fence_and_fractional_score() {
        let v = parse_verdict(
            "```json\n{\"es_duplicado\": true, \"es_version\": false, \"similitud\": 97.6, \"explicacion\": \"idénticas\"}\n```",
        )
        .unwrap();
        assert_eq!(v.score, 98);
        assert!(v.is_duplicate);
        assert!(v.changes.is_empty());
    }

    #[test]
    fn test_parse_verdict_clamps_out_of_range_score() {
        let v = parse_verdict(r#"{"similitud": 150}"#).unwrap();
        assert_eq!(v.score, 100);
    }

    #[test]
    fn test_parse_verdict_rejects_garbage() {
        assert!(matches!(
            parse_verdict("no es JSON"),
            Err(LlmError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_prompt_strips_markup() {
        let existing = pair("<p>Falta <strong>evidencia</strong></p>", "prop");
        let incoming = pair("obs", "prop");
        let prompt = comparison_prompt(&existing, &incoming);
        assert!(prompt.contains("Observación: Falta evidencia"));
        assert!(!prompt.contains("<strong>"));
    }

    #[test]
    fn test_llm_judge_end_to_end_with_mock_provider() {
        let provider = MockProvider::new(
            r#"{"es_duplicado": true, "es_version": false, "similitud": 96, "explicacion": "mismo contenido"}"#,
        );
        let judge = LlmJudge::new(provider);
        let v = judge.judge(&pair("a", "b"), &pair("a", "b")).unwrap();
        assert_eq!(v.score, 96);
        assert!(v.is_duplicate);
    }

    #[test]
    fn test_llm_judge_propagates_provider_failure() {
        let judge = LlmJudge::new(MockProvider::failing("caído"));
        assert!(judge.judge(&pair("a", "b"), &pair("a", "b")).is_err());
    }

    #[test]
    fn test_null_judge_scores_zero() {
        let v = NullJudge.judge(&pair("a", "b"), &pair("a", "b")).unwrap();
        assert_eq!(v.score, 0);
        assert!(!v.is_duplicate);
        assert!(!v.is_version);
    }

    #[test]
    fn test_mock_judge_scripted_order() {
        let judge = MockJudge::new();
        judge.push_verdict(SimilarityVerdict {
            score: 96,
            is_duplicate: true,
            is_version: false,
            rationale: "primera".to_string(),
            changes: Vec::new(),
        });
        judge.push_error("fallo");

        let first = judge.judge(&pair("a", "b"), &pair("a", "b")).unwrap();
        assert_eq!(first.score, 96);
        assert!(judge.judge(&pair("a", "b"), &pair("a", "b")).is_err());
        // Exhausted queue falls back to not-similar
        let third = judge.judge(&pair("a", "b"), &pair("a", "b")).unwrap();
        assert_eq!(third.score, 0);
    }
}
