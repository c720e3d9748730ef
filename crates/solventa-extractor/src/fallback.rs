//! Generative fallback extraction
//!
//! Invoked only when the structural scan finds nothing. A bounded markup
//! rendering of the document is sent to the text-generation provider with
//! a constrained-output instruction, and the returned JSON is mapped into
//! the same candidate shape the structural path produces. Every failure
//! degrades to an empty list; the fallback never propagates an error.

use crate::config::ExtractorConfig;
use crate::document::{DocxDocument, ParsedDocument, XlsxDocument};
use crate::error::ExtractorError;
use crate::markup;
use serde::Deserialize;
use solventa_domain::{
    CandidateDetails, ExtractionMethod, LlmProvider, ProposalCandidate, NO_OBSERVATION,
};
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// One entry of the model's `{"propuestas": [...]}` response. Unknown
/// fields are ignored; missing texts are skipped by the caller.
#[derive(Debug, Deserialize)]
struct FallbackEntry {
    #[serde(default)]
    observacion: Option<String>,
    #[serde(default)]
    propuesta: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FallbackResponse {
    #[serde(default)]
    propuestas: Vec<FallbackEntry>,
}

/// Fallback extractor over a blocking text-generation provider.
pub struct FallbackExtractor<P> {
    provider: Option<Arc<P>>,
    config: ExtractorConfig,
}

impl<P> FallbackExtractor<P>
where
    P: LlmProvider + Send + Sync + 'static,
    P::Error: std::fmt::Display,
{
    /// Create a fallback extractor. With no provider every extraction
    /// yields an empty list.
    pub fn new(provider: Option<Arc<P>>, config: ExtractorConfig) -> Self {
        Self { provider, config }
    }

    /// Extract candidates from a document whose structural scan came up
    /// empty. Never fails; degraded paths log and return an empty list.
    pub async fn extract(&self, doc: &ParsedDocument) -> Vec<ProposalCandidate> {
        if self.provider.is_none() {
            debug!("no generative provider configured, skipping fallback");
            return Vec::new();
        }
        let result = match doc {
            ParsedDocument::Docx(d) => self.extract_docx(d).await,
            ParsedDocument::Xlsx(d) => self.extract_xlsx(d).await,
        };
        match result {
            Ok(candidates) => {
                info!(count = candidates.len(), "fallback extraction finished");
                candidates
            }
            Err(e) => {
                warn!(error = %e, "fallback extraction failed");
                Vec::new()
            }
        }
    }

    async fn extract_docx(
        &self,
        doc: &DocxDocument,
    ) -> Result<Vec<ProposalCandidate>, ExtractorError> {
        let html = markup::docx_html(doc);
        if html.chars().count() > self.config.max_document_chars {
            return Err(ExtractorError::DocumentTooLarge(
                html.chars().count(),
                self.config.max_document_chars,
            ));
        }
        let excerpt = truncate_chars(&html, self.config.docx_excerpt_chars);
        let response = self.call_provider(&document_prompt(&excerpt)).await?;
        let pairs = parse_response(&response)?;
        Ok(build_candidates(pairs, None, 1))
    }

    async fn extract_xlsx(
        &self,
        doc: &XlsxDocument,
    ) -> Result<Vec<ProposalCandidate>, ExtractorError> {
        let mut candidates = Vec::new();
        for sheet in &doc.sheets {
            let html = markup::sheet_html(sheet);
            let excerpt = truncate_chars(&html, self.config.xlsx_excerpt_chars);
            let response = self.call_provider(&sheet_prompt(&sheet.name, &excerpt)).await?;
            let pairs = parse_response(&response)?;
            let start = candidates.len() as u32 + 1;
            candidates.extend(build_candidates(pairs, Some(sheet.name.clone()), start));
        }
        Ok(candidates)
    }

    async fn call_provider(&self, prompt: &str) -> Result<String, ExtractorError> {
        let provider = match &self.provider {
            Some(p) => Arc::clone(p),
            None => return Err(ExtractorError::Llm("no provider configured".to_string())),
        };
        let prompt = prompt.to_string();

        // The provider is blocking; run it off the async executor.
        let call = tokio::task::spawn_blocking(move || {
            provider
                .generate(&prompt)
                .map_err(|e| ExtractorError::Llm(e.to_string()))
        });
        match timeout(self.config.fallback_timeout(), call).await {
            Ok(joined) => {
                joined.map_err(|e| ExtractorError::Llm(format!("task join error: {}", e)))?
            }
            Err(_) => Err(ExtractorError::Timeout),
        }
    }
}

fn document_prompt(excerpt: &str) -> String {
    format!(
        r#"Eres un experto en análisis de documentos de auditoría y solventación. Respondes solo en JSON válido.

Analiza el siguiente documento (en formato HTML) y extrae TODAS las propuestas de solventación que encuentres.

Una propuesta típicamente tiene:
1. Una OBSERVACIÓN (opcional)
2. Una PROPUESTA DE SOLVENTACIÓN

DOCUMENTO:
{excerpt}

Extrae TODAS las propuestas y devuelve un JSON con este formato:
{{
    "propuestas": [
        {{
            "numero": 1,
            "observacion": "texto de la observación o 'Sin observación'",
            "propuesta": "texto de la propuesta"
        }}
    ]
}}

IMPORTANTE: Solo devuelve el JSON, sin texto adicional."#
    )
}

fn sheet_prompt(sheet_name: &str, excerpt: &str) -> String {
    format!(
        r#"Eres un experto en análisis de documentos de auditoría y solventación. Respondes solo en JSON válido.

Analiza la siguiente tabla de Excel (en formato HTML) y extrae TODAS las propuestas de solventación que encuentres.

Una propuesta típicamente tiene:
1. Una OBSERVACIÓN (opcional)
2. Una PROPUESTA DE SOLVENTACIÓN

TABLA DE LA HOJA "{sheet_name}":
{excerpt}

Extrae TODAS las propuestas y devuelve un JSON con este formato:
{{
    "propuestas": [
        {{
            "numero": 1,
            "observacion": "texto de la observación o 'Sin observación'",
            "propuesta": "texto de la propuesta"
        }}
    ]
}}

IMPORTANTE: Solo devuelve el JSON, sin texto adicional."#
    )
}

/// Parse the provider's response, tolerating a markdown code fence.
fn parse_response(response: &str) -> Result<Vec<FallbackEntry>, ExtractorError> {
    let cleaned = strip_code_fence(response.trim());
    let parsed: FallbackResponse = serde_json::from_str(cleaned)?;
    Ok(parsed.propuestas)
}

/// Remove a surrounding ``` or ```json fence, when present.
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

/// Map response entries to candidates, skipping malformed ones and
/// renumbering from `start`.
fn build_candidates(
    entries: Vec<FallbackEntry>,
    sheet: Option<String>,
    start: u32,
) -> Vec<ProposalCandidate> {
    let mut candidates = Vec::new();
    let mut number = start;
    for entry in entries {
        let proposal = entry.propuesta.map(|p| p.trim().to_string()).unwrap_or_default();
        if proposal.is_empty() {
            continue;
        }
        let observation = entry
            .observacion
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .unwrap_or_else(|| NO_OBSERVATION.to_string());
        candidates.push(ProposalCandidate {
            number,
            observation_html: markup::plain_html(&observation),
            observation_text: observation,
            proposal_html: markup::plain_html(&proposal),
            proposal_text: proposal,
            sheet: sheet.clone(),
            row: None,
            method: ExtractionMethod::Fallback,
            details: CandidateDetails::default(),
        });
        number += 1;
    }
    candidates
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
