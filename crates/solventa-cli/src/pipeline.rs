//! The batch processing pipeline.
//!
//! Runs every discovered parsed-document handle through metadata
//! analysis, structural extraction with generative fallback, image
//! validation, dedup classification and consolidation. A failing file
//! becomes a failure record; the batch never stops for one file.

use crate::config::{AppConfig, LlmSettings};
use crate::error::{CliError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use solventa_domain::traits::SimilarityJudge;
use solventa_domain::{DedupDecision, FileKind, ProcessingStats, ProposalPair, SimilarityVerdict};
use solventa_extractor::{
    ExtractorError, FallbackExtractor, JsonDocumentParser, MetadataExtractor, StructuralExtractor,
};
use solventa_llm::openai::{EXTRACTION_SAMPLING, JUDGING_SAMPLING};
use solventa_llm::{LlmError, LlmJudge, NullJudge, OpenAiProvider};
use solventa_report::{render_workbook, Consolidator, FileRecord, JsonWorkbookWriter};
use solventa_store::engine::Scope;
use solventa_store::{DedupEngine, SqliteStore};
use solventa_validator::ImageValidator;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Judge selected at startup: LLM-backed when an API key is configured,
/// otherwise the null judge that never finds similarity.
pub enum PipelineJudge {
    /// Pairwise comparison through the configured provider
    Llm(LlmJudge<OpenAiProvider>),
    /// No provider configured
    Disabled(NullJudge),
}

impl SimilarityJudge for PipelineJudge {
    type Error = LlmError;

    fn judge(
        &self,
        existing: &ProposalPair,
        incoming: &ProposalPair,
    ) -> std::result::Result<SimilarityVerdict, Self::Error> {
        match self {
            Self::Llm(judge) => judge.judge(existing, incoming),
            Self::Disabled(judge) => judge.judge(existing, incoming),
        }
    }
}

/// Totals over one batch run, written as the processing summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingSummary {
    /// When the batch started
    pub started_at: DateTime<Utc>,
    /// When the batch finished
    pub finished_at: DateTime<Utc>,
    /// Input files discovered
    pub total_files: usize,
    /// Files processed end to end
    pub processed_files: usize,
    /// Files that failed
    pub failed_files: usize,
    /// Proposal candidates extracted
    pub total_proposals: usize,
    /// Submissions stored as new proposals
    pub new_proposals: usize,
    /// Submissions rejected on the content fingerprint
    pub exact_duplicates: usize,
    /// Submissions rejected by the semantic judge
    pub semantic_duplicates: usize,
    /// Submissions applied as version updates
    pub versions_created: usize,
    /// Files flagged for manual image review
    pub files_with_image_warnings: usize,
}

impl ProcessingSummary {
    fn new(total_files: usize) -> Self {
        let now = Utc::now();
        Self {
            started_at: now,
            finished_at: now,
            total_files,
            processed_files: 0,
            failed_files: 0,
            total_proposals: 0,
            new_proposals: 0,
            exact_duplicates: 0,
            semantic_duplicates: 0,
            versions_created: 0,
            files_with_image_warnings: 0,
        }
    }

    fn tally(&mut self, record: &FileRecord) {
        self.total_proposals += record.proposals.len();
        for decision in &record.decisions {
            match decision {
                DedupDecision::New { .. } => self.new_proposals += 1,
                DedupDecision::ExactDuplicate { .. } => self.exact_duplicates += 1,
                DedupDecision::SemanticDuplicate { .. } => self.semantic_duplicates += 1,
                DedupDecision::NewVersion { .. } => self.versions_created += 1,
            }
        }
    }
}

/// List the `.json` handles under `dir`, sorted by name. Spreadsheet
/// lock temporaries (`~$` prefix) are skipped. Handles whose source
/// kind is not recognized are still listed; processing rejects them
/// with an unsupported-kind failure so they show up in the reports.
pub fn discover_inputs(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(CliError::InvalidInput(format!(
            "input directory does not exist: {}",
            dir.display()
        )));
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with("~$") {
            continue;
        }
        if name.ends_with(".json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// The assembled processing pipeline.
pub struct Pipeline {
    parser: JsonDocumentParser,
    metadata: MetadataExtractor,
    structural: StructuralExtractor,
    fallback: FallbackExtractor<OpenAiProvider>,
    validator: ImageValidator,
    consolidator: Consolidator,
    engine: DedupEngine<PipelineJudge>,
}

impl Pipeline {
    /// Assemble the pipeline against the database at `db`. Unless
    /// `keep_data` is set, previously stored proposals are cleared.
    pub fn new(db: &Path, config: &AppConfig, keep_data: bool) -> Result<Self> {
        let store = SqliteStore::open(db)?;
        if keep_data {
            info!("keeping previously stored proposals");
        } else {
            store.reset()?;
        }

        let (provider, judge) = build_llm(&config.llm);
        Ok(Self {
            parser: JsonDocumentParser,
            metadata: MetadataExtractor::new(),
            structural: StructuralExtractor::new(),
            fallback: FallbackExtractor::new(provider, config.extractor.clone()),
            validator: ImageValidator::new(config.validator),
            consolidator: Consolidator::new(),
            engine: DedupEngine::with_config(store, judge, config.engine),
        })
    }

    /// Process every handle under `input` and write the consolidated
    /// outputs under `output`.
    pub async fn run(&mut self, input: &Path, output: &Path) -> Result<ProcessingSummary> {
        let files = discover_inputs(input)?;
        info!(count = files.len(), input = %input.display(), "input files discovered");

        let individual_dir = output.join("individuales");
        fs::create_dir_all(&individual_dir)?;

        let mut summary = ProcessingSummary::new(files.len());
        for path in &files {
            let file_name = display_name(path);
            let record = match self.process_file(path, &file_name).await {
                Ok(record) => {
                    summary.processed_files += 1;
                    record
                }
                Err(e) => {
                    warn!(file = %file_name, error = %e, "file failed, continuing");
                    summary.failed_files += 1;
                    FileRecord::failure(&file_name, e.to_string())
                }
            };
            summary.tally(&record);
            record.save(&individual_dir)?;
        }

        if self.consolidator.is_empty() {
            warn!("nothing consolidated, skipping workbook");
        } else {
            let mut writer = JsonWorkbookWriter::new();
            render_workbook(&self.consolidator, &mut writer)?;
            writer.save(&output.join("base_datos_consolidada.json"))?;
        }

        let image_report = self.validator.consolidated();
        summary.files_with_image_warnings = image_report.warning_files;
        write_json(&output.join("reporte_imagenes.json"), &image_report)?;
        write_json(
            &output.join("estadisticas.json"),
            &self.engine.store().statistics()?,
        )?;

        summary.finished_at = Utc::now();
        write_json(&output.join("resumen_procesamiento.json"), &summary)?;
        info!(
            processed = summary.processed_files,
            failed = summary.failed_files,
            proposals = summary.total_proposals,
            "batch finished"
        );
        Ok(summary)
    }

    async fn process_file(&mut self, path: &Path, file_name: &str) -> Result<FileRecord> {
        info!(file = %file_name, "processing");
        if FileKind::from_path(Path::new(file_name)).is_none() {
            self.validator.record_unsupported(file_name);
            return Err(ExtractorError::UnsupportedKind(file_name.to_string()).into());
        }
        let doc = self.parser.parse(path)?;
        let kind = doc.kind();
        let metadata = self.metadata.analyze(file_name, kind, &doc.sheet_names());

        let extraction = self.structural.extract(&doc);
        let candidates = if extraction.candidates.is_empty() {
            info!(file = %file_name, "structural scan found nothing, trying generative fallback");
            self.fallback.extract(&doc).await
        } else {
            extraction.candidates
        };

        let validation = self.validator.validate_file(file_name, &doc, &candidates);

        let mut stats = ProcessingStats::new(kind, file_name);
        stats.total_proposals = candidates.len() as u32;
        let mut decisions = Vec::new();
        for candidate in &candidates {
            for source in &metadata.funding_sources {
                let scope = Scope {
                    entity: metadata.entity.clone(),
                    source: source.clone(),
                    source_file: file_name.to_string(),
                    file_kind: kind.label().to_string(),
                };
                let decision = self.engine.submit(&scope, candidate)?;
                if decision.is_duplicate() {
                    stats.duplicates_detected += 1;
                }
                if matches!(decision, DedupDecision::NewVersion { .. }) {
                    stats.versions_created += 1;
                }
                decisions.push(decision);
            }
        }
        self.engine.store().record_processing(&stats)?;
        self.consolidator.add_file(&metadata, &candidates);

        Ok(FileRecord::success(
            metadata, stats, candidates, decisions, validation,
        ))
    }
}

// The handle "1.ENTE_SA.docx.json" stands for the source "1.ENTE_SA.docx".
fn display_name(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    name.strip_suffix(".json").map(str::to_string).unwrap_or(name)
}

fn build_llm(settings: &LlmSettings) -> (Option<Arc<OpenAiProvider>>, PipelineJudge) {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.trim().is_empty() => {
            let (temperature, max_tokens) = EXTRACTION_SAMPLING;
            let extraction =
                OpenAiProvider::with_endpoint(&settings.endpoint, &key, &settings.model)
                    .with_max_retries(settings.max_retries)
                    .with_sampling(temperature, max_tokens);
            let (temperature, max_tokens) = JUDGING_SAMPLING;
            let judging = OpenAiProvider::with_endpoint(&settings.endpoint, &key, &settings.model)
                .with_max_retries(settings.max_retries)
                .with_sampling(temperature, max_tokens);
            info!(model = %settings.model, "generative provider configured");
            (
                Some(Arc::new(extraction)),
                PipelineJudge::Llm(LlmJudge::new(judging)),
            )
        }
        _ => {
            warn!("OPENAI_API_KEY not set; fallback extraction and semantic dedup disabled");
            (None, PipelineJudge::Disabled(NullJudge))
        }
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use solventa_extractor::document::{
        Block, DocxDocument, ParsedDocument, Table, TableCell, TableRow,
    };

    fn proposal_table_doc() -> ParsedDocument {
        ParsedDocument::Docx(DocxDocument {
            blocks: vec![Block::Table(Table {
                rows: vec![TableRow {
                    cells: vec![
                        TableCell::plain("OBSERVACIÓN"),
                        TableCell::plain("Falta evidencia documental"),
                        TableCell::plain("PROPUESTA DE SOLVENTACIÓN"),
                        TableCell::plain("Se anexa el expediente completo"),
                    ],
                }],
            })],
            images: Vec::new(),
        })
    }

    fn write_handle(dir: &Path, name: &str, doc: &ParsedDocument) {
        let json = serde_json::to_string(doc).unwrap();
        fs::write(dir.join(name), json).unwrap();
    }

    #[test]
    fn test_discovery_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "b.xlsx.json",
            "a.docx.json",
            "listado.json",
            "~$a.docx.json",
            "notas.txt",
            "c.docx",
        ] {
            fs::write(dir.path().join(name), "{}").unwrap();
        }

        let files = discover_inputs(dir.path()).unwrap();
        let names: Vec<String> = files.iter().map(|p| display_name(p)).collect();
        assert_eq!(names, vec!["a.docx", "b.xlsx", "listado"]);
    }

    #[test]
    fn test_missing_input_dir_is_an_error() {
        let err = discover_inputs(Path::new("/no/such/dir")).unwrap_err();
        assert!(matches!(err, CliError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_batch_processes_files_and_writes_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("entrada");
        let output = dir.path().join("salida");
        fs::create_dir_all(&input).unwrap();

        write_handle(
            &input,
            "1.FIDECIX_RRyPE_ENE_JUN_SA.docx.json",
            &proposal_table_doc(),
        );
        // Corrupt handle, must become a failure record without stopping
        // the batch
        fs::write(input.join("2.CEA_REA_2024_R.docx.json"), "no es json").unwrap();

        let mut pipeline =
            Pipeline::new(&dir.path().join("prueba.db"), &AppConfig::default(), false).unwrap();
        let summary = pipeline.run(&input, &output).await.unwrap();

        assert_eq!(summary.total_files, 2);
        assert_eq!(summary.processed_files, 1);
        assert_eq!(summary.failed_files, 1);
        assert_eq!(summary.total_proposals, 1);
        assert_eq!(summary.new_proposals, 1);

        for name in [
            "base_datos_consolidada.json",
            "reporte_imagenes.json",
            "estadisticas.json",
            "resumen_procesamiento.json",
        ] {
            assert!(output.join(name).is_file(), "missing output {name}");
        }
        assert!(output
            .join("individuales")
            .join("1.FIDECIX_RRyPE_ENE_JUN_SA_resultado.json")
            .is_file());
        assert!(output
            .join("individuales")
            .join("2.CEA_REA_2024_R_resultado.json")
            .is_file());
    }

    #[tokio::test]
    async fn test_unrecognized_handle_kind_becomes_failure_record() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("entrada");
        let output = dir.path().join("salida");
        fs::create_dir_all(&input).unwrap();

        // A .json handle whose source name carries no recognized
        // extension is rejected before parsing
        write_handle(&input, "listado.json", &proposal_table_doc());

        let mut pipeline =
            Pipeline::new(&dir.path().join("prueba.db"), &AppConfig::default(), false).unwrap();
        let summary = pipeline.run(&input, &output).await.unwrap();

        assert_eq!(summary.total_files, 1);
        assert_eq!(summary.processed_files, 0);
        assert_eq!(summary.failed_files, 1);
        assert_eq!(summary.total_proposals, 0);
        assert!(output
            .join("individuales")
            .join("listado_resultado.json")
            .is_file());

        let report: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(output.join("reporte_imagenes.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(report["error_files"], 1);
    }

    #[tokio::test]
    async fn test_rerun_without_keep_data_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("entrada");
        let output = dir.path().join("salida");
        fs::create_dir_all(&input).unwrap();
        write_handle(
            &input,
            "1.FIDECIX_RRyPE_ENE_JUN_SA.docx.json",
            &proposal_table_doc(),
        );
        let db = dir.path().join("prueba.db");

        let mut first = Pipeline::new(&db, &AppConfig::default(), false).unwrap();
        first.run(&input, &output).await.unwrap();

        // Fresh run: the same text inserts as new again instead of an
        // exact duplicate
        let mut second = Pipeline::new(&db, &AppConfig::default(), false).unwrap();
        let summary = second.run(&input, &output).await.unwrap();
        assert_eq!(summary.new_proposals, 1);
        assert_eq!(summary.exact_duplicates, 0);
    }

    #[tokio::test]
    async fn test_rerun_with_keep_data_detects_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("entrada");
        let output = dir.path().join("salida");
        fs::create_dir_all(&input).unwrap();
        write_handle(
            &input,
            "1.FIDECIX_RRyPE_ENE_JUN_SA.docx.json",
            &proposal_table_doc(),
        );
        let db = dir.path().join("prueba.db");

        let mut first = Pipeline::new(&db, &AppConfig::default(), false).unwrap();
        first.run(&input, &output).await.unwrap();

        let mut second = Pipeline::new(&db, &AppConfig::default(), true).unwrap();
        let summary = second.run(&input, &output).await.unwrap();
        assert_eq!(summary.new_proposals, 0);
        assert_eq!(summary.exact_duplicates, 1);
    }
}
