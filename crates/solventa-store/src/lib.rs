//! Solventa Storage Layer
//!
//! SQLite persistence for remediation proposals, their version history,
//! entity and funding-source catalogs, and per-file processing records,
//! plus the deduplication engine built on top.
//!
//! # Architecture
//!
//! - `SqliteStore` exposes the persistence primitives; multi-statement
//!   writes run inside a single transaction
//! - `engine::DedupEngine` owns a store and a similarity judge and runs
//!   the fixed-order classification state machine
//!
//! # Thread Safety
//!
//! SQLite connections are not thread-safe; the store is a single-writer
//! component. Give each thread its own instance when reading.
//!
//! # Examples
//!
//! ```no_run
//! use solventa_store::SqliteStore;
//!
//! let store = SqliteStore::open("solventacion.db").unwrap();
//! ```

#![warn(missing_docs)]

pub mod engine;

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use solventa_domain::{
    Fingerprint, ProcessingStats, ProposalCandidate, ProposalVersion, StoredProposal,
};
use std::path::Path;
use thiserror::Error;
use tracing::info;

pub use engine::{DedupEngine, EngineConfig};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Proposal row not found
    #[error("Proposal not found: {0}")]
    ProposalNotFound(i64),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Global database counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStatistics {
    /// Distinct entities
    pub total_entities: u64,
    /// Distinct funding sources
    pub total_sources: u64,
    /// All proposal rows
    pub total_proposals: u64,
    /// Rows not flagged as duplicates
    pub unique_proposals: u64,
    /// Rows flagged as duplicates
    pub duplicates: u64,
    /// Version snapshots across all proposals
    pub total_versions: u64,
}

/// SQLite-backed store for proposals and their versions.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open an in-memory database, for tests and dry runs.
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    /// Get or lazily create an entity. Identity is immutable once created;
    /// a repeated call with a different description keeps the original.
    pub fn get_or_create_ente(
        &self,
        nombre: &str,
        descripcion: Option<&str>,
    ) -> Result<i64, StoreError> {
        let existing: Option<i64> = self
            .conn
            .query_row("SELECT id FROM entes WHERE nombre = ?1", params![nombre], |row| {
                row.get(0)
            })
            .optional()?;
        if let Some(id) = existing {
            return Ok(id);
        }
        self.conn.execute(
            "INSERT INTO entes (nombre, descripcion) VALUES (?1, ?2)",
            params![nombre, descripcion],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Get or lazily create a funding source.
    pub fn get_or_create_fuente(
        &self,
        nombre: &str,
        descripcion: Option<&str>,
    ) -> Result<i64, StoreError> {
        let existing: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM fuentes_financiamiento WHERE nombre = ?1",
                params![nombre],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(id) = existing {
            return Ok(id);
        }
        self.conn.execute(
            "INSERT INTO fuentes_financiamiento (nombre, descripcion) VALUES (?1, ?2)",
            params![nombre, descripcion],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Find the proposal carrying this fingerprint within one
    /// (entity, funding source) scope.
    pub fn find_by_fingerprint(
        &self,
        fingerprint: &Fingerprint,
        ente_id: i64,
        fuente_id: i64,
    ) -> Result<Option<StoredProposal>, StoreError> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {PROPOSAL_COLUMNS} FROM propuestas
                     WHERE hash_contenido = ?1 AND ente_id = ?2 AND fuente_financiamiento_id = ?3"
                ),
                params![fingerprint.as_str(), ente_id, fuente_id],
                row_to_proposal,
            )
            .optional()
            .map_err(StoreError::from)
    }

    /// Insert a new proposal and its initial version snapshot in one
    /// transaction.
    pub fn insert_proposal(
        &mut self,
        ente_id: i64,
        fuente_id: i64,
        candidate: &ProposalCandidate,
        source_file: &str,
        file_kind: &str,
    ) -> Result<i64, StoreError> {
        let fingerprint = candidate.fingerprint();
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO propuestas (
                ente_id, fuente_financiamiento_id, numero,
                observacion_texto, propuesta_texto,
                observacion_html, propuesta_html,
                archivo_origen, tipo_archivo, hoja_origen,
                hash_contenido, version_actual
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 1)",
            params![
                ente_id,
                fuente_id,
                candidate.number,
                candidate.observation_text,
                candidate.proposal_text,
                candidate.observation_html,
                candidate.proposal_html,
                source_file,
                file_kind,
                candidate.sheet,
                fingerprint.as_str(),
            ],
        )?;
        let proposal_id = tx.last_insert_rowid();
        tx.execute(
            "INSERT INTO versiones_propuestas (
                propuesta_id, version, observacion_texto, propuesta_texto,
                observacion_html, propuesta_html, hash_contenido, motivo_cambio
            ) VALUES (?1, 1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                proposal_id,
                candidate.observation_text,
                candidate.proposal_text,
                candidate.observation_html,
                candidate.proposal_html,
                fingerprint.as_str(),
                "Versión inicial",
            ],
        )?;
        tx.commit()?;
        Ok(proposal_id)
    }

    /// Overwrite a proposal's content with a new revision: bump
    /// `version_actual`, replace text/markup/fingerprint, append the
    /// version snapshot. One transaction; returns the new version number.
    pub fn update_with_version(
        &mut self,
        proposal_id: i64,
        candidate: &ProposalCandidate,
        change_reason: &str,
    ) -> Result<u32, StoreError> {
        let fingerprint = candidate.fingerprint();
        let tx = self.conn.transaction()?;

        let current: Option<u32> = tx
            .query_row(
                "SELECT version_actual FROM propuestas WHERE id = ?1",
                params![proposal_id],
                |row| row.get(0),
            )
            .optional()?;
        let current = current.ok_or(StoreError::ProposalNotFound(proposal_id))?;
        let new_version = current + 1;

        tx.execute(
            "UPDATE propuestas
             SET observacion_texto = ?1, propuesta_texto = ?2,
                 observacion_html = ?3, propuesta_html = ?4,
                 hash_contenido = ?5, version_actual = ?6,
                 fecha_actualizacion = CURRENT_TIMESTAMP
             WHERE id = ?7",
            params![
                candidate.observation_text,
                candidate.proposal_text,
                candidate.observation_html,
                candidate.proposal_html,
                fingerprint.as_str(),
                new_version,
                proposal_id,
            ],
        )?;
        tx.execute(
            "INSERT INTO versiones_propuestas (
                propuesta_id, version, observacion_texto, propuesta_texto,
                observacion_html, propuesta_html, hash_contenido, motivo_cambio
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                proposal_id,
                new_version,
                candidate.observation_text,
                candidate.proposal_text,
                candidate.observation_html,
                candidate.proposal_html,
                fingerprint.as_str(),
                change_reason,
            ],
        )?;
        tx.commit()?;
        info!(proposal_id, version = new_version, "proposal updated with new version");
        Ok(new_version)
    }

    /// Flag a row as a duplicate of another.
    pub fn mark_duplicate(&self, proposal_id: i64, original_id: i64) -> Result<(), StoreError> {
        let updated = self.conn.execute(
            "UPDATE propuestas SET es_duplicado = 1, propuesta_original_id = ?1 WHERE id = ?2",
            params![original_id, proposal_id],
        )?;
        if updated == 0 {
            return Err(StoreError::ProposalNotFound(proposal_id));
        }
        Ok(())
    }

    /// All proposals within one (entity, funding source) scope, newest
    /// first.
    pub fn proposals_for_scope(
        &self,
        ente_id: i64,
        fuente_id: i64,
    ) -> Result<Vec<StoredProposal>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PROPOSAL_COLUMNS} FROM propuestas
             WHERE ente_id = ?1 AND fuente_financiamiento_id = ?2
             ORDER BY fecha_creacion DESC, id DESC"
        ))?;
        let rows = stmt.query_map(params![ente_id, fuente_id], row_to_proposal)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
    }

    /// All version snapshots of a proposal, ascending.
    pub fn versions_for(&self, proposal_id: i64) -> Result<Vec<ProposalVersion>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, propuesta_id, version, observacion_texto, propuesta_texto,
                    observacion_html, propuesta_html, motivo_cambio, hash_contenido
             FROM versiones_propuestas
             WHERE propuesta_id = ?1
             ORDER BY version ASC",
        )?;
        let rows = stmt.query_map(params![proposal_id], |row| {
            Ok(ProposalVersion {
                id: row.get(0)?,
                proposal_id: row.get(1)?,
                version: row.get(2)?,
                observation_text: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                proposal_text: row.get(4)?,
                observation_html: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
                proposal_html: row.get(6)?,
                change_reason: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
                fingerprint: row.get(8)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
    }

    /// Append a per-file processing record.
    pub fn record_processing(&self, stats: &ProcessingStats) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO estadisticas_procesamiento (
                tipo_archivo, archivo_nombre, total_propuestas,
                duplicados_detectados, versiones_creadas
            ) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                stats.file_kind,
                stats.filename,
                stats.total_proposals,
                stats.duplicates_detected,
                stats.versions_created,
            ],
        )?;
        Ok(())
    }

    /// Global counters across the whole database.
    pub fn statistics(&self) -> Result<StoreStatistics, StoreError> {
        let count = |sql: &str| -> Result<u64, StoreError> {
            self.conn
                .query_row(sql, [], |row| row.get::<_, i64>(0))
                .map(|n| n as u64)
                .map_err(StoreError::from)
        };
        Ok(StoreStatistics {
            total_entities: count("SELECT COUNT(*) FROM entes")?,
            total_sources: count("SELECT COUNT(*) FROM fuentes_financiamiento")?,
            total_proposals: count("SELECT COUNT(*) FROM propuestas")?,
            unique_proposals: count("SELECT COUNT(*) FROM propuestas WHERE es_duplicado = 0")?,
            duplicates: count("SELECT COUNT(*) FROM propuestas WHERE es_duplicado = 1")?,
            total_versions: count("SELECT COUNT(*) FROM versiones_propuestas")?,
        })
    }

    /// Wipe every table for a fresh consolidation run.
    pub fn reset(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "DELETE FROM versiones_propuestas;
             DELETE FROM propuestas;
             DELETE FROM estadisticas_procesamiento;
             DELETE FROM entes;
             DELETE FROM fuentes_financiamiento;",
        )?;
        info!("database reset");
        Ok(())
    }
}

const PROPOSAL_COLUMNS: &str = "id, ente_id, fuente_financiamiento_id, numero,
    observacion_texto, propuesta_texto, observacion_html, propuesta_html,
    archivo_origen, tipo_archivo, hoja_origen, hash_contenido,
    version_actual, es_duplicado, propuesta_original_id";

fn row_to_proposal(row: &Row<'_>) -> rusqlite::Result<StoredProposal> {
    Ok(StoredProposal {
        id: row.get(0)?,
        ente_id: row.get(1)?,
        fuente_id: row.get(2)?,
        number: row.get(3)?,
        observation_text: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        proposal_text: row.get(5)?,
        observation_html: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
        proposal_html: row.get(7)?,
        source_file: row.get::<_, Option<String>>(8)?.unwrap_or_default(),
        file_kind: row.get::<_, Option<String>>(9)?.unwrap_or_default(),
        sheet: row.get(10)?,
        fingerprint: row.get(11)?,
        current_version: row.get(12)?,
        is_duplicate: row.get(13)?,
        original_id: row.get(14)?,
    })
}
