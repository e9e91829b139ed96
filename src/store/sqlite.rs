//! `SQLite` chunk store.
//!
//! Records live in one table with an FTS5 index kept in sync by triggers.
//! Every operation runs in its own transaction; a transaction that is not
//! committed rolls back when dropped.

// SQLite stores all integers as i64. Only non-negative values that fit in
// usize are stored.
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]

use crate::embedding::cosine_similarity;
use crate::error::{Error, Result, StorageError};
use crate::store::record::{ChunkRecord, ScoredRow};
use crate::store::schema::{
    CHECK_SCHEMA_SQL, CURRENT_SCHEMA_VERSION, GET_VERSION_SQL, SCHEMA_SQL, SET_VERSION_SQL,
};
use crate::store::traits::ChunkStore;
use rayon::prelude::*;
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// SQLite-backed [`ChunkStore`].
///
/// # Examples
///
/// ```
/// use chunkbench::store::{ChunkRecord, ChunkStore, SqliteStore};
/// use std::collections::BTreeMap;
///
/// let store = SqliteStore::in_memory().unwrap();
/// let record = ChunkRecord {
///     id: ChunkRecord::id_for(0),
///     content: "Rivers carry sediment".to_string(),
///     embedding: vec![1.0, 0.0],
///     tfidf: BTreeMap::new(),
/// };
/// store.write_records(&[record]).unwrap();
///
/// let hits = store.search_fulltext("sediment", 5).unwrap();
/// assert_eq!(hits[0].id, "chunk_0");
/// ```
pub struct SqliteStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Opens or creates a database at `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| StorageError::Database(e.to_string()))?;
            }
        }

        let conn = Connection::open(&path).map_err(StorageError::from)?;
        let _: String = conn
            .query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))
            .map_err(StorageError::from)?;

        let store = Self {
            conn: Mutex::new(conn),
            path: Some(path),
        };
        store.init()?;
        Ok(store)
    }

    /// Creates an in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(StorageError::from)?;
        let store = Self {
            conn: Mutex::new(conn),
            path: None,
        };
        store.init()?;
        Ok(store)
    }

    /// Returns the database path (None for in-memory).
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Creates the schema if missing. Idempotent.
    fn init(&self) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(StorageError::from)?;

        let is_init: i64 = tx
            .query_row(CHECK_SCHEMA_SQL, [], |row| row.get(0))
            .map_err(StorageError::from)?;
        if is_init == 0 {
            tx.execute_batch(SCHEMA_SQL).map_err(StorageError::from)?;
            tx.execute(SET_VERSION_SQL, params![CURRENT_SCHEMA_VERSION.to_string()])
                .map_err(StorageError::from)?;
        } else {
            let version: Option<String> = tx
                .query_row(GET_VERSION_SQL, [], |row| row.get(0))
                .optional()
                .map_err(StorageError::from)?;
            if version.and_then(|v| v.parse::<u32>().ok()) != Some(CURRENT_SCHEMA_VERSION) {
                return Err(StorageError::Database(format!(
                    "unsupported schema version, expected {CURRENT_SCHEMA_VERSION}"
                ))
                .into());
            }
        }

        tx.commit().map_err(StorageError::from)?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::from(StorageError::Transaction("connection lock poisoned".to_string())))
    }

    /// Returns current Unix timestamp.
    fn now() -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }
}

impl ChunkStore for SqliteStore {
    fn write_records(&self, records: &[ChunkRecord]) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(StorageError::from)?;
        let now = Self::now();

        {
            let mut delete = tx
                .prepare("DELETE FROM records WHERE id = ?")
                .map_err(StorageError::from)?;
            let mut insert = tx
                .prepare(
                    r"
                INSERT INTO records (id, content, embedding, dimensions, tfidf, created_at)
                VALUES (?, ?, ?, ?, ?, ?)
            ",
                )
                .map_err(StorageError::from)?;

            for record in records {
                let tfidf = serde_json::to_string(&record.tfidf).map_err(StorageError::from)?;
                delete
                    .execute(params![record.id])
                    .map_err(StorageError::from)?;
                insert
                    .execute(params![
                        record.id,
                        record.content,
                        encode_embedding(&record.embedding),
                        record.embedding.len() as i64,
                        tfidf,
                        now,
                    ])
                    .map_err(StorageError::from)?;
            }
        }

        tx.commit().map_err(StorageError::from)?;
        tracing::debug!(records = records.len(), "records written");
        Ok(())
    }

    fn get_record(&self, id: &str) -> Result<Option<ChunkRecord>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(StorageError::from)?;

        let row: Option<(String, String, Vec<u8>, String)> = tx
            .query_row(
                "SELECT id, content, embedding, tfidf FROM records WHERE id = ?",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()
            .map_err(StorageError::from)?;
        tx.commit().map_err(StorageError::from)?;

        row.map(|(id, content, bytes, tfidf)| -> Result<ChunkRecord> {
            let tfidf: BTreeMap<String, f64> =
                serde_json::from_str(&tfidf).map_err(StorageError::from)?;
            Ok(ChunkRecord {
                id,
                content,
                embedding: decode_embedding(&bytes),
                tfidf,
            })
        })
        .transpose()
    }

    fn search_fulltext(&self, query: &str, top_k: usize) -> Result<Vec<ScoredRow>> {
        // Quote each term so FTS5 operators in the query are treated as text
        let fts_query = query
            .split_whitespace()
            .map(|term| format!("\"{}\"", term.replace('"', "\"\"")))
            .collect::<Vec<_>>()
            .join(" OR ");
        if fts_query.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(StorageError::from)?;
        let rows = {
            // bm25() is negative, more negative = better match
            let mut stmt = tx
                .prepare(
                    r"
                SELECT r.id, r.content, -bm25(records_fts) AS score
                FROM records_fts
                JOIN records r ON r.seq = records_fts.rowid
                WHERE records_fts MATCH ?
                ORDER BY score DESC
                LIMIT ?
            ",
                )
                .map_err(StorageError::from)?;

            stmt.query_map(params![fts_query, top_k as i64], |row| {
                Ok(ScoredRow {
                    id: row.get(0)?,
                    content: row.get(1)?,
                    score: row.get(2)?,
                })
            })
            .map_err(StorageError::from)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StorageError::from)?
        };
        tx.commit().map_err(StorageError::from)?;
        Ok(rows)
    }

    fn search_vector(&self, embedding: &[f32], top_k: usize) -> Result<Vec<ScoredRow>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(StorageError::from)?;
        let rows: Vec<(String, String, Vec<u8>)> = {
            let mut stmt = tx
                .prepare("SELECT id, content, embedding FROM records ORDER BY seq")
                .map_err(StorageError::from)?;
            stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
                .map_err(StorageError::from)?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(StorageError::from)?
        };
        tx.commit().map_err(StorageError::from)?;
        drop(conn);

        let mut scored: Vec<ScoredRow> = rows
            .into_par_iter()
            .map(|(id, content, bytes)| ScoredRow {
                score: f64::from(cosine_similarity(embedding, &decode_embedding(&bytes))),
                id,
                content,
            })
            .collect();
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(top_k);
        Ok(scored)
    }

    fn record_count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))
            .map_err(StorageError::from)?;
        Ok(count as usize)
    }

    fn clear(&self) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(StorageError::from)?;
        tx.execute("DELETE FROM records", [])
            .map_err(StorageError::from)?;
        tx.commit().map_err(StorageError::from)?;
        Ok(())
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn decode_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}
