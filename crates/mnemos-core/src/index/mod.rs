//! Embedding Index
//!
//! Per-note multi-vector representation persisted in an embedded relational
//! store, keyed by content fingerprint so rebuilds are incremental. Each
//! note commits atomically (a single row upsert); an interrupted build
//! leaves a consistent subset and a later build completes the remainder
//! via hash-skip.

mod migrations;

pub use migrations::{apply_migrations, Migration, MIGRATIONS};

use std::collections::HashSet;
use std::path::Path;
use std::time::Instant;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};

use crate::embeddings::{community_projection, type_one_hot, EmbeddingError, TextEmbedder};
use crate::vault::Note;

/// Outgoing link targets included in the enriched body
const CONNECTED_LINK_CAP: usize = 10;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Embedding index error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Embedding error
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),
}

/// Embedding index result type
pub type Result<T> = std::result::Result<T, IndexError>;

// ============================================================================
// RECORDS
// ============================================================================

/// One note's persisted representation
#[derive(Debug, Clone)]
pub struct EmbeddingRecord {
    /// Note title (row key)
    pub title: String,
    /// `E(title)`
    pub title_vec: Vec<f32>,
    /// `E(description or title)`
    pub desc_vec: Vec<f32>,
    /// `E(enriched body)`
    pub body_vec: Vec<f32>,
    /// One-hot over the six type labels
    pub type_vec: Vec<f32>,
    /// Deterministic community projection
    pub community_vec: Vec<f32>,
    /// SHA-256 over title, description, and body
    pub content_hash: String,
    /// When the row was written
    pub indexed_at: DateTime<Utc>,
}

impl EmbeddingRecord {
    /// Whole days between indexing and `now`, never negative
    pub fn days_since_index(&self, now: DateTime<Utc>) -> f64 {
        (now - self.indexed_at).num_days().max(0) as f64
    }
}

/// Outcome of an index build
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexBuildReport {
    /// Notes embedded and written this run
    pub indexed: usize,
    /// Notes skipped because their fingerprint matched
    pub skipped: usize,
    /// Notes in the corpus
    pub total: usize,
    /// Wall-clock build time in milliseconds
    pub duration_ms: u64,
}

// ============================================================================
// FINGERPRINT AND ENRICHMENT
// ============================================================================

/// SHA-256 fingerprint over title, description, and body
pub fn content_fingerprint(note: &Note) -> String {
    let mut hasher = Sha256::new();
    hasher.update(note.title.as_bytes());
    hasher.update(note.description.as_deref().unwrap_or("").as_bytes());
    hasher.update(note.body.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Body text as embedded: type/project prefix, title, description, body,
/// and up to ten outgoing link targets
pub fn enriched_body(note: &Note) -> String {
    let mut text = String::new();

    if !note.projects.is_empty() {
        text.push_str(&format!(
            "[{}] [{}]\n",
            note.note_type.as_str().to_uppercase(),
            note.projects.join(", ")
        ));
    } else {
        text.push_str(&format!("[{}]\n", note.note_type.as_str().to_uppercase()));
    }

    text.push_str(&note.title);
    text.push('\n');
    if let Some(description) = &note.description {
        text.push_str(description);
        text.push('\n');
    }
    if !note.body.trim().is_empty() {
        text.push_str(note.body.trim());
        text.push('\n');
    }
    if !note.links.is_empty() {
        let connected: Vec<&str> = note
            .links
            .iter()
            .take(CONNECTED_LINK_CAP)
            .map(String::as_str)
            .collect();
        text.push_str(&format!("Connected: {}", connected.join(", ")));
    }

    text
}

fn vector_to_bytes(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn bytes_to_vector(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

// ============================================================================
// EMBEDDING INDEX
// ============================================================================

/// The embedded relational store holding one row per note
pub struct EmbeddingIndex {
    conn: Connection,
}

impl EmbeddingIndex {
    /// Open (or create) the store at `path`
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::configure(&conn)?;
        apply_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// In-memory store for tests
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_migrations(&conn)?;
        Ok(Self { conn })
    }

    fn configure(conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA temp_store = MEMORY;
             PRAGMA busy_timeout = 5000;",
        )
    }

    /// Number of stored rows
    pub fn count(&self) -> Result<usize> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM note_embeddings", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Whether the store holds no rows
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.count()? == 0)
    }

    /// Stored fingerprint for a title
    pub fn stored_hash(&self, title: &str) -> Result<Option<String>> {
        let hash = self
            .conn
            .query_row(
                "SELECT content_hash FROM note_embeddings WHERE title = ?1",
                params![title],
                |row| row.get(0),
            )
            .optional()?;
        Ok(hash)
    }

    /// Write one note's row atomically
    pub fn upsert(&self, record: &EmbeddingRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO note_embeddings
                (title, title_vec, desc_vec, body_vec, type_vec, community_vec, content_hash, indexed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(title) DO UPDATE SET
                title_vec = excluded.title_vec,
                desc_vec = excluded.desc_vec,
                body_vec = excluded.body_vec,
                type_vec = excluded.type_vec,
                community_vec = excluded.community_vec,
                content_hash = excluded.content_hash,
                indexed_at = excluded.indexed_at",
            params![
                record.title,
                vector_to_bytes(&record.title_vec),
                vector_to_bytes(&record.desc_vec),
                vector_to_bytes(&record.body_vec),
                vector_to_bytes(&record.type_vec),
                vector_to_bytes(&record.community_vec),
                record.content_hash,
                record.indexed_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Load one record by title
    pub fn get(&self, title: &str) -> Result<Option<EmbeddingRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT title, title_vec, desc_vec, body_vec, type_vec, community_vec,
                        content_hash, indexed_at
                 FROM note_embeddings WHERE title = ?1",
                params![title],
                Self::row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    /// Load every record
    pub fn load_all(&self) -> Result<Vec<EmbeddingRecord>> {
        let mut statement = self.conn.prepare(
            "SELECT title, title_vec, desc_vec, body_vec, type_vec, community_vec,
                    content_hash, indexed_at
             FROM note_embeddings ORDER BY title",
        )?;
        let records = statement
            .query_map([], Self::row_to_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    /// Delete rows whose note no longer exists; returns how many went
    pub fn remove_absent(&self, live_titles: &HashSet<String>) -> Result<usize> {
        let mut statement = self.conn.prepare("SELECT title FROM note_embeddings")?;
        let stored = statement
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        drop(statement);

        let mut removed = 0;
        for title in stored {
            if !live_titles.contains(&title) {
                removed += self.conn.execute(
                    "DELETE FROM note_embeddings WHERE title = ?1",
                    params![title],
                )?;
            }
        }
        Ok(removed)
    }

    fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<EmbeddingRecord> {
        let indexed_at: String = row.get(7)?;
        let indexed_at = DateTime::parse_from_rfc3339(&indexed_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());
        Ok(EmbeddingRecord {
            title: row.get(0)?,
            title_vec: bytes_to_vector(&row.get::<_, Vec<u8>>(1)?),
            desc_vec: bytes_to_vector(&row.get::<_, Vec<u8>>(2)?),
            body_vec: bytes_to_vector(&row.get::<_, Vec<u8>>(3)?),
            type_vec: bytes_to_vector(&row.get::<_, Vec<u8>>(4)?),
            community_vec: bytes_to_vector(&row.get::<_, Vec<u8>>(5)?),
            content_hash: row.get(6)?,
            indexed_at,
        })
    }
}

// ============================================================================
// BUILD PROTOCOL
// ============================================================================

/// Incremental index build over a corpus
///
/// Graph metrics are computed by the caller once up front so community
/// identifiers are available; `communities` is aligned with `notes`.
pub struct IndexBuilder<'a> {
    index: &'a EmbeddingIndex,
    embedder: &'a dyn TextEmbedder,
    community_dims: usize,
}

impl<'a> IndexBuilder<'a> {
    /// Create a builder over an open store and an embedder
    pub fn new(
        index: &'a EmbeddingIndex,
        embedder: &'a dyn TextEmbedder,
        community_dims: usize,
    ) -> Self {
        Self {
            index,
            embedder,
            community_dims,
        }
    }

    /// Build or refresh the index
    ///
    /// Skips notes whose stored fingerprint matches unless `force`; removes
    /// rows for notes that have disappeared.
    pub fn build(
        &self,
        notes: &[Note],
        communities: &[usize],
        community_count: usize,
        force: bool,
    ) -> Result<IndexBuildReport> {
        let started = Instant::now();
        let mut indexed = 0;
        let mut skipped = 0;

        for (i, note) in notes.iter().enumerate() {
            let fingerprint = content_fingerprint(note);
            if !force {
                if let Some(stored) = self.index.stored_hash(&note.title)? {
                    if stored == fingerprint {
                        skipped += 1;
                        continue;
                    }
                }
            }

            let community = communities.get(i).copied().unwrap_or(0);
            let record = self.embed_note(note, community, community_count, fingerprint)?;
            self.index.upsert(&record)?;
            indexed += 1;
        }

        let live: HashSet<String> = notes.iter().map(|n| n.title.clone()).collect();
        let removed = self.index.remove_absent(&live)?;
        if removed > 0 {
            tracing::debug!(removed, "dropped embedding rows for deleted notes");
        }

        Ok(IndexBuildReport {
            indexed,
            skipped,
            total: notes.len(),
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }

    fn embed_note(
        &self,
        note: &Note,
        community: usize,
        community_count: usize,
        fingerprint: String,
    ) -> Result<EmbeddingRecord> {
        let body_text = enriched_body(note);
        let texts = [note.title.as_str(), note.description_or_title(), &body_text];
        let mut vectors = self.embedder.embed_batch(&texts)?.into_iter();

        let mut next = || {
            vectors.next().ok_or_else(|| {
                EmbeddingError::EmbeddingFailed("embedder returned too few vectors".to_string())
            })
        };

        Ok(EmbeddingRecord {
            title: note.title.clone(),
            title_vec: next()?,
            desc_vec: next()?,
            body_vec: next()?,
            type_vec: type_one_hot(note.note_type),
            community_vec: community_projection(community, community_count, self.community_dims),
            content_hash: fingerprint,
            indexed_at: Utc::now(),
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
