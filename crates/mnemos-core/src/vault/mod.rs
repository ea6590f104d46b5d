//! Vault Module
//!
//! A vault is a directory holding the note corpus plus derived indexes and
//! configuration. This module owns:
//! - vault discovery (walk up from a start directory until `.ori` is found)
//! - the on-disk layout contract
//! - configuration loading with documented defaults
//! - the corpus reader and note model

mod config;
mod note;
mod reader;

pub use config::{
    Bm25Config, Config, EngineConfig, GraphConfig, IpsConfig, MetabolicRates, RetrievalConfig,
    SignalWeights, VitalityConfig,
};
pub use note::{MetabolicRole, Note, NoteStatus, NoteType, NOTE_TYPE_COUNT};
pub use reader::{
    detect_title_mentions, extract_links, link_title_mentions, parse_note, CorpusReader,
    TitleMention,
};

use std::path::{Path, PathBuf};

/// Marker entry that identifies a vault root
pub const VAULT_MARKER: &str = ".ori";

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Vault error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    /// No `.ori` marker found walking up from the start directory
    #[error("no vault found above {0}")]
    NotFound(String),
    /// Configuration file could not be parsed
    #[error("invalid configuration at {path}: {source}")]
    Config {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Vault result type
pub type Result<T> = std::result::Result<T, VaultError>;

// ============================================================================
// VAULT LAYOUT
// ============================================================================

/// Resolved paths of a vault on disk
#[derive(Debug, Clone)]
pub struct Vault {
    root: PathBuf,
}

impl Vault {
    /// Open a vault at a known root (the root itself must carry the marker)
    pub fn at_root(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.join(VAULT_MARKER).exists() {
            return Err(VaultError::NotFound(root.display().to_string()));
        }
        Ok(Self { root })
    }

    /// Discover a vault by walking up from `start` until `.ori` is found
    pub fn discover(start: impl AsRef<Path>) -> Result<Self> {
        let start = start.as_ref();
        let mut current = Some(start);
        while let Some(dir) = current {
            if dir.join(VAULT_MARKER).exists() {
                return Ok(Self {
                    root: dir.to_path_buf(),
                });
            }
            current = dir.parent();
        }
        Err(VaultError::NotFound(start.display().to_string()))
    }

    /// The vault root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The note corpus directory
    pub fn notes_dir(&self) -> PathBuf {
        self.root.join("notes")
    }

    /// Draft inbox (not indexed by the engine)
    pub fn inbox_dir(&self) -> PathBuf {
        self.root.join("inbox")
    }

    /// Schema templates (not the engine's concern)
    pub fn templates_dir(&self) -> PathBuf {
        self.root.join("templates")
    }

    /// The embedding store location, honoring `engine.db_path`
    pub fn embeddings_db(&self, config: &Config) -> PathBuf {
        match &config.engine.db_path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => self.root.join(path),
            None => self.root.join(VAULT_MARKER).join("embeddings.db"),
        }
    }

    /// The propensity log location, honoring `ips.log_path`
    pub fn access_log(&self, config: &Config) -> PathBuf {
        match &config.ips.log_path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => self.root.join(path),
            None => self.root.join("ops").join("access.jsonl"),
        }
    }

    /// A corpus reader over this vault
    pub fn reader(&self) -> CorpusReader {
        CorpusReader::new(self.notes_dir())
    }
}

// ============================================================================
// TESTS
// ============================================================================
