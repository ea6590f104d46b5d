//! Test Vault Manager
//!
//! Builds isolated vaults on disk for end-to-end tests:
//! - a scaffolded `.ori` root inside a TempDir, cleaned up on drop
//! - note files written from fixtures
//! - engines wired to the deterministic hash embedder

use std::path::{Path, PathBuf};
use std::sync::Arc;

use mnemos_core::{Config, Engine, Vault};
use tempfile::TempDir;

use crate::mocks::{HashEmbedder, NoteFixture};

/// An isolated vault on disk
///
/// The TempDir is kept alive for the lifetime of the value; everything is
/// deleted when it drops.
pub struct TestVault {
    root: PathBuf,
    _temp: TempDir,
}

impl TestVault {
    /// Scaffold an empty vault
    pub fn new() -> Self {
        let temp = TempDir::new().expect("create tempdir");
        let root = temp.path().join("vault");
        std::fs::create_dir_all(root.join(".ori")).expect("scaffold .ori");
        std::fs::create_dir_all(root.join("notes")).expect("scaffold notes");
        Self { root, _temp: temp }
    }

    /// Scaffold a vault holding the given fixtures
    pub fn with_notes(fixtures: &[NoteFixture]) -> Self {
        let vault = Self::new();
        for fixture in fixtures {
            vault.write(fixture);
        }
        vault
    }

    /// The vault root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write one fixture into the corpus
    pub fn write(&self, fixture: &NoteFixture) {
        self.write_raw(fixture.title(), &fixture.render());
    }

    /// Write raw note content under a title
    pub fn write_raw(&self, title: &str, content: &str) {
        std::fs::write(self.note_path(title), content).expect("write note");
    }

    /// Delete a note file
    pub fn delete_note(&self, title: &str) {
        std::fs::remove_file(self.note_path(title)).expect("delete note");
    }

    /// Write `ori.config.yaml` at the root
    pub fn write_config(&self, yaml: &str) {
        std::fs::write(self.root.join("ori.config.yaml"), yaml).expect("write config");
    }

    /// Path of the embedding store under the default configuration
    pub fn embeddings_db(&self) -> PathBuf {
        self.root.join(".ori/embeddings.db")
    }

    /// Path of the access log under the default configuration
    pub fn access_log(&self) -> PathBuf {
        self.root.join("ops/access.jsonl")
    }

    /// Open an engine over this vault with the deterministic embedder
    pub fn engine(&self) -> Engine {
        let vault = Vault::at_root(&self.root).expect("vault root");
        let config = Config::load(vault.root()).expect("load config");
        Engine::with_embedder(vault, config, Arc::new(HashEmbedder::default()))
            .expect("open engine")
    }

    fn note_path(&self, title: &str) -> PathBuf {
        self.root.join("notes").join(format!("{title}.md"))
    }
}

impl Default for TestVault {
    fn default() -> Self {
        Self::new()
    }
}
