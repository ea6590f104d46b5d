//! # Mnemos Core
//!
//! Retrieval and ranking engine for file-backed agent memory vaults.
//! A vault is a directory of plain text notes with structured metadata
//! headers; edges between notes are `[[wiki link]]` tokens in note bodies.
//! The engine turns that corpus into ranked answers to natural-language
//! queries:
//!
//! - **Link Graph**: authority walk, communities, articulation points,
//!   personalized walks from query entities
//! - **Vitality**: ACT-R inspired per-note aliveness from access history,
//!   age, connectivity, and role
//! - **Three-Signal Retrieval**: composite multi-space vector search,
//!   field-weighted BM25, and a personalized graph walk, fused by
//!   score-weighted reciprocal rank
//! - **Incremental Embedding Index**: per-note multi-vector rows in an
//!   embedded relational store, keyed by content fingerprint
//! - **Exploration & Propensity**: random tail injection against
//!   popularity bias, with an append-only access log for off-policy
//!   correction
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mnemos_core::Engine;
//!
//! // Discover the vault above the working directory and open it
//! let engine = Engine::open(".")?;
//!
//! // Build (or refresh) the embedding index
//! let report = engine.index_build(false)?;
//!
//! // Ask a question
//! let response = engine.query_ranked("how do I deploy the broker", None)?;
//! for result in &response.results {
//!     println!("{} {:.3}", result.title, result.score);
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `embeddings` (default): local embedding inference with fastembed
//! - `bundled-sqlite` (default): bundle SQLite into the binary

#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod embeddings;
pub mod engine;
pub mod graph;
pub mod index;
pub mod propensity;
pub mod search;
pub mod vault;
pub mod vitality;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Engine facade
pub use engine::{
    CommunityReport, Engine, EngineError, RankedNote, RankedResponse, Result,
    DEFAULT_FADING_THRESHOLD,
};

// Vault and corpus
pub use vault::{
    Config, CorpusReader, MetabolicRole, Note, NoteStatus, NoteType, TitleMention, Vault,
    VaultError,
};

// Link graph
pub use graph::{GraphMetrics, GraphMetricsReport, LinkGraph};

// Vitality
pub use vitality::{VitalityEngine, VitalityInputs};

// Embeddings
pub use embeddings::{cosine_similarity, EmbeddingError, TextEmbedder};

#[cfg(feature = "embeddings")]
pub use embeddings::{LocalEmbedder, DEFAULT_EMBEDDING_MODEL};

// Embedding index
pub use index::{EmbeddingIndex, EmbeddingRecord, IndexBuildReport, IndexBuilder, IndexError};

// Search pipeline
pub use search::{
    CompositeHit, CompositeScorer, FusedNote, IntentProfile, QueryIntent, Signal, SpaceScores,
};

// Propensity ledger
pub use propensity::{AccessEvent, AccessLog, Propensities, ServedEntry};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// PRELUDE
// ============================================================================

/// Convenient imports for common usage
pub mod prelude {
    pub use crate::{
        Config, Engine, EngineError, Note, NoteType, QueryIntent, RankedResponse, Result,
        TextEmbedder, Vault,
    };

    #[cfg(feature = "embeddings")]
    pub use crate::LocalEmbedder;
}
