//! Composite Scorer
//!
//! Per-candidate weighted similarity across the six spaces (text, temporal,
//! vitality, importance, type, community). The query is embedded once; text
//! similarity is a split-weighted cosine over the per-note title,
//! description, and body vectors, and scalar signals are compared through
//! the piecewise-linear encoding.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::intent::QueryIntent;
use crate::embeddings::{cosine_similarity, scalar_similarity};
use crate::index::EmbeddingRecord;

/// Days for the indexing-recency decay `exp(-days/30)`
const RECENCY_DECAY_DAYS: f64 = 30.0;

/// Recency in [0,1] from days since the note was indexed
pub fn recency(days_since_index: f64) -> f64 {
    (-days_since_index / RECENCY_DECAY_DAYS).exp()
}

// ============================================================================
// SCORES
// ============================================================================

/// Per-note scalar signals, computed by the engine before scoring
#[derive(Debug, Clone, Copy, Default)]
pub struct NoteSignals {
    /// Vitality score in [0,1]
    pub vitality: f64,
    /// Authority normalized by the corpus maximum
    pub importance: f64,
    /// `exp(-days_since_index/30)`
    pub recency: f64,
}

/// Per-space similarity breakdown, kept on results for observability
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpaceScores {
    pub text: f64,
    pub temporal: f64,
    pub vitality: f64,
    pub importance: f64,
    pub note_type: f64,
    pub community: f64,
}

/// One scored candidate from the composite signal
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeHit {
    pub title: String,
    pub score: f64,
    pub spaces: SpaceScores,
}

// ============================================================================
// SCORER
// ============================================================================

/// Scores every indexed note against an embedded query
#[derive(Debug, Clone, Copy)]
pub struct CompositeScorer {
    bins: usize,
}

impl CompositeScorer {
    /// Create a scorer with the configured piecewise bin count
    pub fn new(bins: usize) -> Self {
        Self {
            bins: bins.max(1),
        }
    }

    /// Rank all records against the query, descending, top `limit`
    pub fn rank(
        &self,
        query_vec: &[f32],
        intent: QueryIntent,
        records: &[EmbeddingRecord],
        signals: &HashMap<String, NoteSignals>,
        limit: usize,
    ) -> Vec<CompositeHit> {
        let space_weights = intent.space_weights();
        let split_weights = intent.split_weights();
        let type_target = intent.type_target();
        let importance_target = intent.importance_target();

        let mut hits: Vec<CompositeHit> = records
            .iter()
            .map(|record| {
                let note_signals = signals.get(&record.title).copied().unwrap_or_default();

                let text = split_weights.title
                    * cosine_similarity(query_vec, &record.title_vec)
                    + split_weights.description * cosine_similarity(query_vec, &record.desc_vec)
                    + split_weights.body * cosine_similarity(query_vec, &record.body_vec);

                let note_type = cosine_similarity(&type_target, &record.type_vec);

                // Query-side community inference is an open design option;
                // the constant marks membership without ranking between
                // communities.
                let community = if record.community_vec.iter().any(|&x| x != 0.0) {
                    0.5
                } else {
                    0.0
                };

                let temporal = scalar_similarity(note_signals.recency, 1.0, self.bins);
                let vitality = scalar_similarity(note_signals.vitality, 1.0, self.bins);
                let importance =
                    scalar_similarity(note_signals.importance, importance_target, self.bins);

                let spaces = SpaceScores {
                    text,
                    temporal,
                    vitality,
                    importance,
                    note_type,
                    community,
                };
                let score = space_weights.text * text
                    + space_weights.temporal * temporal
                    + space_weights.vitality * vitality
                    + space_weights.importance * importance
                    + space_weights.note_type * note_type
                    + space_weights.community * community;

                CompositeHit {
                    title: record.title.clone(),
                    score,
                    spaces,
                }
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.title.cmp(&b.title)));
        hits.truncate(limit);
        hits
    }
}

// ============================================================================
// TESTS
// ============================================================================
