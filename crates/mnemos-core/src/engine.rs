//! Memory Engine
//!
//! The facade over the retrieval pipeline. Operations are synchronous per
//! call; the corpus on disk owns truth, the link graph and metrics are
//! recomputed on demand, and the embedding store plus access log are the
//! only derived state.
//!
//! A ranked query runs reader -> (graph, keyword, embeddings) -> intent ->
//! composite + keyword + personalized walk -> score-weighted RRF ->
//! exploration injection -> access log append.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use lru::LruCache;

use crate::embeddings::{EmbeddingError, TextEmbedder};
use crate::graph::{personalized_pagerank, GraphMetrics, GraphMetricsReport, LinkGraph};
use crate::index::{EmbeddingIndex, EmbeddingRecord, IndexBuildReport, IndexBuilder, IndexError};
use crate::propensity::{AccessEvent, AccessLog, Propensities};
use crate::search::{
    classify, fuse, inject_exploration, recency, CompositeHit, CompositeScorer, NoteSignals,
    QueryIntent, RankedSignal, Signal, SignalContribution, SpaceScores,
};
use crate::vault::{Config, Note, Vault, VaultError};
use crate::vitality::{VitalityEngine, VitalityInputs};

/// Query embeddings memoized per engine
const QUERY_CACHE_CAPACITY: usize = 100;

/// Authorities listed in the metrics report
const REPORT_TOP_N: usize = 10;

/// Default threshold for `query_fading`
pub const DEFAULT_FADING_THRESHOLD: f64 = 0.3;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Engine error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Vault discovery or configuration error
    #[error("vault error: {0}")]
    Vault(#[from] VaultError),
    /// Embedding store error
    #[error("index error: {0}")]
    Index(#[from] IndexError),
    /// Embedding model error
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Engine result type
pub type Result<T> = std::result::Result<T, EngineError>;

// ============================================================================
// RESPONSES
// ============================================================================

/// One served result with per-signal and per-space detail
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedNote {
    pub title: String,
    /// Fused score (0 for exploration entries)
    pub score: f64,
    /// Raw score and rank per contributing signal
    pub signals: std::collections::BTreeMap<String, SignalContribution>,
    /// Injected at random rather than ranked
    pub exploration: bool,
    /// Per-space similarity breakdown when the composite signal scored
    /// this note
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spaces: Option<SpaceScores>,
}

/// Response envelope for ranked queries
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedResponse {
    pub intent: QueryIntent,
    pub confidence: f64,
    pub results: Vec<RankedNote>,
    /// Non-fatal degradations encountered while serving
    pub warnings: Vec<String>,
}

impl RankedResponse {
    fn empty(intent: QueryIntent, confidence: f64) -> Self {
        Self {
            intent,
            confidence,
            results: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

/// One community and its members
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityReport {
    pub id: usize,
    pub members: Vec<String>,
}

// ============================================================================
// CORPUS SNAPSHOT
// ============================================================================

/// One read of the corpus with its derived graph state
struct CorpusState {
    notes: Vec<Note>,
    graph: LinkGraph,
    metrics: GraphMetrics,
}

// ============================================================================
// ENGINE
// ============================================================================

/// The retrieval and ranking engine over one vault
///
/// Single-writer, multi-reader, in-process. The caller arranges that only
/// one process writes to a given vault at a time.
pub struct Engine {
    vault: Vault,
    config: Config,
    embedder: Arc<dyn TextEmbedder>,
    index: EmbeddingIndex,
    log: AccessLog,
    query_cache: Mutex<LruCache<String, Vec<f32>>>,
}

impl Engine {
    /// Discover the vault above `start` and open it with the local
    /// embedding model from the configuration
    #[cfg(feature = "embeddings")]
    pub fn open(start: impl AsRef<std::path::Path>) -> Result<Self> {
        let vault = Vault::discover(start)?;
        let config = Config::load(vault.root())?;
        let embedder = crate::embeddings::LocalEmbedder::new(
            &config.engine.embedding_model,
            config.engine.embedding_dims,
        )?;
        Self::with_embedder(vault, config, Arc::new(embedder))
    }

    /// Open a vault with an explicit embedder
    pub fn with_embedder(
        vault: Vault,
        config: Config,
        embedder: Arc<dyn TextEmbedder>,
    ) -> Result<Self> {
        let index = EmbeddingIndex::open(&vault.embeddings_db(&config))?;
        let log = AccessLog::new(vault.access_log(&config));
        // SAFETY: the capacity constant is non-zero
        let query_cache = Mutex::new(LruCache::new(
            NonZeroUsize::new(QUERY_CACHE_CAPACITY).expect("cache capacity is non-zero"),
        ));
        Ok(Self {
            vault,
            config,
            embedder,
            index,
            log,
            query_cache,
        })
    }

    /// The vault this engine serves
    pub fn vault(&self) -> &Vault {
        &self.vault
    }

    /// The active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    // ------------------------------------------------------------------------
    // Ranked retrieval
    // ------------------------------------------------------------------------

    /// Full three-signal pipeline: composite, keyword, and graph walk fused
    /// by score-weighted RRF, with exploration injection and access logging
    pub fn query_ranked(&self, query: &str, limit: Option<usize>) -> Result<RankedResponse> {
        let limit = limit.unwrap_or(self.config.retrieval.default_limit);
        if query.trim().is_empty() {
            return Ok(RankedResponse::empty(QueryIntent::Semantic, 0.5));
        }

        let state = self.load_corpus();
        if state.notes.is_empty() {
            return Ok(RankedResponse::empty(QueryIntent::Semantic, 0.5));
        }

        let mut warnings = Vec::new();
        self.ensure_index(&state, &mut warnings)?;

        let profile = classify(query, state.graph.titles());
        let records = self.index.load_all()?;
        let signals_by_title = self.note_signals(&state, &records);
        let candidates = limit.max(1) * self.config.retrieval.candidate_multiplier.max(1);

        // Composite signal; on model failure keyword and graph still serve
        let mut composite_detail: HashMap<String, SpaceScores> = HashMap::new();
        let composite_hits: Vec<(String, f64)> = match self.query_embedding(query) {
            Ok(query_vec) => {
                let scorer = CompositeScorer::new(self.config.engine.piecewise_bins);
                scorer
                    .rank(
                        &query_vec,
                        profile.intent,
                        &records,
                        &signals_by_title,
                        candidates,
                    )
                    .into_iter()
                    .map(|hit| {
                        composite_detail.insert(hit.title.clone(), hit.spaces);
                        (hit.title, hit.score)
                    })
                    .collect()
            }
            Err(error) => {
                tracing::warn!(%error, "embedding model unavailable, serving keyword and graph only");
                warnings.push(format!(
                    "embedding model unavailable, serving keyword and graph signals only: {error}"
                ));
                Vec::new()
            }
        };

        // Keyword signal
        let keyword_index =
            crate::search::KeywordIndex::build(&state.notes, self.config.bm25);
        let keyword_hits = keyword_index.search(query, candidates);

        // Graph signal: personalized walk from entity seeds
        let seeds: Vec<usize> = profile
            .entities
            .iter()
            .filter_map(|title| state.graph.index_of(title))
            .collect();
        let walk = personalized_pagerank(&state.graph, &seeds, self.config.graph.pagerank_alpha);
        let mut graph_hits: Vec<(String, f64)> = walk
            .iter()
            .enumerate()
            .map(|(idx, &score)| (state.graph.title(idx).to_string(), score))
            .collect();
        graph_hits.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        graph_hits.truncate(candidates);

        let weights = self.config.retrieval.signal_weights;
        let ranked_signals = [
            RankedSignal {
                signal: Signal::Composite,
                weight: weights.composite,
                hits: composite_hits,
            },
            RankedSignal {
                signal: Signal::Keyword,
                weight: weights.keyword,
                hits: keyword_hits,
            },
            RankedSignal {
                signal: Signal::Graph,
                weight: weights.graph,
                hits: graph_hits,
            },
        ];

        let mut fused = fuse(&ranked_signals, self.config.retrieval.rrf_k);
        fused.truncate(limit);
        inject_exploration(
            &mut fused,
            state.graph.titles(),
            self.config.retrieval.exploration_budget,
            &mut rand::thread_rng(),
        );

        if self.config.ips.enabled {
            let event = AccessEvent::from_served(query, profile.intent, &fused);
            if let Err(error) = self.log.append(&event) {
                tracing::warn!(%error, "failed to append access event");
                warnings.push(format!("failed to append access event: {error}"));
            }
        }

        let results = fused
            .into_iter()
            .map(|note| {
                let spaces = composite_detail.get(&note.title).copied();
                RankedNote {
                    title: note.title,
                    score: note.score,
                    signals: note.signals,
                    exploration: note.exploration,
                    spaces,
                }
            })
            .collect();

        Ok(RankedResponse {
            intent: profile.intent,
            confidence: profile.confidence,
            results,
            warnings,
        })
    }

    /// Composite signal only
    pub fn query_similar(&self, query: &str, limit: Option<usize>) -> Result<Vec<CompositeHit>> {
        let limit = limit.unwrap_or(self.config.retrieval.default_limit);
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let state = self.load_corpus();
        if state.notes.is_empty() {
            return Ok(Vec::new());
        }

        let mut warnings = Vec::new();
        self.ensure_index(&state, &mut warnings)?;

        let profile = classify(query, state.graph.titles());
        let records = self.index.load_all()?;
        let signals_by_title = self.note_signals(&state, &records);
        let query_vec = self.query_embedding(query)?;

        let scorer = CompositeScorer::new(self.config.engine.piecewise_bins);
        Ok(scorer.rank(&query_vec, profile.intent, &records, &signals_by_title, limit))
    }

    // ------------------------------------------------------------------------
    // Structural queries
    // ------------------------------------------------------------------------

    /// Notes ranked by authority, descending
    pub fn query_important(&self, limit: Option<usize>) -> Vec<(String, f64)> {
        let limit = limit.unwrap_or(self.config.retrieval.default_limit);
        let state = self.load_corpus();

        let mut ranked: Vec<(String, f64)> = state
            .metrics
            .pagerank
            .iter()
            .enumerate()
            .map(|(idx, &score)| (state.graph.title(idx).to_string(), score))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(limit);
        ranked
    }

    /// Notes below the vitality threshold, least alive first
    pub fn query_fading(&self, threshold: f64, limit: Option<usize>) -> Vec<(String, f64)> {
        let limit = limit.unwrap_or(self.config.retrieval.default_limit);
        let state = self.load_corpus();
        let vitality = self.vitality_scores(&state);

        let mut fading: Vec<(String, f64)> = vitality
            .iter()
            .enumerate()
            .filter(|&(_, &score)| score < threshold)
            .map(|(idx, &score)| (state.graph.title(idx).to_string(), score))
            .collect();
        fading.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        fading.truncate(limit);
        fading
    }

    /// Titles no other note links to
    pub fn query_orphans(&self) -> Vec<String> {
        self.load_corpus().graph.orphans()
    }

    /// Link targets that name no existing note
    pub fn query_dangling(&self) -> Vec<String> {
        self.load_corpus().graph.dangling()
    }

    /// Titles of notes linking to `title`
    pub fn query_backlinks(&self, title: &str) -> Vec<String> {
        self.load_corpus().graph.backlinks(title)
    }

    /// Titles carrying two or more project tags
    pub fn query_cross_project(&self) -> Vec<String> {
        self.load_corpus().graph.cross_project()
    }

    // ------------------------------------------------------------------------
    // Index and reporting
    // ------------------------------------------------------------------------

    /// Build or refresh the embedding index incrementally
    pub fn index_build(&self, force: bool) -> Result<IndexBuildReport> {
        let state = self.load_corpus();
        self.build_index(&state, force)
    }

    /// Structural metrics snapshot
    pub fn graph_metrics(&self) -> GraphMetricsReport {
        let state = self.load_corpus();
        GraphMetricsReport::build(&state.graph, &self.config.graph, REPORT_TOP_N)
    }

    /// Communities and their members
    pub fn graph_communities(&self) -> Vec<CommunityReport> {
        let state = self.load_corpus();

        let mut members: HashMap<usize, Vec<String>> = HashMap::new();
        for (idx, &community) in state.metrics.communities.iter().enumerate() {
            members
                .entry(community)
                .or_default()
                .push(state.graph.title(idx).to_string());
        }

        let mut reports: Vec<CommunityReport> = members
            .into_iter()
            .map(|(id, mut members)| {
                members.sort();
                CommunityReport { id, members }
            })
            .collect();
        reports.sort_by_key(|r| r.id);
        reports
    }

    /// Appearance-share propensities from the access log
    pub fn propensities(&self) -> Result<Propensities> {
        Ok(Propensities::from_log(&self.log, self.config.ips.epsilon)?)
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn load_corpus(&self) -> CorpusState {
        let notes = self.vault.reader().read_all();
        let graph = LinkGraph::build(&notes);
        let metrics = GraphMetrics::compute(&graph, &self.config.graph);
        CorpusState {
            notes,
            graph,
            metrics,
        }
    }

    /// Cold start: a missing or empty index is a build request, not an error
    fn ensure_index(&self, state: &CorpusState, warnings: &mut Vec<String>) -> Result<()> {
        if !self.index.is_empty()? {
            return Ok(());
        }
        tracing::warn!("embedding index empty, building before serving");
        warnings.push("embedding index was empty and was built before serving".to_string());
        match self.build_index(state, false) {
            Ok(_) => Ok(()),
            Err(EngineError::Index(IndexError::Embedding(error)))
            | Err(EngineError::Embedding(error)) => {
                tracing::warn!(%error, "cold-start build failed at the embedding model");
                warnings.push(format!("embedding model failed during cold-start build: {error}"));
                Ok(())
            }
            Err(other) => Err(other),
        }
    }

    fn build_index(&self, state: &CorpusState, force: bool) -> Result<IndexBuildReport> {
        let builder = IndexBuilder::new(
            &self.index,
            self.embedder.as_ref(),
            self.config.engine.community_dims,
        );
        let report = builder.build(
            &state.notes,
            &state.metrics.communities,
            state.metrics.community_count,
            force,
        )?;
        tracing::debug!(
            indexed = report.indexed,
            skipped = report.skipped,
            total = report.total,
            duration_ms = report.duration_ms,
            "index build finished"
        );
        Ok(report)
    }

    /// Embed a query once, memoized across calls
    fn query_embedding(&self, query: &str) -> std::result::Result<Vec<f32>, EmbeddingError> {
        if let Ok(mut cache) = self.query_cache.lock() {
            if let Some(vector) = cache.get(query) {
                return Ok(vector.clone());
            }
        }
        let vector = self.embedder.embed(query)?;
        if let Ok(mut cache) = self.query_cache.lock() {
            cache.put(query.to_string(), vector.clone());
        }
        Ok(vector)
    }

    fn vitality_scores(&self, state: &CorpusState) -> Vec<f64> {
        let engine = VitalityEngine::new(
            self.config.vitality,
            self.config.graph.bridge_vitality_floor,
        );
        let today = Utc::now().date_naive();

        (0..state.notes.len())
            .map(|idx| {
                let note = &state.notes[idx];
                // A new incoming link is approximated by the youngest
                // in-neighbor's creation date
                let days_since_new_connection = state
                    .graph
                    .in_neighbors(idx)
                    .iter()
                    .map(|&source| (today - state.notes[source].created).num_days().max(0))
                    .min()
                    .map(|days| days as f64);

                engine.score(&VitalityInputs {
                    access_count: note.access_count,
                    lifetime_days: note.lifetime_days(today),
                    in_degree: state.graph.in_degree(idx),
                    role: note.metabolic_role(),
                    is_bridge: state.metrics.bridges.contains(&idx),
                    days_since_new_connection,
                })
            })
            .collect()
    }

    fn note_signals(
        &self,
        state: &CorpusState,
        records: &[EmbeddingRecord],
    ) -> HashMap<String, NoteSignals> {
        let vitality = self.vitality_scores(state);
        let now = Utc::now();

        records
            .iter()
            .filter_map(|record| {
                let idx = state.graph.index_of(&record.title)?;
                Some((
                    record.title.clone(),
                    NoteSignals {
                        vitality: vitality[idx],
                        importance: state.metrics.normalized_pagerank(idx),
                        recency: recency(record.days_since_index(now)),
                    },
                ))
            })
            .collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================
