//! Engine Configuration
//!
//! Loaded from `ori.config.yaml` at the vault root. Every key is optional
//! and falls back to its documented default; a structurally invalid file
//! (wrong value types) is a fatal startup error.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::VaultError;

// ============================================================================
// TOP-LEVEL CONFIG
// ============================================================================

/// Configuration consumed by the engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub retrieval: RetrievalConfig,
    pub bm25: Bm25Config,
    pub graph: GraphConfig,
    pub vitality: VitalityConfig,
    pub ips: IpsConfig,
}

impl Config {
    /// Load configuration from a vault root; a missing file yields defaults
    pub fn load(vault_root: &Path) -> Result<Self, VaultError> {
        let path = vault_root.join("ori.config.yaml");
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        serde_yaml::from_str(&content).map_err(|source| VaultError::Config {
            path: path.display().to_string(),
            source,
        })
    }
}

// ============================================================================
// SECTIONS
// ============================================================================

/// Embedding and encoding parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Embedding model name for the local model cache
    pub embedding_model: String,
    /// Truncate embeddings to this many dimensions (model default if absent)
    pub embedding_dims: Option<usize>,
    /// Bins for the piecewise-linear scalar encoding
    pub piecewise_bins: usize,
    /// Dimension of the community projection vector
    pub community_dims: usize,
    /// Embedding store location, relative to the vault root if not absolute
    pub db_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            embedding_model: "nomic-embed-text-v1.5".to_string(),
            embedding_dims: None,
            piecewise_bins: 8,
            community_dims: 16,
            db_path: None,
        }
    }
}

/// Retrieval pipeline parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Result count when the caller does not pass a limit
    pub default_limit: usize,
    /// Candidates fetched per signal = limit * multiplier
    pub candidate_multiplier: usize,
    /// RRF dampening constant
    pub rrf_k: f64,
    /// Per-signal fusion weights
    pub signal_weights: SignalWeights,
    /// Fraction of the served list replaced by exploration picks
    pub exploration_budget: f64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            candidate_multiplier: 5,
            rrf_k: 60.0,
            signal_weights: SignalWeights::default(),
            exploration_budget: 0.10,
        }
    }
}

/// Fusion weights for the three candidate signals
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalWeights {
    pub composite: f64,
    pub keyword: f64,
    pub graph: f64,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            composite: 2.0,
            keyword: 1.0,
            graph: 1.5,
        }
    }
}

/// Okapi BM25 parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct Bm25Config {
    pub k1: f64,
    pub b: f64,
    /// Copies contributed per title token
    pub title_boost: f64,
    /// Copies contributed per description token
    pub description_boost: f64,
}

impl Default for Bm25Config {
    fn default() -> Self {
        Self {
            k1: 1.2,
            b: 0.75,
            title_boost: 3.0,
            description_boost: 2.0,
        }
    }
}

/// Link graph parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Damping factor for the authority walk
    pub pagerank_alpha: f64,
    /// Vitality floor applied to bridge notes
    pub bridge_vitality_floor: f64,
    /// A note is a hub when in-degree exceeds this multiple of the median
    pub hub_degree_multiplier: f64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            pagerank_alpha: 0.85,
            bridge_vitality_floor: 0.5,
            hub_degree_multiplier: 2.0,
        }
    }
}

/// Vitality model parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct VitalityConfig {
    /// ACT-R base decay, before the metabolic multiplier
    pub actr_decay: f64,
    /// Per-role decay multipliers
    pub metabolic_rates: MetabolicRates,
    /// Access saturation constant k
    pub access_saturation_k: f64,
    /// Structural boost per incoming link
    pub structural_boost_per_link: f64,
    /// Incoming links counted toward the structural boost
    pub structural_boost_cap: u32,
    /// Exponential rate of the revival bonus
    pub revival_decay_rate: f64,
    /// Window in which a new incoming link counts as a revival
    pub revival_window_days: i64,
}

impl Default for VitalityConfig {
    fn default() -> Self {
        Self {
            actr_decay: 0.5,
            metabolic_rates: MetabolicRates::default(),
            access_saturation_k: 10.0,
            structural_boost_per_link: 0.1,
            structural_boost_cap: 10,
            revival_decay_rate: 0.2,
            revival_window_days: 14,
        }
    }
}

/// Decay multipliers per metabolic role
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct MetabolicRates {
    /// Identity notes decay 10x slower
    #[serde(rename = "self")]
    pub identity: f64,
    /// General notes
    pub notes: f64,
    /// Operational notes decay faster
    pub ops: f64,
}

impl Default for MetabolicRates {
    fn default() -> Self {
        Self {
            identity: 0.1,
            notes: 1.0,
            ops: 3.0,
        }
    }
}

/// Propensity logging parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IpsConfig {
    /// Whether served results are appended to the access log
    pub enabled: bool,
    /// Propensity floor for off-policy estimates
    pub epsilon: f64,
    /// Access log location, relative to the vault root if not absolute
    pub log_path: Option<PathBuf>,
}

impl Default for IpsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            epsilon: 0.01,
            log_path: None,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
