//! Fusion & Exploration
//!
//! Score-weighted reciprocal rank fusion over the three candidate signals,
//! followed by exploration injection: the tail of the served list is
//! replaced with random unseen notes to counter popularity bias.

use std::collections::{BTreeMap, HashMap, HashSet};

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

// ============================================================================
// SIGNALS
// ============================================================================

/// The three candidate-producing signals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    /// Multi-space vector similarity
    Composite,
    /// BM25 keyword match
    Keyword,
    /// Personalized graph walk
    Graph,
}

impl Signal {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Composite => "composite",
            Signal::Keyword => "keyword",
            Signal::Graph => "graph",
        }
    }
}

/// One signal's ranked candidates with its fusion weight
#[derive(Debug, Clone)]
pub struct RankedSignal {
    pub signal: Signal,
    pub weight: f64,
    /// `(title, raw score)` pairs, best first
    pub hits: Vec<(String, f64)>,
}

/// A signal's contribution to one fused note, kept for debugging
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalContribution {
    /// Zero-based rank within the signal
    pub rank: usize,
    /// The signal's raw score
    pub raw_score: f64,
}

/// One fused, possibly exploration-injected, result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FusedNote {
    pub title: String,
    /// Score-weighted RRF total (0 for exploration entries)
    pub score: f64,
    /// Per-signal raw scores and ranks
    pub signals: BTreeMap<String, SignalContribution>,
    /// Injected at random rather than ranked
    pub exploration: bool,
}

// ============================================================================
// SCORE-WEIGHTED RRF
// ============================================================================

/// Fuse ranked signal lists by score-weighted reciprocal rank
///
/// `fused(note) = sum over signals of weight * raw / (k + rank + 1)` with
/// zero-based ranks. Notes merge by title; ties keep insertion order.
pub fn fuse(signals: &[RankedSignal], k: f64) -> Vec<FusedNote> {
    let mut order: HashMap<String, usize> = HashMap::new();
    let mut fused: Vec<FusedNote> = Vec::new();

    for signal in signals {
        for (rank, (title, raw_score)) in signal.hits.iter().enumerate() {
            let position = *order.entry(title.clone()).or_insert_with(|| {
                fused.push(FusedNote {
                    title: title.clone(),
                    score: 0.0,
                    signals: BTreeMap::new(),
                    exploration: false,
                });
                fused.len() - 1
            });

            fused[position].score += signal.weight * raw_score / (k + rank as f64 + 1.0);
            fused[position].signals.insert(
                signal.signal.as_str().to_string(),
                SignalContribution {
                    rank,
                    raw_score: *raw_score,
                },
            );
        }
    }

    // Stable sort keeps insertion order on ties
    fused.sort_by(|a, b| b.score.total_cmp(&a.score));
    fused
}

// ============================================================================
// EXPLORATION INJECTION
// ============================================================================

/// Replace the tail of a served list with random unseen notes
///
/// Replaces the bottom `floor(len * budget)` positions (at least one when
/// the budget is positive) with shuffled titles not already present. When
/// unseen notes run out the remaining tail keeps its original entries.
pub fn inject_exploration<R: Rng>(
    results: &mut [FusedNote],
    all_titles: &[String],
    budget: f64,
    rng: &mut R,
) -> usize {
    if budget <= 0.0 || results.is_empty() {
        return 0;
    }

    let slots = ((results.len() as f64 * budget).floor() as usize)
        .max(1)
        .min(results.len());

    let served: HashSet<&str> = results.iter().map(|r| r.title.as_str()).collect();
    let mut unseen: Vec<&String> = all_titles
        .iter()
        .filter(|title| !served.contains(title.as_str()))
        .collect();
    unseen.shuffle(rng);

    let injected = slots.min(unseen.len());
    let start = results.len() - injected;
    for (offset, title) in unseen.into_iter().take(injected).enumerate() {
        results[start + offset] = FusedNote {
            title: title.clone(),
            score: 0.0,
            signals: BTreeMap::new(),
            exploration: true,
        };
    }
    injected
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn signal(signal: Signal, weight: f64, hits: &[(&str, f64)]) -> RankedSignal {
        RankedSignal {
            signal,
            weight,
            hits: hits
                .iter()
                .map(|(title, score)| (title.to_string(), *score))
                .collect(),
        }
    }

    fn rng() -> rand::rngs::StdRng {
        rand::rngs::StdRng::seed_from_u64(42)
    }

    #[test]
    fn test_fuse_rewards_agreement() {
        let signals = vec![
            signal(Signal::Composite, 2.0, &[("a", 0.9), ("b", 0.8)]),
            signal(Signal::Keyword, 1.0, &[("b", 5.0), ("c", 4.0)]),
        ];
        let fused = fuse(&signals, 60.0);

        assert!(fused.iter().any(|f| f.title == "a"));
        let b = fused.iter().find(|f| f.title == "b").unwrap();
        assert_eq!(b.signals.len(), 2);
        assert!(b.signals.contains_key("composite"));
        assert!(b.signals.contains_key("keyword"));
    }

    #[test]
    fn test_fuse_preserves_raw_scores() {
        let signals = vec![signal(Signal::Graph, 1.5, &[("a", 0.25)])];
        let fused = fuse(&signals, 60.0);
        let contribution = fused[0].signals["graph"];
        assert_eq!(contribution.rank, 0);
        assert!((contribution.raw_score - 0.25).abs() < 1e-12);
        // weight * raw / (k + 0 + 1)
        assert!((fused[0].score - 1.5 * 0.25 / 61.0).abs() < 1e-12);
    }

    #[test]
    fn test_identical_rankings_fuse_to_same_order() {
        let hits = &[("a", 0.9), ("b", 0.8), ("c", 0.7)];
        let signals = vec![
            signal(Signal::Composite, 2.0, hits),
            signal(Signal::Keyword, 1.0, hits),
        ];
        let fused = fuse(&signals, 60.0);
        let titles: Vec<&str> = fused.iter().map(|f| f.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_zero_weight_signal_changes_nothing() {
        let base = vec![signal(Signal::Composite, 2.0, &[("a", 0.9), ("b", 0.5)])];
        let with_zero = vec![
            signal(Signal::Composite, 2.0, &[("a", 0.9), ("b", 0.5)]),
            signal(Signal::Graph, 0.0, &[("b", 1.0), ("z", 1.0)]),
        ];

        let plain: Vec<(String, f64)> = fuse(&base, 60.0)
            .into_iter()
            .map(|f| (f.title, f.score))
            .collect();
        let zeroed: Vec<(String, f64)> = fuse(&with_zero, 60.0)
            .into_iter()
            .filter(|f| f.score > 0.0 || plain.iter().any(|(t, _)| *t == f.title))
            .map(|f| (f.title, f.score))
            .collect();

        assert_eq!(plain, zeroed);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let signals = vec![signal(Signal::Composite, 0.0, &[("x", 1.0), ("y", 1.0)])];
        let fused = fuse(&signals, 60.0);
        assert_eq!(fused[0].title, "x");
        assert_eq!(fused[1].title, "y");
    }

    fn served(titles: &[&str]) -> Vec<FusedNote> {
        titles
            .iter()
            .map(|title| FusedNote {
                title: title.to_string(),
                score: 1.0,
                signals: BTreeMap::new(),
                exploration: false,
            })
            .collect()
    }

    #[test]
    fn test_exploration_replaces_exact_tail() {
        let mut results = served(&["a", "b", "c", "d", "e", "f", "g", "h", "i", "j"]);
        let pool: Vec<String> = (0..30).map(|i| format!("extra{i}")).collect();

        let injected = inject_exploration(&mut results, &pool, 0.20, &mut rng());
        assert_eq!(injected, 2);

        let flagged: Vec<&FusedNote> = results.iter().filter(|r| r.exploration).collect();
        assert_eq!(flagged.len(), 2);
        // Flags sit at the bottom and carry score zero
        assert!(results[8].exploration && results[9].exploration);
        assert!(flagged.iter().all(|f| f.score == 0.0));
        // Injected titles are disjoint from the ranked ones
        for f in &flagged {
            assert!(f.title.starts_with("extra"));
        }
    }

    #[test]
    fn test_exploration_minimum_one_slot() {
        let mut results = served(&["a", "b", "c"]);
        let pool = vec!["z".to_string()];
        let injected = inject_exploration(&mut results, &pool, 0.05, &mut rng());
        assert_eq!(injected, 1);
        assert!(results[2].exploration);
    }

    #[test]
    fn test_exploration_zero_budget_is_noop() {
        let mut results = served(&["a", "b"]);
        let pool = vec!["z".to_string()];
        assert_eq!(inject_exploration(&mut results, &pool, 0.0, &mut rng()), 0);
        assert!(results.iter().all(|r| !r.exploration));
    }

    #[test]
    fn test_exploration_keeps_tail_when_unseen_runs_out() {
        let mut results = served(&["a", "b", "c", "d"]);
        // Every candidate is already served
        let pool = vec!["a".to_string(), "b".to_string()];
        let injected = inject_exploration(&mut results, &pool, 0.5, &mut rng());
        assert_eq!(injected, 0);
        assert_eq!(results[3].title, "d");
        assert!(!results[3].exploration);
    }
}
