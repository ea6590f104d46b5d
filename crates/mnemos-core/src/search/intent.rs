//! Intent Classifier
//!
//! Maps a query string to one of four retrieval intents through a fixed,
//! ordered table of case-insensitive patterns. The winning intent selects
//! the space and split weight profiles used by the composite scorer; the
//! classifier also extracts entity seeds for the personalized graph walk.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::vault::{NoteType, NOTE_TYPE_COUNT};

// ============================================================================
// INTENTS
// ============================================================================

/// Retrieval intent of a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QueryIntent {
    /// Conceptual lookup ("what do we know about X")
    #[default]
    Semantic,
    /// Event recall ("what happened with X recently")
    Episodic,
    /// How-to retrieval ("how do I X")
    Procedural,
    /// Decision archaeology ("why did we choose X")
    Decision,
}

impl QueryIntent {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryIntent::Semantic => "semantic",
            QueryIntent::Episodic => "episodic",
            QueryIntent::Procedural => "procedural",
            QueryIntent::Decision => "decision",
        }
    }

    /// Weights over the six similarity spaces, summing to 1
    pub fn space_weights(&self) -> SpaceWeights {
        match self {
            QueryIntent::Episodic => SpaceWeights {
                text: 0.40,
                temporal: 0.25,
                vitality: 0.15,
                importance: 0.05,
                note_type: 0.05,
                community: 0.10,
            },
            QueryIntent::Procedural => SpaceWeights {
                text: 0.30,
                temporal: 0.05,
                vitality: 0.10,
                importance: 0.30,
                note_type: 0.10,
                community: 0.15,
            },
            QueryIntent::Semantic => SpaceWeights {
                text: 0.65,
                temporal: 0.05,
                vitality: 0.10,
                importance: 0.10,
                note_type: 0.05,
                community: 0.05,
            },
            QueryIntent::Decision => SpaceWeights {
                text: 0.30,
                temporal: 0.15,
                vitality: 0.10,
                importance: 0.10,
                note_type: 0.30,
                community: 0.05,
            },
        }
    }

    /// Weights over the title/description/body text splits, summing to 1
    pub fn split_weights(&self) -> SplitWeights {
        match self {
            QueryIntent::Semantic => SplitWeights {
                title: 0.50,
                description: 0.30,
                body: 0.20,
            },
            QueryIntent::Episodic => SplitWeights {
                title: 0.20,
                description: 0.20,
                body: 0.60,
            },
            QueryIntent::Decision => SplitWeights {
                title: 0.40,
                description: 0.40,
                body: 0.20,
            },
            QueryIntent::Procedural => SplitWeights {
                title: 0.30,
                description: 0.30,
                body: 0.40,
            },
        }
    }

    /// Target for the importance space
    pub fn importance_target(&self) -> f64 {
        match self {
            QueryIntent::Procedural | QueryIntent::Decision => 0.8,
            _ => 0.5,
        }
    }

    /// Query-implied target over the type one-hot slots
    ///
    /// Episodic and semantic share the same slot mix; what separates those
    /// two intents is the split-weight profile, not the type target.
    pub fn type_target(&self) -> Vec<f32> {
        let mut target = vec![0.0f32; NOTE_TYPE_COUNT];
        let slots: &[NoteType] = match self {
            QueryIntent::Decision => &[NoteType::Decision],
            QueryIntent::Procedural => &[NoteType::Learning, NoteType::Insight],
            QueryIntent::Episodic | QueryIntent::Semantic => {
                &[NoteType::Idea, NoteType::Learning, NoteType::Insight]
            }
        };
        for note_type in slots {
            target[note_type.slot()] = 1.0;
        }
        target
    }
}

impl std::fmt::Display for QueryIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-space weights for the composite score
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SpaceWeights {
    pub text: f64,
    pub temporal: f64,
    pub vitality: f64,
    pub importance: f64,
    pub note_type: f64,
    pub community: f64,
}

/// Per-split weights for the text space
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SplitWeights {
    pub title: f64,
    pub description: f64,
    pub body: f64,
}

// ============================================================================
// RULE TABLE
// ============================================================================

const EPISODIC_PATTERNS: &[&str] = &[
    r"\bwhen (did|was|were)\b",
    r"\blast (week|month|time|session)\b",
    r"\byesterday\b",
    r"\brecently\b",
    r"\bremember\b",
    r"\bwhat happened\b",
    r"\btimeline\b",
    r"\bhistory of\b",
];

const PROCEDURAL_PATTERNS: &[&str] = &[
    r"\bhow (do|to|can|should|does)\b",
    r"\bsteps?\b",
    r"\bguide\b",
    r"\bprocess\b",
    r"\bprocedure\b",
    r"\brunbook\b",
    r"\b(set ?up|install|configure|deploy|run|build|migrate)\b",
];

const DECISION_PATTERNS: &[&str] = &[
    r"\bwhy (did|do|was|were)\b",
    r"\bdecision\b",
    r"\bdecided?\b",
    r"\b(choose|chose|chosen|picked?)\b",
    r"\bshould (i|we)\b",
    r"\btrade-?offs?\b",
    r"\binstead of\b",
    r"\boption\b",
    r"\balternatives?\b",
];

const SEMANTIC_PATTERNS: &[&str] = &[
    r"\bwhat (is|are)\b",
    r"\bdefine\b",
    r"\bexplain\b",
    r"\bmeaning\b",
    r"\brelated to\b",
    r"\babout\b",
    r"\boverview\b",
];

/// Fixed classification order; ties fall back to semantic
const RULE_ORDER: [QueryIntent; 4] = [
    QueryIntent::Episodic,
    QueryIntent::Procedural,
    QueryIntent::Decision,
    QueryIntent::Semantic,
];

fn compiled_rules() -> &'static [(QueryIntent, Vec<Regex>)] {
    static RULES: OnceLock<Vec<(QueryIntent, Vec<Regex>)>> = OnceLock::new();
    RULES.get_or_init(|| {
        RULE_ORDER
            .iter()
            .map(|&intent| {
                let patterns = match intent {
                    QueryIntent::Episodic => EPISODIC_PATTERNS,
                    QueryIntent::Procedural => PROCEDURAL_PATTERNS,
                    QueryIntent::Decision => DECISION_PATTERNS,
                    QueryIntent::Semantic => SEMANTIC_PATTERNS,
                };
                let compiled = patterns
                    .iter()
                    .filter_map(|p| Regex::new(&format!("(?i){p}")).ok())
                    .collect();
                (intent, compiled)
            })
            .collect()
    })
}

// ============================================================================
// CLASSIFICATION
// ============================================================================

/// The classified query: intent, confidence, and entity seeds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentProfile {
    /// Winning intent
    pub intent: QueryIntent,
    /// 1.0 for two or more pattern matches, 0.7 for one, 0.5 otherwise;
    /// reported but not consumed downstream
    pub confidence: f64,
    /// Known titles mentioned in the query, longest matches first
    pub entities: Vec<String>,
}

/// Classify a query against the rule table and the known title set
pub fn classify(query: &str, titles: &[String]) -> IntentProfile {
    let mut best = QueryIntent::Semantic;
    let mut best_count = 0usize;
    let mut tied = false;

    for (intent, patterns) in compiled_rules() {
        let count = patterns.iter().filter(|p| p.is_match(query)).count();
        if count > best_count {
            best = *intent;
            best_count = count;
            tied = false;
        } else if count == best_count && count > 0 && *intent != best {
            tied = true;
        }
    }

    let intent = if best_count == 0 || tied {
        QueryIntent::Semantic
    } else {
        best
    };
    let confidence = match best_count {
        0 => 0.5,
        1 => 0.7,
        _ => 1.0,
    };

    IntentProfile {
        intent,
        confidence,
        entities: extract_entities(query, titles),
    }
}

/// Substring-match the query against the known title set, longest first
///
/// A span claimed by a longer title is not re-claimed by a shorter one.
fn extract_entities(query: &str, titles: &[String]) -> Vec<String> {
    let lowered = query.to_lowercase();

    let mut ordered: Vec<&String> = titles.iter().collect();
    ordered.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let mut claimed: Vec<(usize, usize)> = Vec::new();
    let mut entities = Vec::new();
    for title in ordered {
        let needle = title.to_lowercase();
        if needle.len() < 2 {
            continue;
        }
        let mut search_from = 0;
        while let Some(offset) = lowered[search_from..].find(&needle) {
            let start = search_from + offset;
            let end = start + needle.len();
            search_from = end;
            if claimed.iter().any(|&(s, e)| start < e && s < end) {
                continue;
            }
            claimed.push((start, end));
            if !entities.contains(title) {
                entities.push(title.clone());
            }
        }
    }
    entities
}

// ============================================================================
// TESTS
// ============================================================================
