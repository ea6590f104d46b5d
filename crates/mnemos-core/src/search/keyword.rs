//! Keyword Search (BM25)
//!
//! Field-weighted inverted index with Okapi BM25 scoring. Title and
//! description tokens contribute boosted copies to the document bag, so a
//! title hit outranks the same term buried in a body.

use std::collections::HashMap;

use crate::vault::{Bm25Config, Note};

/// Minimum token length kept by the tokenizer
const MIN_TOKEN_LEN: usize = 2;

/// Fixed English stopword list
const STOPWORDS: &[&str] = &[
    "about", "after", "again", "all", "also", "an", "and", "any", "are", "as", "at", "be", "been",
    "before", "being", "between", "both", "but", "by", "can", "could", "did", "do", "does", "down",
    "each", "few", "for", "from", "further", "had", "has", "have", "her", "here", "him", "his",
    "how", "if", "in", "into", "is", "it", "its", "just", "me", "more", "most", "my", "no", "not",
    "now", "of", "on", "once", "only", "or", "our", "out", "over", "own", "same", "should", "so",
    "some", "such", "than", "that", "the", "their", "them", "then", "there", "these", "they",
    "this", "to", "too", "under", "up", "very", "was", "we", "were", "what", "when", "where",
    "which", "who", "why", "will", "with", "would", "you", "your",
];

/// Lowercase, split on non-alphanumerics, drop short tokens and stopwords
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.len() >= MIN_TOKEN_LEN)
        .filter(|token| !STOPWORDS.contains(token))
        .map(str::to_string)
        .collect()
}

// ============================================================================
// KEYWORD INDEX
// ============================================================================

/// Inverted index over the corpus with weighted term frequencies
pub struct KeywordIndex {
    /// term -> (document, weighted frequency)
    postings: HashMap<String, Vec<(usize, f64)>>,
    /// Weighted token count per document
    doc_lengths: Vec<f64>,
    titles: Vec<String>,
    avg_doc_length: f64,
    config: Bm25Config,
}

impl KeywordIndex {
    /// Build the index over a corpus
    pub fn build(notes: &[Note], config: Bm25Config) -> Self {
        let mut postings: HashMap<String, Vec<(usize, f64)>> = HashMap::new();
        let mut doc_lengths = Vec::with_capacity(notes.len());
        let mut titles = Vec::with_capacity(notes.len());

        for (doc, note) in notes.iter().enumerate() {
            let mut bag: HashMap<String, f64> = HashMap::new();
            let mut length = 0.0;

            let mut add = |bag: &mut HashMap<String, f64>, text: &str, weight: f64| {
                let mut total = 0.0;
                for token in tokenize(text) {
                    *bag.entry(token).or_default() += weight;
                    total += weight;
                }
                total
            };

            length += add(&mut bag, &note.title, config.title_boost);
            if let Some(description) = &note.description {
                length += add(&mut bag, description, config.description_boost);
            }
            length += add(&mut bag, &note.body, 1.0);

            for (term, frequency) in bag {
                postings.entry(term).or_default().push((doc, frequency));
            }
            doc_lengths.push(length);
            titles.push(note.title.clone());
        }

        let avg_doc_length = if doc_lengths.is_empty() {
            0.0
        } else {
            doc_lengths.iter().sum::<f64>() / doc_lengths.len() as f64
        };

        Self {
            postings,
            doc_lengths,
            titles,
            avg_doc_length,
            config,
        }
    }

    /// Number of indexed documents
    pub fn len(&self) -> usize {
        self.titles.len()
    }

    /// Whether the index is empty
    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    /// Score the corpus against a query, descending, positive scores only
    pub fn search(&self, query: &str, limit: usize) -> Vec<(String, f64)> {
        if self.is_empty() {
            return Vec::new();
        }

        let n = self.len() as f64;
        let mut seen = std::collections::HashSet::new();
        let mut terms = tokenize(query);
        terms.retain(|term| seen.insert(term.clone()));

        let mut scores: HashMap<usize, f64> = HashMap::new();
        for term in terms {
            let Some(posting) = self.postings.get(&term) else {
                continue;
            };
            let df = posting.len() as f64;
            let idf = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();

            for &(doc, tf) in posting {
                let dl = self.doc_lengths[doc];
                let norm = 1.0 - self.config.b
                    + self.config.b * dl / self.avg_doc_length.max(f64::EPSILON);
                let tf_norm = tf * (self.config.k1 + 1.0) / (tf + self.config.k1 * norm);
                *scores.entry(doc).or_default() += idf * tf_norm;
            }
        }

        let mut ranked: Vec<(String, f64)> = scores
            .into_iter()
            .filter(|&(_, score)| score > 0.0)
            .map(|(doc, score)| (self.titles[doc].clone(), score))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(limit);
        ranked
    }
}

// ============================================================================
// TESTS
// ============================================================================
