//! Link Graph Module
//!
//! Directed graph over the note corpus, derived from `[[link]]` tokens and
//! rebuildable from scratch in one pass. Nodes live in an arena indexed by
//! title; forward and reverse adjacency tables store arena indices, never
//! references between node records.
//!
//! Metrics (authority walk, communities, articulation points, betweenness,
//! personalized walks) live in the submodules and operate over the arena
//! tables.

mod community;
mod metrics;

pub use community::{detect_communities, modularity};
pub use metrics::{
    articulation_points, betweenness, bridge_set, pagerank, personalized_pagerank, GraphMetrics,
    GraphMetricsReport, PAGERANK_MAX_ITERATIONS, PERSONALIZED_WALK_ITERATIONS,
};

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::vault::Note;

// ============================================================================
// LINK GRAPH
// ============================================================================

/// The directed link graph over the corpus
///
/// Multi-edges are collapsed and self-loops dropped at build time. Targets
/// that name no existing note are tracked as dangling.
#[derive(Debug, Clone, Default)]
pub struct LinkGraph {
    titles: Vec<String>,
    index: HashMap<String, usize>,
    outgoing: Vec<Vec<usize>>,
    incoming: Vec<Vec<usize>>,
    projects: Vec<Vec<String>>,
    dangling: BTreeSet<String>,
}

impl LinkGraph {
    /// Build the graph in one pass over the corpus
    pub fn build(notes: &[Note]) -> Self {
        let mut graph = Self {
            titles: Vec::with_capacity(notes.len()),
            index: HashMap::with_capacity(notes.len()),
            outgoing: vec![Vec::new(); notes.len()],
            incoming: vec![Vec::new(); notes.len()],
            projects: Vec::with_capacity(notes.len()),
            dangling: BTreeSet::new(),
        };

        for (i, note) in notes.iter().enumerate() {
            graph.titles.push(note.title.clone());
            graph.projects.push(note.projects.clone());
            graph.index.insert(note.title.clone(), i);
        }

        for (source, note) in notes.iter().enumerate() {
            for target in &note.links {
                match graph.index.get(target) {
                    Some(&dest) if dest != source => {
                        if !graph.outgoing[source].contains(&dest) {
                            graph.outgoing[source].push(dest);
                            graph.incoming[dest].push(source);
                        }
                    }
                    Some(_) => {}
                    None => {
                        graph.dangling.insert(target.clone());
                    }
                }
            }
        }

        graph
    }

    /// Number of notes in the graph
    pub fn len(&self) -> usize {
        self.titles.len()
    }

    /// Whether the graph has no notes
    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    /// Number of directed edges
    pub fn edge_count(&self) -> usize {
        self.outgoing.iter().map(Vec::len).sum()
    }

    /// Title at an arena index
    pub fn title(&self, idx: usize) -> &str {
        &self.titles[idx]
    }

    /// All titles in arena order
    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    /// Arena index for a title
    pub fn index_of(&self, title: &str) -> Option<usize> {
        self.index.get(title).copied()
    }

    /// Outgoing neighbors of a node
    pub fn out_neighbors(&self, idx: usize) -> &[usize] {
        &self.outgoing[idx]
    }

    /// Incoming neighbors of a node
    pub fn in_neighbors(&self, idx: usize) -> &[usize] {
        &self.incoming[idx]
    }

    /// In-degree of a node
    pub fn in_degree(&self, idx: usize) -> usize {
        self.incoming[idx].len()
    }

    /// Project tags of a node
    pub fn projects(&self, idx: usize) -> &[String] {
        &self.projects[idx]
    }

    /// Undirected view: symmetrized adjacency with self-loops removed
    pub fn undirected(&self) -> Vec<Vec<usize>> {
        let mut adjacency = vec![Vec::new(); self.len()];
        let mut seen: HashSet<(usize, usize)> = HashSet::new();
        for (u, targets) in self.outgoing.iter().enumerate() {
            for &v in targets {
                let key = (u.min(v), u.max(v));
                if u != v && seen.insert(key) {
                    adjacency[u].push(v);
                    adjacency[v].push(u);
                }
            }
        }
        adjacency
    }

    // ------------------------------------------------------------------------
    // Structural queries
    // ------------------------------------------------------------------------

    /// Titles no other note links to, sorted
    pub fn orphans(&self) -> Vec<String> {
        let mut orphans: Vec<String> = (0..self.len())
            .filter(|&i| self.incoming[i].is_empty())
            .map(|i| self.titles[i].clone())
            .collect();
        orphans.sort();
        orphans
    }

    /// Link targets that name no existing note, sorted
    pub fn dangling(&self) -> Vec<String> {
        self.dangling.iter().cloned().collect()
    }

    /// Titles of notes linking to `title`, sorted
    pub fn backlinks(&self, title: &str) -> Vec<String> {
        let Some(idx) = self.index_of(title) else {
            return Vec::new();
        };
        let mut sources: Vec<String> = self.incoming[idx]
            .iter()
            .map(|&s| self.titles[s].clone())
            .collect();
        sources.sort();
        sources
    }

    /// Titles carrying two or more project tags, sorted
    pub fn cross_project(&self) -> Vec<String> {
        let mut titles: Vec<String> = (0..self.len())
            .filter(|&i| self.projects[i].len() >= 2)
            .map(|i| self.titles[i].clone())
            .collect();
        titles.sort();
        titles
    }
}

// ============================================================================
// TESTS
// ============================================================================
