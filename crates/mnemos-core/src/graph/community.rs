//! Community Detection
//!
//! Modularity-based clustering on the undirected view of the link graph.
//! Label propagation drives the assignment; `modularity` scores the result
//! for reporting. Downstream consumers use community identifiers only, so
//! the non-unique optimum of modularity clustering is acceptable.

use std::collections::HashMap;

const MAX_SWEEPS: usize = 20;

/// Assign a community identifier to every node
///
/// Returns `(assignments, community_count)` with identifiers renumbered
/// densely from zero in first-appearance order. Isolated nodes form
/// singleton communities.
pub fn detect_communities(adjacency: &[Vec<usize>]) -> (Vec<usize>, usize) {
    let n = adjacency.len();
    let mut labels: Vec<usize> = (0..n).collect();

    for _ in 0..MAX_SWEEPS {
        let mut changed = false;
        for u in 0..n {
            if adjacency[u].is_empty() {
                continue;
            }
            let mut counts: HashMap<usize, usize> = HashMap::new();
            for &v in &adjacency[u] {
                *counts.entry(labels[v]).or_default() += 1;
            }
            // Most frequent neighbor label; ties resolve to the smallest
            let best = counts
                .into_iter()
                .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
                .map(|(label, _)| label)
                .unwrap_or(labels[u]);
            if best != labels[u] {
                labels[u] = best;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    renumber(labels)
}

fn renumber(labels: Vec<usize>) -> (Vec<usize>, usize) {
    let mut mapping: HashMap<usize, usize> = HashMap::new();
    let mut dense = Vec::with_capacity(labels.len());
    for label in labels {
        let next = mapping.len();
        dense.push(*mapping.entry(label).or_insert(next));
    }
    let count = mapping.len();
    (dense, count)
}

/// Newman modularity of an assignment over the undirected view
pub fn modularity(adjacency: &[Vec<usize>], labels: &[usize]) -> f64 {
    let two_m: f64 = adjacency.iter().map(|neighbors| neighbors.len() as f64).sum();
    if two_m == 0.0 {
        return 0.0;
    }

    let mut score = 0.0;
    for (u, neighbors) in adjacency.iter().enumerate() {
        for &v in neighbors {
            if labels[u] == labels[v] {
                score += 1.0 - adjacency[u].len() as f64 * adjacency[v].len() as f64 / two_m;
            }
        }
    }
    score / two_m
}

// ============================================================================
// TESTS
// ============================================================================
