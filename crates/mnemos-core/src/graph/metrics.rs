//! Graph Metrics
//!
//! Authority (damped random walk), personalized walks, articulation points,
//! betweenness, and the bridge set. All algorithms operate over the arena
//! adjacency tables; nothing here holds references between node records.

use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use super::community::{detect_communities, modularity};
use super::LinkGraph;
use crate::vault::GraphConfig;

/// Iteration cap for the authority walk; convergence is typically well
/// inside this on vault-scale graphs
pub const PAGERANK_MAX_ITERATIONS: usize = 50;

/// Fixed iteration count for query-time personalized walks
pub const PERSONALIZED_WALK_ITERATIONS: usize = 20;

const PAGERANK_TOLERANCE: f64 = 1e-9;

// ============================================================================
// AUTHORITY WALK
// ============================================================================

/// PageRank-style damped walk with uniform teleport
pub fn pagerank(graph: &LinkGraph, alpha: f64) -> Vec<f64> {
    personalized(graph, &[], alpha, PAGERANK_MAX_ITERATIONS, true)
}

/// Damped walk with the teleport distribution concentrated on seed nodes
///
/// Falls back to the uniform teleport when `seeds` is empty.
pub fn personalized_pagerank(graph: &LinkGraph, seeds: &[usize], alpha: f64) -> Vec<f64> {
    personalized(graph, seeds, alpha, PERSONALIZED_WALK_ITERATIONS, false)
}

fn personalized(
    graph: &LinkGraph,
    seeds: &[usize],
    alpha: f64,
    max_iterations: usize,
    check_convergence: bool,
) -> Vec<f64> {
    let n = graph.len();
    if n == 0 {
        return Vec::new();
    }

    // Teleport distribution: uniform over seeds, uniform over all when empty
    let uniform = 1.0 / n as f64;
    let mut teleport = vec![0.0; n];
    if seeds.is_empty() {
        teleport.fill(uniform);
    } else {
        let mass = 1.0 / seeds.len() as f64;
        for &seed in seeds {
            teleport[seed] += mass;
        }
    }

    let mut rank = vec![uniform; n];
    let mut next = vec![0.0; n];

    for _ in 0..max_iterations {
        // Mass from nodes without out-links re-enters via the teleport
        let mut sink_mass = 0.0;
        for u in 0..n {
            if graph.out_neighbors(u).is_empty() {
                sink_mass += rank[u];
            }
        }

        for (v, t) in teleport.iter().enumerate() {
            next[v] = (1.0 - alpha) * t + alpha * sink_mass * t;
        }
        for u in 0..n {
            let out = graph.out_neighbors(u);
            if out.is_empty() {
                continue;
            }
            let share = alpha * rank[u] / out.len() as f64;
            for &v in out {
                next[v] += share;
            }
        }

        let delta: f64 = rank
            .iter()
            .zip(next.iter())
            .map(|(a, b)| (a - b).abs())
            .sum();
        std::mem::swap(&mut rank, &mut next);
        if check_convergence && delta < PAGERANK_TOLERANCE {
            break;
        }
    }

    rank
}

// ============================================================================
// ARTICULATION POINTS
// ============================================================================

/// Classic articulation points of the undirected view (iterative low-link DFS)
pub fn articulation_points(adjacency: &[Vec<usize>]) -> HashSet<usize> {
    let n = adjacency.len();
    const UNVISITED: usize = usize::MAX;

    let mut disc = vec![UNVISITED; n];
    let mut low = vec![0usize; n];
    let mut parent = vec![UNVISITED; n];
    let mut points = HashSet::new();
    let mut timer = 0usize;

    for start in 0..n {
        if disc[start] != UNVISITED {
            continue;
        }
        disc[start] = timer;
        low[start] = timer;
        timer += 1;

        let mut root_children = 0usize;
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];

        while let Some(frame) = stack.last_mut() {
            let (u, edge) = *frame;
            if edge < adjacency[u].len() {
                frame.1 += 1;
                let v = adjacency[u][edge];
                if disc[v] == UNVISITED {
                    parent[v] = u;
                    if u == start {
                        root_children += 1;
                    }
                    disc[v] = timer;
                    low[v] = timer;
                    timer += 1;
                    stack.push((v, 0));
                } else if v != parent[u] {
                    low[u] = low[u].min(disc[v]);
                }
            } else {
                stack.pop();
                if let Some(&(p, _)) = stack.last() {
                    low[p] = low[p].min(low[u]);
                    if p != start && low[u] >= disc[p] {
                        points.insert(p);
                    }
                }
            }
        }

        if root_children >= 2 {
            points.insert(start);
        }
    }

    points
}

// ============================================================================
// BETWEENNESS
// ============================================================================

/// Brandes betweenness centrality on the undirected view (reporting only)
pub fn betweenness(adjacency: &[Vec<usize>]) -> Vec<f64> {
    let n = adjacency.len();
    let mut centrality = vec![0.0; n];

    for s in 0..n {
        let mut order = Vec::with_capacity(n);
        let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut sigma = vec![0.0; n];
        let mut dist = vec![-1i64; n];
        sigma[s] = 1.0;
        dist[s] = 0;

        let mut queue = VecDeque::new();
        queue.push_back(s);
        while let Some(v) = queue.pop_front() {
            order.push(v);
            for &w in &adjacency[v] {
                if dist[w] < 0 {
                    dist[w] = dist[v] + 1;
                    queue.push_back(w);
                }
                if dist[w] == dist[v] + 1 {
                    sigma[w] += sigma[v];
                    predecessors[w].push(v);
                }
            }
        }

        let mut delta = vec![0.0; n];
        while let Some(w) = order.pop() {
            for &v in &predecessors[w] {
                delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
            }
            if w != s {
                centrality[w] += delta[w];
            }
        }
    }

    // Each undirected pair is counted from both endpoints
    for value in &mut centrality {
        *value /= 2.0;
    }
    centrality
}

// ============================================================================
// BRIDGE SET
// ============================================================================

fn median_in_degree(graph: &LinkGraph) -> f64 {
    let mut degrees: Vec<usize> = (0..graph.len()).map(|i| graph.in_degree(i)).collect();
    if degrees.is_empty() {
        return 0.0;
    }
    degrees.sort_unstable();
    let mid = degrees.len() / 2;
    if degrees.len() % 2 == 0 {
        (degrees[mid - 1] + degrees[mid]) as f64 / 2.0
    } else {
        degrees[mid] as f64
    }
}

/// Union of the four bridge conditions
///
/// (a) articulation point of the undirected view, (b) in-degree above the
/// hub multiple of the median, (c) role-based title (`"... map"` or
/// `"index"`), (d) cross-project connector (>= 2 project tags, in-degree
/// >= 3).
pub fn bridge_set(graph: &LinkGraph, config: &GraphConfig) -> HashSet<usize> {
    let mut bridges = articulation_points(&graph.undirected());

    let median = median_in_degree(graph);
    for idx in 0..graph.len() {
        let in_degree = graph.in_degree(idx);
        if median > 0.0 && in_degree as f64 > config.hub_degree_multiplier * median {
            bridges.insert(idx);
        }

        let title = graph.title(idx);
        if title.ends_with(" map") || title == "index" {
            bridges.insert(idx);
        }

        if graph.projects(idx).len() >= 2 && in_degree >= 3 {
            bridges.insert(idx);
        }
    }
    bridges
}

// ============================================================================
// METRICS BUNDLE
// ============================================================================

/// The metric set consumed by scoring: ephemeral, recomputed on demand
#[derive(Debug, Clone)]
pub struct GraphMetrics {
    /// Authority score per arena index
    pub pagerank: Vec<f64>,
    /// Largest authority score (normalization denominator)
    pub max_pagerank: f64,
    /// Community identifier per arena index
    pub communities: Vec<usize>,
    /// Number of distinct communities
    pub community_count: usize,
    /// Arena indices in the bridge set
    pub bridges: HashSet<usize>,
}

impl GraphMetrics {
    /// Compute the scoring metrics for a graph
    pub fn compute(graph: &LinkGraph, config: &GraphConfig) -> Self {
        let pagerank = pagerank(graph, config.pagerank_alpha);
        let max_pagerank = pagerank.iter().cloned().fold(0.0, f64::max);
        let undirected = graph.undirected();
        let (communities, community_count) = detect_communities(&undirected);
        let bridges = bridge_set(graph, config);
        Self {
            pagerank,
            max_pagerank,
            communities,
            community_count,
            bridges,
        }
    }

    /// Authority normalized into [0,1]
    pub fn normalized_pagerank(&self, idx: usize) -> f64 {
        if self.max_pagerank > 0.0 {
            self.pagerank[idx] / self.max_pagerank
        } else {
            0.0
        }
    }
}

// ============================================================================
// REPORTING
// ============================================================================

/// Snapshot returned by the `graph_metrics` operation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphMetricsReport {
    pub note_count: usize,
    pub edge_count: usize,
    pub orphan_count: usize,
    pub dangling_count: usize,
    pub community_count: usize,
    pub modularity: f64,
    /// Titles in the bridge set, sorted
    pub bridges: Vec<String>,
    /// Highest-authority titles with their scores, descending
    pub top_authorities: Vec<(String, f64)>,
    /// Highest-betweenness titles with their scores, descending
    pub top_betweenness: Vec<(String, f64)>,
}

impl GraphMetricsReport {
    /// Build the full report, including the reporting-only metrics
    pub fn build(graph: &LinkGraph, config: &GraphConfig, top: usize) -> Self {
        let metrics = GraphMetrics::compute(graph, config);
        let undirected = graph.undirected();
        let betweenness = betweenness(&undirected);

        let mut bridges: Vec<String> = metrics
            .bridges
            .iter()
            .map(|&i| graph.title(i).to_string())
            .collect();
        bridges.sort();

        let top_of = |scores: &[f64]| {
            let mut ranked: Vec<(String, f64)> = scores
                .iter()
                .enumerate()
                .map(|(i, &s)| (graph.title(i).to_string(), s))
                .collect();
            ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            ranked.truncate(top);
            ranked
        };

        Self {
            note_count: graph.len(),
            edge_count: graph.edge_count(),
            orphan_count: graph.orphans().len(),
            dangling_count: graph.dangling().len(),
            community_count: metrics.community_count,
            modularity: modularity(&undirected, &metrics.communities),
            bridges,
            top_authorities: top_of(&metrics.pagerank),
            top_betweenness: top_of(&betweenness),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
