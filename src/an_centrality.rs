//! Edge importance scores.
//!
//! Two metrics are provided:
//!
//! - **Betweenness**: fraction of shortest paths between node pairs that cross an edge,
//!   from `rustworkx_core`.
//! - **Current flow**: treat every edge as a unit resistor and sum, over all node pairs,
//!   the current an edge carries when one unit is injected at one node and extracted at the
//!   other. Computed per connected component from the inverse of the grounded Laplacian.
//!
//! Both are full recomputations over the surviving edge set; scores are only valid against
//! the graph they were computed on. Disconnected graphs are fine: pairs in different
//! components contribute nothing.

use hashbrown::HashMap;
use indexmap::IndexMap;
use log::warn;
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use rustworkx_core::centrality::edge_betweenness_centrality;

use crate::an_interface::{Edge, NodeId};
use crate::an_network::Network;

/// Edge -> score, in ascending edge order
pub type CentralityMap = IndexMap<Edge, f64>;

/// Which importance score to compute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CentralityMetric {
    Betweenness,
    CurrentFlow,
}

impl CentralityMetric {
    pub fn compute(&self, network: &Network) -> CentralityMap {
        match self {
            CentralityMetric::Betweenness => edge_betweenness(network),
            CentralityMetric::CurrentFlow => current_flow_betweenness(network),
        }
    }
}

fn empty_map(network: &Network) -> CentralityMap {
    network.edges().into_iter().map(|e| (e, 0.0)).collect()
}

/// Mean score over all edges, 0 for an empty map
pub fn mean_score(scores: &CentralityMap) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    scores.values().sum::<f64>() / scores.len() as f64
}

/// Shortest-path edge betweenness, normalised by `n(n - 1)`
pub fn edge_betweenness(network: &Network) -> CentralityMap {
    let mut scores = empty_map(network);
    if scores.is_empty() {
        return scores;
    }

    let graph = network.graph();
    // one thread, so the per-source sums are added in the same order every run
    let raw = edge_betweenness_centrality(graph, true, usize::MAX);

    for edge in graph.edge_references() {
        let key = Edge::new(edge.source().index(), edge.target().index());
        let value = raw.get(edge.id().index()).copied().flatten();
        if let (Some(score), Some(value)) = (scores.get_mut(&key), value) {
            *score = value;
        }
    }

    scores
}

/// Current-flow (random-walk) edge betweenness, normalised by `(n - 1)(n - 2)`
pub fn current_flow_betweenness(network: &Network) -> CentralityMap {
    let mut scores = empty_map(network);
    let n = network.num_nodes();
    if scores.is_empty() {
        return scores;
    }

    for component in network.components() {
        if component.len() < 2 {
            continue;
        }
        accumulate_component_flow(network, &component, &mut scores);
    }

    if n > 2 {
        let scale = 1.0 / ((n as f64 - 1.0) * (n as f64 - 2.0));
        for score in scores.values_mut() {
            *score *= scale;
        }
    }

    scores
}

fn accumulate_component_flow(network: &Network, component: &[NodeId], scores: &mut CentralityMap) {
    let size = component.len();
    let local: HashMap<NodeId, usize> = component
        .iter()
        .enumerate()
        .map(|(i, &node)| (node, i))
        .collect();

    // Laplacian with the last node grounded (its row and column dropped)
    let reduced = size - 1;
    let mut laplacian = vec![vec![0.0f64; reduced]; reduced];
    for (i, &node) in component.iter().enumerate().take(reduced) {
        laplacian[i][i] = network.degree(node) as f64;
        for neighbor in network.neighbors(node) {
            if let Some(&j) = local.get(&neighbor) {
                if j < reduced {
                    laplacian[i][j] -= 1.0;
                }
            }
        }
    }

    let inverse = match invert(laplacian) {
        Some(inverse) => inverse,
        None => {
            warn!(
                "singular laplacian for component of {} nodes, scoring its edges 0",
                size
            );
            return;
        }
    };
    let potential = |a: usize, s: usize| -> f64 {
        if a < reduced && s < reduced {
            inverse[a][s]
        } else {
            0.0
        }
    };

    let mut row = vec![0.0f64; size];
    for (i, &node) in component.iter().enumerate() {
        for neighbor in network.neighbors(node) {
            if neighbor <= node {
                continue;
            }
            let j = match local.get(&neighbor) {
                Some(&j) => j,
                None => continue,
            };

            for (s, value) in row.iter_mut().enumerate() {
                *value = potential(i, s) - potential(j, s);
            }
            // sum of |row[s] - row[t]| over unordered pairs
            row.sort_by(|a, b| a.total_cmp(b));
            let mut total = 0.0;
            for (k, value) in row.iter().enumerate() {
                total += value * (2.0 * k as f64 - (size as f64 - 1.0));
            }

            if let Some(score) = scores.get_mut(&Edge::new(node, neighbor)) {
                *score += total;
            }
        }
    }
}

/// Gauss-Jordan inverse with partial pivoting
fn invert(mut matrix: Vec<Vec<f64>>) -> Option<Vec<Vec<f64>>> {
    let n = matrix.len();
    let mut inverse: Vec<Vec<f64>> = (0..n)
        .map(|i| {
            let mut row = vec![0.0; n];
            row[i] = 1.0;
            row
        })
        .collect();

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&a, &b| matrix[a][col].abs().total_cmp(&matrix[b][col].abs()))?;
        if matrix[pivot][col].abs() < 1e-12 {
            return None;
        }
        matrix.swap(col, pivot);
        inverse.swap(col, pivot);

        let factor = matrix[col][col];
        for k in 0..n {
            matrix[col][k] /= factor;
            inverse[col][k] /= factor;
        }

        let pivot_row = matrix[col].clone();
        let pivot_inverse = inverse[col].clone();
        for r in 0..n {
            if r == col {
                continue;
            }
            let f = matrix[r][col];
            if f == 0.0 {
                continue;
            }
            for k in 0..n {
                matrix[r][k] -= f * pivot_row[k];
                inverse[r][k] -= f * pivot_inverse[k];
            }
        }
    }

    Some(inverse)
}
