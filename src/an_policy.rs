//! Edge removal interventions.
//!
//! Pre-hardening runs once before the first timestep and removes the top
//! `floor(edges * prer)` edges by current-flow betweenness. Adaptive removal runs every
//! timestep: edges incident to Infectious nodes are the targets, and a budget of
//! `restrict` edges is spent on the composite ranking `(is_target, betweenness)`. A budget
//! of zero isolates every Infectious node instead.

use std::cmp::Ordering;

use hashbrown::HashSet;
use log::{debug, info};

use crate::an_centrality::{CentralityMap, CentralityMetric};
use crate::an_interface::{Edge, NodeState};
use crate::an_network::Network;

/// Outcome of one removal pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemovalReport {
    /// Edges removed, in removal order
    pub removed: Vec<Edge>,
    /// Edges incident to Infectious nodes when the pass started
    pub targets: usize,
}

/// An edge together with the key it is ranked by
#[derive(Debug, Clone, Copy)]
struct RankedEdge {
    edge: Edge,
    is_target: bool,
    score: f64,
}

/// Total order: higher priority first.
///
/// Targets outrank non-targets, higher scores outrank lower ones, and remaining ties go to
/// the smaller edge so the order never depends on map iteration.
fn priority(a: &RankedEdge, b: &RankedEdge) -> Ordering {
    b.is_target
        .cmp(&a.is_target)
        .then_with(|| b.score.total_cmp(&a.score))
        .then_with(|| a.edge.cmp(&b.edge))
}

fn rank(scores: &CentralityMap, targets: &HashSet<Edge>) -> Vec<RankedEdge> {
    let mut ranked: Vec<RankedEdge> = scores
        .iter()
        .map(|(edge, score)| RankedEdge {
            edge: *edge,
            is_target: targets.contains(edge),
            score: *score,
        })
        .collect();
    ranked.sort_by(priority);
    ranked
}

/// Number of edges pre-hardening removes for a fraction `prer`
pub fn prehardening_budget(total_edges: usize, prer: f64) -> usize {
    ((total_edges as f64 * prer).floor() as usize).min(total_edges)
}

/// One-time removal of the structurally most important edges
pub fn preharden(network: &mut Network, prer: f64) -> RemovalReport {
    let budget = prehardening_budget(network.num_edges(), prer);
    let mut report = RemovalReport::default();
    if budget == 0 {
        info!("pre-hardening: nothing to remove (prer={})", prer);
        return report;
    }

    let scores = CentralityMetric::CurrentFlow.compute(network);
    let ranked = rank(&scores, &HashSet::new());

    for entry in ranked.into_iter().take(budget) {
        debug!("pre-hardening removes {} (score {:.6})", entry.edge, entry.score);
        network.remove_edge(entry.edge);
        report.removed.push(entry.edge);
    }

    info!(
        "pre-hardening removed {} of {} edges",
        report.removed.len(),
        report.removed.len() + network.num_edges()
    );
    report
}

/// Per-timestep adaptive removal
#[derive(Debug, Clone)]
pub struct AdaptiveRemoval {
    /// Edges removed per step; 0 removes every target edge
    pub restrict: usize,
}

impl AdaptiveRemoval {
    pub fn new(restrict: usize) -> Self {
        Self { restrict }
    }

    pub fn step(&self, network: &mut Network) -> RemovalReport {
        let targets = network.edges_incident_to(NodeState::Infectious);
        let mut report = RemovalReport {
            removed: Vec::new(),
            targets: targets.len(),
        };

        if self.restrict == 0 {
            for edge in targets {
                network.remove_edge(edge);
                report.removed.push(edge);
            }
            debug!("isolation: removed {} target edges", report.removed.len());
            return report;
        }

        let scores = CentralityMetric::Betweenness.compute(network);
        let targets: HashSet<Edge> = targets.into_iter().collect();
        let ranked = rank(&scores, &targets);

        for entry in ranked.into_iter().take(self.restrict) {
            debug!(
                "removing {} (target={}, betweenness {:.6})",
                entry.edge, entry.is_target, entry.score
            );
            network.remove_edge(entry.edge);
            report.removed.push(entry.edge);
        }

        debug!(
            "adaptive removal: {} removed, {} targets, {} edges left",
            report.removed.len(),
            report.targets,
            network.num_edges()
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // two triangles joined by the 2-3 bridge
    fn barbell() -> Network {
        Network::from_edges(
            6,
            &[(0, 1), (1, 2), (0, 2), (2, 3), (3, 4), (4, 5), (3, 5)],
        )
    }

    #[test]
    fn test_priority_is_total_order() {
        let a = RankedEdge {
            edge: Edge::new(0, 1),
            is_target: false,
            score: 0.9,
        };
        let b = RankedEdge {
            edge: Edge::new(1, 2),
            is_target: true,
            score: 0.1,
        };
        let c = RankedEdge {
            edge: Edge::new(0, 2),
            is_target: false,
            score: 0.9,
        };
        assert_eq!(priority(&b, &a), Ordering::Less);
        assert_eq!(priority(&a, &c), Ordering::Less);
        assert_eq!(priority(&a, &a), Ordering::Equal);
    }

    #[test]
    fn test_isolation_removes_all_target_edges() {
        let mut network = barbell();
        network.set_state(2, NodeState::Infectious);

        let report = AdaptiveRemoval::new(0).step(&mut network);

        assert_eq!(report.targets, 3);
        assert_eq!(report.removed.len(), 3);
        assert_eq!(network.degree(2), 0);
        assert_eq!(network.num_edges(), 4);
    }

    #[test]
    fn test_targets_outrank_higher_betweenness() {
        let mut network = barbell();
        // 0-1 has low betweenness, the bridge has the highest
        network.set_state(0, NodeState::Infectious);
        network.set_state(1, NodeState::Infectious);

        let report = AdaptiveRemoval::new(2).step(&mut network);

        assert_eq!(report.targets, 3);
        assert_eq!(report.removed.len(), 2);
        for edge in &report.removed {
            assert!(edge.touches(0) || edge.touches(1));
        }
        assert!(network.has_edge(2, 3));
    }

    #[test]
    fn test_spare_budget_goes_to_highest_betweenness() {
        let mut network = barbell();
        network.set_state(0, NodeState::Infectious);

        let report = AdaptiveRemoval::new(3).step(&mut network);

        // both edges of node 0 first, then the bridge
        assert_eq!(report.removed.len(), 3);
        assert!(report.removed[..2].iter().all(|e| e.touches(0)));
        assert_eq!(report.removed[2], Edge::new(2, 3));
    }

    #[test]
    fn test_budget_clamps_to_available_edges() {
        let mut network = barbell();
        network.set_state(4, NodeState::Infectious);

        let report = AdaptiveRemoval::new(50).step(&mut network);

        assert_eq!(report.removed.len(), 7);
        assert_eq!(network.num_edges(), 0);
    }

    #[test]
    fn test_prehardening_budget() {
        assert_eq!(prehardening_budget(7, 0.0), 0);
        assert_eq!(prehardening_budget(7, 0.3), 2);
        assert_eq!(prehardening_budget(7, 1.0), 7);
    }

    #[test]
    fn test_preharden_removes_bridge_first() {
        let mut network = barbell();
        let report = preharden(&mut network, 0.15);

        assert_eq!(report.removed, vec![Edge::new(2, 3)]);
        assert_eq!(network.num_edges(), 6);
        assert_eq!(network.components().len(), 2);
    }

    #[test]
    fn test_preharden_follows_current_flow_ranking() {
        let mut network = barbell();
        let scores = CentralityMetric::CurrentFlow.compute(&network);

        // floor(7 * 0.45) = 3
        let report = preharden(&mut network, 0.45);

        assert_eq!(report.removed.len(), 3);
        assert_eq!(report.removed[0], Edge::new(2, 3));
        let expected: Vec<Edge> = rank(&scores, &HashSet::new())
            .into_iter()
            .take(3)
            .map(|r| r.edge)
            .collect();
        assert_eq!(report.removed, expected);

        for pair in report.removed.windows(2) {
            assert!(scores[&pair[0]] >= scores[&pair[1]]);
        }
        let lowest_removed = scores[&report.removed[2]];
        for edge in network.edges() {
            assert!(scores[&edge] <= lowest_removed);
        }
        assert_eq!(network.num_edges(), 4);
    }

    #[test]
    fn test_preharden_zero_fraction_is_noop() {
        let mut network = barbell();
        let report = preharden(&mut network, 0.0);
        assert!(report.removed.is_empty());
        assert_eq!(network.num_edges(), 7);
    }
}
