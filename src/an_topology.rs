//! Initial network construction.
//!
//! Builds a Watts–Strogatz small world and seeds the initial epidemic states. Rewiring
//! consumes the same generator as the rest of the run, so a seed pins the topology too.

use log::{debug, info};
use rand::Rng;

use crate::an_interface::{Edge, NodeId, NodeState};
use crate::an_network::Network;

/// Parameters for the small-world topology and the initial seeding
#[derive(Debug, Clone)]
pub struct TopologyConfig {
    pub num_nodes: usize,
    /// Lattice degree before rewiring; each node links to `connectivity / 2` neighbours per side
    pub connectivity: usize,
    /// Probability that a lattice edge is rewired to a random endpoint
    pub rewiring: f64,
    /// Uniform draws (with repetition) set to Infectious
    pub initial_infectious: usize,
    /// Uniform draws (with repetition) set to Recovered
    pub initial_recovered: usize,
}

/// Ring lattice with random rewiring
pub fn watts_strogatz<R: Rng + ?Sized>(
    rng: &mut R,
    num_nodes: usize,
    connectivity: usize,
    rewiring: f64,
) -> Network {
    let mut network = Network::new(num_nodes);
    if num_nodes < 2 {
        return network;
    }

    let half = connectivity / 2;
    for offset in 1..=half {
        for u in 0..num_nodes {
            network.add_edge(u, (u + offset) % num_nodes);
        }
    }

    if rewiring <= 0.0 {
        return network;
    }

    for offset in 1..=half {
        for u in 0..num_nodes {
            let v = (u + offset) % num_nodes;
            if !rng.gen_bool(rewiring) {
                continue;
            }
            // u already linked to everyone, nowhere to rewire to
            if network.degree(u) >= num_nodes - 1 {
                continue;
            }
            let mut w = rng.gen_range(0..num_nodes);
            while w == u || network.has_edge(u, w) {
                w = rng.gen_range(0..num_nodes);
            }
            if network.remove_edge(Edge::new(u, v)) {
                network.add_edge(u, w);
            }
        }
    }

    network
}

/// Set `count` uniformly drawn nodes to `state`; repeated draws are idempotent
pub fn seed_states<R: Rng + ?Sized>(
    rng: &mut R,
    network: &mut Network,
    count: usize,
    state: NodeState,
) -> Vec<NodeId> {
    if network.num_nodes() == 0 {
        return Vec::new();
    }
    let mut drawn = Vec::with_capacity(count);
    for _ in 0..count {
        let id = rng.gen_range(0..network.num_nodes());
        network.set_state(id, state);
        drawn.push(id);
    }
    drawn
}

/// Build the topology and seed Recovered then Infectious nodes
pub fn build_network<R: Rng + ?Sized>(rng: &mut R, config: &TopologyConfig) -> Network {
    let mut network = watts_strogatz(rng, config.num_nodes, config.connectivity, config.rewiring);

    seed_states(rng, &mut network, config.initial_recovered, NodeState::Recovered);
    let infectious = seed_states(
        rng,
        &mut network,
        config.initial_infectious,
        NodeState::Infectious,
    );
    debug!("seeded infectious nodes: {:?}", infectious);

    info!(
        "built network: {} nodes, {} edges",
        network.num_nodes(),
        network.num_edges()
    );
    network
}

/// Log a textual rendering of the network.
///
/// Summary at info, full adjacency at debug.
pub fn display_network(network: &Network) {
    let max_degree = (0..network.num_nodes())
        .map(|n| network.degree(n))
        .max()
        .unwrap_or(0);
    let mut histogram = vec![0usize; max_degree + 1];
    for n in 0..network.num_nodes() {
        histogram[network.degree(n)] += 1;
    }

    info!(
        "topology: {} nodes, {} edges, {} components",
        network.num_nodes(),
        network.num_edges(),
        network.components().len()
    );
    for (degree, count) in histogram.iter().enumerate() {
        if *count > 0 {
            info!("  degree {:>3}: {} nodes", degree, count);
        }
    }
    for node in network.nodes() {
        let neighbors: Vec<NodeId> = network.neighbors(node.id).collect();
        debug!("  {:>4} [{}] -> {:?}", node.id, node.state, neighbors);
    }
}
