use log::{debug, trace};
use rand::Rng;

use crate::an_error::SamplerError;
use crate::an_interface::{NodeId, NodeState};
use crate::an_network::Network;
use crate::an_sampler::sample;

/// Transitions applied during one spread/recovery or discovery pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransitionCounts {
    pub infections: usize,
    pub recoveries: usize,
    pub detections: usize,
}

/// Contagion spread and recovery.
///
/// One pass per timestep. The spreaders are the nodes that are contagious when the pass
/// starts, visited in ascending id order. Neighbour states are read live: a neighbour
/// infected by an earlier spreader is no longer Susceptible and is not contacted again.
/// Recovery is drawn afterwards for every node contagious at that point, including nodes
/// infected earlier in the same pass.
#[derive(Debug, Clone)]
pub struct EpidemicEngine {
    /// Transmission probability per contact
    pub beta: f64,
    /// Recovery probability per step
    pub gamma: f64,
    /// State given to newly infected nodes: Undetected with detection, Infectious without
    pub infected_state: NodeState,
}

impl EpidemicEngine {
    pub fn new(beta: f64, gamma: f64, detection: bool) -> Self {
        Self {
            beta,
            gamma,
            infected_state: if detection {
                NodeState::Undetected
            } else {
                NodeState::Infectious
            },
        }
    }

    pub fn step<R: Rng + ?Sized>(
        &self,
        network: &mut Network,
        rng: &mut R,
    ) -> Result<TransitionCounts, SamplerError> {
        let mut counts = TransitionCounts::default();

        let spreaders: Vec<NodeId> = network
            .nodes()
            .filter(|n| n.state.is_contagious())
            .map(|n| n.id)
            .collect();

        let mut contacts: Vec<NodeId> = Vec::new();
        for &spreader in &spreaders {
            contacts.clear();
            contacts.extend(network.neighbors(spreader));
            for &contact in &contacts {
                if network.state(contact) != NodeState::Susceptible {
                    continue;
                }
                if sample(rng, self.beta)? {
                    trace!("{} infects {}", spreader, contact);
                    let node = network.node_mut(contact);
                    node.state = self.infected_state;
                    node.exposure_count = 0;
                    counts.infections += 1;
                }
            }
        }

        for id in 0..network.num_nodes() {
            if !network.state(id).is_contagious() {
                continue;
            }
            if sample(rng, self.gamma)? {
                trace!("{} recovers", id);
                network.set_state(id, NodeState::Recovered);
                counts.recoveries += 1;
            }
        }

        debug!(
            "spread: {} spreaders, {} infections, {} recoveries",
            spreaders.len(),
            counts.infections,
            counts.recoveries
        );
        Ok(counts)
    }
}

/// Dwell-time detection of Undetected nodes.
///
/// Each pass increments the exposure counter of every Undetected node and promotes it to
/// Infectious once the counter reaches the threshold. Deterministic.
#[derive(Debug, Clone)]
pub struct DiscoveryTracker {
    pub threshold: u32,
}

impl DiscoveryTracker {
    pub fn new(threshold: u32) -> Self {
        Self { threshold }
    }

    pub fn advance(&self, network: &mut Network) -> TransitionCounts {
        let mut counts = TransitionCounts::default();

        for id in 0..network.num_nodes() {
            let node = network.node_mut(id);
            if node.state != NodeState::Undetected {
                continue;
            }
            node.exposure_count += 1;
            if node.exposure_count >= self.threshold {
                trace!("{} detected after {} steps", id, node.exposure_count);
                node.state = NodeState::Infectious;
                counts.detections += 1;
            }
        }

        debug!("discovery: {} detections", counts.detections);
        counts
    }
}
