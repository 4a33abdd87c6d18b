use indexmap::IndexMap;
use petgraph::stable_graph::{NodeIndex, StableUnGraph};
use petgraph::unionfind::UnionFind;
use petgraph::visit::{EdgeRef, IntoEdgeReferences};

use crate::an_interface::{Edge, NodeId, NodeState, StateCounts};

/// A single member of the contact network
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub state: NodeState,
    /// Steps spent Undetected; only meaningful while the node is Undetected
    pub exposure_count: u32,
}

/// Graph type the network is stored in
pub type ContactGraph = StableUnGraph<Node, ()>;

fn ix(id: NodeId) -> NodeIndex {
    NodeIndex::new(id)
}

/// Undirected simple contact graph.
///
/// Nodes are created once and never removed, so a node's graph index is its id. Edges can
/// only be removed, so the edge count is non-increasing over a run. Neighbours are handed
/// out in ascending id order, which makes every pass over the graph deterministic.
#[derive(Debug, Clone)]
pub struct Network {
    graph: ContactGraph,
}

impl Network {
    /// Create `num_nodes` Susceptible nodes with no edges
    pub fn new(num_nodes: usize) -> Self {
        let mut graph = ContactGraph::with_capacity(num_nodes, 0);
        for id in 0..num_nodes {
            graph.add_node(Node {
                id,
                state: NodeState::Susceptible,
                exposure_count: 0,
            });
        }
        Self { graph }
    }

    /// Build a network from an explicit edge list; self loops and out of range ids are ignored
    pub fn from_edges(num_nodes: usize, edges: &[(NodeId, NodeId)]) -> Self {
        let mut network = Self::new(num_nodes);
        for &(a, b) in edges {
            network.add_edge(a, b);
        }
        network
    }

    /// Underlying petgraph storage, for graph algorithms
    pub fn graph(&self) -> &ContactGraph {
        &self.graph
    }

    /// Only used while the topology is being built
    pub(crate) fn add_edge(&mut self, a: NodeId, b: NodeId) -> bool {
        if a == b || self.has_edge(a, b) || a >= self.num_nodes() || b >= self.num_nodes() {
            return false;
        }
        self.graph.add_edge(ix(a), ix(b), ());
        true
    }

    pub fn remove_edge(&mut self, edge: Edge) -> bool {
        if edge.high() >= self.num_nodes() {
            return false;
        }
        match self.graph.find_edge(ix(edge.low()), ix(edge.high())) {
            Some(index) => self.graph.remove_edge(index).is_some(),
            None => false,
        }
    }

    pub fn has_edge(&self, a: NodeId, b: NodeId) -> bool {
        a < self.num_nodes()
            && b < self.num_nodes()
            && self.graph.find_edge(ix(a), ix(b)).is_some()
    }

    pub fn num_nodes(&self) -> usize {
        self.graph.node_count()
    }

    pub fn num_edges(&self) -> usize {
        self.graph.edge_count()
    }

    /// Neighbours in ascending id order
    pub fn neighbors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        let mut ids: Vec<NodeId> = self.graph.neighbors(ix(node)).map(|n| n.index()).collect();
        ids.sort_unstable();
        ids.into_iter()
    }

    pub fn degree(&self, node: NodeId) -> usize {
        self.graph.edges(ix(node)).count()
    }

    /// All surviving edges in ascending order
    pub fn edges(&self) -> Vec<Edge> {
        let mut edges: Vec<Edge> = self
            .graph
            .edge_references()
            .map(|e| Edge::new(e.source().index(), e.target().index()))
            .collect();
        edges.sort_unstable();
        edges
    }

    /// Surviving edges with at least one endpoint in the given state
    pub fn edges_incident_to(&self, state: NodeState) -> Vec<Edge> {
        self.edges()
            .into_iter()
            .filter(|e| self.state(e.low()) == state || self.state(e.high()) == state)
            .collect()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.graph[ix(id)]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.graph[ix(id)]
    }

    /// Nodes in ascending id order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.graph.node_indices().map(move |i| &self.graph[i])
    }

    pub fn state(&self, id: NodeId) -> NodeState {
        self.node(id).state
    }

    pub fn set_state(&mut self, id: NodeId, state: NodeState) {
        self.node_mut(id).state = state;
    }

    pub fn counts(&self) -> StateCounts {
        let mut counts = StateCounts::default();
        for node in self.nodes() {
            match node.state {
                NodeState::Susceptible => counts.susceptible += 1,
                NodeState::Undetected => counts.undetected += 1,
                NodeState::Infectious => counts.infectious += 1,
                NodeState::Recovered => counts.recovered += 1,
            }
        }
        counts
    }

    /// Connected components, each listed in ascending node order and ordered by their
    /// smallest node
    pub fn components(&self) -> Vec<Vec<NodeId>> {
        let mut sets = UnionFind::<usize>::new(self.num_nodes());
        for edge in self.graph.edge_references() {
            sets.union(edge.source().index(), edge.target().index());
        }

        let mut components: IndexMap<usize, Vec<NodeId>> = IndexMap::new();
        for (id, label) in sets.into_labeling().into_iter().enumerate() {
            components.entry(label).or_default().push(id);
        }
        components.into_values().collect()
    }
}
