use std::fmt;

// node ids are dense indices into the network's node table
pub type NodeId = usize;

pub type TimeStep = usize;

/// Epidemic state of a single node.
///
/// States only move forward along `Susceptible -> Undetected -> Infectious -> Recovered`
/// (stages may be skipped, never revisited). `Recovered` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeState {
    Susceptible,
    Undetected,
    Infectious,
    Recovered,
}

impl NodeState {
    /// Position along the progression, used to check that nodes never move backward
    pub fn rank(self) -> u8 {
        match self {
            NodeState::Susceptible => 0,
            NodeState::Undetected => 1,
            NodeState::Infectious => 2,
            NodeState::Recovered => 3,
        }
    }

    /// Undetected and Infectious nodes both spread and can recover
    pub fn is_contagious(self) -> bool {
        matches!(self, NodeState::Undetected | NodeState::Infectious)
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeState::Susceptible => "S",
            NodeState::Undetected => "U",
            NodeState::Infectious => "I",
            NodeState::Recovered => "R",
        };
        write!(f, "{}", s)
    }
}

/// Undirected edge, always stored with the smaller id first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Edge(NodeId, NodeId);

impl Edge {
    pub fn new(a: NodeId, b: NodeId) -> Self {
        if a <= b {
            Edge(a, b)
        } else {
            Edge(b, a)
        }
    }

    pub fn low(&self) -> NodeId {
        self.0
    }

    pub fn high(&self) -> NodeId {
        self.1
    }

    pub fn touches(&self, node: NodeId) -> bool {
        self.0 == node || self.1 == node
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.0, self.1)
    }
}

/// Per-state node counts at one point in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateCounts {
    pub susceptible: usize,
    pub undetected: usize,
    pub infectious: usize,
    pub recovered: usize,
}

impl StateCounts {
    pub fn total(&self) -> usize {
        self.susceptible + self.undetected + self.infectious + self.recovered
    }

    /// No contagious node left: no further transition can happen
    pub fn is_extinguished(&self) -> bool {
        self.undetected == 0 && self.infectious == 0
    }
}

/// Column layout of the per-timestep output record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSchema {
    /// `timestep,s,i,r`
    Baseline,
    /// `timestep,s,u,i,r`
    Detection,
    /// `timestep,s,u,i,r,meanBetweenness`
    Centrality,
}

impl RecordSchema {
    pub fn header(&self) -> &'static str {
        match self {
            RecordSchema::Baseline => "timestep,s,i,r",
            RecordSchema::Detection => "timestep,s,u,i,r",
            RecordSchema::Centrality => "timestep,s,u,i,r,meanBetweenness",
        }
    }
}

/// One logical output record
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsRecord {
    pub timestep: TimeStep,
    pub counts: StateCounts,
    pub mean_betweenness: Option<f64>,
}

impl MetricsRecord {
    /// Render as a CSV line (without newline) in the given layout
    pub fn to_csv(&self, schema: RecordSchema) -> String {
        let c = &self.counts;
        match schema {
            RecordSchema::Baseline => format!(
                "{},{},{},{}",
                self.timestep, c.susceptible, c.infectious, c.recovered
            ),
            RecordSchema::Detection => format!(
                "{},{},{},{},{}",
                self.timestep, c.susceptible, c.undetected, c.infectious, c.recovered
            ),
            RecordSchema::Centrality => format!(
                "{},{},{},{},{},{}",
                self.timestep,
                c.susceptible,
                c.undetected,
                c.infectious,
                c.recovered,
                self.mean_betweenness.unwrap_or(0.0)
            ),
        }
    }
}

/// Destination for per-timestep records.
///
/// Emission is fire-and-forget from the simulation's point of view: the scheduler
/// reports an `Err` and keeps going.
pub trait MetricsSink {
    fn emit(&mut self, schema: RecordSchema, record: &MetricsRecord) -> std::io::Result<()>;

    fn finish(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// No-op sink for runs where only the returned history matters
pub struct NoOpSink;

impl MetricsSink for NoOpSink {
    #[inline(always)]
    fn emit(&mut self, _schema: RecordSchema, _record: &MetricsRecord) -> std::io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_is_normalized() {
        assert_eq!(Edge::new(3, 1), Edge::new(1, 3));
        assert_eq!(Edge::new(3, 1).low(), 1);
        assert!(Edge::new(3, 1).touches(3));
        assert!(!Edge::new(3, 1).touches(2));
    }

    #[test]
    fn test_record_layouts() {
        let record = MetricsRecord {
            timestep: 4,
            counts: StateCounts {
                susceptible: 10,
                undetected: 2,
                infectious: 3,
                recovered: 5,
            },
            mean_betweenness: Some(0.5),
        };

        assert_eq!(record.to_csv(RecordSchema::Baseline), "4,10,3,5");
        assert_eq!(record.to_csv(RecordSchema::Detection), "4,10,2,3,5");
        assert_eq!(record.to_csv(RecordSchema::Centrality), "4,10,2,3,5,0.5");
    }

    #[test]
    fn test_extinction() {
        let counts = StateCounts {
            susceptible: 3,
            recovered: 1,
            ..Default::default()
        };
        assert!(counts.is_extinguished());
        assert_eq!(counts.total(), 4);
    }
}
