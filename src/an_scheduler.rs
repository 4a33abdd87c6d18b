// Simulation Scheduler

use log::{debug, error, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::an_centrality::CentralityMetric;
use crate::an_config::{format_seed_hex, RunOptions, SimulationConfig};
use crate::an_epidemic::{DiscoveryTracker, EpidemicEngine, TransitionCounts};
use crate::an_error::SimError;
use crate::an_interface::{MetricsRecord, MetricsSink, RecordSchema, StateCounts, TimeStep};
use crate::an_metrics::MetricsRecorder;
use crate::an_network::Network;
use crate::an_policy::{preharden, AdaptiveRemoval};
use crate::an_topology::{build_network, display_network};

// ============================================================================
// Result
// ============================================================================

/// Why the timestep loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The configured number of steps ran
    HorizonReached,
    /// No Undetected or Infectious node left at the end of the given step
    Extinguished(TimeStep),
}

/// Outcome of a complete run
#[derive(Debug, Clone)]
pub struct SimulationResult {
    /// Random seed used
    pub seed_used: [u8; 32],

    /// Timesteps executed, equal to the number of records emitted
    pub steps_executed: usize,

    pub termination: Termination,

    /// Record layout used for the history
    pub schema: RecordSchema,

    /// Edges removed before the first timestep
    pub prehardening_removed: usize,

    /// Edges removed by adaptive removal over the whole run
    pub adaptive_removed: usize,

    /// Records a sink failed to write
    pub emit_failures: usize,

    /// Edges still present at the end
    pub final_edges: usize,

    /// Infections, recoveries and detections summed over the run
    pub transitions: TransitionCounts,

    /// One record per executed timestep
    pub history: Vec<MetricsRecord>,
}

impl SimulationResult {
    pub fn final_counts(&self) -> StateCounts {
        self.history
            .last()
            .map(|r| r.counts)
            .unwrap_or_default()
    }

    /// Highest Undetected + Infectious count over the run
    pub fn peak_contagious(&self) -> usize {
        self.history
            .iter()
            .map(|r| r.counts.undetected + r.counts.infectious)
            .max()
            .unwrap_or(0)
    }

    pub fn print_summary(&self) {
        let last = self.final_counts();
        println!("Seed: {}", format_seed_hex(&self.seed_used));
        println!("Steps executed: {}", self.steps_executed);
        match self.termination {
            Termination::HorizonReached => println!("Termination: horizon reached"),
            Termination::Extinguished(step) => {
                println!("Termination: extinguished at step {}", step)
            }
        }
        println!(
            "Final: S={} U={} I={} R={}",
            last.susceptible, last.undetected, last.infectious, last.recovered
        );
        println!("Peak contagious: {}", self.peak_contagious());
        println!(
            "Transitions: {} infections, {} recoveries, {} detections",
            self.transitions.infections, self.transitions.recoveries, self.transitions.detections
        );
        println!(
            "Edges removed: {} pre-hardening, {} adaptive, {} left",
            self.prehardening_removed, self.adaptive_removed, self.final_edges
        );
        if self.emit_failures > 0 {
            println!("Records not written: {}", self.emit_failures);
        }
    }
}

// ============================================================================
// Scheduler
// ============================================================================

/// Sequences the phases of every timestep.
///
/// Order per step is fixed: spread and recovery, discovery, adaptive removal, metrics.
/// Pre-hardening, when enabled, runs once before step 0.
#[derive(Debug, Clone)]
pub struct Scheduler {
    horizon: usize,
    engine: EpidemicEngine,
    discovery: Option<DiscoveryTracker>,
    adaptive: Option<AdaptiveRemoval>,
    prer: Option<f64>,
}

impl Scheduler {
    /// Spread and recovery only; detection, removal and pre-hardening are added with the
    /// `with_*` methods
    pub fn new(horizon: usize, beta: f64, gamma: f64) -> Self {
        Self {
            horizon,
            engine: EpidemicEngine::new(beta, gamma, false),
            discovery: None,
            adaptive: None,
            prer: None,
        }
    }

    pub fn with_discovery(mut self, threshold: u32) -> Self {
        self.engine = EpidemicEngine::new(self.engine.beta, self.engine.gamma, true);
        self.discovery = Some(DiscoveryTracker::new(threshold));
        self
    }

    pub fn with_adaptive_removal(mut self, restrict: usize) -> Self {
        self.adaptive = Some(AdaptiveRemoval::new(restrict));
        self
    }

    pub fn with_prehardening(mut self, prer: f64) -> Self {
        self.prer = Some(prer);
        self
    }

    pub fn from_config(config: &SimulationConfig, options: &RunOptions) -> Self {
        let mut scheduler = Self::new(config.time, config.beta, config.gamma);
        if let Some(threshold) = config.discovery {
            scheduler = scheduler.with_discovery(threshold);
        }
        if options.adaptive {
            scheduler = scheduler.with_adaptive_removal(config.restrict);
        }
        if options.prer_mode {
            scheduler = scheduler.with_prehardening(config.prer);
        }
        scheduler
    }

    /// Records carry a centrality column whenever an intervention is active
    pub fn recorder(&self) -> MetricsRecorder {
        let diagnostic = if self.adaptive.is_some() {
            Some(CentralityMetric::Betweenness)
        } else if self.prer.is_some() {
            Some(CentralityMetric::CurrentFlow)
        } else {
            None
        };
        MetricsRecorder::new(self.discovery.is_some(), diagnostic)
    }

    /// Run until the horizon or extinction.
    ///
    /// Sink failures are logged and counted; they never stop the loop.
    pub fn run<R: Rng + ?Sized>(
        &self,
        network: &mut Network,
        rng: &mut R,
        sink: &mut dyn MetricsSink,
        seed_used: [u8; 32],
    ) -> Result<SimulationResult, SimError> {
        let recorder = self.recorder();
        let total_nodes = network.num_nodes();

        let mut result = SimulationResult {
            seed_used,
            steps_executed: 0,
            termination: Termination::HorizonReached,
            schema: recorder.schema(),
            prehardening_removed: 0,
            adaptive_removed: 0,
            emit_failures: 0,
            final_edges: network.num_edges(),
            transitions: TransitionCounts::default(),
            history: Vec::new(),
        };

        if let Some(metric) = recorder.diagnostic() {
            info!("recording mean {:?} per step", metric);
        }

        if let Some(prer) = self.prer {
            result.prehardening_removed = preharden(network, prer).removed.len();
        }

        for step in 0..self.horizon {
            let spread = self.engine.step(network, rng)?;
            let detections = match &self.discovery {
                Some(discovery) => discovery.advance(network).detections,
                None => 0,
            };
            debug!(
                "step {}: {} infections, {} recoveries, {} detections",
                step, spread.infections, spread.recoveries, detections
            );
            result.transitions.infections += spread.infections;
            result.transitions.recoveries += spread.recoveries;
            result.transitions.detections += detections;

            if let Some(adaptive) = &self.adaptive {
                result.adaptive_removed += adaptive.step(network).removed.len();
            }

            let record = recorder.record(step, network);
            debug_assert_eq!(record.counts.total(), total_nodes);
            if let Err(e) = sink.emit(recorder.schema(), &record) {
                error!("failed to emit record for step {}: {}", step, e);
                result.emit_failures += 1;
            }

            let extinguished = record.counts.is_extinguished();
            result.history.push(record);
            result.steps_executed += 1;

            if extinguished {
                result.termination = Termination::Extinguished(step);
                info!("epidemic extinguished at step {}", step);
                break;
            }
        }

        if let Err(e) = sink.finish() {
            error!("failed to finish metrics output: {}", e);
            result.emit_failures += 1;
        }

        result.final_edges = network.num_edges();
        info!(
            "run finished after {} steps ({:?})",
            result.steps_executed, result.termination
        );
        Ok(result)
    }
}

/// Seed to use for a run: the given one, or a fresh random one
pub fn resolve_seed(seed: Option<[u8; 32]>) -> [u8; 32] {
    seed.unwrap_or_else(|| {
        let mut seed = [0u8; 32];
        rand::thread_rng().fill(&mut seed);
        seed
    })
}

/// Build the network from the configuration and run it.
///
/// `seed` overrides the seed in the configuration. The one generator drives topology
/// construction and every stochastic transition, so a seed replays the whole run.
pub fn run_simulation(
    config: &SimulationConfig,
    options: &RunOptions,
    seed: Option<[u8; 32]>,
    sink: &mut dyn MetricsSink,
) -> Result<SimulationResult, SimError> {
    let seed = resolve_seed(match seed {
        Some(seed) => Some(seed),
        None => config.parsed_seed()?,
    });
    info!("seed: {}", format_seed_hex(&seed));
    let mut rng = StdRng::from_seed(seed);

    let mut network = build_network(&mut rng, &config.topology());
    if options.display_topology {
        display_network(&network);
    }

    Scheduler::from_config(config, options).run(&mut network, &mut rng, sink, seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::an_interface::{Edge, NodeState, NoOpSink};
    use crate::an_metrics::MemorySink;
    use std::io;

    fn cycle4() -> Network {
        Network::from_edges(4, &[(0, 1), (1, 2), (2, 3), (3, 0)])
    }

    fn config(time: usize) -> SimulationConfig {
        SimulationConfig {
            time,
            connectivity: 4,
            rewiring: 0.1,
            beta: 0.3,
            gamma: 0.1,
            spop: 57,
            ipop: 3,
            rpop: 0,
            restrict: 2,
            delay: 0,
            discovery: Some(2),
            prer: 0.1,
            seed: None,
            output: None,
        }
    }

    struct FailingSink {
        attempts: usize,
    }

    impl MetricsSink for FailingSink {
        fn emit(&mut self, _schema: RecordSchema, _record: &MetricsRecord) -> io::Result<()> {
            self.attempts += 1;
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
        }
    }

    #[test]
    fn test_cycle_trace() {
        let mut network = cycle4();
        network.set_state(0, NodeState::Infectious);
        let mut rng = StdRng::from_seed([0u8; 32]);
        let mut sink = MemorySink::default();

        let scheduler = Scheduler::new(6, 1.0, 0.0).with_discovery(1);
        let result = scheduler
            .run(&mut network, &mut rng, &mut sink, [0u8; 32])
            .unwrap();

        let counts: Vec<(usize, usize, usize, usize)> = sink
            .records
            .iter()
            .map(|r| {
                let c = r.counts;
                (c.susceptible, c.undetected, c.infectious, c.recovered)
            })
            .collect();
        assert_eq!(
            counts,
            vec![
                (1, 0, 3, 0),
                (0, 0, 4, 0),
                (0, 0, 4, 0),
                (0, 0, 4, 0),
                (0, 0, 4, 0),
                (0, 0, 4, 0)
            ]
        );
        assert_eq!(result.termination, Termination::HorizonReached);
        assert_eq!(result.steps_executed, 6);
        assert_eq!(result.schema, RecordSchema::Detection);
        assert_eq!(
            result.transitions,
            TransitionCounts {
                infections: 3,
                recoveries: 0,
                detections: 3,
            }
        );
    }

    #[test]
    fn test_stops_at_extinction() {
        let mut network = cycle4();
        network.set_state(0, NodeState::Infectious);
        let mut rng = StdRng::from_seed([1u8; 32]);
        let mut sink = MemorySink::default();

        // everything contagious recovers in the first step
        let scheduler = Scheduler::new(50, 0.0, 1.0).with_discovery(1);
        let result = scheduler
            .run(&mut network, &mut rng, &mut sink, [1u8; 32])
            .unwrap();

        assert_eq!(result.termination, Termination::Extinguished(0));
        assert_eq!(result.steps_executed, 1);
        assert_eq!(result.transitions.recoveries, 1);
        assert_eq!(sink.records.len(), 1);
        assert_eq!(result.final_counts().recovered, 1);
    }

    #[test]
    fn test_isolation_every_step() {
        let mut network = cycle4();
        network.set_state(0, NodeState::Infectious);
        let mut rng = StdRng::from_seed([2u8; 32]);

        let scheduler = Scheduler::new(10, 0.0, 0.0)
            .with_discovery(1)
            .with_adaptive_removal(0);
        let result = scheduler
            .run(&mut network, &mut rng, &mut NoOpSink, [2u8; 32])
            .unwrap();

        assert_eq!(result.adaptive_removed, 2);
        assert_eq!(network.degree(0), 0);
        assert!(network.has_edge(1, 2));
        assert_eq!(result.schema, RecordSchema::Centrality);
    }

    #[test]
    fn test_budgeted_removal_per_step() {
        // path 0-1-2-3-4-5 with the infection sealed off by beta = 0
        let mut network =
            Network::from_edges(6, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5)]);
        network.set_state(0, NodeState::Infectious);
        let mut rng = StdRng::from_seed([3u8; 32]);
        let mut sink = MemorySink::default();

        let scheduler = Scheduler::new(2, 0.0, 0.0)
            .with_discovery(1)
            .with_adaptive_removal(2);
        let result = scheduler
            .run(&mut network, &mut rng, &mut sink, [3u8; 32])
            .unwrap();

        // target 0-1 first, then the most central remaining edge each time
        assert_eq!(result.adaptive_removed, 4);
        assert!(!network.has_edge(0, 1));
        assert_eq!(network.num_edges(), 1);
        assert_eq!(sink.records[1].mean_betweenness.map(|m| m > 0.0), Some(true));
    }

    #[test]
    fn test_prehardening_runs_before_first_step() {
        let mut network = Network::from_edges(
            6,
            &[(0, 1), (1, 2), (0, 2), (2, 3), (3, 4), (4, 5), (3, 5)],
        );
        network.set_state(0, NodeState::Infectious);
        let mut rng = StdRng::from_seed([4u8; 32]);

        // beta = 1 would reach 3 through the bridge without pre-hardening
        let scheduler = Scheduler::new(10, 1.0, 0.0)
            .with_discovery(1)
            .with_prehardening(0.15);
        let result = scheduler
            .run(&mut network, &mut rng, &mut NoOpSink, [4u8; 32])
            .unwrap();

        assert_eq!(result.prehardening_removed, 1);
        assert!(!network.has_edge(2, 3));
        assert_eq!(result.final_counts().susceptible, 3);
    }

    #[test]
    fn test_sink_failure_does_not_abort() {
        let mut network = cycle4();
        network.set_state(0, NodeState::Infectious);
        let mut rng = StdRng::from_seed([5u8; 32]);
        let mut sink = FailingSink { attempts: 0 };

        let scheduler = Scheduler::new(5, 1.0, 0.0).with_discovery(1);
        let result = scheduler
            .run(&mut network, &mut rng, &mut sink, [5u8; 32])
            .unwrap();

        assert_eq!(sink.attempts, 5);
        assert_eq!(result.emit_failures, 5);
        assert_eq!(result.steps_executed, 5);
    }

    #[test]
    fn test_conservation_and_monotone_edges() {
        let options = RunOptions {
            adaptive: true,
            prer_mode: true,
            ..Default::default()
        };
        let mut sink = MemorySink::default();
        let result = run_simulation(&config(40), &options, Some([6u8; 32]), &mut sink).unwrap();

        assert_eq!(sink.records.len(), result.steps_executed);
        assert!(result.steps_executed <= 40);
        for record in &sink.records {
            assert_eq!(record.counts.total(), 60);
        }
        // lattice of 60 nodes with degree 4
        assert_eq!(
            result.final_edges + result.prehardening_removed + result.adaptive_removed,
            120
        );
    }

    #[test]
    fn test_same_seed_same_history() {
        let options = RunOptions {
            adaptive: true,
            ..Default::default()
        };
        let a = run_simulation(&config(30), &options, Some([7u8; 32]), &mut NoOpSink).unwrap();
        let b = run_simulation(&config(30), &options, Some([7u8; 32]), &mut NoOpSink).unwrap();

        assert_eq!(a.history, b.history);
        assert_eq!(a.seed_used, [7u8; 32]);
    }

    #[test]
    fn test_seed_from_config() {
        let mut with_seed = config(10);
        with_seed.seed = Some(format_seed_hex(&[9u8; 32]));
        let result =
            run_simulation(&with_seed, &RunOptions::default(), None, &mut NoOpSink).unwrap();
        assert_eq!(result.seed_used, [9u8; 32]);
        assert_eq!(result.schema, RecordSchema::Detection);
    }

    #[test]
    fn test_baseline_schema_without_detection() {
        let mut baseline = config(10);
        baseline.discovery = None;
        let result =
            run_simulation(&baseline, &RunOptions::default(), Some([8u8; 32]), &mut NoOpSink)
                .unwrap();

        assert_eq!(result.schema, RecordSchema::Baseline);
        assert!(result.history.iter().all(|r| r.counts.undetected == 0));
    }

    #[test]
    fn test_single_edge_budget_sequence() {
        let mut network = cycle4();
        network.set_state(0, NodeState::Infectious);
        let scheduler = Scheduler::new(3, 0.0, 0.0)
            .with_discovery(1)
            .with_adaptive_removal(1);
        let mut rng = StdRng::from_seed([10u8; 32]);
        let result = scheduler
            .run(&mut network, &mut rng, &mut NoOpSink, [10u8; 32])
            .unwrap();

        // 0-1 then 0-3 isolate node 0, the last step spends the budget on 1-2
        assert_eq!(result.adaptive_removed, 3);
        assert_eq!(network.edges(), vec![Edge::new(2, 3)]);
    }
}
